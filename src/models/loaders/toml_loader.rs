use crate::models::locators::LocatorMap;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载选择器表
pub async fn load_locator_map(toml_file_path: &Path) -> Result<LocatorMap> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let map: LocatorMap = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    if map.captcha_images.is_empty() {
        anyhow::bail!("选择器表 {} 未配置任何验证码图片", toml_file_path.display());
    }

    tracing::info!(
        "已加载选择器表 {} (版本 {})",
        toml_file_path.display(),
        map.version
    );

    Ok(map)
}

/// 按配置加载选择器表：未指定文件时使用内置默认值
pub async fn load_locator_map_or_default(toml_file_path: Option<&str>) -> Result<LocatorMap> {
    match toml_file_path {
        Some(path) => load_locator_map(Path::new(path)).await,
        None => {
            let map = LocatorMap::default();
            tracing::info!("使用内置选择器表 (版本 {})", map.version);
            Ok(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::captcha::CaptchaKind;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_locator_map_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"
version = "test-1"
consignment_input = "#track"
captcha_query = "#query"
captcha_input = "#answer"
search_button = "#go"
result_container = "div.result"
status_label = "#status"
tracking_panel = "#panel"
not_found_message = "#error"
not_found_phrases = ["nothing here"]

[[captcha_images]]
selector = "#math"
kind = "math_expression"
"##
        )
        .unwrap();

        let map = load_locator_map(file.path()).await.unwrap();
        assert_eq!(map.version, "test-1");
        assert_eq!(map.captcha_images[0].kind, CaptchaKind::MathExpression);
        assert!(map.is_not_found_message("Nothing here, sorry"));
    }

    #[tokio::test]
    async fn test_rejects_map_without_captcha_images() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"
version = "broken"
consignment_input = "#track"
captcha_images = []
captcha_query = "#query"
captcha_input = "#answer"
search_button = "#go"
result_container = "div.result"
status_label = "#status"
tracking_panel = "#panel"
not_found_message = "#error"
"##
        )
        .unwrap();

        assert!(load_locator_map(file.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_default_when_no_file() {
        let map = load_locator_map_or_default(None).await.unwrap();
        assert_eq!(map, LocatorMap::default());
    }
}
