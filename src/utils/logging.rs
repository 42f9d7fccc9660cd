/// 日志工具模块
///
/// 提供日志初始化和启动/关闭信息输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{ArtifactBackend, Config};
use crate::models::LocatorMap;

/// 初始化日志
///
/// 设置了 `RUST_LOG` 时以其为准，否则默认 info，`verbose` 时为 debug。
/// 重复调用不会报错（测试中会多次调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录服务启动信息
pub fn log_startup(config: &Config, locators: &LocatorMap) {
    info!("{}", "=".repeat(60));
    info!("🚀 邮件查询服务启动");
    info!("🌐 查询页面: {}", config.target_url);
    info!(
        "📊 并发上限: 交互 {} / 批量 {} (积压上限 {})",
        config.interactive_concurrency, config.bulk_concurrency, config.queue_backlog_limit
    );
    info!("🗺️ 选择器表版本: {}", locators.version);
    match config.artifact_backend {
        ArtifactBackend::S3 => info!(
            "☁️ PDF 存储: s3://{} ({})",
            config.aws_s3_bucket_name, config.aws_region
        ),
        ArtifactBackend::Local => info!("📁 PDF 存储: 本地目录 {}", config.artifact_dir),
    }
    info!("{}", "=".repeat(60));
}

/// 记录监听地址
pub fn log_listening(port: u16) {
    info!("✅ 服务已就绪: http://localhost:{}/api", port);
}

/// 记录关闭信息
pub fn log_shutdown() {
    info!("\n{}", "─".repeat(60));
    info!(
        "🛑 服务关闭 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("Item Delivered", 4), "Item...");
        assert_eq!(truncate_text("已妥投", 2), "已妥...");
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
