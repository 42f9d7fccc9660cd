//! Chromium 页面 - 基础设施层
//!
//! 持有 chromiumoxide 的 Page，只暴露 `PageDriver` 定义的能力。
//! 读取类操作统一通过执行 JS 完成，选择器以 JSON 字符串形式嵌入脚本。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, Page};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::sleep;
use tracing::debug;

use crate::error::BrowserError;
use crate::infrastructure::page_driver::{PageDriver, PdfOptions, SessionFactory};

/// Chromium 页面
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 实现打开 / 等待 / 输入 / 点击 / 读取 / 渲染 PDF
/// - 不认识邮件号和验证码
pub struct ChromePage {
    page: Page,
    poll_interval: Duration,
}

impl ChromePage {
    pub fn new(page: Page, poll_interval: Duration) -> Self {
        Self {
            page,
            poll_interval,
        }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue, BrowserError> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(|e| BrowserError::transport("evaluate", e))?;
        result
            .into_value()
            .map_err(|e| BrowserError::transport("evaluate", e))
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> Result<T, BrowserError> {
        let json_value = self.eval(js_code).await?;
        serde_json::from_value(json_value).map_err(|e| BrowserError::transport("decode", e))
    }

    /// 对匹配元素执行表达式 `expr`（其中 `el` 为元素），元素不存在时返回 None
    async fn query_element<T: DeserializeOwned>(
        &self,
        selector: &str,
        expr: &str,
    ) -> Result<Option<T>, BrowserError> {
        // 顶层 null 无法取回，元素不存在时返回空数组
        let js_code = format!(
            r#"(() => {{
                const el = document.querySelector({});
                return el ? [({})] : [];
            }})()"#,
            js_string(selector),
            expr
        );
        let values: Vec<T> = self.eval_as(js_code).await?;
        Ok(values.into_iter().next())
    }

    async fn ensure_present(&self, selector: &str) -> Result<(), BrowserError> {
        if self.exists(selector).await? {
            Ok(())
        } else {
            Err(BrowserError::not_found(selector))
        }
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn open(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        debug!("正在打开页面: {}", url);
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::transport(format!("goto {}", url), e)),
            Err(_) => Err(BrowserError::timeout(url, timeout)),
        }
    }

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError> {
        let js_code = format!("document.querySelector({}) !== null", js_string(selector));
        self.eval_as(js_code).await
    }

    async fn locate(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let present = poll_until_present(|| self.exists(selector), self.poll_interval);
        tokio::time::timeout(timeout, present)
            .await
            .map_err(|_| BrowserError::timeout(selector, timeout))
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        self.ensure_present(selector).await?;
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| BrowserError::transport(format!("find {}", selector), e))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::transport(format!("focus {}", selector), e))?;
        element
            .type_str(text)
            .await
            .map_err(|e| BrowserError::transport(format!("type {}", selector), e))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        self.ensure_present(selector).await?;
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| BrowserError::transport(format!("find {}", selector), e))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::transport(format!("click {}", selector), e))?;
        Ok(())
    }

    async fn read_text(&self, selector: &str) -> Result<String, BrowserError> {
        self.query_element::<String>(selector, "el.textContent || ''")
            .await?
            .ok_or_else(|| BrowserError::not_found(selector))
    }

    async fn read_property(&self, selector: &str, name: &str) -> Result<String, BrowserError> {
        let expr = format!("el[{name}] == null ? '' : String(el[{name}])", name = js_string(name));
        self.query_element::<String>(selector, &expr)
            .await?
            .ok_or_else(|| BrowserError::not_found(selector))
    }

    async fn outer_html(&self, selector: &str) -> Result<String, BrowserError> {
        self.query_element::<String>(selector, "el.outerHTML")
            .await?
            .ok_or_else(|| BrowserError::not_found(selector))
    }

    async fn render_pdf(&self, options: &PdfOptions) -> Result<Vec<u8>, BrowserError> {
        let params = PrintToPdfParams {
            print_background: Some(options.print_background),
            paper_width: Some(options.paper_width),
            paper_height: Some(options.paper_height),
            ..Default::default()
        };
        self.page
            .pdf(params)
            .await
            .map_err(|e| BrowserError::transport("print to pdf", e))
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| BrowserError::transport("close page", e))
    }
}

/// 基于共享浏览器的会话工厂：每个会话是一个新标签页
pub struct ChromeSessionFactory {
    browser: Arc<Browser>,
    poll_interval: Duration,
}

impl ChromeSessionFactory {
    pub fn new(browser: Browser, poll_interval: Duration) -> Self {
        Self {
            browser: Arc::new(browser),
            poll_interval,
        }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open_session(&self) -> Result<Box<dyn PageDriver>, BrowserError> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(Box::new(ChromePage::new(page, self.poll_interval)))
    }
}

/// 反复探测直到元素出现，只能由外层超时结束
///
/// 提交后页面回发期间执行上下文会被销毁，单次探测失败不代表元素不会出现。
async fn poll_until_present<F, Fut>(mut check: F, poll_interval: Duration)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, BrowserError>>,
{
    loop {
        match check().await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => debug!("探测元素失败，继续等待: {}", e),
        }
        sleep(poll_interval).await;
    }
}

/// 将字符串编码为 JS 字符串字面量
fn js_string(value: &str) -> String {
    JsonValue::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_poll_survives_transient_check_errors() {
        let calls = std::cell::Cell::new(0);
        let check = || {
            calls.set(calls.get() + 1);
            let attempt = calls.get();
            async move {
                match attempt {
                    1 | 2 => Err(BrowserError::transport(
                        "evaluate",
                        std::io::Error::new(
                            std::io::ErrorKind::Other,
                            "Execution context was destroyed",
                        ),
                    )),
                    3 => Ok(false),
                    _ => Ok(true),
                }
            }
        };

        let waited = tokio::time::timeout(
            Duration::from_secs(1),
            poll_until_present(check, Duration::from_millis(1)),
        )
        .await;

        assert!(waited.is_ok());
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn test_poll_with_failing_check_ends_only_by_timeout() {
        let check = || async {
            Err::<bool, _>(BrowserError::transport(
                "evaluate",
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "ws closed"),
            ))
        };

        let waited = tokio::time::timeout(
            Duration::from_millis(30),
            poll_until_present(check, Duration::from_millis(1)),
        )
        .await;

        assert!(waited.is_err());
    }

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string("#a"), r##""#a""##);
        assert_eq!(js_string(r#"div[title="x"]"#), r#""div[title=\"x\"]""#);
    }
}
