//! 浏览器自动化能力 - 基础设施层
//!
//! 上层流程只依赖这里的 trait，不直接接触 chromiumoxide，
//! 测试中可以用脚本化的假页面替换真实浏览器。

use std::time::Duration;

use async_trait::async_trait;

use crate::error::BrowserError;

/// PDF 渲染参数（单位：英寸）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfOptions {
    pub paper_width: f64,
    pub paper_height: f64,
    pub print_background: bool,
}

impl PdfOptions {
    /// A4 纸张，打印背景
    pub fn a4() -> Self {
        Self {
            paper_width: 8.27,
            paper_height: 11.69,
            print_background: true,
        }
    }
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self::a4()
    }
}

/// 单个页面的操作能力
///
/// 所有操作都可能失败，错误区分超时 / 元素不存在 / 通信失败。
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 打开页面，超过 `timeout` 返回 `BrowserError::Timeout`
    async fn open(&self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// 元素当前是否存在（不等待）
    async fn exists(&self, selector: &str) -> Result<bool, BrowserError>;

    /// 在 `timeout` 内等待元素出现
    async fn locate(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    async fn type_text(&self, selector: &str, text: &str) -> Result<(), BrowserError>;

    async fn click(&self, selector: &str) -> Result<(), BrowserError>;

    /// 读取元素的 textContent
    async fn read_text(&self, selector: &str) -> Result<String, BrowserError>;

    /// 读取元素属性（DOM property，例如图片的绝对地址 `src`）
    async fn read_property(&self, selector: &str, name: &str) -> Result<String, BrowserError>;

    async fn outer_html(&self, selector: &str) -> Result<String, BrowserError>;

    async fn render_pdf(&self, options: &PdfOptions) -> Result<Vec<u8>, BrowserError>;

    /// 关闭页面并释放浏览器资源
    async fn close(&self) -> Result<(), BrowserError>;
}

/// 会话工厂：每次查询创建一个全新的页面
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn PageDriver>, BrowserError>;
}
