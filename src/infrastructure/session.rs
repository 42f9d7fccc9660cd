//! 单次查询的浏览器会话
//!
//! 每次查询独占一个会话，结束时（无论成功、已处理的失败还是 panic）恰好释放一次。

use tracing::{debug, warn};

use crate::error::BrowserError;
use crate::infrastructure::page_driver::PageDriver;

/// 会话守卫
///
/// 两条释放路径：
/// 1. `release()` 显式异步关闭，正常流程使用
/// 2. Drop 兜底：在错误或 panic 路径上由后台任务关闭页面
pub struct Session {
    page: Option<Box<dyn PageDriver>>,
    label: String,
    runtime_handle: tokio::runtime::Handle,
}

impl Session {
    /// 必须在 tokio 运行时内创建
    pub fn new(page: Box<dyn PageDriver>, label: impl Into<String>) -> Self {
        Self {
            page: Some(page),
            label: label.into(),
            runtime_handle: tokio::runtime::Handle::current(),
        }
    }

    pub fn page(&self) -> &(dyn PageDriver + 'static) {
        match self.page.as_deref() {
            Some(page) => page,
            // release() 消耗 self，存活的 Session 一定持有页面
            None => unreachable!("session page already released"),
        }
    }

    /// 显式关闭页面，消耗会话
    pub async fn release(mut self) -> Result<(), BrowserError> {
        match self.page.take() {
            Some(page) => {
                let result = page.close().await;
                match &result {
                    Ok(()) => debug!("{} 会话已关闭", self.label),
                    Err(e) => warn!("{} 关闭会话失败: {}", self.label, e),
                }
                result
            }
            None => Ok(()),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            let label = std::mem::take(&mut self.label);
            warn!("{} 会话未显式释放，后台关闭", label);
            self.runtime_handle.spawn(async move {
                if let Err(e) = page.close().await {
                    warn!("{} 后台关闭会话失败: {}", label, e);
                }
            });
        }
    }
}
