use std::sync::Arc;

use crate::orchestrator::JobQueue;
use crate::services::TextRecognizer;

/// 路由共享状态，由 `App` 构造，没有全局单例
#[derive(Clone)]
pub struct AppState {
    /// 单个查询（默认并发 20）
    pub interactive: Arc<JobQueue>,
    /// 批量查询（默认并发 5）
    pub bulk: Arc<JobQueue>,
    pub recognizer: Arc<dyn TextRecognizer>,
}

impl AppState {
    pub fn new(
        interactive: Arc<JobQueue>,
        bulk: Arc<JobQueue>,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Self {
        Self {
            interactive,
            bulk,
            recognizer,
        }
    }
}
