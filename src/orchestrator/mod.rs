//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用组装
//! - 管理应用生命周期（初始化、运行、关闭）
//! - 持有浏览器资源
//! - 创建两个互相独立的任务队列
//!
//! ### `job_queue` - 有界并发任务队列
//! - FIFO 准入，积压有上限
//! - Semaphore 限制同时执行的查询数
//! - 单个查询的失败和 panic 不影响其他任务
//!
//! ## 层次关系
//!
//! ```text
//! api (HTTP)
//!     ↓
//! job_queue (interactive K=20 / bulk K=5)
//!     ↓
//! workflow::TrackingFlow (单次查询)
//!     ↓
//! workflow::NavigationDriver ⇄ services (验证码 / OCR / PDF 发布)
//!     ↓
//! infrastructure (PageDriver / Session)
//! ```

pub mod app;
pub mod job_queue;

pub use app::{build_state, App, BULK_QUEUE, INTERACTIVE_QUEUE};
pub use job_queue::{JobQueue, QueueStatsSnapshot, TrackingJob};
