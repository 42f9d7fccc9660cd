//! # Track Consignment
//!
//! 自动查询邮件跟踪状态的 Rust 服务：驱动浏览器打开邮政查询页面，
//! 识别并填写验证码，提取状态文字和结果 HTML，并将结果页保存为 PDF。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` / `SessionFactory` - 浏览器操作的抽象
//! - `Session` - 单次查询独占的页面，恰好释放一次
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `CaptchaResolver` - 验证码求解（按序取数 / 算式 / 原文）
//! - `VisionOcrClient` - OCR 能力
//! - `ArtifactPublisher` - 渲染 PDF 并存储
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次查询"的完整流程
//! - `NavigationDriver` - 页面导航状态机
//! - `TrackingFlow` - 组合导航和发布，给出唯一的结果分类
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/job_queue` - 有界并发任务队列
//! - `orchestrator/app` - 应用组装与 HTTP 服务
//!
//! ## 模块结构

pub mod api;
pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{validate, ConsignmentId, TrackingResult, TrackingStatus};
pub use orchestrator::{App, JobQueue};
pub use workflow::{TrackingCtx, TrackingFlow};
