//! 单次查询流程 - 流程层
//!
//! 核心职责：把"一次查询"组合起来并给出唯一的结果分类
//!
//! 流程顺序：
//! 1. 创建新会话（失败则作为基础设施错误向上返回）
//! 2. 导航状态机
//! 3. 提取成功后发布 PDF（失败只清空 PDF URL）
//! 4. 无论结果如何，释放会话

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::error::BrowserError;
use crate::infrastructure::{PageDriver, Session, SessionFactory};
use crate::models::{ConsignmentId, TrackingResult};
use crate::services::ArtifactPublisher;
use crate::utils::truncate_text;
use crate::workflow::navigation::NavigationDriver;
use crate::workflow::tracking_ctx::TrackingCtx;

/// 执行一次查询的能力，由任务队列调用
#[async_trait]
pub trait AttemptRunner: Send + Sync + 'static {
    /// 只有无法创建会话时返回错误，其余情况都归类为某个 `TrackingResult`
    async fn run_attempt(
        &self,
        id: &ConsignmentId,
        ctx: &TrackingCtx,
    ) -> Result<TrackingResult, BrowserError>;
}

/// 单次查询流程
///
/// - 独占本次查询的会话
/// - 只依赖业务能力（services）和导航状态机
pub struct TrackingFlow {
    sessions: Arc<dyn SessionFactory>,
    navigator: NavigationDriver,
    publisher: ArtifactPublisher,
}

impl TrackingFlow {
    pub fn new(
        sessions: Arc<dyn SessionFactory>,
        navigator: NavigationDriver,
        publisher: ArtifactPublisher,
    ) -> Self {
        Self {
            sessions,
            navigator,
            publisher,
        }
    }

    pub async fn run_tracking_attempt(
        &self,
        id: &ConsignmentId,
        ctx: &TrackingCtx,
    ) -> Result<TrackingResult, BrowserError> {
        let page = self.sessions.open_session().await.map_err(|e| {
            error!("{} ❌ 无法创建浏览器会话: {}", ctx, e);
            e
        })?;
        let session = Session::new(page, ctx.to_string());

        let outcome = AssertUnwindSafe(self.track_in_session(session.page(), id, ctx))
            .catch_unwind()
            .await;

        // 关闭失败已在 release 内记录
        let _ = session.release().await;

        match outcome {
            Ok(result) => Ok(result),
            Err(_) => {
                error!("{} ❌ 查询过程中发生 panic", ctx);
                Ok(TrackingResult::internal_error(id.as_str()))
            }
        }
    }

    async fn track_in_session(
        &self,
        page: &dyn PageDriver,
        id: &ConsignmentId,
        ctx: &TrackingCtx,
    ) -> TrackingResult {
        let extraction = match self.navigator.drive(page, id, ctx).await {
            Ok(extraction) => extraction,
            Err(failure) => {
                let result = failure.to_result(id);
                warn!("{} ⚠️ {} → {:?}", ctx, failure, result.status());
                return result;
            }
        };

        debug!("{} HTML: {}", ctx, truncate_text(&extraction.html_content, 120));

        let artifact_url = match self.publisher.publish(page, id).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("{} ⚠️ PDF 发布失败，仅返回状态: {}", ctx, e);
                None
            }
        };

        info!("{} ✅ {}", ctx, extraction.current_status);
        TrackingResult::success(
            id,
            extraction.current_status,
            extraction.html_content,
            artifact_url,
        )
    }
}

#[async_trait]
impl AttemptRunner for TrackingFlow {
    async fn run_attempt(
        &self,
        id: &ConsignmentId,
        ctx: &TrackingCtx,
    ) -> Result<TrackingResult, BrowserError> {
        self.run_tracking_attempt(id, ctx).await
    }
}
