//! 页面导航状态机 - 流程层
//!
//! 驱动一个会话完成：打开页面 → 输入邮件号 → 验证码 → 提交 → 提取结果。
//!
//! ```text
//! Start → PageLoaded → InputEntered → CaptchaPresented → CaptchaTyped → Submitted → Extracted
//!   └────────────┴────────────┴──────────────┴──────────────┴────────────┴──→ Errored(..)
//! ```
//!
//! 每一步的等待都有超时，超时一律落到某个 `NavigationFailure`。

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Timeouts;
use crate::error::BrowserError;
use crate::infrastructure::PageDriver;
use crate::models::{
    CaptchaChallenge, ConsignmentId, LocatorMap, TrackingResult, TrackingStatus,
};
use crate::services::{CaptchaResolver, Unresolved};
use crate::workflow::tracking_ctx::TrackingCtx;

/// 提取到的查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// 状态文字（已去除首尾空白）
    pub current_status: String,
    /// 查询结果区域的 HTML（已去除换行、制表和回车）
    pub html_content: String,
}

/// 导航失败的原因
#[derive(Debug, Error)]
pub enum NavigationFailure {
    #[error("无法打开查询页面: {0}")]
    PortalUnreachable(#[source] BrowserError),
    #[error("找不到邮件号输入框: {0}")]
    InputMissing(#[source] BrowserError),
    #[error("页面上没有验证码图片")]
    CaptchaMissing,
    #[error("无法读取验证码图片或提示: {0}")]
    CaptchaUnreadable(#[source] BrowserError),
    #[error("验证码无法求解: {0}")]
    CaptchaUnresolved(#[source] Unresolved),
    #[error("提交后结果区域未出现")]
    ResultContainerTimeout,
    #[error("查无此件: {0}")]
    RecordNotFound(String),
    #[error("状态尚未生成")]
    ResultPending,
    #[error("浏览器操作失败: {0}")]
    Browser(#[from] BrowserError),
}

impl NavigationFailure {
    pub fn classification(&self) -> TrackingStatus {
        match self {
            NavigationFailure::PortalUnreachable(_)
            | NavigationFailure::ResultContainerTimeout
            | NavigationFailure::ResultPending => TrackingStatus::Initiated,
            NavigationFailure::CaptchaMissing
            | NavigationFailure::CaptchaUnreadable(_)
            | NavigationFailure::CaptchaUnresolved(_) => TrackingStatus::CaptchaFailed,
            NavigationFailure::RecordNotFound(_) => TrackingStatus::NotFound,
            NavigationFailure::InputMissing(_) | NavigationFailure::Browser(_) => {
                TrackingStatus::InternalError
            }
        }
    }

    pub fn to_result(&self, id: &ConsignmentId) -> TrackingResult {
        match self.classification() {
            TrackingStatus::Initiated => TrackingResult::initiated(id),
            TrackingStatus::NotFound => TrackingResult::not_found(id),
            TrackingStatus::CaptchaFailed => TrackingResult::captcha_failed(id),
            _ => TrackingResult::internal_error(id.as_str()),
        }
    }
}

/// 状态机的状态
#[derive(Debug)]
pub enum NavState {
    Start,
    PageLoaded,
    InputEntered,
    CaptchaPresented(CaptchaChallenge),
    CaptchaTyped,
    Submitted,
    Extracted(Extraction),
    Errored(NavigationFailure),
}

impl NavState {
    pub fn name(&self) -> &'static str {
        match self {
            NavState::Start => "Start",
            NavState::PageLoaded => "PageLoaded",
            NavState::InputEntered => "InputEntered",
            NavState::CaptchaPresented(_) => "CaptchaPresented",
            NavState::CaptchaTyped => "CaptchaTyped",
            NavState::Submitted => "Submitted",
            NavState::Extracted(_) => "Extracted",
            NavState::Errored(_) => "Errored",
        }
    }
}

/// 导航驱动
///
/// - 只依赖 `PageDriver`，不持有页面
/// - 选择器全部来自 `LocatorMap`
pub struct NavigationDriver {
    target_url: String,
    locators: Arc<LocatorMap>,
    timeouts: Timeouts,
    resolver: CaptchaResolver,
}

impl NavigationDriver {
    pub fn new(
        target_url: impl Into<String>,
        locators: Arc<LocatorMap>,
        timeouts: Timeouts,
        resolver: CaptchaResolver,
    ) -> Self {
        Self {
            target_url: target_url.into(),
            locators,
            timeouts,
            resolver,
        }
    }

    /// 从 Start 运行到终止状态
    pub async fn drive(
        &self,
        page: &dyn PageDriver,
        id: &ConsignmentId,
        ctx: &TrackingCtx,
    ) -> Result<Extraction, NavigationFailure> {
        let mut state = NavState::Start;
        loop {
            state = match state {
                NavState::Extracted(extraction) => return Ok(extraction),
                NavState::Errored(failure) => return Err(failure),
                current => {
                    debug!("{} 状态: {}", ctx, current.name());
                    self.step(page, id, ctx, current).await
                }
            };
        }
    }

    async fn step(
        &self,
        page: &dyn PageDriver,
        id: &ConsignmentId,
        ctx: &TrackingCtx,
        state: NavState,
    ) -> NavState {
        let next = match state {
            NavState::Start => self.load_portal(page).await.map(|_| NavState::PageLoaded),
            NavState::PageLoaded => self
                .enter_consignment(page, id)
                .await
                .map(|_| NavState::InputEntered),
            NavState::InputEntered => self
                .present_captcha(page)
                .await
                .map(NavState::CaptchaPresented),
            NavState::CaptchaPresented(challenge) => self
                .answer_captcha(page, ctx, &challenge)
                .await
                .map(|_| NavState::CaptchaTyped),
            NavState::CaptchaTyped => self.submit(page).await.map(|_| NavState::Submitted),
            NavState::Submitted => self.extract(page, ctx).await.map(NavState::Extracted),
            terminal => return terminal,
        };
        next.unwrap_or_else(NavState::Errored)
    }

    async fn load_portal(&self, page: &dyn PageDriver) -> Result<(), NavigationFailure> {
        page.open(&self.target_url, self.timeouts.navigation)
            .await
            .map_err(NavigationFailure::PortalUnreachable)
    }

    async fn enter_consignment(
        &self,
        page: &dyn PageDriver,
        id: &ConsignmentId,
    ) -> Result<(), NavigationFailure> {
        let input = &self.locators.consignment_input;
        page.locate(input, self.timeouts.input)
            .await
            .map_err(NavigationFailure::InputMissing)?;
        page.type_text(input, id.as_str()).await?;
        Ok(())
    }

    /// 按顺序探测验证码图片，第一个存在的决定类型
    async fn present_captcha(
        &self,
        page: &dyn PageDriver,
    ) -> Result<CaptchaChallenge, NavigationFailure> {
        for locator in &self.locators.captcha_images {
            if !page.exists(&locator.selector).await? {
                continue;
            }
            let image_ref = page
                .read_property(&locator.selector, "src")
                .await
                .map_err(NavigationFailure::CaptchaUnreadable)?;
            let query_text = page
                .read_text(&self.locators.captcha_query)
                .await
                .map_err(NavigationFailure::CaptchaUnreadable)?;
            return Ok(CaptchaChallenge::new(
                image_ref,
                query_text.trim(),
                locator.kind,
            ));
        }
        Err(NavigationFailure::CaptchaMissing)
    }

    async fn answer_captcha(
        &self,
        page: &dyn PageDriver,
        ctx: &TrackingCtx,
        challenge: &CaptchaChallenge,
    ) -> Result<(), NavigationFailure> {
        let answer = self
            .resolver
            .resolve(challenge)
            .await
            .map_err(NavigationFailure::CaptchaUnresolved)?;
        info!("{} 🔑 验证码答案: {}", ctx, answer);
        page.type_text(&self.locators.captcha_input, answer.as_str())
            .await?;
        Ok(())
    }

    async fn submit(&self, page: &dyn PageDriver) -> Result<(), NavigationFailure> {
        page.click(&self.locators.search_button).await?;
        page.locate(&self.locators.result_container, self.timeouts.result_container)
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NavigationFailure::ResultContainerTimeout
                } else {
                    NavigationFailure::Browser(e)
                }
            })
    }

    async fn extract(
        &self,
        page: &dyn PageDriver,
        ctx: &TrackingCtx,
    ) -> Result<Extraction, NavigationFailure> {
        match page
            .locate(&self.locators.status_label, self.timeouts.status)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_timeout() => return Err(self.diagnose_missing_status(page, ctx).await),
            Err(e) => return Err(e.into()),
        }

        let current_status = page.read_text(&self.locators.status_label).await?;
        let html = page.outer_html(&self.locators.tracking_panel).await?;

        Ok(Extraction {
            current_status: current_status.trim().to_string(),
            html_content: strip_line_breaks(&html),
        })
    }

    /// 状态文字未出现时，根据错误提示区分"查无此件"和"尚未生成"
    async fn diagnose_missing_status(
        &self,
        page: &dyn PageDriver,
        ctx: &TrackingCtx,
    ) -> NavigationFailure {
        let selector = &self.locators.not_found_message;
        let message = match page.exists(selector).await {
            Ok(true) => page.read_text(selector).await.unwrap_or_default(),
            Ok(false) => String::new(),
            Err(e) => {
                warn!("{} 读取错误提示失败: {}", ctx, e);
                String::new()
            }
        };

        if self.locators.is_not_found_message(&message) {
            NavigationFailure::RecordNotFound(message.trim().to_string())
        } else {
            NavigationFailure::ResultPending
        }
    }
}

/// 去掉 `\n` `\t` `\r`
pub fn strip_line_breaks(html: &str) -> String {
    html.chars()
        .filter(|c| !matches!(c, '\n' | '\t' | '\r'))
        .collect()
}
