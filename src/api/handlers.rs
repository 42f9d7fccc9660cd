//! HTTP 处理函数
//!
//! 只做参数解析和状态码映射，查询本身交给任务队列。

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::api::state::AppState;
use crate::error::QueueError;
use crate::models::{validate, TrackingResult};
use crate::orchestrator::{JobQueue, QueueStatsSnapshot};

pub const TRACKING_MESSAGE: &str = "Tracking info retrieved";

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    #[serde(default)]
    pub consignment_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkTrackRequest {
    #[serde(default)]
    pub consignment_numbers: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CaptchaRequest {
    #[serde(default, rename = "captchaUrl")]
    pub captcha_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueueHealth {
    pub name: String,
    pub concurrency: usize,
    pub backlog_limit: usize,
    #[serde(flatten)]
    pub stats: QueueStatsSnapshot,
}

impl QueueHealth {
    fn of(queue: &JobQueue) -> Self {
        Self {
            name: queue.name().to_string(),
            concurrency: queue.concurrency(),
            backlog_limit: queue.backlog_limit(),
            stats: queue.stats(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub interactive: QueueHealth,
    pub bulk: QueueHealth,
}

/// GET /api
pub async fn index() -> Json<serde_json::Value> {
    Json(json!({ "message": "Consignment tracking service is running" }))
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        interactive: QueueHealth::of(&state.interactive),
        bulk: QueueHealth::of(&state.bulk),
    })
}

/// POST /api/trackConsignment
pub async fn track_consignment(
    State(state): State<AppState>,
    Json(request): Json<TrackRequest>,
) -> Response {
    let Some(raw) = request.consignment_number.filter(|v| !v.is_empty()) else {
        warn!("请求缺少 consignment_number");
        return error_response(StatusCode::BAD_REQUEST, "Missing consignment number");
    };

    let id = match validate(&raw) {
        Ok(id) => id,
        Err(e) => {
            info!("邮件号 {} 格式不合法: {}", raw, e);
            return tracking_response(TrackingResult::invalid(&raw));
        }
    };

    match state.interactive.submit(id).await {
        Ok(result) => tracking_response(result),
        Err(e) => queue_error_response(e),
    }
}

/// POST /api/bulkTrackConsignments
///
/// 每个邮件号各自占用批量队列的一个任务，结果按请求顺序返回。
pub async fn bulk_track_consignments(
    State(state): State<AppState>,
    Json(request): Json<BulkTrackRequest>,
) -> Response {
    let Some(numbers) = request.consignment_numbers.filter(|v| !v.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing consignment numbers");
    };

    info!("📦 批量查询 {} 个邮件号", numbers.len());

    let queue = &state.bulk;
    let results = join_all(numbers.iter().map(|raw| async move {
        let id = match validate(raw) {
            Ok(id) => id,
            Err(_) => return TrackingResult::invalid(raw),
        };
        match queue.submit(id).await {
            Ok(result) => result,
            Err(e) => {
                warn!("批量查询 {} 失败: {}", raw, e);
                TrackingResult::internal_error(raw)
            }
        }
    }))
    .await;

    (
        StatusCode::OK,
        Json(json!({ "message": TRACKING_MESSAGE, "data": results })),
    )
        .into_response()
}

/// POST /api/extractCaptchaText
pub async fn extract_captcha_text(
    State(state): State<AppState>,
    Json(request): Json<CaptchaRequest>,
) -> Response {
    let Some(url) = request.captcha_url.filter(|v| !v.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Captcha URL is required");
    };

    match state.recognizer.recognize(&url).await {
        Ok(Some(text)) => (
            StatusCode::OK,
            Json(json!({ "success": true, "captchaText": text })),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "No text detected in captcha" })),
        )
            .into_response(),
        Err(e) => {
            error!("验证码识别失败: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Internal server error" })),
            )
                .into_response()
        }
    }
}

fn tracking_response(result: TrackingResult) -> Response {
    let status = StatusCode::from_u16(result.status().http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({ "message": TRACKING_MESSAGE, "data": result })),
    )
        .into_response()
}

fn queue_error_response(err: QueueError) -> Response {
    let status = match err {
        QueueError::Backlogged { .. } | QueueError::Closed { .. } => {
            warn!("队列暂不可用: {}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
        QueueError::WorkerLost { .. } | QueueError::Infrastructure(_) => {
            error!("查询失败: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, &err.to_string())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
