use serde::{Deserialize, Serialize};

use crate::models::consignment::ConsignmentId;

pub const STATUS_INVALID: &str = "Current Status : Invalid consignment number";
pub const STATUS_INITIATED: &str = "Current Status : Tracking initiated, result not available yet";
pub const STATUS_NOT_FOUND: &str = "Current Status : Consignment details not found";
pub const STATUS_CAPTCHA_FAILED: &str = "Current Status : Captcha could not be solved";
pub const STATUS_INTERNAL_ERROR: &str = "Current Status : Internal error while tracking consignment";

/// 查询结果分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackingStatus {
    Success,
    Invalid,
    Initiated,
    NotFound,
    CaptchaFailed,
    InternalError,
}

impl TrackingStatus {
    /// 对外返回的 HTTP 状态码
    ///
    /// 203 表示"已受理但结论不确定"，调用方可以稍后重试。
    pub fn http_status(self) -> u16 {
        match self {
            TrackingStatus::Success => 200,
            TrackingStatus::Invalid
            | TrackingStatus::Initiated
            | TrackingStatus::NotFound
            | TrackingStatus::CaptchaFailed => 203,
            TrackingStatus::InternalError => 500,
        }
    }

    pub fn is_success(self) -> bool {
        self == TrackingStatus::Success
    }
}

/// 一次查询的最终结果，构造后不可修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingResult {
    #[serde(rename = "Consignment Number")]
    consignment_number: String,
    #[serde(rename = "Current Status")]
    current_status: String,
    #[serde(rename = "HTML Content")]
    html_content: String,
    #[serde(rename = "PDF URL")]
    artifact_url: String,
    #[serde(skip)]
    status: TrackingStatus,
}

impl TrackingResult {
    /// 成功提取到状态；`artifact_url` 为空表示快照上传失败
    pub fn success(
        id: &ConsignmentId,
        current_status: impl Into<String>,
        html_content: impl Into<String>,
        artifact_url: Option<String>,
    ) -> Self {
        Self {
            consignment_number: id.to_string(),
            current_status: current_status.into(),
            html_content: html_content.into(),
            artifact_url: artifact_url.unwrap_or_default(),
            status: TrackingStatus::Success,
        }
    }

    /// 邮件号格式不合法（原样保留调用方传入的字符串）
    pub fn invalid(raw: &str) -> Self {
        Self::empty(raw, STATUS_INVALID, TrackingStatus::Invalid)
    }

    pub fn initiated(id: &ConsignmentId) -> Self {
        Self::empty(id.as_str(), STATUS_INITIATED, TrackingStatus::Initiated)
    }

    pub fn not_found(id: &ConsignmentId) -> Self {
        Self::empty(id.as_str(), STATUS_NOT_FOUND, TrackingStatus::NotFound)
    }

    pub fn captcha_failed(id: &ConsignmentId) -> Self {
        Self::empty(id.as_str(), STATUS_CAPTCHA_FAILED, TrackingStatus::CaptchaFailed)
    }

    pub fn internal_error(consignment_number: &str) -> Self {
        Self::empty(consignment_number, STATUS_INTERNAL_ERROR, TrackingStatus::InternalError)
    }

    fn empty(consignment_number: &str, current_status: &str, status: TrackingStatus) -> Self {
        Self {
            consignment_number: consignment_number.to_string(),
            current_status: current_status.to_string(),
            html_content: String::new(),
            artifact_url: String::new(),
            status,
        }
    }

    pub fn consignment_number(&self) -> &str {
        &self.consignment_number
    }

    pub fn current_status(&self) -> &str {
        &self.current_status
    }

    pub fn html_content(&self) -> &str {
        &self.html_content
    }

    pub fn artifact_url(&self) -> &str {
        &self.artifact_url
    }

    pub fn status(&self) -> TrackingStatus {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalid_result_shape() {
        let result = TrackingResult::invalid("AB12345IN");
        assert_eq!(result.status(), TrackingStatus::Invalid);
        assert_eq!(result.status().http_status(), 203);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "Consignment Number": "AB12345IN",
                "Current Status": "Current Status : Invalid consignment number",
                "HTML Content": "",
                "PDF URL": ""
            })
        );
    }

    #[test]
    fn test_success_without_artifact_keeps_status_text() {
        let id = ConsignmentId::parse("EE123456789IN").unwrap();
        let result = TrackingResult::success(&id, "Item Delivered", "<div>ok</div>", None);
        assert_eq!(result.status(), TrackingStatus::Success);
        assert_eq!(result.current_status(), "Item Delivered");
        assert_eq!(result.artifact_url(), "");
        assert_eq!(result.status().http_status(), 200);
    }

    #[test]
    fn test_constructors_carry_their_classification() {
        let id = ConsignmentId::parse("EE123456789IN").unwrap();
        assert_eq!(TrackingResult::initiated(&id).status(), TrackingStatus::Initiated);
        assert_eq!(TrackingResult::not_found(&id).status(), TrackingStatus::NotFound);
        assert_eq!(TrackingResult::captcha_failed(&id).status(), TrackingStatus::CaptchaFailed);
        assert_eq!(
            TrackingResult::internal_error(id.as_str()).status(),
            TrackingStatus::InternalError
        );

        // 分类只用于状态码，不出现在响应体中
        let value = serde_json::to_value(TrackingResult::not_found(&id)).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_http_status_table() {
        assert_eq!(TrackingStatus::Initiated.http_status(), 203);
        assert_eq!(TrackingStatus::NotFound.http_status(), 203);
        assert_eq!(TrackingStatus::CaptchaFailed.http_status(), 203);
        assert_eq!(TrackingStatus::InternalError.http_status(), 500);
    }
}
