//! OCR 服务 - 业务能力层
//!
//! 只负责"识别图片中的文字"，使用 Google Vision 的 TEXT_DETECTION。
//! 图片由本服务先下载，再以 base64 内容提交（Vision 服务端不一定能访问邮政站点）。

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult, OcrError};

/// 文字识别能力
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// 识别图片中的文字；图片中没有文字时返回 `Ok(None)`
    async fn recognize(&self, image_url: &str) -> Result<Option<String>, OcrError>;
}

/// Google Vision 客户端
pub struct VisionOcrClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl VisionOcrClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::ocr_request_failed(&config.ocr_api_base_url, e))?;

        Ok(Self {
            client,
            base_url: config.ocr_api_base_url.trim_end_matches('/').to_string(),
            api_key: config.ocr_api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/images:annotate", self.base_url)
    }

    /// 下载验证码图片
    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, OcrError> {
        let fetch_failed = |reason: String| OcrError::ImageFetchFailed {
            url: image_url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_failed(format!("HTTP {}", status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// 构造 `images:annotate` 请求体，图片以 base64 内容内联
fn annotate_request(image: &[u8]) -> JsonValue {
    json!({
        "requests": [{
            "image": { "content": STANDARD.encode(image) },
            "features": [{ "type": "TEXT_DETECTION" }]
        }]
    })
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    error: Option<VisionStatus>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct VisionStatus {
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

/// 第一条 textAnnotation 是整张图片的完整文字
fn first_description(response: AnnotateResponse) -> Result<Option<String>, OcrError> {
    let Some(image) = response.responses.into_iter().next() else {
        return Ok(None);
    };
    if let Some(status) = image.error {
        return Err(OcrError::BadResponse {
            code: status.code,
            message: status.message,
        });
    }
    Ok(image
        .text_annotations
        .into_iter()
        .next()
        .map(|a| a.description)
        .filter(|text| !text.trim().is_empty()))
}

#[async_trait]
impl TextRecognizer for VisionOcrClient {
    async fn recognize(&self, image_url: &str) -> Result<Option<String>, OcrError> {
        let image = self.fetch_image(image_url).await?;
        debug!("OCR 请求: {} ({} bytes)", image_url, image.len());

        let endpoint = self.endpoint();
        let body = annotate_request(&image);

        let response = self
            .client
            .post(&endpoint)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| OcrError::RequestFailed {
                endpoint: endpoint.clone(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OcrError::BadResponse {
                code: Some(i64::from(status.as_u16())),
                message,
            });
        }

        let parsed: AnnotateResponse =
            response.json().await.map_err(|e| OcrError::RequestFailed {
                endpoint,
                source: Box::new(e),
            })?;

        first_description(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> AnnotateResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_first_description_is_full_text() {
        let response = parse(
            r#"{"responses":[{"textAnnotations":[
                {"description":"4 7 2\n","locale":"en"},
                {"description":"4"}
            ]}]}"#,
        );
        assert_eq!(first_description(response).unwrap().as_deref(), Some("4 7 2\n"));
    }

    #[test]
    fn test_no_annotations_means_no_text() {
        assert_eq!(first_description(parse(r#"{"responses":[{}]}"#)).unwrap(), None);
        assert_eq!(first_description(parse(r#"{"responses":[]}"#)).unwrap(), None);
        assert_eq!(first_description(parse(r#"{}"#)).unwrap(), None);
    }

    #[test]
    fn test_per_image_error_is_reported() {
        let response = parse(
            r#"{"responses":[{"error":{"code":7,"message":"image fetch denied"}}]}"#,
        );
        assert!(matches!(
            first_description(response),
            Err(OcrError::BadResponse { code: Some(7), ref message }) if message == "image fetch denied"
        ));
    }

    #[test]
    fn test_request_inlines_image_as_base64() {
        let body = annotate_request(b"\x89PNG captcha");
        let request = &body["requests"][0];

        assert_eq!(request["image"]["content"], "iVBORyBjYXB0Y2hh");
        assert!(request["image"].get("source").is_none());
        assert_eq!(request["features"][0]["type"], "TEXT_DETECTION");
    }

    #[tokio::test]
    async fn test_unreachable_image_is_fetch_failure() {
        let client = VisionOcrClient::new(&Config::default()).unwrap();
        let result = client.recognize("http://127.0.0.1:9/captcha.png").await;

        assert!(matches!(
            result,
            Err(OcrError::ImageFetchFailed { ref url, .. }) if url == "http://127.0.0.1:9/captcha.png"
        ));
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = Config {
            ocr_api_base_url: "https://vision.example.com/v1/".to_string(),
            ..Config::default()
        };
        let client = VisionOcrClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "https://vision.example.com/v1/images:annotate");
    }
}
