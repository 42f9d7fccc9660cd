//! 验证码求解服务 - 业务能力层
//!
//! 只负责"把验证码图片变成答案"，不关心页面操作。
//!
//! 页面上的提示文字决定求解方式：
//! - 包含 `number`：按序数取第 N 个数字，例如 "Enter the Third number"
//! - 包含 `Expression`：计算图片中的算式，例如 "Solve the Expression"
//! - 其他：直接使用识别出的文字

use std::sync::{Arc, LazyLock};

use phf::phf_map;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::OcrError;
use crate::models::captcha::{CaptchaAnswer, CaptchaChallenge};
use crate::services::expression::{self, ExpressionError};
use crate::services::ocr_service::TextRecognizer;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]+").expect("digit-run pattern is valid"));

/// 序数词 → 下标
static ORDINALS: phf::Map<&'static str, usize> = phf_map! {
    "First" => 0,
    "Second" => 1,
    "Third" => 2,
    "Fourth" => 3,
    "Fifth" => 4,
    "Sixth" => 5,
};

/// 无法得出答案的原因
#[derive(Debug, Error)]
pub enum Unresolved {
    #[error("验证码图片中未识别到文字")]
    NoTextDetected,
    #[error("OCR 调用失败: {0}")]
    OcrFailed(#[source] OcrError),
    #[error("无法识别的序数词: {0:?}")]
    UnknownOrdinal(Option<String>),
    #[error("需要第 {} 个数字，但只识别到 {found} 个", .index + 1)]
    MissingDigit { index: usize, found: usize },
    #[error("算式无法计算: {0}")]
    InvalidExpression(#[from] ExpressionError),
    #[error("答案为空")]
    EmptyAnswer,
}

/// 提示文字的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// 按位置取数字
    Positional,
    /// 算式
    Arithmetic,
    /// 原样输入
    Verbatim,
}

impl QueryKind {
    pub fn classify(query_text: &str) -> Self {
        if query_text.contains("number") {
            QueryKind::Positional
        } else if query_text.contains("Expression") {
            QueryKind::Arithmetic
        } else {
            QueryKind::Verbatim
        }
    }
}

/// 验证码求解服务
///
/// 职责：
/// - 调用 OCR 获取图片文字
/// - 按提示文字计算答案
/// - 不操作页面
pub struct CaptchaResolver {
    recognizer: Arc<dyn TextRecognizer>,
}

impl CaptchaResolver {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }

    /// 求解验证码
    pub async fn resolve(&self, challenge: &CaptchaChallenge) -> Result<CaptchaAnswer, Unresolved> {
        debug!("验证码图片: {} ({:?})", challenge.image_ref, challenge.kind);

        let text = self
            .recognizer
            .recognize(&challenge.image_ref)
            .await
            .map_err(|e| {
                warn!("OCR 调用失败: {}", e);
                Unresolved::OcrFailed(e)
            })?
            .filter(|text| !text.trim().is_empty())
            .ok_or(Unresolved::NoTextDetected)?;

        debug!("OCR 识别结果: {:?}, 提示: {:?}", text, challenge.query_text);
        answer_for_query(&text, &challenge.query_text)
    }
}

/// 根据提示文字从识别结果中得出答案
pub fn answer_for_query(text: &str, query_text: &str) -> Result<CaptchaAnswer, Unresolved> {
    let answer = match QueryKind::classify(query_text) {
        QueryKind::Positional => {
            let candidates = digit_candidates(text);
            let index = ordinal_index(query_text)?;
            candidates
                .get(index)
                .cloned()
                .ok_or(Unresolved::MissingDigit {
                    index,
                    found: candidates.len(),
                })?
        }
        QueryKind::Arithmetic => {
            let sanitized = expression::sanitize(text);
            expression::format_value(expression::evaluate(&sanitized)?)
        }
        QueryKind::Verbatim => text.trim().to_string(),
    };

    if answer.is_empty() {
        return Err(Unresolved::EmptyAnswer);
    }
    Ok(CaptchaAnswer::new(answer))
}

/// 提取所有连续数字串；若只有一个且长度大于 1，拆成单个数字
///
/// OCR 经常把 "4 7 2" 识别成 "472"。
pub fn digit_candidates(text: &str) -> Vec<String> {
    let runs: Vec<String> = DIGIT_RUN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();

    match runs.as_slice() {
        [single] if single.len() > 1 => single.chars().map(String::from).collect(),
        _ => runs,
    }
}

/// 提示文字中第 3 个词（下标 2）为序数词
pub fn ordinal_index(query_text: &str) -> Result<usize, Unresolved> {
    let word = query_text.split_whitespace().nth(2);
    word.and_then(|w| ORDINALS.get(w).copied())
        .ok_or_else(|| Unresolved::UnknownOrdinal(word.map(str::to_string)))
}
