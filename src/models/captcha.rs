use serde::{Deserialize, Serialize};

/// 验证码图片类型（由页面上出现的图片元素决定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptchaKind {
    /// 普通文字/数字图片
    PlainText,
    /// 算式图片
    MathExpression,
}

/// 一次查询中遇到的验证码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaChallenge {
    /// 图片地址
    pub image_ref: String,
    /// 页面上的提示文字，例如 "Enter the Third number"
    pub query_text: String,
    pub kind: CaptchaKind,
}

impl CaptchaChallenge {
    pub fn new(image_ref: impl Into<String>, query_text: impl Into<String>, kind: CaptchaKind) -> Self {
        Self {
            image_ref: image_ref.into(),
            query_text: query_text.into(),
            kind,
        }
    }
}

/// 需要填入验证码输入框的答案
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaAnswer(String);

impl CaptchaAnswer {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CaptchaAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
