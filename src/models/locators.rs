//! 页面选择器表
//!
//! 目标站点的 DOM 结构属于外部约定，随时可能改版。
//! 所有选择器集中在这里，并可通过 TOML 文件整体替换（见 `loaders::load_locator_map`）。

use serde::{Deserialize, Serialize};

use crate::models::captcha::CaptchaKind;

const PREFIX: &str = "#ctl00_PlaceHolderMain_ucNewLegacyControl_";

/// 验证码图片选择器及其对应类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptchaLocator {
    pub selector: String,
    pub kind: CaptchaKind,
}

/// 邮政查询页面的选择器表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorMap {
    /// 选择器表版本，对应目标站点的一次页面结构
    pub version: String,
    /// 邮件号输入框
    pub consignment_input: String,
    /// 验证码图片，按顺序探测，第一个存在的决定验证码类型
    pub captcha_images: Vec<CaptchaLocator>,
    /// 验证码提示文字
    pub captcha_query: String,
    /// 验证码输入框
    pub captcha_input: String,
    /// 查询按钮
    pub search_button: String,
    /// 提交后出现的结果容器
    pub result_container: String,
    /// 当前状态文字
    pub status_label: String,
    /// 完整的查询结果区域（保存其 HTML）
    pub tracking_panel: String,
    /// "查无此件"提示元素
    pub not_found_message: String,
    /// "查无此件"提示文字（不区分大小写，包含即命中）
    #[serde(default)]
    pub not_found_phrases: Vec<String>,
}

impl Default for LocatorMap {
    fn default() -> Self {
        let id = |suffix: &str| format!("{PREFIX}{suffix}");
        Self {
            version: "dop-legacy-2024".to_string(),
            consignment_input: id("txtOrignlPgTranNo"),
            captcha_images: vec![
                CaptchaLocator {
                    selector: id("ucCaptcha1_imgCaptcha"),
                    kind: CaptchaKind::PlainText,
                },
                CaptchaLocator {
                    selector: id("ucCaptcha1_imgMathCaptcha"),
                    kind: CaptchaKind::MathExpression,
                },
            ],
            captcha_query: id("ucCaptcha1_lblCaptcha"),
            captcha_input: id("ucCaptcha1_txtCaptcha"),
            search_button: id("btnSearch"),
            result_container: "div.col-xs-12.col-md-12".to_string(),
            status_label: id("lblMailArticleCurrentStatusOER"),
            tracking_panel: id("upnlTrackConsignment"),
            not_found_message: id("lblMsg"),
            not_found_phrases: vec![
                "not found".to_string(),
                "no record".to_string(),
                "invalid article".to_string(),
            ],
        }
    }
}

impl LocatorMap {
    /// 判断错误提示文字是否表示"查无此件"
    pub fn is_not_found_message(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.not_found_phrases
            .iter()
            .any(|phrase| !phrase.is_empty() && text.contains(&phrase.to_lowercase()))
    }
}
