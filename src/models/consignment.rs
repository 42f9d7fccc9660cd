//! 邮件号校验
//!
//! 邮件号固定 13 位：前 2 位字母、中间 9 位数字、末尾 2 位字母，例如 `EE123456789IN`。

use std::fmt;

use thiserror::Error;

/// 邮件号长度
pub const CONSIGNMENT_LEN: usize = 13;

/// 校验失败原因（按规则顺序检查，第一条不满足的规则即为结果）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidFormat {
    #[error("邮件号长度应为 {CONSIGNMENT_LEN}，实际为 {actual}")]
    WrongLength { actual: usize },
    #[error("第 {position} 位应为字母")]
    ExpectedAlphabetic { position: usize },
    #[error("第 {position} 位应为数字")]
    ExpectedNumeric { position: usize },
}

/// 已通过校验的邮件号
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConsignmentId(String);

impl ConsignmentId {
    /// 校验原始字符串并构造邮件号
    pub fn parse(raw: &str) -> Result<Self, InvalidFormat> {
        let chars: Vec<char> = raw.chars().collect();
        if chars.len() != CONSIGNMENT_LEN {
            return Err(InvalidFormat::WrongLength {
                actual: chars.len(),
            });
        }

        check_range(&chars, 0..2, char::is_ascii_alphabetic)
            .map_err(|position| InvalidFormat::ExpectedAlphabetic { position })?;
        check_range(&chars, 2..11, char::is_ascii_digit)
            .map_err(|position| InvalidFormat::ExpectedNumeric { position })?;
        check_range(&chars, 11..13, char::is_ascii_alphabetic)
            .map_err(|position| InvalidFormat::ExpectedAlphabetic { position })?;

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// PDF 快照在存储中的文件名
    pub fn artifact_key(&self) -> String {
        format!("consignment_{}.pdf", self.0)
    }
}

/// 校验邮件号（`ConsignmentId::parse` 的函数形式）
pub fn validate(raw: &str) -> Result<ConsignmentId, InvalidFormat> {
    ConsignmentId::parse(raw)
}

fn check_range(
    chars: &[char],
    range: std::ops::Range<usize>,
    predicate: fn(&char) -> bool,
) -> Result<(), usize> {
    match chars[range.clone()].iter().position(|c| !predicate(c)) {
        Some(offset) => Err(range.start + offset),
        None => Ok(()),
    }
}

impl fmt::Display for ConsignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConsignmentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
