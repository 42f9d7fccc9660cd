//! 算式验证码求值
//!
//! 只支持整数与 `+ - * /`（含一元正负号），乘除优先于加减，同级从左到右结合。
//! 不执行任何动态代码。

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("算式为空")]
    Empty,
    #[error("算式在位置 {0} 处意外结束")]
    UnexpectedEnd(usize),
    #[error("位置 {position} 处出现意外字符 '{found}'")]
    UnexpectedToken { position: usize, found: char },
    #[error("数字过大: {0}")]
    NumberTooLarge(String),
    #[error("除数为零")]
    DivisionByZero,
}

/// 去掉数字和 `+ - * /` 以外的所有字符
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '*' | '/'))
        .collect()
}

/// 计算算式的值
pub fn evaluate(expression: &str) -> Result<f64, ExpressionError> {
    if expression.trim().is_empty() {
        return Err(ExpressionError::Empty);
    }
    let mut parser = Parser {
        chars: expression.chars().filter(|c| !c.is_whitespace()).collect(),
        pos: 0,
    };
    let value = parser.expr()?;
    match parser.peek() {
        Some(found) => Err(ExpressionError::UnexpectedToken {
            position: parser.pos,
            found,
        }),
        None => Ok(value),
    }
}

/// 将结果格式化为页面输入：整数不带小数点
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, ExpressionError> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.bump();
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<f64, ExpressionError> {
        let mut value = self.factor()?;
        while let Some(op @ ('*' | '/')) = self.peek() {
            self.bump();
            let rhs = self.factor()?;
            if op == '*' {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(ExpressionError::DivisionByZero);
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    // factor := ('+' | '-') factor | number
    fn factor(&mut self) -> Result<f64, ExpressionError> {
        match self.peek() {
            Some('-') => {
                self.bump();
                Ok(-self.factor()?)
            }
            Some('+') => {
                self.bump();
                self.factor()
            }
            Some(c) if c.is_ascii_digit() => self.number(),
            Some(found) => Err(ExpressionError::UnexpectedToken {
                position: self.pos,
                found,
            }),
            None => Err(ExpressionError::UnexpectedEnd(self.pos)),
        }
    }

    fn number(&mut self) -> Result<f64, ExpressionError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse::<i64>()
            .map(|n| n as f64)
            .map_err(|_| ExpressionError::NumberTooLarge(digits))
    }
}
