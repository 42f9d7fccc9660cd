use std::time::Duration;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// OCR 服务错误
    #[error("OCR错误: {0}")]
    Ocr(#[from] OcrError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 浏览器相关错误
///
/// 调用方需要区分"超时"、"元素不存在"和"通信失败"三类情况，
/// 导航状态机依赖这一区分来决定最终的结果分类。
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: BoxError,
    },
    /// 等待超时
    #[error("等待 {what} 超时 ({timeout:?})")]
    Timeout { what: String, timeout: Duration },
    /// 元素不存在
    #[error("页面上不存在元素: {selector}")]
    NotFound { selector: String },
    /// CDP 通信失败
    #[error("浏览器操作失败 ({action}): {source}")]
    Transport {
        action: String,
        #[source]
        source: BoxError,
    },
}

impl BrowserError {
    pub fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        BrowserError::Timeout {
            what: what.into(),
            timeout,
        }
    }

    pub fn not_found(selector: impl Into<String>) -> Self {
        BrowserError::NotFound {
            selector: selector.into(),
        }
    }

    pub fn transport(
        action: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        BrowserError::Transport {
            action: action.into(),
            source: Box::new(source),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BrowserError::Timeout { .. })
    }
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::transport("cdp", err)
    }
}

/// OCR 服务错误
#[derive(Debug, Error)]
pub enum OcrError {
    /// 网络请求失败
    #[error("OCR 请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: BoxError,
    },
    /// 下载验证码图片失败
    #[error("下载验证码图片失败 ({url}): {reason}")]
    ImageFetchFailed { url: String, reason: String },
    /// 服务返回错误响应
    #[error("OCR 服务返回错误 (code={code:?}): {message}")]
    BadResponse { code: Option<i64>, message: String },
}

/// 对象存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 上传失败
    #[error("上传 {key} 失败: {source}")]
    UploadFailed {
        key: String,
        #[source]
        source: BoxError,
    },
    /// 写入本地文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 任务队列错误
#[derive(Debug, Error)]
pub enum QueueError {
    /// 积压任务已达上限
    #[error("队列 {queue} 积压已满 (上限 {limit})")]
    Backlogged { queue: String, limit: usize },
    /// 队列已关闭
    #[error("队列 {queue} 已关闭")]
    Closed { queue: String },
    /// 执行任务的 worker 在返回结果前退出
    #[error("队列 {queue} 的任务未返回结果")]
    WorkerLost { queue: String },
    /// 基础设施故障（例如浏览器无法创建会话）
    #[error("基础设施故障: {0}")]
    Infrastructure(#[from] BrowserError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置值不合法
    #[error("配置项 {name} 不合法: {reason}")]
    InvalidValue { name: String, reason: String },
    /// 缺少必要配置
    #[error("缺少配置项 {name}")]
    Missing { name: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建OCR请求失败错误
    pub fn ocr_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Ocr(OcrError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
