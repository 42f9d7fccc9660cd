use std::time::Duration;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP 服务端口
    pub port: u16,
    /// 邮政查询页面
    pub target_url: String,
    /// 已启动浏览器的调试端口（设置后不再自行启动浏览器）
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件路径
    pub chrome_executable: Option<String>,
    /// 是否以无头模式启动
    pub headless: bool,
    /// 交互队列的最大并发数
    pub interactive_concurrency: usize,
    /// 批量队列的最大并发数
    pub bulk_concurrency: usize,
    /// 单个队列允许积压的任务数
    pub queue_backlog_limit: usize,
    pub navigation_timeout_secs: u64,
    pub input_timeout_secs: u64,
    pub result_timeout_secs: u64,
    pub status_timeout_secs: u64,
    pub poll_interval_ms: u64,
    /// 页面选择器配置文件（TOML）
    pub locator_file: Option<String>,
    // --- OCR 配置 ---
    pub ocr_api_key: String,
    pub ocr_api_base_url: String,
    // --- 存储配置 ---
    pub artifact_backend: ArtifactBackend,
    pub aws_s3_bucket_name: String,
    pub aws_region: String,
    pub artifact_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

/// PDF 快照的存储后端
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactBackend {
    S3,
    Local,
}

impl ArtifactBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s3" => Some(ArtifactBackend::S3),
            "local" | "fs" => Some(ArtifactBackend::Local),
            _ => None,
        }
    }
}

/// 导航过程中各等待步骤的超时设置
#[derive(Clone, Copy, Debug)]
pub struct Timeouts {
    pub navigation: Duration,
    pub input: Duration,
    pub result_container: Duration,
    pub status: Duration,
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Config::default().timeouts()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            target_url: "https://www.indiapost.gov.in/_layouts/15/dop.portal.tracking/trackconsignment.aspx".to_string(),
            browser_debug_port: None,
            chrome_executable: None,
            headless: true,
            interactive_concurrency: 20,
            bulk_concurrency: 5,
            queue_backlog_limit: 1000,
            navigation_timeout_secs: 60,
            input_timeout_secs: 20,
            result_timeout_secs: 30,
            status_timeout_secs: 100,
            poll_interval_ms: 250,
            locator_file: None,
            ocr_api_key: String::new(),
            ocr_api_base_url: "https://vision.googleapis.com/v1".to_string(),
            artifact_backend: ArtifactBackend::S3,
            aws_s3_bucket_name: String::new(),
            aws_region: "ap-south-1".to_string(),
            artifact_dir: "artifacts".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            port: std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.port),
            target_url: std::env::var("TARGET_URL").unwrap_or(default.target_url),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().filter(|v| !v.is_empty()),
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headless),
            interactive_concurrency: std::env::var("INTERACTIVE_CONCURRENCY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.interactive_concurrency),
            bulk_concurrency: std::env::var("BULK_CONCURRENCY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.bulk_concurrency),
            queue_backlog_limit: std::env::var("QUEUE_BACKLOG_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.queue_backlog_limit),
            navigation_timeout_secs: std::env::var("NAVIGATION_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.navigation_timeout_secs),
            input_timeout_secs: std::env::var("INPUT_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.input_timeout_secs),
            result_timeout_secs: std::env::var("RESULT_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.result_timeout_secs),
            status_timeout_secs: std::env::var("STATUS_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.status_timeout_secs),
            poll_interval_ms: std::env::var("POLL_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.poll_interval_ms),
            locator_file: std::env::var("LOCATOR_FILE").ok().filter(|v| !v.is_empty()),
            ocr_api_key: std::env::var("GOOGLE_VISION_API_KEY").unwrap_or(default.ocr_api_key),
            ocr_api_base_url: std::env::var("GOOGLE_VISION_API_BASE_URL").unwrap_or(default.ocr_api_base_url),
            artifact_backend: std::env::var("ARTIFACT_BACKEND").ok().and_then(|v| ArtifactBackend::parse(&v)).unwrap_or(default.artifact_backend),
            aws_s3_bucket_name: std::env::var("AWS_S3_BUCKET_NAME").unwrap_or(default.aws_s3_bucket_name),
            aws_region: std::env::var("AWS_REGION").unwrap_or(default.aws_region),
            artifact_dir: std::env::var("ARTIFACT_DIR").unwrap_or(default.artifact_dir),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 检查配置是否可用于启动服务
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interactive_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                name: "INTERACTIVE_CONCURRENCY".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        if self.bulk_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                name: "BULK_CONCURRENCY".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        if self.queue_backlog_limit == 0 {
            return Err(ConfigError::InvalidValue {
                name: "QUEUE_BACKLOG_LIMIT".to_string(),
                reason: "必须大于 0".to_string(),
            });
        }
        if self.artifact_backend == ArtifactBackend::S3 && self.aws_s3_bucket_name.trim().is_empty() {
            return Err(ConfigError::Missing {
                name: "AWS_S3_BUCKET_NAME".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            navigation: Duration::from_secs(self.navigation_timeout_secs),
            input: Duration::from_secs(self.input_timeout_secs),
            result_container: Duration::from_secs(self.result_timeout_secs),
            status: Duration::from_secs(self.status_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}
