//! 应用组装 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：校验配置、加载选择器表、获取浏览器
//! 2. **能力组装**：OCR、产物存储、导航状态机、单次查询流程
//! 3. **队列创建**：交互队列和批量队列，各自独立的并发上限
//! 4. **服务运行**：HTTP 服务，Ctrl-C 后停止接收请求并等待两个队列排空
//!
//! 唯一持有 Browser 的模块（通过 `ChromeSessionFactory`）。

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::api::{create_router, AppState};
use crate::browser;
use crate::config::{ArtifactBackend, Config};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{ChromeSessionFactory, SessionFactory};
use crate::models::{load_locator_map_or_default, LocatorMap};
use crate::orchestrator::JobQueue;
use crate::services::{
    ArtifactPublisher, ArtifactStore, CaptchaResolver, LocalArtifactStore, S3ArtifactStore,
    TextRecognizer, VisionOcrClient,
};
use crate::utils::logging::{log_listening, log_shutdown, log_startup};
use crate::workflow::{AttemptRunner, NavigationDriver, TrackingFlow};

pub const INTERACTIVE_QUEUE: &str = "interactive";
pub const BULK_QUEUE: &str = "bulk";

/// 应用主结构
pub struct App {
    config: Config,
    state: AppState,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        config.validate()?;

        let locators = load_locator_map_or_default(config.locator_file.as_deref())
            .await
            .map_err(|e| AppError::Other(format!("加载选择器表失败: {:#}", e)))?;
        log_startup(&config, &locators);

        let browser = browser::acquire_browser(&config).await?;
        let sessions: Arc<dyn SessionFactory> = Arc::new(ChromeSessionFactory::new(
            browser,
            config.timeouts().poll_interval,
        ));

        let recognizer: Arc<dyn TextRecognizer> = Arc::new(VisionOcrClient::new(&config)?);

        let store: Arc<dyn ArtifactStore> = match config.artifact_backend {
            ArtifactBackend::S3 => Arc::new(
                S3ArtifactStore::new(&config.aws_s3_bucket_name, &config.aws_region).await,
            ),
            ArtifactBackend::Local => Arc::new(LocalArtifactStore::new(&config.artifact_dir)),
        };

        let state = build_state(&config, Arc::new(locators), sessions, recognizer, store);

        Ok(Self { config, state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// 运行 HTTP 服务直到收到关闭信号
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("无法监听端口 {}", addr))?;
        log_listening(self.config.port);

        axum::serve(listener, create_router(self.state.clone()))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP 服务异常退出")?;

        tokio::join!(
            self.state.interactive.shutdown(),
            self.state.bulk.shutdown()
        );
        log_shutdown();
        Ok(())
    }
}

/// 用给定的能力组装路由状态
pub fn build_state(
    config: &Config,
    locators: Arc<LocatorMap>,
    sessions: Arc<dyn SessionFactory>,
    recognizer: Arc<dyn TextRecognizer>,
    store: Arc<dyn ArtifactStore>,
) -> AppState {
    let navigator = NavigationDriver::new(
        config.target_url.clone(),
        locators,
        config.timeouts(),
        CaptchaResolver::new(recognizer.clone()),
    );
    let flow: Arc<dyn AttemptRunner> = Arc::new(TrackingFlow::new(
        sessions,
        navigator,
        ArtifactPublisher::new(store),
    ));

    let interactive = Arc::new(JobQueue::new(
        INTERACTIVE_QUEUE,
        config.interactive_concurrency,
        config.queue_backlog_limit,
        flow.clone(),
    ));
    let bulk = Arc::new(JobQueue::new(
        BULK_QUEUE,
        config.bulk_concurrency,
        config.queue_backlog_limit,
        flow,
    ));

    AppState::new(interactive, bulk, recognizer)
}

/// 等待 Ctrl-C 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("无法监听 Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("无法监听 SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("收到关闭信号，停止接收新请求...");
}
