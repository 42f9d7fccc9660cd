//! 测试公共工具
//!
//! 提供脚本化的假页面、会话工厂、OCR 和内存存储，
//! 在不启动浏览器、不访问网络的情况下测试完整流程。

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use track_consignment::api::{create_router, AppState};
use track_consignment::config::{ArtifactBackend, Config};
use track_consignment::error::{BrowserError, OcrError, StorageError};
use track_consignment::infrastructure::{PageDriver, PdfOptions, SessionFactory};
use track_consignment::models::LocatorMap;
use track_consignment::orchestrator::build_state;
use track_consignment::services::{
    ArtifactPublisher, ArtifactStore, CaptchaResolver, TextRecognizer,
};
use track_consignment::workflow::{NavigationDriver, TrackingFlow};

pub const PORTAL_URL: &str = "https://portal.test/track";
pub const CAPTCHA_SRC: &str = "https://portal.test/captcha.png";
pub const DELIVERED_HTML: &str = "<div id=\"panel\">\n\t<span>Item Delivered</span>\r\n</div>";

// ========== 假页面 ==========

/// 页面脚本：哪些元素存在、读到什么内容、哪里出错
#[derive(Debug, Clone, Default)]
pub struct PageScript {
    pub present: HashSet<String>,
    pub texts: HashMap<String, String>,
    pub properties: HashMap<String, String>,
    pub html: HashMap<String, String>,
    pub portal_down: bool,
    pub pdf_fails: bool,
    pub panic_on_click: bool,
}

impl PageScript {
    /// 查询成功、状态为 "Item Delivered" 的页面
    pub fn delivered(locators: &LocatorMap) -> Self {
        let mut script = PageScript::default();
        script.present.insert(locators.consignment_input.clone());
        script.present.insert(locators.captcha_input.clone());
        script.present.insert(locators.search_button.clone());
        script.present.insert(locators.result_container.clone());

        let image = locators.captcha_images[0].selector.clone();
        script.present.insert(image.clone());
        script.properties.insert(image, CAPTCHA_SRC.to_string());

        script = script
            .with_text(&locators.captcha_query, " Enter the Third number ")
            .with_text(&locators.status_label, "  Item Delivered \n");
        script
            .html
            .insert(locators.tracking_panel.clone(), DELIVERED_HTML.to_string());
        script.present.insert(locators.tracking_panel.clone());
        script
    }

    pub fn with_text(mut self, selector: &str, text: &str) -> Self {
        self.present.insert(selector.to_string());
        self.texts.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn without(mut self, selector: &str) -> Self {
        self.present.remove(selector);
        self
    }

    pub fn portal_down(mut self) -> Self {
        self.portal_down = true;
        self
    }

    pub fn pdf_fails(mut self) -> Self {
        self.pdf_fails = true;
        self
    }

    pub fn panic_on_click(mut self) -> Self {
        self.panic_on_click = true;
        self
    }
}

/// 所有假页面共享的操作记录
#[derive(Debug, Default)]
pub struct PageRecorder {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub pdf_rendered: AtomicUsize,
    pub typed: Mutex<Vec<(String, String)>>,
    pub clicked: Mutex<Vec<String>>,
}

impl PageRecorder {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn typed_into(&self, selector: &str) -> Option<String> {
        self.typed
            .lock()
            .unwrap()
            .iter()
            .find(|(s, _)| s == selector)
            .map(|(_, text)| text.clone())
    }

    pub fn clicked(&self, selector: &str) -> bool {
        self.clicked.lock().unwrap().iter().any(|s| s == selector)
    }
}

pub struct MockPage {
    script: PageScript,
    recorder: Arc<PageRecorder>,
}

impl MockPage {
    fn require(&self, selector: &str) -> Result<(), BrowserError> {
        if self.script.present.contains(selector) {
            Ok(())
        } else {
            Err(BrowserError::not_found(selector))
        }
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn open(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        if self.script.portal_down {
            Err(BrowserError::timeout(url, timeout))
        } else {
            Ok(())
        }
    }

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(self.script.present.contains(selector))
    }

    async fn locate(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        if self.script.present.contains(selector) {
            Ok(())
        } else {
            Err(BrowserError::timeout(selector, timeout))
        }
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        self.require(selector)?;
        self.recorder
            .typed
            .lock()
            .unwrap()
            .push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        if self.script.panic_on_click {
            panic!("scripted panic while clicking {}", selector);
        }
        self.require(selector)?;
        self.recorder
            .clicked
            .lock()
            .unwrap()
            .push(selector.to_string());
        Ok(())
    }

    async fn read_text(&self, selector: &str) -> Result<String, BrowserError> {
        self.require(selector)?;
        Ok(self.script.texts.get(selector).cloned().unwrap_or_default())
    }

    async fn read_property(&self, selector: &str, _name: &str) -> Result<String, BrowserError> {
        self.require(selector)?;
        self.script
            .properties
            .get(selector)
            .cloned()
            .ok_or_else(|| BrowserError::not_found(selector))
    }

    async fn outer_html(&self, selector: &str) -> Result<String, BrowserError> {
        self.require(selector)?;
        self.script
            .html
            .get(selector)
            .cloned()
            .ok_or_else(|| BrowserError::not_found(selector))
    }

    async fn render_pdf(&self, _options: &PdfOptions) -> Result<Vec<u8>, BrowserError> {
        if self.script.pdf_fails {
            return Err(BrowserError::transport(
                "print to pdf",
                std::io::Error::new(std::io::ErrorKind::Other, "renderer crashed"),
            ));
        }
        self.recorder.pdf_rendered.fetch_add(1, Ordering::SeqCst);
        Ok(b"%PDF-1.4 mock".to_vec())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.recorder.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 每次打开会话都按同一脚本创建假页面
pub struct MockSessionFactory {
    script: PageScript,
    pub recorder: Arc<PageRecorder>,
    unavailable: bool,
}

impl MockSessionFactory {
    pub fn new(script: PageScript) -> Self {
        Self {
            script,
            recorder: Arc::new(PageRecorder::default()),
            unavailable: false,
        }
    }

    /// 浏览器不可用：创建会话总是失败
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new(PageScript::default())
        }
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    async fn open_session(&self) -> Result<Box<dyn PageDriver>, BrowserError> {
        if self.unavailable {
            return Err(BrowserError::LaunchFailed("browser runtime unavailable".into()));
        }
        self.recorder.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPage {
            script: self.script.clone(),
            recorder: self.recorder.clone(),
        }))
    }
}

// ========== 假 OCR ==========

pub struct MockRecognizer {
    text: Option<String>,
    fails: bool,
    pub calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            fails: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn blank() -> Self {
        Self {
            text: None,
            fails: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            text: None,
            fails: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TextRecognizer for MockRecognizer {
    async fn recognize(&self, _image_url: &str) -> Result<Option<String>, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fails {
            return Err(OcrError::BadResponse {
                code: Some(500),
                message: "vision backend error".to_string(),
            });
        }
        Ok(self.text.clone())
    }
}

// ========== 内存存储 ==========

#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    fails: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fails: true,
            ..Self::default()
        }
    }

    pub fn content_type_of(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, content_type)| content_type.clone())
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn store(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if self.fails {
            return Err(StorageError::UploadFailed {
                key: key.to_string(),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "access denied",
                )),
            });
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(format!("memory://{}", key))
    }
}

// ========== 组装 ==========

pub fn test_config() -> Config {
    Config {
        target_url: PORTAL_URL.to_string(),
        interactive_concurrency: 4,
        bulk_concurrency: 2,
        queue_backlog_limit: 16,
        navigation_timeout_secs: 1,
        input_timeout_secs: 1,
        result_timeout_secs: 1,
        status_timeout_secs: 1,
        poll_interval_ms: 10,
        artifact_backend: ArtifactBackend::Local,
        ..Config::default()
    }
}

pub fn tracking_flow(
    sessions: Arc<MockSessionFactory>,
    recognizer: Arc<MockRecognizer>,
    store: Arc<MemoryStore>,
) -> TrackingFlow {
    let config = test_config();
    let navigator = NavigationDriver::new(
        config.target_url.clone(),
        Arc::new(LocatorMap::default()),
        config.timeouts(),
        CaptchaResolver::new(recognizer),
    );
    TrackingFlow::new(sessions, navigator, ArtifactPublisher::new(store))
}

// ========== HTTP ==========

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub struct TestFixture {
    pub router: Router,
    pub state: AppState,
    pub sessions: Arc<MockSessionFactory>,
    pub recognizer: Arc<MockRecognizer>,
    pub store: Arc<MemoryStore>,
}

impl TestFixture {
    pub fn new(script: PageScript, recognizer: MockRecognizer) -> Self {
        let sessions = Arc::new(MockSessionFactory::new(script));
        Self::with_parts(sessions, Arc::new(recognizer), Arc::new(MemoryStore::default()))
    }

    pub fn with_parts(
        sessions: Arc<MockSessionFactory>,
        recognizer: Arc<MockRecognizer>,
        store: Arc<MemoryStore>,
    ) -> Self {
        let state = build_state(
            &test_config(),
            Arc::new(LocatorMap::default()),
            sessions.clone(),
            recognizer.clone(),
            store.clone(),
        );
        Self {
            router: create_router(state.clone()),
            state,
            sessions,
            recognizer,
            store,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let response = self
            .router
            .clone()
            .oneshot(request_builder.body(body).unwrap())
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
