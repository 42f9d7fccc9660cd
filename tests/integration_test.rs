use std::sync::Arc;

use track_consignment::browser::acquire_browser;
use track_consignment::config::Config;
use track_consignment::infrastructure::{ChromeSessionFactory, PageDriver, SessionFactory};
use track_consignment::models::{load_locator_map_or_default, ConsignmentId};
use track_consignment::services::{
    ArtifactPublisher, CaptchaResolver, LocalArtifactStore, TextRecognizer, VisionOcrClient,
};
use track_consignment::utils::logging;
use track_consignment::workflow::{NavigationDriver, TrackingCtx, TrackingFlow};

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_track_single_consignment() {
    // 初始化日志
    logging::init(true);

    // 加载配置
    let config = Config::from_env();

    // 需要真实的邮件号：TEST_CONSIGNMENT=EE123456789IN
    let raw = std::env::var("TEST_CONSIGNMENT").expect("请设置 TEST_CONSIGNMENT");
    let id = ConsignmentId::parse(&raw).expect("邮件号格式不合法");

    let browser = acquire_browser(&config).await.expect("获取浏览器失败");
    let sessions = Arc::new(ChromeSessionFactory::new(
        browser,
        config.timeouts().poll_interval,
    ));
    let recognizer: Arc<dyn TextRecognizer> =
        Arc::new(VisionOcrClient::new(&config).expect("创建 OCR 客户端失败"));
    let locators = load_locator_map_or_default(config.locator_file.as_deref())
        .await
        .expect("加载选择器表失败");

    let dir = tempfile::tempdir().unwrap();
    let flow = TrackingFlow::new(
        sessions,
        NavigationDriver::new(
            config.target_url.clone(),
            Arc::new(locators),
            config.timeouts(),
            CaptchaResolver::new(recognizer),
        ),
        ArtifactPublisher::new(Arc::new(LocalArtifactStore::new(dir.path()))),
    );

    let ctx = TrackingCtx::new(&id, "live", 1);
    let result = flow
        .run_tracking_attempt(&id, &ctx)
        .await
        .expect("浏览器不可用");

    println!("{}: {}", result.consignment_number(), result.current_status());
}

#[tokio::test]
#[ignore]
async fn test_browser_session() {
    // 初始化日志
    logging::init(false);

    // 加载配置
    let config = Config::from_env();

    // 测试浏览器会话
    let browser = acquire_browser(&config).await.expect("获取浏览器失败");
    let factory = ChromeSessionFactory::new(browser, config.timeouts().poll_interval);
    let page = factory.open_session().await.expect("应该能够创建会话");

    page.open(&config.target_url, config.timeouts().navigation)
        .await
        .expect("应该能够打开查询页面");
    assert!(page.exists("body").await.unwrap());
    page.close().await.expect("应该能够关闭会话");
}

#[tokio::test]
#[ignore]
async fn test_vision_ocr() {
    logging::init(false);

    let config = Config::from_env();
    let url = std::env::var("TEST_CAPTCHA_URL").expect("请设置 TEST_CAPTCHA_URL");

    let client = VisionOcrClient::new(&config).expect("创建 OCR 客户端失败");
    let text = client.recognize(&url).await;

    assert!(text.is_ok(), "OCR 调用应该成功");
    println!("识别结果: {:?}", text.unwrap());
}
