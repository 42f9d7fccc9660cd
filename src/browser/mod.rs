pub mod connection;
pub mod headless;

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;

use chromiumoxide::Browser;

use crate::config::Config;
use crate::error::BrowserError;

/// 按配置获取浏览器：设置了调试端口则连接已有浏览器，否则自行启动
pub async fn acquire_browser(config: &Config) -> Result<Browser, BrowserError> {
    match config.browser_debug_port {
        Some(port) => connect_to_browser(port).await,
        None => launch_headless_browser(config).await,
    }
}
