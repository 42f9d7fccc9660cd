//! API 模块
//!
//! 对外的 HTTP 接口，路由状态中持有两个任务队列

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
