pub mod navigation;
pub mod tracking_ctx;
pub mod tracking_flow;

pub use navigation::{Extraction, NavState, NavigationDriver, NavigationFailure};
pub use tracking_ctx::TrackingCtx;
pub use tracking_flow::{AttemptRunner, TrackingFlow};
