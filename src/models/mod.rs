pub mod captcha;
pub mod consignment;
pub mod loaders;
pub mod locators;
pub mod tracking;

pub use captcha::{CaptchaAnswer, CaptchaChallenge, CaptchaKind};
pub use consignment::{validate, ConsignmentId, InvalidFormat};
pub use loaders::{load_locator_map, load_locator_map_or_default};
pub use locators::{CaptchaLocator, LocatorMap};
pub use tracking::{TrackingResult, TrackingStatus};
