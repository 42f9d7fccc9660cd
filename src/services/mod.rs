pub mod artifact_publisher;
pub mod artifact_store;
pub mod captcha_solver;
pub mod expression;
pub mod ocr_service;

pub use artifact_publisher::{ArtifactPublisher, PublishError};
pub use artifact_store::{ArtifactStore, LocalArtifactStore, S3ArtifactStore};
pub use captcha_solver::{CaptchaResolver, QueryKind, Unresolved};
pub use ocr_service::{TextRecognizer, VisionOcrClient};
