//! 产物存储 - 业务能力层
//!
//! 只负责"把字节存起来并返回可访问的地址"。
//! - `S3ArtifactStore`：上传到 S3，返回对象 URL
//! - `LocalArtifactStore`：写入本地目录，返回文件路径（开发调试用）

use std::path::PathBuf;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;
use tracing::{debug, info};

use crate::error::StorageError;

/// 产物存储能力
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// 存储一个对象，返回其公开地址
    async fn store(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// S3 存储
pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    region: String,
}

impl S3ArtifactStore {
    /// 使用默认凭证链（环境变量 / 配置文件 / 实例角色）
    pub async fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        let region = region.into();
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;
        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket: bucket.into(),
            region,
        }
    }

    pub fn object_url(&self, key: &str) -> String {
        object_url(&self.bucket, &self.region, key)
    }
}

fn object_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key)
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn store(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed {
                key: key.to_string(),
                source: Box::new(e),
            })?;

        let url = self.object_url(key);
        info!("☁️ 已上传 {} ({} bytes): {}", key, size, url);
        Ok(url)
    }
}

/// 本地目录存储
pub struct LocalArtifactStore {
    dir: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn store(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let path = self.dir.join(key);
        let write_failed = |source| StorageError::WriteFailed {
            path: path.display().to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(write_failed)?;
        tokio::fs::write(&path, &bytes).await.map_err(write_failed)?;

        debug!("已写入 {} ({} bytes)", path.display(), bytes.len());
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_format() {
        assert_eq!(
            object_url("track-bucket", "ap-south-1", "consignment_EK123456789IN.pdf"),
            "https://track-bucket.s3.ap-south-1.amazonaws.com/consignment_EK123456789IN.pdf"
        );
    }

    #[tokio::test]
    async fn test_local_store_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().join("pdfs"));

        let location = store
            .store("consignment_EK123456789IN.pdf", b"%PDF-1.4".to_vec(), "application/pdf")
            .await
            .unwrap();

        let written = std::fs::read(&location).unwrap();
        assert_eq!(written, b"%PDF-1.4");
        assert!(location.ends_with("consignment_EK123456789IN.pdf"));
    }

    #[tokio::test]
    async fn test_local_store_overwrites_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());

        store.store("a.pdf", b"first".to_vec(), "application/pdf").await.unwrap();
        let location = store.store("a.pdf", b"second".to_vec(), "application/pdf").await.unwrap();

        assert_eq!(std::fs::read(location).unwrap(), b"second");
    }
}
