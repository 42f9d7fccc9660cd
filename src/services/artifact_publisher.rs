//! 产物发布服务 - 业务能力层
//!
//! 将当前页面渲染为 A4 PDF，并以 `consignment_<邮件号>.pdf` 存储。

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::error::{BrowserError, StorageError};
use crate::infrastructure::{PageDriver, PdfOptions};
use crate::models::ConsignmentId;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("渲染 PDF 失败: {0}")]
    Render(#[source] BrowserError),
    #[error("存储 PDF 失败: {0}")]
    Store(#[source] StorageError),
}

/// 产物发布服务
///
/// 职责：
/// - 渲染页面为 PDF
/// - 交给 `ArtifactStore` 存储
/// - 同一邮件号重复发布时覆盖旧文件
pub struct ArtifactPublisher {
    store: Arc<dyn super::ArtifactStore>,
    options: PdfOptions,
}

impl ArtifactPublisher {
    pub fn new(store: Arc<dyn super::ArtifactStore>) -> Self {
        Self {
            store,
            options: PdfOptions::a4(),
        }
    }

    /// 发布当前页面，返回产物地址
    pub async fn publish(
        &self,
        page: &dyn PageDriver,
        consignment: &ConsignmentId,
    ) -> Result<String, PublishError> {
        let pdf = page
            .render_pdf(&self.options)
            .await
            .map_err(PublishError::Render)?;
        debug!("{} PDF 渲染完成 ({} bytes)", consignment, pdf.len());

        self.store
            .store(&consignment.artifact_key(), pdf, PDF_CONTENT_TYPE)
            .await
            .map_err(PublishError::Store)
    }
}
