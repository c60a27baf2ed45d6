use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::{attachment_err_fmt, sequence_err_fmt};
use crate::entities::{Attachment, FileType};
use crate::errors::{Error, Result};
use crate::repositories::{AttachmentRepository, SequenceRepository};
use crate::storage::{file_url, BlobStorage};
use crate::usecases::attachment::upload;

pub(crate) const ATTACHMENT_SEQUENCE: &str = "attachmentid";

pub struct AttachmentUploadInteractor {
    pub attachment_repository: Arc<dyn AttachmentRepository + Sync + Send>,
    pub sequence_repository: Arc<dyn SequenceRepository + Sync + Send>,
    pub storage: Arc<dyn BlobStorage + Sync + Send>,
    pub asset_host: String,
}
#[async_trait]
impl upload::Usecase for AttachmentUploadInteractor {
    #[tracing::instrument(skip(self, data), fields(filename = %data.filename, size = data.body.len()))]
    async fn handle(&self, data: upload::Input) -> Result<upload::Output> {
        let upload::Input {
            file_type,
            filename,
            body,
        } = data;

        let file_type = file_type.parse::<FileType>()?;

        // clients may send a full path
        let filename = filename
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        if matches!(filename.as_str(), "" | "." | "..") || filename.contains('\\') {
            return Err(Error::InvalidArgument(format!("bad filename {:?}", filename)));
        }

        let id = self
            .sequence_repository
            .next(ATTACHMENT_SEQUENCE)
            .await
            .map_err(sequence_err_fmt)?;

        let now = Utc::now();
        let attachment = Attachment {
            id,
            filename,
            file_type,
            created: now,
            updated: now,
        };

        self.storage
            .upload(&attachment.file_path(), &attachment.filename, body)
            .await?;

        let inserted = self
            .attachment_repository
            .insert(attachment.clone())
            .await
            .map_err(attachment_err_fmt)?;
        if !inserted {
            return Err(Error::Internal(anyhow::anyhow!(
                "attachment id {} collided",
                attachment.id
            )));
        }

        let url = file_url(&self.asset_host, &attachment);
        tracing::debug!("uploaded {}", url);

        Ok(upload::Output { attachment, url })
    }
}
