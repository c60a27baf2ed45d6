use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use crate::entities::Attachment;
use crate::errors::{Error, Result};

/// Directory every upload lands under, also the URL path prefix.
pub const PREFIX: &str = "upload/";

#[async_trait]
pub trait BlobStorage {
    /// Stores `body` as `file_path + filename`, relative to [`PREFIX`].
    async fn upload(&self, file_path: &str, filename: &str, body: Bytes) -> Result<()>;
}

/// Public URL of an uploaded attachment.
pub fn file_url(asset_host: &str, attachment: &Attachment) -> String {
    format!(
        "{}{}{}{}",
        asset_host,
        PREFIX,
        attachment.file_path(),
        attachment.filename
    )
}

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }
}

#[async_trait]
impl BlobStorage for FileStore {
    #[tracing::instrument(skip(self, body))]
    async fn upload(&self, file_path: &str, filename: &str, body: Bytes) -> Result<()> {
        let dir = self.root.join(PREFIX).join(file_path);

        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("cannot create {}", dir.display()))?;
        tokio::fs::write(dir.join(filename), &body)
            .await
            .with_context(|| format!("cannot write {} into {}", filename, dir.display()))?;

        tracing::debug!("stored {} bytes", body.len());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore(Mutex<HashMap<String, Bytes>>);

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub async fn get(&self, key: &str) -> Option<Bytes> { self.0.lock().await.get(key).cloned() }
}

#[async_trait]
impl BlobStorage for MemoryStore {
    async fn upload(&self, file_path: &str, filename: &str, body: Bytes) -> Result<()> {
        let key = format!("{}{}{}", PREFIX, file_path, filename);
        self.0.lock().await.insert(key, body);

        Ok(())
    }
}

pub struct S3Storage;

#[async_trait]
impl BlobStorage for S3Storage {
    async fn upload(&self, _: &str, _: &str, _: Bytes) -> Result<()> {
        Err(Error::Unimplemented("s3 storage"))
    }
}

pub struct OssStorage;

#[async_trait]
impl BlobStorage for OssStorage {
    async fn upload(&self, _: &str, _: &str, _: Bytes) -> Result<()> {
        Err(Error::Unimplemented("oss storage"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::entities::FileType;

    fn attachment() -> Attachment {
        let created = Utc.with_ymd_and_hms(2021, 11, 9, 0, 0, 0).unwrap();
        Attachment {
            id: 3,
            filename: "a.jpg".to_string(),
            file_type: FileType::Image,
            created,
            updated: created,
        }
    }

    #[test]
    fn url_is_derived_from_id_and_date() {
        assert_eq!(
            file_url("https://cdn.test/", &attachment()),
            "https://cdn.test/upload/attachment/2021/11/09/3/a.jpg"
        );
    }

    #[tokio::test]
    async fn memory_store_keeps_bytes() {
        let store = MemoryStore::new();
        let a = attachment();

        store
            .upload(&a.file_path(), &a.filename, Bytes::from_static(b"\x89PNG"))
            .await
            .unwrap();

        assert_eq!(
            store.get("upload/attachment/2021/11/09/3/a.jpg").await,
            Some(Bytes::from_static(b"\x89PNG"))
        );
    }

    #[tokio::test]
    async fn cloud_backends_are_unimplemented() {
        let err = S3Storage.upload("x/", "y", Bytes::new()).await.unwrap_err();
        assert!(matches!(err, Error::Unimplemented(_)));
    }
}
