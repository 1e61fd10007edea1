//! Port to the remote document store and its adapters.
//!
//! The store is flat and path-addressed: objects live at `a/b/file.pdf` and
//! folders are whatever prefixes the backend reports for a location.

pub mod download;
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
pub mod http_store;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::file_entry::Listing;
use crate::store_path::StorePath;

/// Per-file upload ceiling enforced before a file is queued.
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Reads a local file for upload, rejecting it up front when it is over
    /// `MAX_UPLOAD_BYTES`.
    pub async fn from_path(path: &Path) -> Result<Self, AppError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| AppError::Validation(format!("invalid file path: {}", path.display())))?;

        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(AppError::Validation(format!("not a file: {}", path.display())));
        }
        check_upload_size(&name, metadata.len())?;

        let bytes = tokio::fs::read(path).await?;
        Ok(Self { name, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

pub fn check_upload_size(name: &str, size: u64) -> Result<(), AppError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(AppError::SizeLimitExceeded {
            name: name.to_string(),
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub path: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
}

#[async_trait]
pub trait RemoteFileStore: Send + Sync {
    async fn list(&self, path: &StorePath) -> Result<Listing, AppError>;

    async fn upload(&self, file: &UploadFile, path: &StorePath) -> Result<UploadReceipt, AppError>;

    /// Short-lived URL for fetching the object at `file_path`.
    async fn download_url(&self, file_path: &str) -> Result<String, AppError>;

    async fn delete_file(&self, file_path: &str) -> Result<(), AppError>;

    async fn create_folder(
        &self,
        name: &str,
        parent: &StorePath,
    ) -> Result<FolderDescriptor, AppError>;

    async fn rename_folder(
        &self,
        old_name: &str,
        new_name: &str,
        parent: &StorePath,
    ) -> Result<(), AppError>;

    async fn delete_folder(&self, folder_path: &str) -> Result<(), AppError>;
}
