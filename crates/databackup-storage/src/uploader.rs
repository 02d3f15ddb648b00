//! Upload capabilities implemented by each storage backend.

use std::fmt::{self, Display, Formatter};
use std::path::Path;

use async_trait::async_trait;

use crate::error::{StorageResult, UploadError};

/// Storage backend a result refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationKind {
    /// Object storage (S3 bucket).
    ColdStorage,
    /// Archival storage (Glacier vault).
    ArchiveStorage,
}

impl DestinationKind {
    /// Stable identifier used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ColdStorage => "cold_storage",
            Self::ArchiveStorage => "archive_storage",
        }
    }
}

impl Display for DestinationKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Acknowledgement returned by a successful upload.
///
/// The token is opaque and only used for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfirmation {
    /// Entity tag or archive identifier.
    pub token: String,
    /// Object key or archive location the bytes were stored under.
    pub location: String,
}

/// Durable object storage keyed by bucket and object key.
#[async_trait]
pub trait ColdStorageUploader: Send + Sync {
    /// Store `file` in `bucket` under `<key_prefix>/<file name>`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is missing or the service rejects the upload.
    async fn upload(
        &self,
        file: &Path,
        bucket: &str,
        key_prefix: Option<&str>,
    ) -> StorageResult<UploadConfirmation>;
}

/// Low-cost archival storage keyed by vault.
#[async_trait]
pub trait ArchiveStorageUploader: Send + Sync {
    /// Store `file` as a new archive in `vault`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is missing or the service rejects the upload.
    async fn upload(&self, file: &Path, vault: &str) -> StorageResult<UploadConfirmation>;
}

/// Size of `file` after checking it is an existing regular file.
pub(crate) async fn ensure_uploadable(file: &Path) -> StorageResult<u64> {
    match tokio::fs::metadata(file).await {
        Ok(metadata) if metadata.is_file() => Ok(metadata.len()),
        Ok(_) => Err(UploadError::FileNotFound {
            path: file.to_path_buf(),
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(UploadError::FileNotFound {
            path: file.to_path_buf(),
        }),
        Err(err) => Err(UploadError::FileRead {
            path: file.to_path_buf(),
            source: err.into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UploadErrorKind;
    use anyhow::Result;
    use tempfile::TempDir;

    #[tokio::test]
    async fn uploadable_file_reports_size() -> Result<()> {
        let temp = TempDir::new()?;
        let file = temp.path().join("backup.zip");
        std::fs::write(&file, b"12345")?;
        assert_eq!(ensure_uploadable(&file).await?, 5);
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_and_directory_are_not_uploadable() -> Result<()> {
        let temp = TempDir::new()?;
        let missing = ensure_uploadable(&temp.path().join("absent.zip")).await;
        assert!(matches!(missing, Err(ref err) if err.kind() == UploadErrorKind::FileNotFound));
        let directory = ensure_uploadable(temp.path()).await;
        assert!(matches!(directory, Err(UploadError::FileNotFound { .. })));
        Ok(())
    }

    #[test]
    fn destination_kind_labels_are_stable() {
        assert_eq!(DestinationKind::ColdStorage.to_string(), "cold_storage");
        assert_eq!(DestinationKind::ArchiveStorage.as_str(), "archive_storage");
    }
}
