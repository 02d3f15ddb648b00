//! # Design
//!
//! - Centralize errors for bootstrap and the backup pipeline.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use std::io;
use std::path::PathBuf;

use databackup_archive::ArchiveError;
use databackup_storage::{DestinationKind, UploadError, UploadErrorKind};
use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// The archive could not be created.
    #[error("archive creation failed")]
    Archive {
        /// Operation identifier.
        operation: &'static str,
        /// Source archive error.
        source: ArchiveError,
    },
    /// An upload failed while uploads stop at the first failure.
    #[error("upload failed")]
    Upload {
        /// Destination the failed upload targeted.
        destination_kind: DestinationKind,
        /// Source upload error.
        source: UploadError,
    },
    /// IO operations failed.
    #[error("io operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
}

impl AppError {
    pub(crate) const fn archive(operation: &'static str, source: ArchiveError) -> Self {
        Self::Archive { operation, source }
    }

    pub(crate) const fn upload(destination_kind: DestinationKind, source: UploadError) -> Self {
        Self::Upload {
            destination_kind,
            source,
        }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Upload failure category, for upload errors.
    #[must_use]
    pub const fn upload_kind(&self) -> Option<UploadErrorKind> {
        match self {
            Self::Upload { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn app_error_helpers_build_variants() {
        let archive = AppError::archive(
            "run_backup.create_archive",
            ArchiveError::SourceNotFound {
                path: PathBuf::from("/missing"),
            },
        );
        assert!(matches!(archive, AppError::Archive { .. }));
        assert_eq!(archive.to_string(), "archive creation failed");
        assert!(archive.source().is_some());
        assert_eq!(archive.upload_kind(), None);

        let upload = AppError::upload(
            DestinationKind::ArchiveStorage,
            UploadError::FileNotFound {
                path: PathBuf::from("backup.zip"),
            },
        );
        assert_eq!(upload.upload_kind(), Some(UploadErrorKind::FileNotFound));

        let io = AppError::io("bootstrap.create_temp_dir", "/tmp/x", io::Error::other("io"));
        assert!(matches!(io, AppError::Io { operation: "bootstrap.create_temp_dir", .. }));
    }
}
