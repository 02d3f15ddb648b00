use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use databackup_archive::ArchiveArtifact;
use databackup_storage::{DestinationKind, StorageResult, UploadConfirmation, UploadError};

/// Which backends a backup should be uploaded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupTargets {
    /// Upload to cold storage (S3).
    pub cold_storage: bool,
    /// Upload to archive storage (Glacier).
    pub archive_storage: bool,
}

impl BackupTargets {
    /// Both backends.
    #[must_use]
    pub const fn both() -> Self {
        Self {
            cold_storage: true,
            archive_storage: true,
        }
    }

    /// Cold storage only.
    #[must_use]
    pub const fn cold_only() -> Self {
        Self {
            cold_storage: true,
            archive_storage: false,
        }
    }

    /// Archive storage only.
    #[must_use]
    pub const fn archive_only() -> Self {
        Self {
            cold_storage: false,
            archive_storage: true,
        }
    }

    /// No backend; the archive is built and cleaned up without uploading.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            cold_storage: false,
            archive_storage: false,
        }
    }
}

impl Default for BackupTargets {
    fn default() -> Self {
        Self::both()
    }
}

/// One backup invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRequest {
    /// Directory to archive.
    pub source_directory: PathBuf,
    /// Bucket or vault name; the same identifier is used for both backends.
    pub destination: String,
    /// Requested backends.
    pub targets: BackupTargets,
}

impl BackupRequest {
    /// Build a request.
    #[must_use]
    pub fn new(
        source_directory: impl Into<PathBuf>,
        destination: impl Into<String>,
        targets: BackupTargets,
    ) -> Self {
        Self {
            source_directory: source_directory.into(),
            destination: destination.into(),
            targets,
        }
    }
}

/// Result of one attempted upload.
#[derive(Debug)]
pub struct UploadResult {
    /// Backend the upload targeted.
    pub destination_kind: DestinationKind,
    /// Whether the backend accepted the archive.
    pub success: bool,
    /// Entity tag or archive id on success.
    pub confirmation_token: Option<String>,
    /// Failure on error.
    pub error: Option<UploadError>,
}

impl UploadResult {
    pub(crate) fn from_attempt(
        destination_kind: DestinationKind,
        attempt: StorageResult<UploadConfirmation>,
    ) -> Self {
        match attempt {
            Ok(confirmation) => Self {
                destination_kind,
                success: true,
                confirmation_token: Some(confirmation.token),
                error: None,
            },
            Err(error) => Self {
                destination_kind,
                success: false,
                confirmation_token: None,
                error: Some(error),
            },
        }
    }
}

/// Aggregate upload status of a backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStatus {
    /// Every requested upload succeeded (or none was requested).
    Success,
    /// Some uploads succeeded and some failed.
    PartialFailure,
    /// Every requested upload failed.
    TotalFailure,
}

impl BackupStatus {
    /// Derive the status from per-destination results.
    #[must_use]
    pub fn from_results(results: &[UploadResult]) -> Self {
        let succeeded = results.iter().filter(|result| result.success).count();
        if succeeded == results.len() {
            Self::Success
        } else if succeeded == 0 {
            Self::TotalFailure
        } else {
            Self::PartialFailure
        }
    }

    /// Stable identifier used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialFailure => "partial_failure",
            Self::TotalFailure => "total_failure",
        }
    }
}

impl Display for BackupStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// What happened to the staged archive after uploading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupState {
    /// The archive was deleted.
    Deleted,
    /// The archive was already gone.
    AlreadyMissing,
    /// The archive was kept on disk by policy.
    Retained,
    /// Deletion failed; the archive may remain.
    Failed {
        /// Rendered IO error.
        error: String,
    },
}

/// Aggregate result of a backup whose archive was created.
#[derive(Debug)]
pub struct BackupOutcome {
    /// One entry per attempted destination.
    pub results: Vec<UploadResult>,
    /// Aggregate status.
    pub status: BackupStatus,
    /// The archive that was uploaded.
    pub artifact: ArchiveArtifact,
    /// Cleanup result for the archive.
    pub cleanup: CleanupState,
}

impl BackupOutcome {
    /// Whether every requested upload succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == BackupStatus::Success
    }

    /// Result for `kind`, when that destination was attempted.
    #[must_use]
    pub fn result(&self, kind: DestinationKind) -> Option<&UploadResult> {
        self.results
            .iter()
            .find(|result| result.destination_kind == kind)
    }
}
