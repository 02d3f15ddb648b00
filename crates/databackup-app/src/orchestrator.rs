//! Sequencing of one backup: archive, upload, clean up.
//!
//! # Design
//! - Archive creation completes before any upload starts; a failed archive
//!   means no upload and nothing to clean.
//! - The staged archive is held by an `ArtifactGuard` from creation until
//!   cleanup, so every exit path after creation is covered.
//! - Cleanup runs only after every attempted upload has returned.

use std::path::Path;
use std::sync::Arc;

use databackup_archive::{ArchiveArtifact, Archiver, ArtifactGuard};
use databackup_config::{BackupSettings, CleanupPolicy, UploadStrategy};
use databackup_storage::{
    ArchiveStorageUploader, ColdStorageUploader, DestinationKind, StorageResult,
    UploadConfirmation,
};
use databackup_telemetry::Logger;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::model::{BackupOutcome, BackupRequest, BackupStatus, CleanupState, UploadResult};

/// How uploads and cleanup are carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorPolicy {
    /// Whether uploads stop at the first failure.
    pub upload_strategy: UploadStrategy,
    /// When the staged archive is deleted.
    pub cleanup_policy: CleanupPolicy,
    /// Cold-storage key prefix.
    pub key_prefix: Option<String>,
}

impl OrchestratorPolicy {
    /// Policy described by loaded settings.
    #[must_use]
    pub fn from_settings(settings: &BackupSettings) -> Self {
        Self {
            upload_strategy: settings.upload_strategy,
            cleanup_policy: settings.cleanup_policy,
            key_prefix: settings.key_prefix().map(str::to_string),
        }
    }
}

impl Default for OrchestratorPolicy {
    fn default() -> Self {
        Self::from_settings(&BackupSettings::default())
    }
}

/// Runs backups against injected archive and storage capabilities.
pub struct BackupOrchestrator {
    archiver: Arc<dyn Archiver>,
    cold_storage: Arc<dyn ColdStorageUploader>,
    archive_storage: Arc<dyn ArchiveStorageUploader>,
    policy: OrchestratorPolicy,
    logger: Logger,
}

impl BackupOrchestrator {
    /// Construct an orchestrator.
    #[must_use]
    pub fn new(
        archiver: Arc<dyn Archiver>,
        cold_storage: Arc<dyn ColdStorageUploader>,
        archive_storage: Arc<dyn ArchiveStorageUploader>,
        policy: OrchestratorPolicy,
        logger: &Logger,
    ) -> Self {
        Self {
            archiver,
            cold_storage,
            archive_storage,
            policy,
            logger: logger.component("backup"),
        }
    }

    /// Archive `request.source_directory`, upload it to the requested
    /// targets, then clean up the staged archive.
    ///
    /// With [`UploadStrategy::Independent`] every requested upload is
    /// attempted and the outcome reports each result. With
    /// [`UploadStrategy::FailFast`] the first upload failure is returned as
    /// an error and later uploads are not attempted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Archive`] when the archive cannot be created, and
    /// [`AppError::Upload`] for the first failed upload under `FailFast`.
    pub async fn run_backup(&self, request: &BackupRequest) -> AppResult<BackupOutcome> {
        self.logger.scope(self.execute(request)).await
    }

    async fn execute(&self, request: &BackupRequest) -> AppResult<BackupOutcome> {
        info!(
            source = %request.source_directory.display(),
            destination = %request.destination,
            upload_strategy = %self.policy.upload_strategy,
            cleanup_policy = %self.policy.cleanup_policy,
            "Starting backup process"
        );

        info!("Step 1: Creating zip archive");
        let artifact = self
            .archiver
            .create_archive(&request.source_directory)
            .await
            .map_err(|err| AppError::archive("run_backup.create_archive", err))?;
        let guard = ArtifactGuard::new(&artifact);

        let uploads = match self.policy.upload_strategy {
            UploadStrategy::Independent => Ok(self.upload_independent(&artifact, request).await),
            UploadStrategy::FailFast => self.upload_fail_fast(&artifact, request).await,
        };
        let all_succeeded = uploads
            .as_ref()
            .is_ok_and(|results| results.iter().all(|result| result.success));
        let cleanup = self.clean_up(guard, all_succeeded);

        let results = match uploads {
            Ok(results) => results,
            Err(err) => {
                error!(
                    error = %err,
                    kind = err.upload_kind().map_or("none", |kind| kind.as_str()),
                    "Backup process failed"
                );
                return Err(err);
            }
        };

        let status = BackupStatus::from_results(&results);
        match status {
            BackupStatus::Success => info!(
                uploads = results.len(),
                "Backup process completed successfully"
            ),
            BackupStatus::PartialFailure | BackupStatus::TotalFailure => error!(
                status = %status,
                failed = results.iter().filter(|result| !result.success).count(),
                "Backup process failed"
            ),
        }

        Ok(BackupOutcome {
            results,
            status,
            artifact,
            cleanup,
        })
    }

    async fn upload_independent(
        &self,
        artifact: &ArchiveArtifact,
        request: &BackupRequest,
    ) -> Vec<UploadResult> {
        let cold = async {
            if request.targets.cold_storage {
                let attempt = self.upload_cold(&artifact.path, &request.destination).await;
                Some(UploadResult::from_attempt(DestinationKind::ColdStorage, attempt))
            } else {
                None
            }
        };
        let archive = async {
            if request.targets.archive_storage {
                let attempt = self
                    .upload_archive(&artifact.path, &request.destination)
                    .await;
                Some(UploadResult::from_attempt(
                    DestinationKind::ArchiveStorage,
                    attempt,
                ))
            } else {
                None
            }
        };

        let (cold, archive) = tokio::join!(cold, archive);
        cold.into_iter().chain(archive).collect()
    }

    async fn upload_fail_fast(
        &self,
        artifact: &ArchiveArtifact,
        request: &BackupRequest,
    ) -> AppResult<Vec<UploadResult>> {
        let mut results = Vec::with_capacity(2);
        if request.targets.cold_storage {
            let confirmation = self
                .upload_cold(&artifact.path, &request.destination)
                .await
                .map_err(|err| AppError::upload(DestinationKind::ColdStorage, err))?;
            results.push(UploadResult::from_attempt(
                DestinationKind::ColdStorage,
                Ok(confirmation),
            ));
        }
        if request.targets.archive_storage {
            let confirmation = self
                .upload_archive(&artifact.path, &request.destination)
                .await
                .map_err(|err| AppError::upload(DestinationKind::ArchiveStorage, err))?;
            results.push(UploadResult::from_attempt(
                DestinationKind::ArchiveStorage,
                Ok(confirmation),
            ));
        }
        Ok(results)
    }

    async fn upload_cold(&self, file: &Path, bucket: &str) -> StorageResult<UploadConfirmation> {
        info!(bucket, "Step 2a: Uploading to cold storage");
        let attempt = self
            .cold_storage
            .upload(file, bucket, self.policy.key_prefix.as_deref())
            .await;
        log_attempt(DestinationKind::ColdStorage, &attempt);
        attempt
    }

    async fn upload_archive(&self, file: &Path, vault: &str) -> StorageResult<UploadConfirmation> {
        info!(vault, "Step 2b: Uploading to archive storage");
        let attempt = self.archive_storage.upload(file, vault).await;
        log_attempt(DestinationKind::ArchiveStorage, &attempt);
        attempt
    }

    fn clean_up(&self, guard: ArtifactGuard, all_succeeded: bool) -> CleanupState {
        let path = guard.path().to_path_buf();
        if self.policy.cleanup_policy == CleanupPolicy::OnSuccess && !all_succeeded {
            let kept = guard.disarm();
            warn!(path = %kept.display(), "Keeping temporary zip file after failed upload");
            return CleanupState::Retained;
        }

        info!("Cleaning up temporary files");
        match guard.release() {
            Ok(true) => {
                info!(path = %path.display(), "Temporary zip file deleted");
                CleanupState::Deleted
            }
            Ok(false) => {
                warn!(path = %path.display(), "Temporary zip file was already removed");
                CleanupState::AlreadyMissing
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to delete temporary zip file");
                CleanupState::Failed {
                    error: err.to_string(),
                }
            }
        }
    }
}

fn log_attempt(kind: DestinationKind, attempt: &StorageResult<UploadConfirmation>) {
    match attempt {
        Ok(confirmation) => info!(
            destination_kind = %kind,
            token = %confirmation.token,
            location = %confirmation.location,
            "Upload succeeded"
        ),
        Err(err) => error!(
            destination_kind = %kind,
            kind = %err.kind(),
            error = %err,
            "Upload failed"
        ),
    }
}
