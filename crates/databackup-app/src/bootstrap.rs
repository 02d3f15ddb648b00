use std::sync::Arc;

use databackup_archive::{Archiver, ZipArchiver};
use databackup_config::BackupSettings;
use databackup_storage::{
    ArchiveStorageUploader, ColdStorageUploader, GlacierUploader, S3Uploader, load_sdk_config,
};
use databackup_telemetry::Logger;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::model::{BackupOutcome, BackupRequest};
use crate::orchestrator::{BackupOrchestrator, OrchestratorPolicy};

/// Capabilities the orchestrator runs against.
pub struct BackupDependencies {
    /// Archive builder.
    pub archiver: Arc<dyn Archiver>,
    /// Cold-storage backend.
    pub cold_storage: Arc<dyn ColdStorageUploader>,
    /// Archive-storage backend.
    pub archive_storage: Arc<dyn ArchiveStorageUploader>,
}

impl BackupDependencies {
    /// Construct production dependencies: a zip archiver staging into the
    /// configured temp directory and AWS clients built from the default
    /// provider chain.
    ///
    /// # Errors
    ///
    /// Returns an error when the staging directory cannot be created.
    pub async fn from_settings(settings: &BackupSettings, logger: &Logger) -> AppResult<Self> {
        let temp_dir = settings.temp_dir();
        tokio::fs::create_dir_all(&temp_dir)
            .await
            .map_err(|err| AppError::io("bootstrap.create_temp_dir", &temp_dir, err))?;

        let sdk_config = load_sdk_config(settings.region.as_deref()).await;
        logger.in_scope(|| {
            info!(
                temp_dir = %temp_dir.display(),
                region = sdk_config.region().map_or("default", |region| region.as_ref()),
                encryption = settings.server_side_encryption.as_str(),
                "Storage clients configured"
            );
        });

        Ok(Self {
            archiver: Arc::new(ZipArchiver::new(temp_dir, logger)),
            cold_storage: Arc::new(S3Uploader::from_sdk_config(
                &sdk_config,
                settings.server_side_encryption,
                logger,
            )),
            archive_storage: Arc::new(GlacierUploader::from_sdk_config(&sdk_config, logger)),
        })
    }
}

/// Run one backup with production dependencies.
///
/// # Errors
///
/// Returns an error if dependency construction or the backup itself fails.
pub async fn run_backup(
    settings: &BackupSettings,
    request: &BackupRequest,
    logger: &Logger,
) -> AppResult<BackupOutcome> {
    let dependencies = BackupDependencies::from_settings(settings, logger).await?;
    run_backup_with(dependencies, settings, request, logger).await
}

/// Run one backup against injected dependencies.
///
/// # Errors
///
/// Returns an error when archiving fails, or when an upload fails under the
/// fail-fast strategy.
pub async fn run_backup_with(
    dependencies: BackupDependencies,
    settings: &BackupSettings,
    request: &BackupRequest,
    logger: &Logger,
) -> AppResult<BackupOutcome> {
    let BackupDependencies {
        archiver,
        cold_storage,
        archive_storage,
    } = dependencies;
    let orchestrator = BackupOrchestrator::new(
        archiver,
        cold_storage,
        archive_storage,
        OrchestratorPolicy::from_settings(settings),
        logger,
    );
    orchestrator.run_backup(request).await
}
