//! Archive-storage uploads to Glacier vaults.

use std::error::Error as StdError;
use std::ffi::OsStr;
use std::path::Path;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_glacier::Client;
use aws_sdk_glacier::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_glacier::primitives::ByteStream;
use chrono::{DateTime, Utc};
use databackup_telemetry::Logger;
use tracing::{error, info};

use crate::error::{FailureClass, StorageResult, UploadError, classify_failure};
use crate::uploader::{ArchiveStorageUploader, UploadConfirmation, ensure_uploadable};

/// Account identifier meaning "the account that owns the credentials".
const CURRENT_ACCOUNT: &str = "-";

/// Archive description stored alongside the archive.
#[must_use]
pub fn archive_description(file_name: &str, uploaded_at: DateTime<Utc>) -> String {
    format!(
        "Backup: {file_name} - {}",
        uploaded_at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Glacier-backed [`ArchiveStorageUploader`].
#[derive(Clone, Debug)]
pub struct GlacierUploader {
    client: Client,
    logger: Logger,
}

impl GlacierUploader {
    /// Construct an uploader around an existing client.
    #[must_use]
    pub fn new(client: Client, logger: &Logger) -> Self {
        Self {
            client,
            logger: logger.component("glacier"),
        }
    }

    /// Construct an uploader from shared SDK configuration.
    #[must_use]
    pub fn from_sdk_config(config: &SdkConfig, logger: &Logger) -> Self {
        Self::new(Client::new(config), logger)
    }

    async fn put(&self, file: &Path, vault: &str) -> StorageResult<UploadConfirmation> {
        let size_bytes = ensure_uploadable(file).await?;
        let file_name = file
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(|| UploadError::FileNotFound {
                path: file.to_path_buf(),
            })?;

        info!(vault, file = file_name, size_bytes, "Uploading file to Glacier vault");

        let body = ByteStream::from_path(file)
            .await
            .map_err(|source| UploadError::FileRead {
                path: file.to_path_buf(),
                source: source.into(),
            })?;

        let response = self
            .client
            .upload_archive()
            .account_id(CURRENT_ACCOUNT)
            .vault_name(vault)
            .archive_description(archive_description(file_name, Utc::now()))
            .body(body)
            .send()
            .await
            .map_err(|err| backend_error(vault, err))?;

        let location = response.location().unwrap_or(vault).to_string();
        let token = response
            .archive_id()
            .filter(|id| !id.is_empty())
            .map_or_else(|| location.clone(), str::to_string);

        info!(vault, archive_id = %token, "Successfully uploaded to Glacier");

        Ok(UploadConfirmation { token, location })
    }
}

#[async_trait]
impl ArchiveStorageUploader for GlacierUploader {
    async fn upload(&self, file: &Path, vault: &str) -> StorageResult<UploadConfirmation> {
        self.logger.scope(self.put(file, vault)).await
    }
}

fn backend_error<E>(vault: &str, err: SdkError<E>) -> UploadError
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
{
    let class = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => FailureClass::Transport,
        SdkError::ServiceError(_) | SdkError::ResponseError(_) => FailureClass::Service,
        _ => FailureClass::Construction,
    };
    let code = err.code().map(str::to_string);
    let status = err.raw_response().map(|response| response.status().as_u16());
    let message = DisplayErrorContext(&err).to_string();
    let kind = classify_failure(class, code.as_deref(), status, &message);

    error!(
        vault,
        kind = %kind,
        code = code.as_deref().unwrap_or("none"),
        error = %message,
        "AWS Glacier upload failed"
    );
    UploadError::backend(kind, vault, code, err)
}
