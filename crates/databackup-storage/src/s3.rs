//! Cold-storage uploads to S3 buckets.

use std::error::Error as StdError;
use std::ffi::OsStr;
use std::path::Path;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ServerSideEncryption as S3Encryption;
use databackup_config::ServerSideEncryption;
use databackup_telemetry::Logger;
use tracing::{error, info};

use crate::error::{FailureClass, StorageResult, UploadError, classify_failure};
use crate::uploader::{ColdStorageUploader, UploadConfirmation, ensure_uploadable};

/// Object key for `file`: its base name, under `key_prefix` when one is set.
///
/// # Errors
///
/// Returns [`UploadError::FileNotFound`] when the path has no usable file name.
pub fn object_key(key_prefix: Option<&str>, file: &Path) -> StorageResult<String> {
    let file_name = file
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(|| UploadError::FileNotFound {
            path: file.to_path_buf(),
        })?;

    match key_prefix
        .map(|prefix| prefix.trim_end_matches('/'))
        .filter(|prefix| !prefix.is_empty())
    {
        Some(prefix) => Ok(format!("{prefix}/{file_name}")),
        None => Ok(file_name.to_string()),
    }
}

/// S3-backed [`ColdStorageUploader`].
#[derive(Clone, Debug)]
pub struct S3Uploader {
    client: Client,
    encryption: ServerSideEncryption,
    logger: Logger,
}

impl S3Uploader {
    /// Construct an uploader around an existing client.
    #[must_use]
    pub fn new(client: Client, encryption: ServerSideEncryption, logger: &Logger) -> Self {
        Self {
            client,
            encryption,
            logger: logger.component("s3"),
        }
    }

    /// Construct an uploader from shared SDK configuration.
    #[must_use]
    pub fn from_sdk_config(
        config: &SdkConfig,
        encryption: ServerSideEncryption,
        logger: &Logger,
    ) -> Self {
        Self::new(Client::new(config), encryption, logger)
    }

    async fn put(
        &self,
        file: &Path,
        bucket: &str,
        key_prefix: Option<&str>,
    ) -> StorageResult<UploadConfirmation> {
        let size_bytes = ensure_uploadable(file).await?;
        let key = object_key(key_prefix, file)?;

        info!(bucket, key = %key, size_bytes, "Uploading file to S3 bucket");

        let body = ByteStream::from_path(file)
            .await
            .map_err(|source| UploadError::FileRead {
                path: file.to_path_buf(),
                source: source.into(),
            })?;

        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(&key)
            .body(body);
        if let Some(encryption) = encryption_header(self.encryption) {
            request = request.server_side_encryption(encryption);
        }

        let response = request
            .send()
            .await
            .map_err(|err| backend_error(bucket, &key, err))?;

        let token = response
            .e_tag()
            .map(|tag| tag.trim_matches('"'))
            .filter(|tag| !tag.is_empty())
            .map_or_else(|| key.clone(), str::to_string);

        info!(bucket, key = %key, etag = %token, "Successfully uploaded to S3");

        Ok(UploadConfirmation {
            token,
            location: key,
        })
    }
}

#[async_trait]
impl ColdStorageUploader for S3Uploader {
    async fn upload(
        &self,
        file: &Path,
        bucket: &str,
        key_prefix: Option<&str>,
    ) -> StorageResult<UploadConfirmation> {
        self.logger.scope(self.put(file, bucket, key_prefix)).await
    }
}

fn encryption_header(encryption: ServerSideEncryption) -> Option<S3Encryption> {
    match encryption {
        ServerSideEncryption::Aes256 => Some(S3Encryption::Aes256),
        ServerSideEncryption::Kms => Some(S3Encryption::AwsKms),
        ServerSideEncryption::Disabled => None,
    }
}

fn backend_error<E>(bucket: &str, key: &str, err: SdkError<E>) -> UploadError
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
        bucket,
        key,
        kind = %kind,
        code = code.as_deref().unwrap_or("none"),
        error = %message,
        "AWS S3 upload failed"
    );
    UploadError::backend(kind, bucket, code, err)
}
