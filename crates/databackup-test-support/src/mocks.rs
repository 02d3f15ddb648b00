//! Recording fakes for the archiver and both upload capabilities.
//!
//! The archiver fake drives the real zip writer into a private staging
//! directory; the upload fakes never touch the network and record what
//! they were asked to store.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use databackup_archive::{ArchiveArtifact, ArchiveResult, Archiver, Clock, ZipArchiver};
use databackup_storage::{
    ArchiveStorageUploader, ColdStorageUploader, StorageResult, UploadConfirmation, UploadError,
    UploadErrorKind, object_key,
};
use databackup_telemetry::Logger;
use tempfile::TempDir;

use crate::fixtures::{fixed_instant, stepping_clock, temp_dir};

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn injected(kind: UploadErrorKind, file: &Path, destination: &str) -> UploadError {
    if kind == UploadErrorKind::FileNotFound {
        UploadError::FileNotFound {
            path: file.to_path_buf(),
        }
    } else {
        UploadError::backend(
            kind,
            destination,
            Some("InjectedFailure".to_string()),
            io::Error::other("injected upload failure"),
        )
    }
}

/// Size of `file`, or `FileNotFound` when it is not a regular file.
fn staged_size(file: &Path) -> StorageResult<u64> {
    match std::fs::metadata(file) {
        Ok(metadata) if metadata.is_file() => Ok(metadata.len()),
        _ => Err(UploadError::FileNotFound {
            path: file.to_path_buf(),
        }),
    }
}

/// Archiver that records each call and stages real zip files in its own directory.
#[derive(Debug)]
pub struct RecordingArchiver {
    staging: TempDir,
    inner: ZipArchiver,
    calls: AtomicUsize,
    artifacts: Mutex<Vec<ArchiveArtifact>>,
}

impl RecordingArchiver {
    /// Archiver whose clock starts at [`fixed_instant`] and steps one second per archive.
    ///
    /// # Errors
    ///
    /// Returns the IO error when the staging directory cannot be created.
    pub fn new(logger: &Logger) -> io::Result<Self> {
        Self::with_clock(stepping_clock(fixed_instant()), logger)
    }

    /// Archiver naming its artifacts from `clock`.
    ///
    /// # Errors
    ///
    /// Returns the IO error when the staging directory cannot be created.
    pub fn with_clock(clock: Clock, logger: &Logger) -> io::Result<Self> {
        let staging = temp_dir()?;
        let inner = ZipArchiver::new(staging.path(), logger).with_clock(clock);
        Ok(Self {
            staging,
            inner,
            calls: AtomicUsize::new(0),
            artifacts: Mutex::new(Vec::new()),
        })
    }

    /// Directory archives are written into.
    #[must_use]
    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }

    /// Number of `create_archive` calls.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Artifacts produced so far.
    #[must_use]
    pub fn artifacts(&self) -> Vec<ArchiveArtifact> {
        locked(&self.artifacts).clone()
    }
}

#[async_trait]
impl Archiver for RecordingArchiver {
    async fn create_archive(&self, source_directory: &Path) -> ArchiveResult<ArchiveArtifact> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let artifact = self.inner.create_archive(source_directory).await?;
        locked(&self.artifacts).push(artifact.clone());
        Ok(artifact)
    }
}

/// One call observed by [`RecordingColdStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColdUpload {
    /// File handed to the uploader.
    pub file: PathBuf,
    /// Bucket name.
    pub bucket: String,
    /// Object key the bytes would be stored under.
    pub key: String,
    /// Size of the file at upload time, when it existed.
    pub size_bytes: Option<u64>,
}

/// Cold-storage fake with call recording and failure injection.
#[derive(Debug, Default)]
pub struct RecordingColdStorage {
    failure: Option<UploadErrorKind>,
    remove_file: bool,
    uploads: Mutex<Vec<ColdUpload>>,
}

impl RecordingColdStorage {
    /// Fake that accepts every upload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fake that rejects every upload with `kind`.
    #[must_use]
    pub fn failing(kind: UploadErrorKind) -> Self {
        Self {
            failure: Some(kind),
            ..Self::default()
        }
    }

    /// Fake that deletes the uploaded file after accepting it.
    #[must_use]
    pub fn removing_file() -> Self {
        Self {
            remove_file: true,
            ..Self::default()
        }
    }

    /// Number of upload calls.
    #[must_use]
    pub fn calls(&self) -> usize {
        locked(&self.uploads).len()
    }

    /// Uploads observed so far.
    #[must_use]
    pub fn uploads(&self) -> Vec<ColdUpload> {
        locked(&self.uploads).clone()
    }
}

#[async_trait]
impl ColdStorageUploader for RecordingColdStorage {
    async fn upload(
        &self,
        file: &Path,
        bucket: &str,
        key_prefix: Option<&str>,
    ) -> StorageResult<UploadConfirmation> {
        let key = object_key(key_prefix, file)?;
        let size = staged_size(file);
        locked(&self.uploads).push(ColdUpload {
            file: file.to_path_buf(),
            bucket: bucket.to_string(),
            key: key.clone(),
            size_bytes: size.as_ref().ok().copied(),
        });
        size?;

        if let Some(kind) = self.failure {
            return Err(injected(kind, file, bucket));
        }
        if self.remove_file {
            std::fs::remove_file(file).map_err(|source| UploadError::FileRead {
                path: file.to_path_buf(),
                source: source.into(),
            })?;
        }
        Ok(UploadConfirmation {
            token: format!("etag-{}", self.calls()),
            location: key,
        })
    }
}

/// One call observed by [`RecordingArchiveStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveUpload {
    /// File handed to the uploader.
    pub file: PathBuf,
    /// Vault name.
    pub vault: String,
    /// Size of the file at upload time, when it existed.
    pub size_bytes: Option<u64>,
}

/// Archive-storage fake with call recording and failure injection.
#[derive(Debug, Default)]
pub struct RecordingArchiveStorage {
    failure: Option<UploadErrorKind>,
    uploads: Mutex<Vec<ArchiveUpload>>,
}

impl RecordingArchiveStorage {
    /// Fake that accepts every upload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fake that rejects every upload with `kind`.
    #[must_use]
    pub fn failing(kind: UploadErrorKind) -> Self {
        Self {
            failure: Some(kind),
            ..Self::default()
        }
    }

    /// Number of upload calls.
    #[must_use]
    pub fn calls(&self) -> usize {
        locked(&self.uploads).len()
    }

    /// Uploads observed so far.
    #[must_use]
    pub fn uploads(&self) -> Vec<ArchiveUpload> {
        locked(&self.uploads).clone()
    }
}

#[async_trait]
impl ArchiveStorageUploader for RecordingArchiveStorage {
    async fn upload(&self, file: &Path, vault: &str) -> StorageResult<UploadConfirmation> {
        let size = staged_size(file);
        locked(&self.uploads).push(ArchiveUpload {
            file: file.to_path_buf(),
            vault: vault.to_string(),
            size_bytes: size.as_ref().ok().copied(),
        });
        size?;

        if let Some(kind) = self.failure {
            return Err(injected(kind, file, vault));
        }
        Ok(UploadConfirmation {
            token: format!("archive-{}", self.calls()),
            location: format!("/-/vaults/{vault}/archives/archive-{}", self.calls()),
        })
    }
}
