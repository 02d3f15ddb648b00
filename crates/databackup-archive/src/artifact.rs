//! The staged archive file and its cleanup guard.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// File extension of produced archives.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// A compressed archive staged on local disk for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveArtifact {
    /// Location of the archive file.
    pub path: PathBuf,
    /// Size of the archive in bytes.
    pub size_bytes: u64,
    /// When the archive was created.
    pub created_at: DateTime<Utc>,
}

impl ArchiveArtifact {
    /// Base name of the archive file.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

/// Archive file name for a creation timestamp: `backup_<YYYYMMDD_HHmmss>.zip`.
#[must_use]
pub fn artifact_file_name(created_at: DateTime<Utc>) -> String {
    format!(
        "backup_{}.{ARCHIVE_EXTENSION}",
        created_at.format("%Y%m%d_%H%M%S")
    )
}

/// Deletes the staged archive when released or dropped, unless disarmed.
#[derive(Debug)]
pub struct ArtifactGuard {
    path: PathBuf,
    armed: bool,
}

impl ArtifactGuard {
    /// Guard the file behind `artifact`.
    #[must_use]
    pub fn new(artifact: &ArchiveArtifact) -> Self {
        Self {
            path: artifact.path.clone(),
            armed: true,
        }
    }

    /// Guarded path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now. Returns `Ok(false)` when it was already gone.
    ///
    /// # Errors
    ///
    /// Returns the IO error when the file exists but cannot be removed.
    pub fn release(mut self) -> io::Result<bool> {
        self.armed = false;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Keep the file on disk and return its path.
    #[must_use]
    pub fn disarm(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = fs::remove_file(&self.path);
        }
    }
}
