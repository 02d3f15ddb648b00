//! # Design
//!
//! - Provide structured, constant-message errors for archive creation.
//! - Capture operation context (paths, operations) to make failures reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors produced while creating an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The source directory does not exist.
    #[error("source directory not found")]
    SourceNotFound {
        /// Requested source path.
        path: PathBuf,
    },
    /// The source path exists but is not a directory.
    #[error("source path is not a directory")]
    SourceNotDirectory {
        /// Requested source path.
        path: PathBuf,
    },
    /// IO failures while reading entries or writing the archive.
    #[error("archive io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Directory traversal failures.
    #[error("archive walkdir failure")]
    Walkdir {
        /// Operation that triggered the walkdir failure.
        operation: &'static str,
        /// Path involved in the walkdir failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// Zip encoder failures.
    #[error("archive zip failure")]
    Zip {
        /// Operation that triggered the zip failure.
        operation: &'static str,
        /// Path involved in the zip failure.
        path: PathBuf,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },
    /// An entry could not be expressed inside the archive.
    #[error("archive entry rejected")]
    InvalidEntry {
        /// Entry path.
        path: PathBuf,
        /// Static reason for the rejection.
        reason: &'static str,
    },
    /// The blocking archive task did not complete.
    #[error("archive task failed")]
    Join {
        /// Underlying join error.
        source: tokio::task::JoinError,
    },
}

impl ArchiveError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn zip(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: zip::result::ZipError,
    ) -> Self {
        Self::Zip {
            operation,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    #[test]
    fn archive_error_helpers_build_variants() -> Result<(), Box<dyn Error>> {
        let io_err = ArchiveError::io("read", "path", io::Error::other("io"));
        assert!(matches!(io_err, ArchiveError::Io { .. }));
        assert!(io_err.source().is_some());
        assert_eq!(io_err.to_string(), "archive io failure");

        let temp = TempDir::new()?;
        let missing = temp.path().join("missing");
        let walkdir_error = WalkDir::new(&missing)
            .into_iter()
            .next()
            .and_then(Result::err)
            .ok_or_else(|| io::Error::other("expected walkdir error"))?;
        let walk_err = ArchiveError::walkdir("walk", &missing, walkdir_error);
        assert!(matches!(walk_err, ArchiveError::Walkdir { .. }));
        assert!(walk_err.source().is_some());

        let zip_err = ArchiveError::zip("finish", "archive.zip", zip::result::ZipError::FileNotFound);
        assert!(matches!(zip_err, ArchiveError::Zip { .. }));
        assert!(zip_err.source().is_some());
        Ok(())
    }
}
