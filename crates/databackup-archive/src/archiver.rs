//! Archiver capability.

use std::path::Path;

use async_trait::async_trait;

use crate::artifact::ArchiveArtifact;
use crate::error::ArchiveResult;

/// Produces a single compressed archive from a directory tree.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Archive every entry under `source_directory`, preserving relative paths.
    ///
    /// # Errors
    ///
    /// Returns an error when the source is missing or not a directory, when an
    /// entry cannot be read, or when the archive cannot be written.
    async fn create_archive(&self, source_directory: &Path) -> ArchiveResult<ArchiveArtifact>;
}
