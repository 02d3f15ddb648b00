//! Zip archive writer.
//!
//! # Design
//! - Walk the source in file-name order so archives are reproducible for a given tree.
//! - Create the output with create-new semantics; a same-second collision is an error.
//! - Run the walk and compression on the blocking pool with the caller's logger installed.
//! - Follow symlinks; a linked file is stored under the link's name with the target's bytes.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use databackup_telemetry::Logger;
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::archiver::Archiver;
use crate::artifact::{ArchiveArtifact, artifact_file_name};
use crate::error::{ArchiveError, ArchiveResult};

/// Deflate level used for every entry.
pub const COMPRESSION_LEVEL: i32 = 9;
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Source of creation timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Archiver that writes deflate-compressed zip files into a staging directory.
#[derive(Clone)]
pub struct ZipArchiver {
    temp_dir: PathBuf,
    logger: Logger,
    clock: Clock,
}

impl ZipArchiver {
    /// Construct an archiver staging files under `temp_dir`.
    #[must_use]
    pub fn new(temp_dir: impl Into<PathBuf>, logger: &Logger) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            logger: logger.component("archiver"),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the timestamp source used for naming archives.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Staging directory for archives.
    #[must_use]
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    async fn create(&self, source: PathBuf) -> ArchiveResult<ArchiveArtifact> {
        match tokio::fs::metadata(&source).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(ArchiveError::SourceNotDirectory { path: source }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ArchiveError::SourceNotFound { path: source });
            }
            Err(err) => return Err(ArchiveError::io("create_archive.stat_source", source, err)),
        }

        info!(source = %source.display(), "Creating zip archive from directory");

        let created_at = (self.clock)();
        let destination = self.temp_dir.join(artifact_file_name(created_at));
        let logger = self.logger.clone();
        let task_destination = destination.clone();
        let entries = tokio::task::spawn_blocking(move || {
            logger.in_scope(|| write_archive(&source, &task_destination))
        })
        .await
        .map_err(|source| ArchiveError::Join { source })??;

        let size_bytes = tokio::fs::metadata(&destination)
            .await
            .map_err(|err| ArchiveError::io("create_archive.stat_archive", &destination, err))?
            .len();

        info!(
            path = %destination.display(),
            entries,
            size_bytes,
            "Zip archive created successfully"
        );

        Ok(ArchiveArtifact {
            path: destination,
            size_bytes,
            created_at,
        })
    }
}

impl std::fmt::Debug for ZipArchiver {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ZipArchiver")
            .field("temp_dir", &self.temp_dir)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Archiver for ZipArchiver {
    async fn create_archive(&self, source_directory: &Path) -> ArchiveResult<ArchiveArtifact> {
        let source = source_directory.to_path_buf();
        self.logger.scope(self.create(source)).await
    }
}

/// Write `source` into a new zip file at `destination`, returning the entry count.
///
/// A file created by this call is removed again when writing fails.
fn write_archive(source: &Path, destination: &Path) -> ArchiveResult<u64> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(|err| ArchiveError::io("create_archive.create_file", destination, err))?;

    let result = fill_archive(file, source, destination);
    if result.is_err() {
        match fs::remove_file(destination) {
            Ok(()) => warn!(path = %destination.display(), "Removed partial archive"),
            Err(err) => warn!(
                path = %destination.display(),
                error = %err,
                "Failed to remove partial archive"
            ),
        }
    }
    result
}

fn fill_archive(file: File, source: &Path, destination: &Path) -> ArchiveResult<u64> {
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let base = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));
    let mut entries = 0_u64;

    for entry in WalkDir::new(source)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry =
            entry.map_err(|err| ArchiveError::walkdir("create_archive.walk", source, err))?;
        let name = entry_name(source, entry.path())?;
        let file_type = entry.file_type();

        if file_type.is_dir() {
            let options = entry_options(base, &entry)?;
            writer
                .add_directory(name, options)
                .map_err(|err| ArchiveError::zip("create_archive.add_directory", entry.path(), err))?;
        } else if file_type.is_file() {
            let options = entry_options(base, &entry)?;
            writer
                .start_file(name, options)
                .map_err(|err| ArchiveError::zip("create_archive.start_file", entry.path(), err))?;
            let mut input = File::open(entry.path())
                .map_err(|err| ArchiveError::io("create_archive.open_entry", entry.path(), err))?;
            io::copy(&mut input, &mut writer)
                .map_err(|err| ArchiveError::io("create_archive.copy_entry", entry.path(), err))?;
        } else {
            warn!(path = %entry.path().display(), "Skipping entry that is not a regular file or directory");
            continue;
        }
        entries += 1;
    }

    let buffered = writer
        .finish()
        .map_err(|err| ArchiveError::zip("create_archive.finish", destination, err))?;
    let file = buffered
        .into_inner()
        .map_err(|err| ArchiveError::io("create_archive.flush", destination, err.into_error()))?;
    file.sync_all()
        .map_err(|err| ArchiveError::io("create_archive.sync", destination, err))?;
    Ok(entries)
}

/// Per-entry options: permissions, modification time, and zip64 for large files.
fn entry_options(base: FileOptions, entry: &DirEntry) -> ArchiveResult<FileOptions> {
    let metadata = entry
        .metadata()
        .map_err(|err| ArchiveError::walkdir("create_archive.stat_entry", entry.path(), err))?;
    let mut options = with_permissions(base, &metadata)
        .large_file(metadata.is_file() && metadata.len() >= ZIP64_THRESHOLD);
    // Times outside the zip range (1980..=2107) keep the format default.
    if let Some(modified) = metadata.modified().ok().and_then(zip_timestamp) {
        options = options.last_modified_time(modified);
    }
    Ok(options)
}

/// Zip timestamps carry no zone and are read back as local time.
fn zip_timestamp(modified: SystemTime) -> Option<zip::DateTime> {
    let local = DateTime::<Local>::from(modified);
    zip::DateTime::from_date_and_time(
        u16::try_from(local.year()).ok()?,
        u8::try_from(local.month()).ok()?,
        u8::try_from(local.day()).ok()?,
        u8::try_from(local.hour()).ok()?,
        u8::try_from(local.minute()).ok()?,
        u8::try_from(local.second()).ok()?,
    )
    .ok()
}

#[cfg(unix)]
fn with_permissions(options: FileOptions, metadata: &fs::Metadata) -> FileOptions {
    options.unix_permissions(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn with_permissions(options: FileOptions, _metadata: &fs::Metadata) -> FileOptions {
    options
}

fn entry_name(source: &Path, path: &Path) -> ArchiveResult<String> {
    let relative = path
        .strip_prefix(source)
        .map_err(|_| ArchiveError::InvalidEntry {
            path: path.to_path_buf(),
            reason: "outside_source",
        })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy()),
            Component::CurDir => {}
            _ => {
                return Err(ArchiveError::InvalidEntry {
                    path: path.to_path_buf(),
                    reason: "invalid_segment",
                });
            }
        }
    }

    if segments.is_empty() {
        return Err(ArchiveError::InvalidEntry {
            path: path.to_path_buf(),
            reason: "empty_name",
        });
    }
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::TimeZone;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn temp_dir() -> Result<TempDir> {
        Ok(tempfile::Builder::new()
            .prefix("databackup-archive-")
            .tempdir()?)
    }

    fn fixed_clock(second: u32) -> Clock {
        Arc::new(move || {
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, second)
                .single()
                .unwrap_or_else(Utc::now)
        })
    }

    fn archiver(staging: &Path, second: u32) -> ZipArchiver {
        ZipArchiver::new(staging, &Logger::disabled()).with_clock(fixed_clock(second))
    }

    fn read_entries(path: &Path) -> Result<Vec<(String, Vec<u8>)>> {
        let mut archive = ZipArchive::new(File::open(path)?)?;
        let mut entries = Vec::new();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents)?;
            entries.push((entry.name().to_string(), contents));
        }
        Ok(entries)
    }

    #[tokio::test]
    async fn archive_preserves_relative_paths() -> Result<()> {
        let temp = temp_dir()?;
        let source = temp.path().join("source");
        let staging = temp.path().join("staging");
        fs::create_dir_all(source.join("docs/empty"))?;
        fs::create_dir_all(&staging)?;
        fs::write(source.join("notes.txt"), b"hello")?;
        fs::write(source.join("docs/readme.md"), b"# readme")?;
        let written = Local
            .with_ymd_and_hms(2023, 6, 15, 10, 20, 30)
            .single()
            .ok_or_else(|| anyhow::anyhow!("ambiguous local time"))?;
        File::options()
            .write(true)
            .open(source.join("notes.txt"))?
            .set_modified(SystemTime::from(written))?;

        let artifact = archiver(&staging, 1).create_archive(&source).await?;

        assert!(artifact.path.starts_with(&staging));
        assert_eq!(artifact.file_name(), Some("backup_20240501_120001.zip"));
        assert!(artifact.size_bytes > 0);
        let entries = read_entries(&artifact.path)?;
        let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["docs/", "docs/empty/", "docs/readme.md", "notes.txt"]);
        let notes = entries
            .iter()
            .find(|(name, _)| name == "notes.txt")
            .map(|(_, contents)| contents.clone());
        assert_eq!(notes.as_deref(), Some(b"hello".as_slice()));

        let mut archive = ZipArchive::new(File::open(&artifact.path)?)?;
        let stamp = archive.by_name("notes.txt")?.last_modified();
        assert_eq!((stamp.year(), stamp.month(), stamp.day()), (2023, 6, 15));
        assert_eq!((stamp.hour(), stamp.minute(), stamp.second()), (10, 20, 30));
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_files_are_archived_with_target_contents() -> Result<()> {
        let temp = temp_dir()?;
        let source = temp.path().join("source");
        let staging = temp.path().join("staging");
        fs::create_dir_all(&source)?;
        fs::create_dir_all(&staging)?;
        fs::write(source.join("plain.txt"), b"plain")?;
        fs::write(temp.path().join("outside.txt"), b"linked bytes")?;
        std::os::unix::fs::symlink(temp.path().join("outside.txt"), source.join("linked.txt"))?;

        let artifact = archiver(&staging, 5).create_archive(&source).await?;

        let entries = read_entries(&artifact.path)?;
        assert_eq!(
            entries,
            vec![
                ("linked.txt".to_string(), b"linked bytes".to_vec()),
                ("plain.txt".to_string(), b"plain".to_vec()),
            ]
        );
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_entry_fails_and_removes_partial_archive() -> Result<()> {
        let temp = temp_dir()?;
        let source = temp.path().join("source");
        let staging = temp.path().join("staging");
        fs::create_dir_all(&source)?;
        fs::create_dir_all(&staging)?;
        fs::write(source.join("a.txt"), b"a")?;
        std::os::unix::fs::symlink(temp.path().join("gone.txt"), source.join("b.txt"))?;

        let err = archiver(&staging, 6)
            .create_archive(&source)
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected dangling link to fail the archive"))?;

        assert!(matches!(
            err,
            ArchiveError::Walkdir {
                operation: "create_archive.walk",
                ..
            }
        ));
        assert_eq!(fs::read_dir(&staging)?.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn empty_directory_yields_valid_archive() -> Result<()> {
        let temp = temp_dir()?;
        let source = temp.path().join("empty");
        fs::create_dir_all(&source)?;

        let artifact = archiver(temp.path(), 2).create_archive(&source).await?;

        assert!(artifact.path.exists());
        assert!(artifact.size_bytes > 0);
        assert!(read_entries(&artifact.path)?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn missing_source_is_reported() -> Result<()> {
        let temp = temp_dir()?;
        let missing = temp.path().join("absent");
        let err = archiver(temp.path(), 3)
            .create_archive(&missing)
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected missing source error"))?;
        assert!(matches!(err, ArchiveError::SourceNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn file_source_is_rejected() -> Result<()> {
        let temp = temp_dir()?;
        let file = temp.path().join("file.txt");
        fs::write(&file, b"data")?;
        let err = archiver(temp.path(), 4)
            .create_archive(&file)
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected not-a-directory error"))?;
        assert!(matches!(err, ArchiveError::SourceNotDirectory { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn archives_created_a_second_apart_have_distinct_names() -> Result<()> {
        let temp = temp_dir()?;
        let source = temp.path().join("source");
        fs::create_dir_all(&source)?;
        fs::write(source.join("a.txt"), b"a")?;

        let first = archiver(temp.path(), 10).create_archive(&source).await?;
        let second = archiver(temp.path(), 11).create_archive(&source).await?;

        assert_ne!(first.path, second.path);
        assert!(first.path.exists());
        assert!(second.path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn same_second_collision_does_not_overwrite() -> Result<()> {
        let temp = temp_dir()?;
        let source = temp.path().join("source");
        fs::create_dir_all(&source)?;
        fs::write(source.join("a.txt"), b"a")?;

        let first = archiver(temp.path(), 20).create_archive(&source).await?;
        let err = archiver(temp.path(), 20)
            .create_archive(&source)
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected collision error"))?;

        assert!(matches!(
            err,
            ArchiveError::Io {
                operation: "create_archive.create_file",
                ..
            }
        ));
        assert!(first.path.exists());
        assert_eq!(fs::metadata(&first.path)?.len(), first.size_bytes);
        Ok(())
    }

    #[test]
    fn entry_name_uses_forward_slashes() -> Result<()> {
        let source = Path::new("root");
        let name = entry_name(source, &source.join("a").join("b.txt"))?;
        assert_eq!(name, "a/b.txt");
        assert!(matches!(
            entry_name(source, Path::new("elsewhere/file")),
            Err(ArchiveError::InvalidEntry {
                reason: "outside_source",
                ..
            })
        ));
        Ok(())
    }
}
