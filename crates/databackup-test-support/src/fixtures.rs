//! Scratch directories, deterministic clocks, and log capture.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use databackup_archive::Clock;
use databackup_telemetry::{LogCapture, LogFormat, Logger, LoggingConfig, build_dispatch};
use tempfile::{Builder, TempDir};

/// Fresh scratch directory removed when dropped.
///
/// # Errors
///
/// Returns the IO error when the directory cannot be created.
pub fn temp_dir() -> io::Result<TempDir> {
    Builder::new().prefix("databackup-").tempdir()
}

/// Scratch directory populated with `files` (relative path, contents).
///
/// Parent directories of nested paths are created as needed.
///
/// # Errors
///
/// Returns the IO error when any directory or file cannot be written.
pub fn source_tree(files: &[(&str, &[u8])]) -> io::Result<TempDir> {
    let root = temp_dir()?;
    for (relative, contents) in files {
        let path = root.path().join(relative);
        if let Some(parent) = path.parent().filter(|parent| *parent != Path::new("")) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
    }
    Ok(root)
}

/// Fixed instant used to make artifact names predictable.
#[must_use]
pub fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Clock that starts at `start` and advances one second per reading.
#[must_use]
pub fn stepping_clock(start: DateTime<Utc>) -> Clock {
    let offset = Arc::new(AtomicI64::new(0));
    Arc::new(move || start + Duration::seconds(offset.fetch_add(1, Ordering::SeqCst)))
}

/// Logger writing plain-text lines into a capture buffer.
#[must_use]
pub fn capture_logger() -> (Logger, LogCapture) {
    let capture = LogCapture::new();
    let config = LoggingConfig {
        level: "debug",
        format: LogFormat::Pretty,
        build_sha: "test",
        ansi: false,
    };
    let logger = Logger::new(build_dispatch(&config, capture.clone()));
    (logger, capture)
}
