#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Logging primitives shared across the databackup workspace.
//!
//! Layout: `init.rs` (subscriber construction and the process guard),
//! `logger.rs` (the explicit logger handle handed to components),
//! `capture.rs` (line-capturing writer used by tests), `error.rs`.

pub mod capture;
pub mod error;
pub mod init;
pub mod logger;

pub use capture::LogCapture;
pub use error::{Result, TelemetryError};
pub use init::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, LoggingGuard, build_dispatch, build_sha,
    init_logging,
};
pub use logger::Logger;
