#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Backup pipeline wiring.
//!
//! Layout: `model.rs` (request and outcome types), `orchestrator.rs`
//! (archive, upload, clean up), `bootstrap.rs` (production dependencies),
//! `error.rs`.

/// Production dependency wiring.
pub mod bootstrap;
/// Application error type.
pub mod error;
/// Request and outcome model.
pub mod model;
/// Archive/upload/cleanup sequencing.
pub mod orchestrator;

pub use bootstrap::{BackupDependencies, run_backup, run_backup_with};
pub use error::{AppError, AppResult};
pub use model::{
    BackupOutcome, BackupRequest, BackupStatus, BackupTargets, CleanupState, UploadResult,
};
pub use orchestrator::{BackupOrchestrator, OrchestratorPolicy};
