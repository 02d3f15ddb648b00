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

//! Runtime settings for the backup tool.
//!
//! Layout: `model.rs` (typed settings and overrides), `defaults.rs`,
//! `loader.rs` (settings file and environment layering), `error.rs`.

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::{EnvSource, ProcessEnv, load_settings};
pub use model::{
    BackupSettings, CleanupPolicy, ServerSideEncryption, SettingsOverrides, UploadStrategy,
};
