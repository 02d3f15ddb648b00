//! Default values and environment variable names.
//!
//! # Design
//! - Keep every default in one place so the loader, CLI help, and tests agree.

/// Key prefix prepended to cold-storage object keys.
pub const DEFAULT_KEY_PREFIX: &str = "backups";
/// Log level used when neither settings nor `RUST_LOG` provide one.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Exit code for usage errors (missing arguments, missing source directory).
pub const DEFAULT_USAGE_EXIT_CODE: i32 = 2;

/// Path to an optional JSON settings file.
pub const ENV_CONFIG_PATH: &str = "DATABACKUP_CONFIG";
/// Overrides [`DEFAULT_KEY_PREFIX`].
pub const ENV_KEY_PREFIX: &str = "DATABACKUP_KEY_PREFIX";
/// Directory where archives are staged before upload.
pub const ENV_TEMP_DIR: &str = "DATABACKUP_TEMP_DIR";
/// Region override for both storage clients.
pub const ENV_REGION: &str = "DATABACKUP_REGION";
/// Server-side encryption mode for cold storage.
pub const ENV_SSE: &str = "DATABACKUP_SSE";
/// Upload strategy (`independent` or `fail_fast`).
pub const ENV_UPLOAD_STRATEGY: &str = "DATABACKUP_UPLOAD_STRATEGY";
/// Cleanup policy (`always` or `on_success`).
pub const ENV_CLEANUP_POLICY: &str = "DATABACKUP_CLEANUP_POLICY";
/// Log level.
pub const ENV_LOG_LEVEL: &str = "DATABACKUP_LOG_LEVEL";
/// Log format (`pretty` or `json`).
pub const ENV_LOG_FORMAT: &str = "DATABACKUP_LOG_FORMAT";
/// Exit code used for usage errors.
pub const ENV_USAGE_EXIT_CODE: &str = "DATABACKUP_USAGE_EXIT_CODE";
