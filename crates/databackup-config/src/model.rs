//! Typed settings model.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use databackup_telemetry::LogFormat;
use serde::{Deserialize, Serialize};

use crate::defaults::{DEFAULT_KEY_PREFIX, DEFAULT_LOG_LEVEL, DEFAULT_USAGE_EXIT_CODE};
use crate::error::ConfigError;

/// How requested uploads are sequenced once the archive exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStrategy {
    /// Attempt every requested target and aggregate the results.
    #[default]
    Independent,
    /// Stop at the first failed upload; later targets are not attempted.
    FailFast,
}

/// When the staged archive is removed from local disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Remove the archive on every exit path once uploads have finished.
    #[default]
    Always,
    /// Remove the archive only when every requested upload succeeded.
    OnSuccess,
}

/// Server-side encryption requested for cold-storage objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerSideEncryption {
    /// `AES256` managed keys.
    #[default]
    Aes256,
    /// `aws:kms` with the bucket's default key.
    Kms,
    /// No encryption header is sent.
    #[serde(rename = "none")]
    Disabled,
}

macro_rules! named_setting {
    ($ty:ty, $field:literal, { $($name:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = ConfigError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    _ => Err(ConfigError::invalid($field, "unknown_variant", value)),
                }
            }
        }
    };
}

named_setting!(UploadStrategy, "upload_strategy", {
    "independent" => Self::Independent,
    "fail_fast" => Self::FailFast,
    "fail-fast" => Self::FailFast,
});

named_setting!(CleanupPolicy, "cleanup_policy", {
    "always" => Self::Always,
    "on_success" => Self::OnSuccess,
    "on-success" => Self::OnSuccess,
});

named_setting!(ServerSideEncryption, "server_side_encryption", {
    "aes256" => Self::Aes256,
    "kms" => Self::Kms,
    "aws:kms" => Self::Kms,
    "none" => Self::Disabled,
});

impl UploadStrategy {
    /// Stable setting name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Independent => "independent",
            Self::FailFast => "fail_fast",
        }
    }
}

impl CleanupPolicy {
    /// Stable setting name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::OnSuccess => "on_success",
        }
    }
}

impl ServerSideEncryption {
    /// Stable setting name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aes256 => "aes256",
            Self::Kms => "kms",
            Self::Disabled => "none",
        }
    }
}

impl Display for UploadStrategy {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl Display for CleanupPolicy {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Fully layered settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupSettings {
    /// Prefix for cold-storage keys; empty means objects land at the bucket root.
    pub key_prefix: String,
    /// Staging directory for archives; the OS temp directory when unset.
    pub temp_dir: Option<PathBuf>,
    /// Region override for both storage clients.
    pub region: Option<String>,
    /// Server-side encryption for cold-storage objects.
    pub server_side_encryption: ServerSideEncryption,
    /// Upload sequencing.
    pub upload_strategy: UploadStrategy,
    /// Archive cleanup policy.
    pub cleanup_policy: CleanupPolicy,
    /// Log level directive.
    pub log_level: String,
    /// Log format name (`pretty` or `json`); inferred from the build when unset.
    pub log_format: Option<String>,
    /// Exit code for usage errors.
    pub usage_exit_code: i32,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            temp_dir: None,
            region: None,
            server_side_encryption: ServerSideEncryption::default(),
            upload_strategy: UploadStrategy::default(),
            cleanup_policy: CleanupPolicy::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: None,
            usage_exit_code: DEFAULT_USAGE_EXIT_CODE,
        }
    }
}

impl BackupSettings {
    /// Key prefix, or `None` when objects should not be prefixed.
    #[must_use]
    pub fn key_prefix(&self) -> Option<&str> {
        let trimmed = self.key_prefix.trim_end_matches('/');
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Staging directory for archives.
    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Log format, falling back to the build default.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
            .as_deref()
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(LogFormat::infer)
    }

    /// Apply explicit command-line overrides on top of the loaded settings.
    pub fn apply(&mut self, overrides: SettingsOverrides) {
        let SettingsOverrides {
            key_prefix,
            temp_dir,
            region,
            upload_strategy,
            cleanup_policy,
            log_level,
            log_format,
        } = overrides;

        if let Some(value) = key_prefix {
            self.key_prefix = value;
        }
        if let Some(value) = temp_dir {
            self.temp_dir = Some(value);
        }
        if let Some(value) = region {
            self.region = Some(value);
        }
        if let Some(value) = upload_strategy {
            self.upload_strategy = value;
        }
        if let Some(value) = cleanup_policy {
            self.cleanup_policy = value;
        }
        if let Some(value) = log_level {
            self.log_level = value;
        }
        if let Some(value) = log_format {
            self.log_format = Some(value.as_str().to_string());
        }
    }
}

/// Settings supplied on the command line; `None` keeps the loaded value.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// Cold-storage key prefix.
    pub key_prefix: Option<String>,
    /// Staging directory.
    pub temp_dir: Option<PathBuf>,
    /// Region override.
    pub region: Option<String>,
    /// Upload sequencing.
    pub upload_strategy: Option<UploadStrategy>,
    /// Cleanup policy.
    pub cleanup_policy: Option<CleanupPolicy>,
    /// Log level directive.
    pub log_level: Option<String>,
    /// Log format.
    pub log_format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = BackupSettings::default();
        assert_eq!(settings.key_prefix(), Some("backups"));
        assert_eq!(settings.upload_strategy, UploadStrategy::Independent);
        assert_eq!(settings.cleanup_policy, CleanupPolicy::Always);
        assert_eq!(settings.server_side_encryption, ServerSideEncryption::Aes256);
        assert_eq!(settings.usage_exit_code, 2);
        assert_eq!(settings.temp_dir(), std::env::temp_dir());
    }

    #[test]
    fn key_prefix_trims_separators_and_empties() {
        let mut settings = BackupSettings {
            key_prefix: "nightly/".to_string(),
            ..BackupSettings::default()
        };
        assert_eq!(settings.key_prefix(), Some("nightly"));
        settings.key_prefix = String::new();
        assert_eq!(settings.key_prefix(), None);
        settings.key_prefix = "/".to_string();
        assert_eq!(settings.key_prefix(), None);
    }

    #[test]
    fn named_settings_parse_aliases() {
        assert_eq!("fail-fast".parse::<UploadStrategy>().ok(), Some(UploadStrategy::FailFast));
        assert_eq!("ON_SUCCESS".parse::<CleanupPolicy>().ok(), Some(CleanupPolicy::OnSuccess));
        assert_eq!(
            "aws:kms".parse::<ServerSideEncryption>().ok(),
            Some(ServerSideEncryption::Kms)
        );
        assert!(matches!(
            "sometimes".parse::<CleanupPolicy>(),
            Err(ConfigError::InvalidField {
                field: "cleanup_policy",
                reason: "unknown_variant",
                ..
            })
        ));
    }

    #[test]
    fn overrides_replace_only_provided_fields() {
        let mut settings = BackupSettings::default();
        settings.apply(SettingsOverrides {
            upload_strategy: Some(UploadStrategy::FailFast),
            log_format: Some(LogFormat::Json),
            ..SettingsOverrides::default()
        });
        assert_eq!(settings.upload_strategy, UploadStrategy::FailFast);
        assert_eq!(settings.log_format(), LogFormat::Json);
        assert_eq!(settings.cleanup_policy, CleanupPolicy::Always);
        assert_eq!(settings.key_prefix(), Some("backups"));
    }
}
