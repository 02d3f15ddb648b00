//! Settings layering: defaults, optional JSON file, then environment.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use databackup_telemetry::LogFormat;

use crate::defaults::{
    ENV_CLEANUP_POLICY, ENV_CONFIG_PATH, ENV_KEY_PREFIX, ENV_LOG_FORMAT, ENV_LOG_LEVEL,
    ENV_REGION, ENV_SSE, ENV_TEMP_DIR, ENV_UPLOAD_STRATEGY, ENV_USAGE_EXIT_CODE,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::BackupSettings;

/// Source of environment variables.
pub trait EnvSource {
    /// Value of `name`, or `None` when unset.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Load settings from defaults, the settings file, and the environment.
///
/// `config_path` takes precedence over `DATABACKUP_CONFIG`. Either way, a
/// named file that does not exist is an error.
///
/// # Errors
///
/// Returns an error when the settings file cannot be read or parsed, or when
/// any setting carries an unsupported value.
pub fn load_settings(
    config_path: Option<&Path>,
    env: &impl EnvSource,
) -> ConfigResult<BackupSettings> {
    let path = config_path
        .map(Path::to_path_buf)
        .or_else(|| non_empty(env, ENV_CONFIG_PATH).map(PathBuf::from));

    let mut settings = match path {
        Some(path) => read_settings_file(&path)?,
        None => BackupSettings::default(),
    };

    apply_env(&mut settings, env)?;
    validate(&settings)?;
    Ok(settings)
}

fn read_settings_file(path: &Path) -> ConfigResult<BackupSettings> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "settings.read",
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_env(settings: &mut BackupSettings, env: &impl EnvSource) -> ConfigResult<()> {
    if let Some(value) = env.var(ENV_KEY_PREFIX) {
        settings.key_prefix = value;
    }
    if let Some(value) = non_empty(env, ENV_TEMP_DIR) {
        settings.temp_dir = Some(PathBuf::from(value));
    }
    if let Some(value) = non_empty(env, ENV_REGION) {
        settings.region = Some(value);
    }
    if let Some(value) = non_empty(env, ENV_SSE) {
        settings.server_side_encryption = value.parse()?;
    }
    if let Some(value) = non_empty(env, ENV_UPLOAD_STRATEGY) {
        settings.upload_strategy = value.parse()?;
    }
    if let Some(value) = non_empty(env, ENV_CLEANUP_POLICY) {
        settings.cleanup_policy = value.parse()?;
    }
    if let Some(value) = non_empty(env, ENV_LOG_LEVEL) {
        settings.log_level = value;
    }
    if let Some(value) = non_empty(env, ENV_LOG_FORMAT) {
        settings.log_format = Some(value);
    }
    if let Some(value) = non_empty(env, ENV_USAGE_EXIT_CODE) {
        settings.usage_exit_code = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid("usage_exit_code", "not_an_integer", &value))?;
    }
    Ok(())
}

fn validate(settings: &BackupSettings) -> ConfigResult<()> {
    if !(0..=255).contains(&settings.usage_exit_code) {
        return Err(ConfigError::invalid(
            "usage_exit_code",
            "out_of_range",
            &settings.usage_exit_code.to_string(),
        ));
    }
    if let Some(format) = settings.log_format.as_deref() {
        format
            .parse::<LogFormat>()
            .map_err(|_| ConfigError::invalid("log_format", "unknown_variant", format))?;
    }
    if settings.log_level.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            field: "log_level",
            reason: "empty",
            value: None,
        });
    }
    Ok(())
}

fn non_empty(env: &impl EnvSource, name: &str) -> Option<String> {
    env.var(name).filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CleanupPolicy, ServerSideEncryption, UploadStrategy};
    use anyhow::Result;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn empty_environment_yields_defaults() -> Result<()> {
        let settings = load_settings(None, &env(&[]))?;
        assert_eq!(settings, BackupSettings::default());
        Ok(())
    }

    #[test]
    fn environment_overrides_settings_file() -> Result<()> {
        let temp = tempfile::Builder::new()
            .prefix("databackup-config-")
            .tempdir()?;
        let path = temp.path().join("appsettings.json");
        fs::write(
            &path,
            r#"{"key_prefix": "nightly", "cleanup_policy": "on_success", "region": "eu-west-1"}"#,
        )?;

        let settings = load_settings(
            Some(&path),
            &env(&[
                (ENV_REGION, "us-east-2"),
                (ENV_UPLOAD_STRATEGY, "fail_fast"),
                (ENV_SSE, "none"),
                (ENV_USAGE_EXIT_CODE, "0"),
            ]),
        )?;

        assert_eq!(settings.key_prefix(), Some("nightly"));
        assert_eq!(settings.cleanup_policy, CleanupPolicy::OnSuccess);
        assert_eq!(settings.region.as_deref(), Some("us-east-2"));
        assert_eq!(settings.upload_strategy, UploadStrategy::FailFast);
        assert_eq!(
            settings.server_side_encryption,
            ServerSideEncryption::Disabled
        );
        assert_eq!(settings.usage_exit_code, 0);
        Ok(())
    }

    #[test]
    fn config_path_from_environment_is_used() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("settings.json");
        fs::write(&path, r#"{"log_level": "debug"}"#)?;

        let path_str = path.to_string_lossy().into_owned();
        let settings = load_settings(None, &env(&[(ENV_CONFIG_PATH, path_str.as_str())]))?;
        assert_eq!(settings.log_level, "debug");
        Ok(())
    }

    #[test]
    fn missing_settings_file_is_reported() -> Result<()> {
        let temp = TempDir::new()?;
        let missing = temp.path().join("absent.json");
        let err = load_settings(Some(&missing), &env(&[]))
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected missing file error"))?;
        assert!(matches!(
            err,
            ConfigError::Io {
                operation: "settings.read",
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn unknown_fields_in_settings_file_are_rejected() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("settings.json");
        fs::write(&path, r#"{"bucket": "not-a-setting"}"#)?;
        let err = load_settings(Some(&path), &env(&[]))
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected parse error"))?;
        assert!(matches!(err, ConfigError::Json { .. }));
        Ok(())
    }

    #[test]
    fn invalid_environment_values_are_rejected() {
        let cases = [
            (ENV_USAGE_EXIT_CODE, "abc", "usage_exit_code"),
            (ENV_USAGE_EXIT_CODE, "300", "usage_exit_code"),
            (ENV_LOG_FORMAT, "xml", "log_format"),
            (ENV_UPLOAD_STRATEGY, "parallel", "upload_strategy"),
        ];
        for (name, value, expected_field) in cases {
            let result = load_settings(None, &env(&[(name, value)]));
            assert!(
                matches!(result, Err(ConfigError::InvalidField { field, .. }) if field == expected_field),
                "expected {expected_field} to be rejected for {value}"
            );
        }
    }

    #[test]
    fn empty_key_prefix_from_environment_disables_prefix() -> Result<()> {
        let settings = load_settings(None, &env(&[(ENV_KEY_PREFIX, "")]))?;
        assert_eq!(settings.key_prefix(), None);
        Ok(())
    }
}
