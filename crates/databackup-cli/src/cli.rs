//! Argument parsing and the backup run sequence.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::error::ErrorKind;
use clap::{Args, Parser};
use databackup_app::{BackupRequest, BackupTargets, run_backup};
use databackup_config::defaults::DEFAULT_USAGE_EXIT_CODE;
use databackup_config::{
    BackupSettings, CleanupPolicy, EnvSource, ProcessEnv, SettingsOverrides, UploadStrategy,
    load_settings,
};
use databackup_telemetry::{LogFormat, Logger, LoggingConfig, init_logging};
use tracing::{error, info};

use crate::error::{CliError, CliResult};

/// Usage text printed when required arguments are missing.
pub const USAGE: &str = "\
Usage: databackup <source-directory> <destination> [--s3 | --glacier | --both]
  destination: S3 bucket name or Glacier vault name
  --s3: Backup to S3 only
  --glacier: Backup to Glacier only
  --both: Backup to both S3 and Glacier (default)";

#[derive(Debug, Parser)]
#[command(
    name = "databackup",
    version,
    about = "Archive a directory and upload it to S3 and/or Glacier",
    override_usage = "databackup <source-directory> <destination> [--s3 | --glacier | --both]"
)]
struct Cli {
    /// Directory to archive.
    #[arg(value_name = "source-directory")]
    source_directory: Option<PathBuf>,
    /// S3 bucket name or Glacier vault name.
    #[arg(value_name = "destination")]
    destination: Option<String>,
    #[command(flatten)]
    mode: ModeArgs,
    /// JSON settings file (defaults to $DATABACKUP_CONFIG).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Prefix for S3 object keys; empty stores at the bucket root.
    #[arg(long, value_name = "PREFIX")]
    key_prefix: Option<String>,
    /// Directory the archive is staged in.
    #[arg(long, value_name = "DIR")]
    temp_dir: Option<PathBuf>,
    /// AWS region override.
    #[arg(long)]
    region: Option<String>,
    /// Stop at the first failed upload instead of attempting every target.
    #[arg(long)]
    fail_fast: bool,
    /// Keep the staged archive when any upload fails.
    #[arg(long)]
    keep_on_failure: bool,
    /// Log level directive (overridden by RUST_LOG).
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
    /// Log output format.
    #[arg(long, value_name = "FORMAT", value_parser = parse_log_format)]
    log_format: Option<LogFormat>,
}

#[derive(Debug, Default, Args)]
#[group(multiple = false)]
struct ModeArgs {
    /// Backup to S3 only.
    #[arg(long)]
    s3: bool,
    /// Backup to Glacier only.
    #[arg(long)]
    glacier: bool,
    /// Backup to both S3 and Glacier (default).
    #[arg(long)]
    both: bool,
}

impl ModeArgs {
    const fn targets(&self) -> BackupTargets {
        if self.s3 {
            BackupTargets::cold_only()
        } else if self.glacier {
            BackupTargets::archive_only()
        } else {
            BackupTargets::both()
        }
    }
}

impl Cli {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            key_prefix: self.key_prefix.clone(),
            temp_dir: self.temp_dir.clone(),
            region: self.region.clone(),
            upload_strategy: self.fail_fast.then_some(UploadStrategy::FailFast),
            cleanup_policy: self.keep_on_failure.then_some(CleanupPolicy::OnSuccess),
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        }
    }

    fn settings(&self, env: &impl EnvSource) -> CliResult<BackupSettings> {
        let mut settings = load_settings(self.config.as_deref(), env).map_err(|err| {
            CliError::usage(format!(
                "{:#}",
                anyhow::Error::new(err).context("failed to load settings")
            ))
        })?;
        settings.apply(self.overrides());
        Ok(settings)
    }

    fn request(&self) -> Option<BackupRequest> {
        let source_directory = self.source_directory.clone()?;
        let destination = self.destination.clone()?;
        Some(BackupRequest::new(
            source_directory,
            destination,
            self.mode.targets(),
        ))
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse().map_err(|_| format!("unknown log format `{value}`"))
}

/// Usage exit code from the environment alone, for errors raised before the
/// full settings are available.
fn fallback_usage_exit_code(env: &impl EnvSource) -> i32 {
    load_settings(None, env).map_or(DEFAULT_USAGE_EXIT_CODE, |settings| settings.usage_exit_code)
}

/// Parse the process arguments, run one backup, and return the exit code.
pub async fn run() -> i32 {
    run_with(std::env::args_os(), &ProcessEnv).await
}

/// Run with explicit arguments (including the program name) and environment.
///
/// Exit codes: `0` on success (and for `--help`/`--version`), the configured
/// usage code for invalid invocations, and `1` when the backup fails.
pub async fn run_with<I, T>(args: I, env: &impl EnvSource) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            if let Err(write_err) = err.print() {
                eprintln!("error: failed to render usage: {write_err}");
            }
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => fallback_usage_exit_code(env),
            };
        }
    };

    let settings = match cli.settings(env) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code(fallback_usage_exit_code(env));
        }
    };

    let Some(request) = cli.request() else {
        eprintln!("{USAGE}");
        return settings.usage_exit_code;
    };

    let logging = LoggingConfig {
        level: &settings.log_level,
        format: settings.log_format(),
        ..LoggingConfig::default()
    };
    let guard = init_logging(&logging);
    let logger = guard.logger().component("cli");

    match execute(&settings, &request, &logger).await {
        Ok(()) => 0,
        Err(err) => err.exit_code(settings.usage_exit_code),
    }
}

async fn execute(
    settings: &BackupSettings,
    request: &BackupRequest,
    logger: &Logger,
) -> CliResult<()> {
    logger.in_scope(|| {
        info!(
            source = %request.source_directory.display(),
            destination = %request.destination,
            "Data Backup Service starting"
        );
    });

    let source_is_dir = tokio::fs::metadata(&request.source_directory)
        .await
        .is_ok_and(|metadata| metadata.is_dir());
    if !source_is_dir {
        let err = CliError::usage("source directory not found");
        logger.in_scope(|| {
            error!(
                source = %request.source_directory.display(),
                error = %err.display_message(),
                "Source directory not found"
            );
        });
        return Err(err);
    }

    match run_backup(settings, request, logger).await {
        Ok(outcome) if outcome.is_success() => {
            logger.in_scope(|| {
                info!(
                    artifact = outcome.artifact.file_name().unwrap_or_default(),
                    size_bytes = outcome.artifact.size_bytes,
                    "Backup completed successfully"
                );
            });
            Ok(())
        }
        Ok(outcome) => {
            let failed: Vec<&str> = outcome
                .results
                .iter()
                .filter(|result| !result.success)
                .map(|result| result.destination_kind.as_str())
                .collect();
            let err = CliError::failure(anyhow!(
                "{} of {} uploads failed",
                failed.len(),
                outcome.results.len()
            ));
            logger.in_scope(|| {
                error!(
                    status = %outcome.status,
                    failed = ?failed,
                    error = %err.display_message(),
                    "Backup operation failed"
                );
            });
            Err(err)
        }
        Err(source) => {
            let err = CliError::failure(anyhow::Error::new(source).context("backup operation"));
            logger.in_scope(|| {
                error!(error = %err.display_message(), "Backup operation failed");
            });
            Err(err)
        }
    }
}
