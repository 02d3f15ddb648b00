//! Logging initialisation primitives and configuration.
//!
//! # Design
//! - Builds a `tracing::Dispatch` instead of installing a global subscriber;
//!   the resulting [`Logger`] is handed to each component explicitly.
//! - Records the build SHA once to avoid inconsistencies across modules.
//! - The [`LoggingGuard`] owns the root logger for the lifetime of the process
//!   and flushes the sink when dropped.

use std::io::{self, IsTerminal, Write};
use std::str::FromStr;

use once_cell::sync::OnceCell;
use tracing::Dispatch;
use tracing_subscriber::{EnvFilter, fmt, fmt::MakeWriter, layer::SubscriberExt};

use crate::error::TelemetryError;
use crate::logger::Logger;

/// Default logging target when `RUST_LOG` is not provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Log level string (e.g., `info`, `debug`).
    pub level: &'a str,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormat,
    /// Build identifier recorded in structured logs.
    pub build_sha: &'a str,
    /// Emit ANSI colour codes in pretty output.
    pub ansi: bool,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            build_sha: option_env!("DATABACKUP_BUILD_SHA").unwrap_or("dev"),
            ansi: io::stdout().is_terminal(),
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable log lines.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Stable name used in settings files and environment variables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            _ => Err(TelemetryError::UnknownLogFormat {
                value: value.to_string(),
            }),
        }
    }
}

/// Owns the process-wide root logger and flushes the sink when dropped.
#[derive(Debug)]
pub struct LoggingGuard {
    logger: Logger,
}

impl LoggingGuard {
    /// Root logger for the process; clone or derive component loggers from it.
    #[must_use]
    pub const fn logger(&self) -> &Logger {
        &self.logger
    }
}

impl Drop for LoggingGuard {
    fn drop(&mut self) {
        let _ = io::stdout().flush();
    }
}

/// Build the process logger that writes to stdout.
///
/// Nothing is installed globally; the returned guard must be kept alive until
/// the process is about to exit.
#[must_use]
pub fn init_logging(config: &LoggingConfig<'_>) -> LoggingGuard {
    BUILD_SHA
        .set(config.build_sha.to_string())
        .ok()
        .or(Some(()));

    let dispatch = build_dispatch(config, io::stdout);
    LoggingGuard {
        logger: Logger::new(dispatch),
    }
}

/// Access the build SHA recorded during logging initialisation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// Assemble a dispatcher that formats events into `writer`.
#[must_use]
pub fn build_dispatch<W>(config: &LoggingConfig<'_>, writer: W) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = build_env_filter(config.level);
    match config.format {
        LogFormat::Json => Dispatch::new(
            tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .json()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(writer),
            ),
        ),
        LogFormat::Pretty => Dispatch::new(
            tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(config.ansi)
                    .with_writer(writer),
            ),
        ),
    }
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
