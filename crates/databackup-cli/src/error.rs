//! CLI error type separating usage problems from operational failures.

use std::fmt::{self, Display, Formatter};

/// Exit code for a failed backup operation.
pub(crate) const FAILURE_EXIT_CODE: i32 = 1;

#[derive(Debug)]
pub(crate) enum CliError {
    /// The invocation itself was wrong; exits with the usage code.
    Usage(String),
    /// The backup ran and failed.
    Failure(anyhow::Error),
}

pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self, usage_exit_code: i32) -> i32 {
        match self {
            Self::Usage(_) => usage_exit_code,
            Self::Failure(_) => FAILURE_EXIT_CODE,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Usage(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(CliError::usage("missing").exit_code(2), 2);
        assert_eq!(CliError::usage("missing").exit_code(0), 0);
        assert_eq!(CliError::failure(anyhow!("boom")).exit_code(2), 1);
    }

    #[test]
    fn failure_message_includes_context_chain() {
        let err = CliError::failure(anyhow!("root cause").context("backup operation"));
        assert_eq!(err.display_message(), "backup operation: root cause");
        assert_eq!(CliError::usage("bad flag").display_message(), "bad flag");
        assert_eq!(err.to_string(), "cli error");
    }
}
