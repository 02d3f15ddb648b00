//! # Design
//!
//! - One error type for both backends; `kind()` exposes the taxonomy callers report on.
//! - Classification of service codes is a pure function so it is testable offline.
//! - Messages stay constant; the bucket/vault and service code travel as fields.

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use thiserror::Error;

/// Boxed source error carried by backend failures.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, UploadError>;

/// Failure categories reported for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadErrorKind {
    /// The local file to upload does not exist.
    FileNotFound,
    /// Credentials were missing, invalid, expired, or denied.
    AuthenticationFailure,
    /// Network, timeout, throttling, or service availability failure.
    TransientNetworkFailure,
    /// The bucket or vault does not exist.
    DestinationNotFound,
    /// An account or service limit was exceeded.
    QuotaExceeded,
    /// Anything not covered above.
    Unknown,
}

impl UploadErrorKind {
    /// Stable identifier used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileNotFound => "file_not_found",
            Self::AuthenticationFailure => "authentication_failure",
            Self::TransientNetworkFailure => "transient_network_failure",
            Self::DestinationNotFound => "destination_not_found",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for UploadErrorKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Errors produced by the upload backends.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The local file to upload does not exist or is not a regular file.
    #[error("upload file not found")]
    FileNotFound {
        /// Requested file.
        path: PathBuf,
    },
    /// The local file exists but could not be opened for streaming.
    #[error("upload file could not be read")]
    FileRead {
        /// Requested file.
        path: PathBuf,
        /// Underlying read error.
        source: BoxError,
    },
    /// The storage service or transport rejected the request.
    #[error("storage backend request failed")]
    Backend {
        /// Classified failure category.
        kind: UploadErrorKind,
        /// Bucket or vault name.
        destination: String,
        /// Service error code when one was returned.
        code: Option<String>,
        /// Underlying SDK error.
        source: BoxError,
    },
}

impl UploadError {
    /// Failure category of this error.
    #[must_use]
    pub const fn kind(&self) -> UploadErrorKind {
        match self {
            Self::FileNotFound { .. } => UploadErrorKind::FileNotFound,
            Self::FileRead { .. } => UploadErrorKind::Unknown,
            Self::Backend { kind, .. } => *kind,
        }
    }

    /// Build a backend failure.
    pub fn backend(
        kind: UploadErrorKind,
        destination: impl Into<String>,
        code: Option<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Backend {
            kind,
            destination: destination.into(),
            code,
            source: source.into(),
        }
    }
}

/// Coarse shape of an SDK failure, before looking at service codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The request could not be sent or timed out in transit.
    Transport,
    /// The service answered with an error response.
    Service,
    /// The request could not be built (including missing credentials).
    Construction,
}

const AUTHENTICATION_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "AccountProblem",
    "AllAccessDisabled",
    "ExpiredToken",
    "ExpiredTokenException",
    "InvalidAccessKeyId",
    "InvalidClientTokenId",
    "InvalidSignatureException",
    "InvalidToken",
    "MissingAuthenticationTokenException",
    "SignatureDoesNotMatch",
    "UnrecognizedClientException",
];

const DESTINATION_CODES: &[&str] = &["NoSuchBucket", "ResourceNotFoundException"];

const QUOTA_CODES: &[&str] = &[
    "EntityTooLarge",
    "InsufficientCapacityException",
    "LimitExceededException",
    "QuotaExceededException",
    "ServiceQuotaExceededException",
];

const TRANSIENT_CODES: &[&str] = &[
    "InternalError",
    "RequestLimitExceeded",
    "RequestTimeout",
    "RequestTimeoutException",
    "ServiceUnavailable",
    "ServiceUnavailableException",
    "SlowDown",
    "Throttling",
    "ThrottlingException",
];

/// Map a service error code to a failure category.
#[must_use]
pub fn classify_error_code(code: &str) -> Option<UploadErrorKind> {
    if AUTHENTICATION_CODES.contains(&code) {
        Some(UploadErrorKind::AuthenticationFailure)
    } else if DESTINATION_CODES.contains(&code) {
        Some(UploadErrorKind::DestinationNotFound)
    } else if QUOTA_CODES.contains(&code) {
        Some(UploadErrorKind::QuotaExceeded)
    } else if TRANSIENT_CODES.contains(&code) {
        Some(UploadErrorKind::TransientNetworkFailure)
    } else {
        None
    }
}

/// Classify an SDK failure from its shape, service code, HTTP status, and rendered message.
#[must_use]
pub fn classify_failure(
    class: FailureClass,
    code: Option<&str>,
    status: Option<u16>,
    message: &str,
) -> UploadErrorKind {
    if let Some(kind) = code.and_then(classify_error_code) {
        return kind;
    }
    if message.to_ascii_lowercase().contains("credential") {
        return UploadErrorKind::AuthenticationFailure;
    }
    match (class, status) {
        (FailureClass::Transport, _) => UploadErrorKind::TransientNetworkFailure,
        (_, Some(401 | 403)) => UploadErrorKind::AuthenticationFailure,
        (_, Some(404)) => UploadErrorKind::DestinationNotFound,
        (_, Some(429 | 500 | 502 | 503 | 504)) => UploadErrorKind::TransientNetworkFailure,
        _ => UploadErrorKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn service_codes_map_to_kinds() {
        assert_eq!(
            classify_error_code("NoSuchBucket"),
            Some(UploadErrorKind::DestinationNotFound)
        );
        assert_eq!(
            classify_error_code("ResourceNotFoundException"),
            Some(UploadErrorKind::DestinationNotFound)
        );
        assert_eq!(
            classify_error_code("InvalidAccessKeyId"),
            Some(UploadErrorKind::AuthenticationFailure)
        );
        assert_eq!(
            classify_error_code("LimitExceededException"),
            Some(UploadErrorKind::QuotaExceeded)
        );
        assert_eq!(
            classify_error_code("SlowDown"),
            Some(UploadErrorKind::TransientNetworkFailure)
        );
        assert_eq!(classify_error_code("SomethingNew"), None);
    }

    #[test]
    fn failure_shape_and_status_fill_in_missing_codes() {
        assert_eq!(
            classify_failure(FailureClass::Transport, None, None, "connection reset"),
            UploadErrorKind::TransientNetworkFailure
        );
        assert_eq!(
            classify_failure(
                FailureClass::Construction,
                None,
                None,
                "no credentials in the property bag"
            ),
            UploadErrorKind::AuthenticationFailure
        );
        assert_eq!(
            classify_failure(FailureClass::Service, None, Some(403), "forbidden"),
            UploadErrorKind::AuthenticationFailure
        );
        assert_eq!(
            classify_failure(FailureClass::Service, None, Some(404), "not found"),
            UploadErrorKind::DestinationNotFound
        );
        assert_eq!(
            classify_failure(FailureClass::Service, None, Some(503), "unavailable"),
            UploadErrorKind::TransientNetworkFailure
        );
        assert_eq!(
            classify_failure(FailureClass::Service, Some("Weird"), Some(400), "bad"),
            UploadErrorKind::Unknown
        );
        assert_eq!(
            classify_failure(
                FailureClass::Service,
                Some("NoSuchBucket"),
                Some(500),
                "no such bucket"
            ),
            UploadErrorKind::DestinationNotFound
        );
    }

    #[test]
    fn upload_error_reports_kind_and_source() {
        let missing = UploadError::FileNotFound {
            path: PathBuf::from("backup.zip"),
        };
        assert_eq!(missing.kind(), UploadErrorKind::FileNotFound);
        assert!(missing.source().is_none());

        let backend = UploadError::backend(
            UploadErrorKind::QuotaExceeded,
            "vault",
            Some("LimitExceededException".to_string()),
            io::Error::other("limit"),
        );
        assert_eq!(backend.kind(), UploadErrorKind::QuotaExceeded);
        assert_eq!(backend.to_string(), "storage backend request failed");
        assert!(backend.source().is_some());
        assert_eq!(UploadErrorKind::QuotaExceeded.to_string(), "quota_exceeded");
    }
}
