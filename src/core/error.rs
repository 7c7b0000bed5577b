//! Error types for the webav client.
//!
//! Every failure is returned as a typed `WebAvError`; the client never
//! panics and never retries a failed request on its own.

use std::time::Duration;
use thiserror::Error;

/// The main error type for client operations.
#[derive(Debug, Error)]
pub enum WebAvError {
    /// No API key has been configured. Raised before any request is built.
    #[error("API key is not set")]
    MissingCredential,

    /// An argument was rejected before any network activity.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the argument.
        message: String,
    },

    /// The service refused the upload because it exceeds its size limit.
    #[error("file is too large (HTTP {status})")]
    FileTooLarge {
        /// HTTP status code returned by the service.
        status: u16,
    },

    /// The job was still pending when the wait deadline passed.
    #[error("timeout waiting for file status after {timeout:?} ({attempts} queries)")]
    Timeout {
        /// The configured wait duration.
        timeout: Duration,
        /// Number of status queries issued before giving up.
        attempts: u32,
    },

    /// A network-layer failure or a non-success HTTP response.
    #[error("transport failure{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        /// Error message or response body.
        message: String,
    },

    /// A successful response whose body could not be decoded.
    #[error("unexpected response body: {details}")]
    Decode {
        /// Details about the decoding failure.
        details: String,
    },

    /// The input stream or file failed while it was being drained.
    #[error("failed to read upload input: {0}")]
    Stream(#[from] std::io::Error),
}

impl WebAvError {
    /// Creates an `InvalidArgument` error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a `Transport` error without an HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a `Transport` error for a non-success HTTP status.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates a `Decode` error.
    pub fn decode(details: impl Into<String>) -> Self {
        Self::Decode {
            details: details.into(),
        }
    }

    /// Returns `true` for failures raised by the network layer or the remote
    /// service, as opposed to local validation.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Decode { .. } | Self::FileTooLarge { .. }
        )
    }

    /// Returns `true` if the caller may succeed by submitting the file by URL
    /// instead of uploading its bytes.
    pub fn is_retryable_by_url(&self) -> bool {
        matches!(self, Self::FileTooLarge { .. })
    }

    /// Returns the HTTP status code attached to this error, if any.
    pub fn http_status_code(&self) -> Option<u16> {
        match self {
            Self::FileTooLarge { status } => Some(*status),
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for WebAvError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// A specialized `Result` type for client operations.
pub type WebAvResult<T> = Result<T, WebAvError>;
