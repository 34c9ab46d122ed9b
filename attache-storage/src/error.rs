//! Upload pipeline error types.

use attache_http_client::HttpClientError;
use std::time::Duration;
use thiserror::Error;

/// Result type for upload operations.
pub type Result<T> = std::result::Result<T, UploadError>;

/// Upload pipeline errors.
#[derive(Debug, Error)]
pub enum UploadError {
    /// No endpoint was configured for a remote attempt.
    #[error("Upload endpoint URL is not configured")]
    MissingEndpoint,

    /// The configuration cannot be used (bad URL, unknown method).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// File validation failed.
    #[error("{0}")]
    Validation(#[from] crate::ValidationError),

    /// The request could not be delivered or no response arrived.
    #[error("Network error: {0}")]
    Network(String),

    /// The transfer did not complete in time.
    #[error("Upload timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-2xx status.
    #[error("Upload failed with status {status}: {status_text}")]
    HttpStatus {
        /// Numeric status code.
        status: u16,
        /// Reason phrase.
        status_text: String,
    },

    /// A 2xx response could not be turned into an upload result.
    #[error("Invalid response format: {0}")]
    InvalidResponseFormat(String),

    /// The file contents could not be read.
    #[error("Failed to read file: {0}")]
    FileRead(String),
}

impl UploadError {
    /// Check if this error came from the transport (after a request was attempted).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Timeout(_)
                | Self::HttpStatus { .. }
                | Self::InvalidResponseFormat(_)
        )
    }

    /// Check if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingEndpoint | Self::Configuration(_))
    }

    /// HTTP status of the server response, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<HttpClientError> for UploadError {
    fn from(err: HttpClientError) -> Self {
        match err {
            HttpClientError::Timeout(duration) => Self::Timeout(duration),
            HttpClientError::Connection(msg) => Self::Network(msg),
            HttpClientError::InvalidUrl(msg)
            | HttpClientError::RequestBuild(msg)
            | HttpClientError::ClientBuild(msg) => Self::Configuration(msg),
            HttpClientError::Decode(msg) => Self::InvalidResponseFormat(msg),
        }
    }
}
