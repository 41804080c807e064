//! Transform failures
//!
//! The client never retries; every failure is returned to the caller once.

use serde::Deserialize;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

/// Response body of a failed request
///
/// Keeps the raw text and, when the body is a JSON object with an
/// `error`, `message` or `detail` string, the extracted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    raw: String,
    message: Option<String>,
}

#[derive(Deserialize)]
struct JsonErrorFields {
    error: Option<serde_json::Value>,
    message: Option<String>,
    detail: Option<String>,
}

impl ErrorBody {
    /// Parse a response body
    #[must_use]
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let message = serde_json::from_str::<JsonErrorFields>(&raw)
            .ok()
            .and_then(|fields| {
                let error = fields.error.and_then(|value| match value {
                    serde_json::Value::String(s) => Some(s),
                    serde_json::Value::Object(map) => map
                        .get("message")
                        .and_then(serde_json::Value::as_str)
                        .map(str::to_string),
                    _ => None,
                });
                error.or(fields.message).or(fields.detail)
            })
            .filter(|message| !message.trim().is_empty());
        Self { raw, message }
    }

    #[inline]
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Extracted JSON message, if any
    #[inline]
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl Display for ErrorBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => f.write_str(self.raw.trim()),
        }
    }
}

/// Transform client errors
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The upload could not be framed
    #[error("could not encode upload: {0}")]
    EncodeFailed(String),

    /// Connection, DNS or TLS failure, or the body stream broke
    #[error("network error: {0}")]
    NetworkError(String),

    /// No complete response within the deadline
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// Service answered with a non-success status
    #[error("service returned {status}: {body}")]
    HttpError { status: u16, body: ErrorBody },

    /// Client could not be set up from its configuration
    #[error("invalid transform configuration: {0}")]
    InvalidConfig(String),

    /// Success status but the payload is not an image
    #[error("response is not an image (content type {content_type:?})")]
    NotImage { content_type: Option<String> },
}

/// Result type alias for transform operations
pub type TransformResult<T> = Result<T, TransformError>;
