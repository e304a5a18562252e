//! Error types for lectern-api

use thiserror::Error;

/// Result type alias using lectern-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the study server
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Server answered with a non-success status
    #[error("HTTP error! status: {status}")]
    Status { status: u16, body: String },

    /// Request was cancelled by the caller
    #[error("Request aborted")]
    Aborted,

    /// Unexpected response format
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Build a status error from a response code and body text
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Whether this error is a deliberate cancellation rather than a failure
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted)
    }

    /// Server-provided detail, if the body carried a FastAPI-style `detail` field
    pub fn detail(&self) -> Option<String> {
        match self {
            Error::Status { body, .. } => serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_matches_wire_wording() {
        let e = Error::status(502, "bad gateway");
        assert_eq!(e.to_string(), "HTTP error! status: 502");
    }

    #[test]
    fn test_aborted_is_distinguishable() {
        assert!(Error::Aborted.is_aborted());
        assert!(!Error::status(500, "").is_aborted());
        assert!(!Error::UnexpectedResponse("x".into()).is_aborted());
    }

    #[test]
    fn test_detail_from_json_body() {
        let e = Error::status(404, r#"{"detail":"Document abc not found"}"#);
        assert_eq!(e.detail().as_deref(), Some("Document abc not found"));
    }

    #[test]
    fn test_detail_absent_for_plain_body() {
        assert!(Error::status(500, "Internal Server Error").detail().is_none());
        assert!(Error::Aborted.detail().is_none());
    }
}
