//! Native error type of backend handlers.

/// Structured error raised by a backend handler instead of returning an
/// HTTP error response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error_type} ({code}): {message}")]
pub struct BackendError {
    /// Error type tag (e.g. `ResourceNotFoundException`).
    pub error_type: String,
    /// Human-readable message.
    pub message: String,
    /// HTTP status code.
    pub code: u16,
}

impl BackendError {
    /// Create a new backend error.
    #[must_use]
    pub fn new(error_type: impl Into<String>, message: impl Into<String>, code: u16) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            code,
        }
    }
}
