//! Error types of the structured operation framework.
//!
//! [`ServiceException`] is the caller-facing error shape: a machine-readable
//! code, a human-readable message and an HTTP status. [`NotImplemented`] is the
//! signal a provider raises for an operation it declines to handle.

use std::fmt;

use http::StatusCode;

/// An AWS-style service error.
#[derive(Debug)]
pub struct ServiceException {
    /// The error code (e.g. `QueueDoesNotExist`).
    pub code: String,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: StatusCode,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for ServiceException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceException({}): {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceException {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl ServiceException {
    /// Create a new `ServiceException`.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>, status_code: StatusCode) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status_code,
            source: None,
        }
    }

    /// Create a `ServiceException` from a raw numeric status.
    ///
    /// Values outside the valid HTTP range map to 500.
    #[must_use]
    pub fn with_raw_status(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        let status_code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(code, message, status_code)
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // -- Convenience constructors --

    /// The operation is not known to the service.
    #[must_use]
    pub fn invalid_action(operation: &str) -> Self {
        Self::new(
            "InvalidAction",
            format!("The action {operation} is not valid for this endpoint."),
            StatusCode::BAD_REQUEST,
        )
    }

    /// Validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("ValidationException", message, StatusCode::BAD_REQUEST)
    }

    /// Internal failure while processing a request or response.
    #[must_use]
    pub fn internal_failure(message: impl Into<String>) -> Self {
        Self::new("InternalFailure", message, StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Raised by a provider for an operation it does not implement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("operation {operation} of service {service} is not implemented")]
pub struct NotImplemented {
    /// Service name.
    pub service: String,
    /// Operation name.
    pub operation: String,
}

impl NotImplemented {
    /// Create a new not-implemented signal.
    #[must_use]
    pub fn new(service: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            operation: operation.into(),
        }
    }
}

/// Error returned by a provider operation.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider declines to handle this operation.
    #[error(transparent)]
    NotImplemented(#[from] NotImplemented),

    /// A modeled service error.
    #[error(transparent)]
    Service(#[from] ServiceException),

    /// Any other failure.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
