//! Dispatch error taxonomy.

use ruststack_asf::{ProviderError, ServiceException};

/// Errors raised while routing an operation to a backend handler.
///
/// `Configuration` and `NoMatchingRoute` indicate that the backend engine
/// was set up incorrectly and are never turned into client-facing service
/// errors. `Service` carries a backend's error response translated into a
/// [`ServiceException`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The service's backend is missing or its routes are unusable.
    #[error("cannot route service {service}: {reason}")]
    Configuration {
        /// The service being routed.
        service: String,
        /// What went wrong.
        reason: String,
    },

    /// No route of the service's table matches the request path.
    #[error("no route of service {service} matches path {path}")]
    NoMatchingRoute {
        /// The service being routed.
        service: String,
        /// The unmatched request path.
        path: String,
    },

    /// The backend answered with an error.
    #[error(transparent)]
    Service(#[from] ServiceException),
}

impl DispatchError {
    /// Create a configuration error.
    pub fn configuration(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// The service exception, if this error carries one.
    #[must_use]
    pub fn as_service_exception(&self) -> Option<&ServiceException> {
        match self {
            Self::Service(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DispatchError> for ProviderError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Service(e) => Self::Service(e),
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}
