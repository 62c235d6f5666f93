//! Backend instances and their path-routed handlers.

use std::fmt;
use std::sync::Arc;

use http::HeaderMap;
use ruststack_core::{HttpRequest, HttpResponse};

use crate::error::BackendError;

/// Type-erased backend handler.
///
/// Called with the request, its absolute URL and its headers; produces the
/// raw status/headers/body triple or a native [`BackendError`].
pub type RouteHandler =
    Arc<dyn Fn(&HttpRequest, &str, &HeaderMap) -> Result<HttpResponse, BackendError> + Send + Sync>;

/// Wrap a closure into a [`RouteHandler`].
pub fn route_handler<F>(f: F) -> RouteHandler
where
    F: Fn(&HttpRequest, &str, &HeaderMap) -> Result<HttpResponse, BackendError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// One concrete backend instance of a service.
///
/// All instances of the same service register identical URL patterns; only
/// their state differs.
pub trait BackendInstance: Send + Sync + fmt::Debug {
    /// The instance's `(url pattern, handler)` registrations, in registration order.
    fn url_paths(&self) -> Vec<(String, RouteHandler)>;
}

/// A backend instance defined by an explicit list of routes.
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use ruststack_backend::{BackendInstance, StaticBackend};
/// use ruststack_core::HttpResponse;
///
/// let backend = StaticBackend::new().route("/<path:path>", |_, _, _| {
///     Ok(HttpResponse::from_status(StatusCode::OK, "ok"))
/// });
/// assert_eq!(backend.url_paths().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct StaticBackend {
    routes: Vec<(String, RouteHandler)>,
}

impl StaticBackend {
    /// Create a backend without routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route, builder style.
    #[must_use]
    pub fn route<F>(mut self, pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&HttpRequest, &str, &HeaderMap) -> Result<HttpResponse, BackendError>
            + Send
            + Sync
            + 'static,
    {
        self.routes.push((pattern.into(), route_handler(handler)));
        self
    }
}

impl fmt::Debug for StaticBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticBackend")
            .field(
                "routes",
                &self.routes.iter().map(|(p, _)| p.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl BackendInstance for StaticBackend {
    fn url_paths(&self) -> Vec<(String, RouteHandler)> {
        self.routes.clone()
    }
}
