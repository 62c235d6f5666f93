//! Provider dispatch tables.
//!
//! A provider implements one handler per operation. Its [`DispatchTable`]
//! maps operation names to those handlers so that callers can invoke an
//! operation by name without knowing the concrete provider type.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ruststack_core::HttpResponse;

use crate::context::{RequestContext, ServiceRequest, ServiceResponse};
use crate::error::{ProviderError, ServiceException};

/// What a provider handler produces.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResponse {
    /// A structured response, serialized by the framework.
    Structured(ServiceResponse),
    /// A ready-made HTTP response, passed through to the client unchanged.
    Http(HttpResponse),
}

/// Type-erased handler for one operation.
pub type ServiceRequestHandler = Arc<
    dyn Fn(&mut RequestContext, ServiceRequest) -> Result<HandlerResponse, ProviderError>
        + Send
        + Sync,
>;

/// Operation name to handler mapping for one provider.
#[derive(Clone, Default)]
pub struct DispatchTable {
    handlers: BTreeMap<String, ServiceRequestHandler>,
}

impl DispatchTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, builder style.
    #[must_use]
    pub fn with<F>(mut self, operation: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut RequestContext, ServiceRequest) -> Result<HandlerResponse, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        self.insert(operation, Arc::new(handler));
        self
    }

    /// Register (or replace) a type-erased handler.
    pub fn insert(&mut self, operation: impl Into<String>, handler: ServiceRequestHandler) {
        self.handlers.insert(operation.into(), handler);
    }

    /// Look up the handler of an operation.
    #[must_use]
    pub fn get(&self, operation: &str) -> Option<&ServiceRequestHandler> {
        self.handlers.get(operation)
    }

    /// Registered operation names, sorted.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Iterate over (operation, handler) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceRequestHandler)> {
        self.handlers.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no operation is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invoke the handler registered for the context's operation.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidAction` service exception if no handler is
    /// registered, otherwise whatever the handler returns.
    pub fn dispatch(
        &self,
        context: &mut RequestContext,
        request: ServiceRequest,
    ) -> Result<HandlerResponse, ProviderError> {
        let handler = self
            .handlers
            .get(&context.operation.name)
            .ok_or_else(|| ServiceException::invalid_action(&context.operation.name))?;
        tracing::debug!(operation = %context.operation, "dispatching to provider");
        handler(context, request)
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("operations", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A structured-operation provider for one service.
pub trait ServiceProvider: Send + Sync + 'static {
    /// The service identifier this provider implements.
    fn service_name(&self) -> &str;

    /// One handler per operation the provider declares.
    fn dispatch_table(self: Arc<Self>) -> DispatchTable;
}
