//! Providers that hand unimplemented operations to another dispatcher.

use std::fmt;
use std::sync::Arc;

use ruststack_asf::{
    DispatchTable, HandlerResponse, ProviderError, RequestContext, ServiceProvider,
    ServiceRequest, ServiceRequestHandler,
};
use ruststack_core::HttpResponse;
use tracing::debug;

use crate::dispatcher::BackendDispatcher;

type ForwardFn = Arc<dyn Fn(&mut RequestContext) -> Result<HttpResponse, ProviderError> + Send + Sync>;

/// A provider whose operations fall back to a forwarding function.
///
/// Every operation of the wrapped provider first runs the provider's own
/// handler. If that handler reports the operation as not implemented, the
/// request is forwarded and the forwarded HTTP response is returned as is.
/// Every other outcome, errors included, is returned unchanged.
pub struct ForwardingFallbackDispatcher {
    service: String,
    table: DispatchTable,
}

impl ForwardingFallbackDispatcher {
    /// Wrap every operation of `provider` with a fallback to `forward`.
    pub fn new<P, F>(provider: Arc<P>, forward: F) -> Self
    where
        P: ServiceProvider + ?Sized,
        F: Fn(&mut RequestContext) -> Result<HttpResponse, ProviderError> + Send + Sync + 'static,
    {
        let service = provider.service_name().to_owned();
        let forward: ForwardFn = Arc::new(forward);

        let mut table = DispatchTable::new();
        for (operation, handler) in provider.dispatch_table().iter() {
            table.insert(operation, with_fallback(Arc::clone(handler), Arc::clone(&forward)));
        }
        Self { service, table }
    }

    /// Invoke an operation by name.
    ///
    /// # Errors
    ///
    /// As [`DispatchTable::dispatch`].
    pub fn dispatch(
        &self,
        context: &mut RequestContext,
        request: ServiceRequest,
    ) -> Result<HandlerResponse, ProviderError> {
        self.table.dispatch(context, request)
    }
}

impl ServiceProvider for ForwardingFallbackDispatcher {
    fn service_name(&self) -> &str {
        &self.service
    }

    fn dispatch_table(self: Arc<Self>) -> DispatchTable {
        self.table.clone()
    }
}

impl fmt::Debug for ForwardingFallbackDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardingFallbackDispatcher")
            .field("service", &self.service)
            .field("table", &self.table)
            .finish()
    }
}

fn with_fallback(handler: ServiceRequestHandler, forward: ForwardFn) -> ServiceRequestHandler {
    Arc::new(move |context: &mut RequestContext, request: ServiceRequest| {
        match handler(&mut *context, request) {
            Err(ProviderError::NotImplemented(signal)) => {
                debug!(operation = %context.operation, %signal, "forwarding unimplemented operation");
                forward(context).map(HandlerResponse::Http)
            }
            other => other,
        }
    })
}

impl BackendDispatcher {
    /// Wrap `provider` so that unimplemented operations are proxied to the
    /// backend engine.
    pub fn wrap_with_fallback<P>(self: &Arc<Self>, provider: Arc<P>) -> ForwardingFallbackDispatcher
    where
        P: ServiceProvider + ?Sized,
    {
        let dispatcher = Arc::clone(self);
        ForwardingFallbackDispatcher::new(provider, move |context| {
            dispatcher.proxy_call(context).map_err(ProviderError::from)
        })
    }
}
