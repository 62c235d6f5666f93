//! The dispatcher routing structured operations to backend handlers.

use std::sync::Arc;

use http::HeaderValue;
use ruststack_asf::{RequestContext, ServiceException, ServiceRequest, ServiceResponse, create_aws_request_context};
use ruststack_backend::{BackendError, BackendRegistry, RouteHandler};
use ruststack_core::{HttpResponse, RustStackConfig};
use tracing::{debug, info, warn};

use crate::cache::RoutingTableCache;
use crate::error::DispatchError;
use crate::routing::{RoutingTable, build_routing_table};
use crate::translate::translate_response;

/// Header carrying the caller's account id to backend handlers.
pub const ACCOUNT_ID_HEADER: &str = "x-ruststack-account-id";

/// Routes structured operations to the path-routed handlers of a backend
/// engine.
///
/// One dispatcher is shared by the whole process; its routing tables are
/// built lazily, once per service, and kept for the dispatcher's lifetime.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use http::{Method, StatusCode};
/// use ruststack_asf::{Protocol, RequestContext, ServiceModel};
/// use ruststack_backend::{StaticBackend, StaticBackendRegistry};
/// use ruststack_core::{AccountId, AwsRegion, HttpRequest, HttpResponse, RustStackConfig};
/// use ruststack_fallback::BackendDispatcher;
///
/// let registry = StaticBackendRegistry::new();
/// registry.register_global(
///     "kinesis",
///     Arc::new(StaticBackend::new().route("/", |_, _, _| {
///         Ok(HttpResponse::json(StatusCode::OK, &serde_json::json!({"StreamNames": []})))
///     })),
/// );
/// let dispatcher = BackendDispatcher::new(Arc::new(registry), RustStackConfig::default());
///
/// let service = Arc::new(ServiceModel::new("kinesis", Protocol::Json, "2013-12-02"));
/// let mut context = RequestContext::new(
///     service.operation("ListStreams"),
///     AwsRegion::default(),
///     AccountId::default(),
///     HttpRequest::new(Method::POST, "/"),
/// );
/// let response = dispatcher.call_with_context(&mut context, false).unwrap();
/// assert_eq!(response["StreamNames"], serde_json::json!([]));
/// ```
pub struct BackendDispatcher {
    registry: Arc<dyn BackendRegistry>,
    config: RustStackConfig,
    tables: RoutingTableCache,
}

impl BackendDispatcher {
    /// Create a dispatcher over `registry` with empty routing tables.
    #[must_use]
    pub fn new(registry: Arc<dyn BackendRegistry>, config: RustStackConfig) -> Self {
        Self {
            registry,
            config,
            tables: RoutingTableCache::new(),
        }
    }

    /// The dispatcher's configuration.
    #[must_use]
    pub fn config(&self) -> &RustStackConfig {
        &self.config
    }

    /// The routing tables built so far.
    #[must_use]
    pub fn tables(&self) -> &RoutingTableCache {
        &self.tables
    }

    /// The routing table of `service`, built on first use.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Configuration`] if the table cannot be built.
    pub fn routing_table(&self, service: &str) -> Result<Arc<RoutingTable>, DispatchError> {
        self.tables.get_or_build(service, || {
            let table = build_routing_table(self.registry.as_ref(), service, &self.config)?;
            info!(service, routes = table.len(), "built routing table");
            Ok(table)
        })
    }

    /// Resolve the backend handler for `path` of `service`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Configuration`] if the service's table cannot
    /// be built, [`DispatchError::NoMatchingRoute`] if no rule matches.
    pub fn resolve(&self, service: &str, path: &str) -> Result<RouteHandler, DispatchError> {
        self.routing_table(service)?.resolve(path)
    }

    /// Invoke the backend handler for the context's request.
    ///
    /// The caller's account id is attached to the request as
    /// [`ACCOUNT_ID_HEADER`], replacing any previous value.
    ///
    /// # Errors
    ///
    /// Routing failures are returned as is; a native backend error is
    /// returned as [`DispatchError::Service`] with the same type, message
    /// and status.
    pub fn dispatch(&self, context: &mut RequestContext) -> Result<HttpResponse, DispatchError> {
        let service = context.service_name().to_owned();
        let handler = self
            .resolve(&service, &context.request.path)
            .inspect_err(|e| warn!(service = %service, error = %e, "cannot route request to backend"))?;

        let account = HeaderValue::from_str(context.account_id.as_str())
            .map_err(|e| DispatchError::configuration(&service, format!("invalid account id: {e}")))?;
        context.request.headers.insert(ACCOUNT_ID_HEADER, account);

        let request = &context.request;
        let url = request.url(&self.config.hostname);
        debug!(
            service = %service,
            operation = %context.operation.name,
            method = %request.method,
            path = %request.path,
            "dispatching to backend"
        );
        handler(request, &url, &request.headers).map_err(|e| {
            debug!(service = %service, error = %e, "backend raised an error");
            DispatchError::Service(backend_exception(e))
        })
    }

    /// Dispatch the context's request and translate the response.
    ///
    /// `ResponseMetadata` is kept only when `include_metadata` is set.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Service`] for backend errors and error
    /// statuses, routing errors otherwise.
    pub fn call_with_context(
        &self,
        context: &mut RequestContext,
        include_metadata: bool,
    ) -> Result<ServiceResponse, DispatchError> {
        let response = self.dispatch(context)?;
        if response.is_error() {
            debug!(
                operation = %context.operation,
                status = response.status.as_u16(),
                "backend answered with an error status"
            );
        }
        Ok(translate_response(&context.operation, &response, include_metadata)?)
    }

    /// Call the context's operation with different parameters.
    ///
    /// A fresh request is serialized from `request`. Headers of the original
    /// request that the fresh one does not set are copied over.
    ///
    /// # Errors
    ///
    /// As [`Self::call_with_context`], plus serialization failures as
    /// [`DispatchError::Service`].
    pub fn call_with_modified_request(
        &self,
        context: &RequestContext,
        request: ServiceRequest,
    ) -> Result<ServiceResponse, DispatchError> {
        let mut local = create_aws_request_context(
            &context.operation,
            request,
            context.region.clone(),
            context.account_id.clone(),
            &self.config.hostname,
        )?;
        for name in context.request.headers.keys() {
            if !local.request.headers.contains_key(name) {
                for value in context.request.headers.get_all(name) {
                    local.request.headers.append(name.clone(), value.clone());
                }
            }
        }
        self.call_with_context(&mut local, false)
    }

    /// Dispatch the context's request and return the raw response.
    ///
    /// # Errors
    ///
    /// As [`Self::dispatch`].
    pub fn proxy_call(&self, context: &mut RequestContext) -> Result<HttpResponse, DispatchError> {
        self.dispatch(context)
    }
}

impl std::fmt::Debug for BackendDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendDispatcher")
            .field("config", &self.config)
            .field("tables", &self.tables)
            .finish_non_exhaustive()
    }
}

fn backend_exception(err: BackendError) -> ServiceException {
    ServiceException::with_raw_status(err.error_type, err.message, err.code)
}
