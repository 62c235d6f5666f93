//! Per-request context handed to providers.

use std::sync::Arc;

use ruststack_core::{AccountId, AwsRegion, HttpRequest};

use crate::model::{OperationModel, ServiceModel};

/// Parsed request parameters of an operation.
pub type ServiceRequest = serde_json::Map<String, serde_json::Value>;

/// Parsed response of an operation.
pub type ServiceResponse = serde_json::Map<String, serde_json::Value>;

/// Everything known about one incoming request.
///
/// The context is owned by the caller. The dispatch layer only reads it,
/// except for attaching its internal account header to `request.headers`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The operation being invoked.
    pub operation: OperationModel,
    /// Target region.
    pub region: AwsRegion,
    /// Calling account.
    pub account_id: AccountId,
    /// The HTTP-shaped request.
    pub request: HttpRequest,
    /// Unique request identifier.
    pub request_id: String,
    /// Parsed parameters, when available.
    pub service_request: Option<ServiceRequest>,
}

impl RequestContext {
    /// Create a context with a fresh request id.
    #[must_use]
    pub fn new(
        operation: OperationModel,
        region: AwsRegion,
        account_id: AccountId,
        request: HttpRequest,
    ) -> Self {
        Self {
            operation,
            region,
            account_id,
            request,
            request_id: uuid::Uuid::new_v4().to_string(),
            service_request: None,
        }
    }

    /// The target service.
    #[must_use]
    pub fn service(&self) -> &Arc<ServiceModel> {
        &self.operation.service
    }

    /// The target service identifier.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.operation.service.service_name
    }
}
