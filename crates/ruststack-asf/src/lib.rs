//! Structured AWS operation framework contract for RustStack.
//!
//! This crate defines what a structured operation consumer sees:
//!
//! - **Models**: [`ServiceModel`] / [`OperationModel`] with the service's wire [`Protocol`]
//! - **Context**: [`RequestContext`] carrying operation, region, account and the HTTP request
//! - **Errors**: [`ServiceException`] (code, message, status) and the [`NotImplemented`] signal
//! - **Serializer**: [`create_aws_request_context`] builds an HTTP request from parameters
//! - **Parser**: [`parse_response`] decodes an HTTP response into a [`ServiceResponse`]
//! - **Dispatch**: [`DispatchTable`] maps operation names to provider handlers

pub mod context;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod parser;
pub mod serializer;

pub use context::{RequestContext, ServiceRequest, ServiceResponse};
pub use dispatch::{DispatchTable, HandlerResponse, ServiceProvider, ServiceRequestHandler};
pub use error::{NotImplemented, ProviderError, ServiceException};
pub use model::{OperationModel, Protocol, ServiceModel};
pub use parser::parse_response;
pub use serializer::create_aws_request_context;
