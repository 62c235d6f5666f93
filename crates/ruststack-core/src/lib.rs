//! Core types, configuration, and state management for RustStack.
//!
//! This crate provides the building blocks shared by the structured operation
//! framework, the backend engine contract, and the fallback dispatch layer:
//! AWS account/region identifiers, environment-driven configuration,
//! multi-account/multi-region partitioned storage, and the HTTP-shaped
//! request/response values both sides of the dispatch bridge agree on.

mod config;
mod error;
mod message;
mod state;
mod types;

pub use config::RustStackConfig;
pub use error::{RustStackError, RustStackResult};
pub use message::{HttpRequest, HttpResponse};
pub use state::AccountRegionStore;
pub use types::{AccountId, AwsRegion};
