//! Fallback dispatch of structured AWS operations to a path-routed backend.
//!
//! Providers implement AWS operations as structured handlers. Operations a
//! provider does not implement can still be served by a backend emulation
//! engine that only exposes URL-pattern routed HTTP handlers. This crate
//! bridges the two:
//!
//! - [`RoutingTable`]: the compiled (rule, handler) list of one service,
//!   built from its backend instance by [`build_routing_table`]
//! - [`RoutingTableCache`]: routing tables built at most once per service
//! - [`BackendDispatcher`]: resolves and invokes backend handlers for a
//!   [`RequestContext`](ruststack_asf::RequestContext) and translates their
//!   responses back into structured responses or service exceptions
//! - [`ForwardingFallbackDispatcher`]: wraps a provider so that operations
//!   it reports as not implemented are proxied to the backend

mod cache;
mod dispatcher;
mod error;
mod fallback;
pub mod routing;
mod translate;

pub use cache::RoutingTableCache;
pub use dispatcher::{ACCOUNT_ID_HEADER, BackendDispatcher};
pub use error::DispatchError;
pub use fallback::ForwardingFallbackDispatcher;
pub use routing::{RouteMatch, RoutePattern, RoutingTable, build_routing_table};
pub use translate::{UNKNOWN_ERROR_CODE, translate_response};
