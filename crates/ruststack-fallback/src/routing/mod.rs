//! Routing tables of backend handlers.

mod pattern;
mod table;

pub use pattern::{PatternError, RoutePattern};
pub use table::{RouteMatch, RoutingTable, build_routing_table, select_backend};
