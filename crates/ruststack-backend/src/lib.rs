//! Contract of a path-routed backend emulation engine.
//!
//! A backend engine exposes its operations only as HTTP handlers keyed by URL
//! patterns. This crate defines how such an engine is seen from the outside:
//!
//! - [`BackendRegistry`]: lookup of a service's backend by service name
//! - [`BackendEntry`]: a single global instance or an account/region partitioned set
//! - [`BackendInstance`]: the URL pattern to [`RouteHandler`] registrations of one instance
//! - [`BackendError`]: the engine's native structured error
//!
//! [`StaticBackendRegistry`] and [`StaticBackend`] are in-memory
//! implementations for wiring engines together and for tests.

pub mod error;
pub mod handler;
pub mod registry;

pub use error::BackendError;
pub use handler::{BackendInstance, RouteHandler, StaticBackend, route_handler};
pub use registry::{BackendEntry, BackendRegistry, StaticBackendRegistry};
