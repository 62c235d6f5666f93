//! Routing tables and the builder deriving them from backend instances.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ruststack_backend::{BackendEntry, BackendInstance, BackendRegistry, RouteHandler};
use ruststack_core::{AwsRegion, RustStackConfig};
use tracing::debug;

use super::pattern::RoutePattern;
use crate::error::DispatchError;

struct Route {
    pattern: RoutePattern,
    handler: RouteHandler,
}

/// A successful match of a request path against a routing table.
pub struct RouteMatch<'a> {
    /// The rule that matched.
    pub pattern: &'a str,
    /// The handler registered for the rule.
    pub handler: &'a RouteHandler,
    /// Variables bound by the rule.
    pub params: BTreeMap<String, String>,
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Immutable, ordered list of (rule, handler) entries for one service.
pub struct RoutingTable {
    service: String,
    routes: Vec<Route>,
}

impl RoutingTable {
    /// Compile `url_paths` into a table, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Configuration`] if any rule fails to compile.
    pub fn new(
        service: impl Into<String>,
        url_paths: impl IntoIterator<Item = (String, RouteHandler)>,
    ) -> Result<Self, DispatchError> {
        let service = service.into();
        let routes = url_paths
            .into_iter()
            .map(|(rule, handler)| {
                RoutePattern::parse(&rule)
                    .map(|pattern| Route { pattern, handler })
                    .map_err(|e| DispatchError::configuration(&service, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { service, routes })
    }

    /// The service this table routes.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The rules of the table, in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.pattern.as_str())
    }

    /// Match `path` against every rule in registration order.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            route.pattern.captures(path).map(|params| RouteMatch {
                pattern: route.pattern.as_str(),
                handler: &route.handler,
                params,
            })
        })
    }

    /// Resolve the handler for `path`.
    ///
    /// A table with a single route returns it without matching.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoMatchingRoute`] if no rule matches.
    pub fn resolve(&self, path: &str) -> Result<RouteHandler, DispatchError> {
        if let [only] = self.routes.as_slice() {
            return Ok(Arc::clone(&only.handler));
        }
        self.routes
            .iter()
            .find(|route| route.pattern.is_match(path))
            .map(|route| Arc::clone(&route.handler))
            .ok_or_else(|| DispatchError::NoMatchingRoute {
                service: self.service.clone(),
                path: path.to_owned(),
            })
    }
}

impl fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingTable")
            .field("service", &self.service)
            .field("patterns", &self.patterns().collect::<Vec<_>>())
            .finish()
    }
}

/// Pick the backend instance whose routes represent the service.
///
/// Partitioned backends prefer the default account in the default region,
/// then the default account in the global region, then any partition.
#[must_use]
pub fn select_backend(
    entry: &BackendEntry,
    config: &RustStackConfig,
) -> Option<Arc<dyn BackendInstance>> {
    match entry {
        BackendEntry::Global(instance) => Some(Arc::clone(instance)),
        BackendEntry::Partitioned(store) => store
            .get(&config.default_account, &config.default_region)
            .or_else(|| store.get(&config.default_account, &AwsRegion::global()))
            .or_else(|| store.any()),
    }
}

/// Build the routing table of `service` from its backend.
///
/// # Errors
///
/// Returns [`DispatchError::Configuration`] if the service is unknown to the
/// registry, no backend instance can be selected, the instance registers no
/// routes, or one of its rules is malformed.
pub fn build_routing_table(
    registry: &dyn BackendRegistry,
    service: &str,
    config: &RustStackConfig,
) -> Result<RoutingTable, DispatchError> {
    let entry = registry
        .get_backend(service)
        .ok_or_else(|| DispatchError::configuration(service, "no backend registered"))?;
    let instance = select_backend(&entry, config)
        .ok_or_else(|| DispatchError::configuration(service, "no backend instance available"))?;

    let url_paths = instance.url_paths();
    if url_paths.is_empty() {
        return Err(DispatchError::configuration(service, "backend registers no routes"));
    }
    debug!(service, routes = url_paths.len(), backend = ?instance, "building routing table");
    RoutingTable::new(service, url_paths)
}
