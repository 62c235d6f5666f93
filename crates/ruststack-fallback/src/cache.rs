//! Memoized routing tables, built at most once per service.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::error::DispatchError;
use crate::routing::RoutingTable;

#[derive(Default)]
struct Slot {
    table: OnceLock<Arc<RoutingTable>>,
    building: Mutex<()>,
}

/// Append-only cache of routing tables keyed by service.
///
/// Concurrent first requests for the same service run the build once; the
/// others wait on the per-service guard and then share the built table.
/// Requests for other services are not blocked. A failed build is not
/// remembered, so the next request retries it.
#[derive(Default)]
pub struct RoutingTableCache {
    slots: DashMap<String, Arc<Slot>>,
}

impl RoutingTableCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the table of `service`, building it with `build` on first use.
    ///
    /// # Errors
    ///
    /// Returns the error of `build` when the table is not cached yet and the
    /// build fails.
    pub fn get_or_build<F>(&self, service: &str, build: F) -> Result<Arc<RoutingTable>, DispatchError>
    where
        F: FnOnce() -> Result<RoutingTable, DispatchError>,
    {
        let existing = self.slots.get(service).map(|slot| Arc::clone(slot.value()));
        let slot = existing.unwrap_or_else(|| {
            Arc::clone(self.slots.entry(service.to_owned()).or_default().value())
        });
        if let Some(table) = slot.table.get() {
            return Ok(Arc::clone(table));
        }

        let _guard = slot.building.lock();
        if let Some(table) = slot.table.get() {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(build()?);
        Ok(Arc::clone(slot.table.get_or_init(|| table)))
    }

    /// The cached table of `service`, if built.
    #[must_use]
    pub fn get(&self, service: &str) -> Option<Arc<RoutingTable>> {
        self.slots
            .get(service)
            .and_then(|slot| slot.table.get().map(Arc::clone))
    }

    /// Whether the table of `service` has been built.
    #[must_use]
    pub fn contains(&self, service: &str) -> bool {
        self.get(service).is_some()
    }

    /// Number of built tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.table.get().is_some()).count()
    }

    /// Whether no table has been built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RoutingTableCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut services: Vec<String> = self
            .slots
            .iter()
            .filter(|slot| slot.table.get().is_some())
            .map(|slot| slot.key().clone())
            .collect();
        services.sort();
        f.debug_struct("RoutingTableCache")
            .field("services", &services)
            .finish()
    }
}
