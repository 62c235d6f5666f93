//! Backend lookup by service name.

use std::sync::Arc;

use dashmap::DashMap;
use ruststack_core::AccountRegionStore;

use crate::handler::BackendInstance;

/// How a service keeps its backend instances.
#[derive(Debug, Clone)]
pub enum BackendEntry {
    /// A single instance shared by all accounts and regions.
    Global(Arc<dyn BackendInstance>),
    /// One instance per (account, region) partition.
    Partitioned(Arc<AccountRegionStore<dyn BackendInstance>>),
}

/// Lookup of a service's backend by service name.
pub trait BackendRegistry: Send + Sync {
    /// The backend entry registered for `service`, if any.
    fn get_backend(&self, service: &str) -> Option<BackendEntry>;
}

/// In-memory [`BackendRegistry`].
#[derive(Debug, Default)]
pub struct StaticBackendRegistry {
    backends: DashMap<String, BackendEntry>,
}

impl StaticBackendRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single global instance for `service`.
    pub fn register_global(&self, service: impl Into<String>, instance: Arc<dyn BackendInstance>) {
        self.register(service, BackendEntry::Global(instance));
    }

    /// Register a partitioned set of instances for `service`.
    pub fn register_partitioned(
        &self,
        service: impl Into<String>,
        store: Arc<AccountRegionStore<dyn BackendInstance>>,
    ) {
        self.register(service, BackendEntry::Partitioned(store));
    }

    /// Register (or replace) the entry for `service`.
    pub fn register(&self, service: impl Into<String>, entry: BackendEntry) {
        let service = service.into();
        tracing::debug!(service = %service, "registered backend");
        self.backends.insert(service, entry);
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether no service is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl BackendRegistry for StaticBackendRegistry {
    fn get_backend(&self, service: &str) -> Option<BackendEntry> {
        self.backends.get(service).map(|e| e.value().clone())
    }
}
