//! Values partitioned by AWS account and region.
//!
//! Backend engines keep one instance per (account, region) partition, the
//! way LocalStack's `AccountRegionBundle` does. [`AccountRegionStore`] is the
//! concurrent map holding those instances.

use std::sync::Arc;

use dashmap::DashMap;

use crate::types::{AccountId, AwsRegion};

type Partition = (AccountId, AwsRegion);

/// Concurrent map from (account, region) to a shared value.
///
/// `T` may be unsized, so a store can hold trait objects directly.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use ruststack_core::{AccountId, AccountRegionStore, AwsRegion};
///
/// let store = AccountRegionStore::<str>::new();
/// store.insert(AccountId::default(), AwsRegion::global(), Arc::from("iam"));
///
/// let found = store.get(&AccountId::default(), &AwsRegion::global());
/// assert_eq!(found.as_deref(), Some("iam"));
/// assert!(store.get(&AccountId::default(), &AwsRegion::default()).is_none());
/// ```
#[derive(Debug)]
pub struct AccountRegionStore<T: ?Sized + Send + Sync> {
    partitions: DashMap<Partition, Arc<T>>,
}

impl<T: ?Sized + Send + Sync> AccountRegionStore<T> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            partitions: DashMap::new(),
        }
    }

    /// Set the value of a partition, returning the value it replaces.
    pub fn insert(&self, account: AccountId, region: AwsRegion, value: Arc<T>) -> Option<Arc<T>> {
        self.partitions.insert((account, region), value)
    }

    /// The value of a partition.
    #[must_use]
    pub fn get(&self, account: &AccountId, region: &AwsRegion) -> Option<Arc<T>> {
        self.partitions
            .get(&(account.clone(), region.clone()))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// The value of some partition, if the store is not empty.
    #[must_use]
    pub fn any(&self) -> Option<Arc<T>> {
        self.partitions
            .iter()
            .next()
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Number of populated partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    /// Whether no partition is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

impl<T: ?Sized + Send + Sync> Default for AccountRegionStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
