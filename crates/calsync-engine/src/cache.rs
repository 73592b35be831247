//! Sync ledger: which events have already been added.
//!
//! Each synced event is recorded under `"{namespace}:{sync key}"` with the
//! value `"true"`. Entries never expire. Store failures never reach the
//! caller: a failed read is a miss and a failed write is dropped, both with
//! a warning.

use std::fmt;
use std::sync::Arc;

use calsync_core::SyncKey;
use tracing::{debug, trace, warn};

use crate::store::KeyValueStore;

/// Value written for every synced key.
const SYNCED: &str = "true";

/// Ledger of synced events over a [`KeyValueStore`].
#[derive(Clone)]
pub struct CacheStore {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl CacheStore {
    /// Creates a ledger over `store` with keys prefixed by `namespace`.
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Returns the namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the storage key for a sync key.
    pub fn storage_key(&self, key: &SyncKey) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Returns true if the event was recorded as synced.
    pub fn has(&self, key: &SyncKey) -> bool {
        let storage_key = self.storage_key(key);
        match self.store.get(&storage_key) {
            Ok(Some(value)) => {
                let hit = value == SYNCED;
                trace!(key = %key, hit, "Ledger lookup");
                hit
            }
            Ok(None) => {
                trace!(key = %key, "Ledger miss");
                false
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Ledger read failed, treating as not synced");
                false
            }
        }
    }

    /// Records the event as synced.
    pub fn put(&self, key: &SyncKey) {
        let storage_key = self.storage_key(key);
        match self.store.set(&storage_key, SYNCED) {
            Ok(()) => debug!(key = %key, "Recorded synced event"),
            Err(e) => warn!(key = %key, error = %e, "Ledger write failed"),
        }
    }

    /// Lists every synced key in this namespace, sorted.
    pub fn synced_keys(&self) -> Vec<SyncKey> {
        let prefix = format!("{}:", self.namespace);
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list ledger keys");
                return Vec::new();
            }
        };

        let mut synced: Vec<SyncKey> = keys
            .iter()
            .filter_map(|k| k.strip_prefix(&prefix))
            .filter(|k| !k.is_empty())
            .map(SyncKey::from_raw)
            .collect();
        synced.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        synced
    }
}
