//! `calsync ledger`: inspect the sync ledger.

use std::sync::Arc;

use calsync_engine::{CacheStore, JsonFileStore};

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Lists every synced key.
pub fn list(config: &ClientConfig, json: bool) -> ClientResult<()> {
    let path = config.ledger_path();
    let store = Arc::new(JsonFileStore::open(&path)?);
    let cache = CacheStore::new(store, config.sync.namespace.clone());
    let keys = cache.synced_keys();

    if json {
        println!("{}", serde_json::to_string_pretty(&keys)?);
        return Ok(());
    }

    if keys.is_empty() {
        println!("No synced events in {}", path.display());
    }
    for key in keys {
        println!("{}", key);
    }
    Ok(())
}
