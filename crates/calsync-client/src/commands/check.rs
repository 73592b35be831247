//! `calsync check`: show sync keys and ledger state without touching calendars.

use std::path::Path;
use std::sync::Arc;

use calsync_core::Event;
use calsync_engine::{CacheStore, JsonFileStore};
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ClientResult;

use super::read_events;

/// Ledger state of one event.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub key: String,
    pub name: String,
    pub synced: bool,
}

/// Prints the key and synced state of every event in the input.
pub async fn run(events: &Path, config: &ClientConfig, json: bool) -> ClientResult<()> {
    let events = read_events(events).await?;
    let store = Arc::new(JsonFileStore::open(config.ledger_path())?);
    let cache = CacheStore::new(store, config.sync.namespace.clone());

    for report in check_all(&cache, &events) {
        if json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            let state = if report.synced { "synced" } else { "not synced" };
            println!("{}  {}  ({})", report.key, state, report.name);
        }
    }
    Ok(())
}

/// Looks every event up in the ledger.
pub fn check_all(cache: &CacheStore, events: &[Event]) -> Vec<CheckReport> {
    events
        .iter()
        .map(|event| {
            let key = event.sync_key();
            CheckReport {
                synced: cache.has(&key),
                key: key.to_string(),
                name: event.name.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use calsync_core::Timestamp;
    use calsync_engine::MemoryStore;

    #[test]
    fn reports_ledger_state() {
        let cache = CacheStore::new(Arc::new(MemoryStore::new()), "calsync:calendar-events");
        let synced = Event::new(
            1,
            "Tech Conference 2025",
            Timestamp::parse("2025-08-15T09:00:00Z").unwrap(),
            Timestamp::parse("2025-08-15T17:00:00Z").unwrap(),
        );
        let pending = Event::new(
            2,
            "Art Exhibition",
            Timestamp::parse("2025-08-15T09:00:00Z").unwrap(),
            Timestamp::parse("2025-08-15T12:00:00Z").unwrap(),
        );
        cache.put(&synced.sync_key());

        let reports = check_all(&cache, &[synced, pending]);
        assert_eq!(
            reports,
            vec![
                CheckReport {
                    key: "1:Tech Conference 2025:2025-08-15T09:00:00Z".into(),
                    name: "Tech Conference 2025".into(),
                    synced: true,
                },
                CheckReport {
                    key: "2:Art Exhibition:2025-08-15T09:00:00Z".into(),
                    name: "Art Exhibition".into(),
                    synced: false,
                },
            ]
        );
    }
}
