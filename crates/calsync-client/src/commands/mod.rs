//! Subcommand implementations and the wiring they share.

pub mod add;
pub mod calendars;
pub mod check;
pub mod config;
pub mod ledger;

use std::path::Path;
use std::sync::Arc;

use calsync_core::Event;
use calsync_engine::{CalendarSync, DesktopNotifier, JsonFileStore, LogNotifier, Notifier};
use calsync_providers::local::LocalProvider;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::config::{ClientConfig, NotifierKind};
use crate::error::{ClientError, ClientResult};

/// Parses events from JSON text: one event object or an array of them.
///
/// Errors name the offending array entry and the serde reason, such as a
/// missing `id`.
pub fn parse_events(json: &str) -> ClientResult<Vec<Event>> {
    let input: Value = serde_json::from_str(json).map_err(|e| ClientError::Input(e.to_string()))?;
    match input {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                Event::deserialize(item)
                    .map_err(|e| ClientError::Input(format!("event #{}: {}", index + 1, e)))
            })
            .collect(),
        other => Event::deserialize(other)
            .map(|event| vec![event])
            .map_err(|e| ClientError::Input(e.to_string())),
    }
}

/// Reads events from a JSON file, or stdin when the path is `-`.
pub async fn read_events(path: &Path) -> ClientResult<Vec<Event>> {
    let json = if path == Path::new("-") {
        let mut buffer = String::new();
        tokio::io::stdin().read_to_string(&mut buffer).await?;
        buffer
    } else {
        tokio::fs::read_to_string(path).await.map_err(|e| {
            ClientError::Input(format!("failed to read {}: {}", path.display(), e))
        })?
    };
    let events = parse_events(&json)?;
    debug!(count = events.len(), "Read events");
    Ok(events)
}

/// Builds the provider for the configured calendar directory.
pub fn build_provider(config: &ClientConfig) -> Arc<LocalProvider> {
    Arc::new(LocalProvider::new(config.local_config()))
}

/// Builds the notifier selected in the configuration.
pub fn build_notifier(kind: NotifierKind) -> Arc<dyn Notifier> {
    match kind {
        NotifierKind::Log => Arc::new(LogNotifier),
        NotifierKind::Desktop => Arc::new(DesktopNotifier::new("calsync")),
    }
}

/// Builds the sync engine over the local provider and the ledger file.
pub fn build_sync(config: &ClientConfig) -> ClientResult<CalendarSync> {
    let store = Arc::new(JsonFileStore::open(config.ledger_path())?);
    let sync = CalendarSync::new(build_provider(config), store, config.sync.clone())?
        .with_notifier(build_notifier(config.notifier));
    Ok(sync)
}
