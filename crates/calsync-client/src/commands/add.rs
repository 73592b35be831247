//! `calsync add`: add events to the calendar once.

use std::path::Path;

use calsync_core::Event;
use calsync_engine::{CalendarSync, MessageBundle, SyncOutcome};
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ClientResult;

use super::{build_sync, read_events};

/// One line of `--json` output.
#[derive(Debug, Serialize)]
struct AddReport<'a> {
    key: String,
    name: &'a str,
    #[serde(flatten)]
    outcome: &'a SyncOutcome,
}

/// Adds every event in the input; returns false if any add failed.
pub async fn run(events: &Path, config: &ClientConfig, json: bool) -> ClientResult<bool> {
    let events = read_events(events).await?;
    let sync = build_sync(config)?;
    let outcomes = add_all(&sync, &events, &config.messages).await;

    for (event, outcome) in events.iter().zip(&outcomes) {
        if json {
            let report = AddReport {
                key: event.sync_key().to_string(),
                name: &event.name,
                outcome,
            };
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{}: {}", event.name, outcome);
        }
    }

    Ok(outcomes.iter().all(SyncOutcome::is_success))
}

/// Adds events one after another, each reported through the notifier.
pub async fn add_all(sync: &CalendarSync, events: &[Event], bundle: &MessageBundle) -> Vec<SyncOutcome> {
    let mut outcomes = Vec::with_capacity(events.len());
    for event in events {
        outcomes.push(sync.add_event_with_feedback(event, bundle).await);
    }
    outcomes
}
