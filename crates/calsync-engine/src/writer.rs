//! Calendar entry creation.

use std::sync::Arc;
use std::time::Duration;

use calsync_core::CalendarEntryData;
use calsync_providers::{CalendarProvider, ProviderResult};
use tracing::{error, info};

use crate::bounded::bounded;

/// Issues exactly one create call per insert.
///
/// Inserting is not idempotent; callers must have ruled out duplicates first.
pub struct CalendarWriter {
    provider: Arc<dyn CalendarProvider>,
    timeout: Duration,
}

impl CalendarWriter {
    /// Creates a writer over `provider`.
    pub fn new(provider: Arc<dyn CalendarProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Creates the entry in `calendar_id` and returns its provider id.
    pub async fn insert(&self, calendar_id: &str, entry: &CalendarEntryData) -> ProviderResult<String> {
        let provider = self.provider.name();
        let result = bounded(
            self.timeout,
            "create_event",
            provider,
            self.provider.create_event(calendar_id, entry),
        )
        .await;

        match &result {
            Ok(id) => info!(
                provider = %provider,
                calendar_id = %calendar_id,
                entry_id = %id,
                title = %entry.title,
                "Calendar entry created"
            ),
            Err(e) => error!(
                provider = %provider,
                calendar_id = %calendar_id,
                error = %e,
                "Calendar entry creation failed"
            ),
        }
        result
    }
}
