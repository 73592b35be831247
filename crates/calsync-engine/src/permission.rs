//! Calendar permission gate.

use std::sync::Arc;
use std::time::Duration;

use calsync_providers::{AccessStatus, CalendarProvider, ProviderErrorCode, ProviderResult};
use tracing::{debug, warn};

use crate::bounded::bounded;

/// Asks the provider for calendar access before anything else touches it.
///
/// Provider errors while asking read as [`AccessStatus::Denied`]. Only a
/// timeout is returned as an error, so the caller can report it as a failed
/// write instead of a denial.
pub struct PermissionGate {
    provider: Arc<dyn CalendarProvider>,
    timeout: Duration,
}

impl PermissionGate {
    /// Creates a gate over `provider`.
    pub fn new(provider: Arc<dyn CalendarProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Requests calendar access.
    pub async fn request_access(&self) -> ProviderResult<AccessStatus> {
        let provider = self.provider.name();
        match bounded(self.timeout, "request_access", provider, self.provider.request_access()).await {
            Ok(status) => {
                debug!(provider = %provider, status = ?status, "Calendar access answered");
                Ok(status)
            }
            Err(e) if e.code() == ProviderErrorCode::Timeout => Err(e),
            Err(e) => {
                warn!(provider = %provider, error = %e, "Calendar permission request failed");
                Ok(AccessStatus::Denied)
            }
        }
    }
}
