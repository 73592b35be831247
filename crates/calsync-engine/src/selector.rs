//! Target calendar selection.
//!
//! Calendars are enumerated once per sync and ranked by a platform strategy:
//!
//! | Platform | Ranking                                                   |
//! |----------|-----------------------------------------------------------|
//! | iOS      | source `Default` > source `iCloud` > writable > first     |
//! | Android  | primary > cloud account source > writable > first         |
//!
//! When the device has no calendar at all and the platform allows it, a local
//! "Events" calendar is created and used.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use calsync_providers::{
    CalendarDescriptor, CalendarProvider, NewCalendar, ProviderErrorCode, ProviderResult,
};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::bounded::bounded;
use crate::config::Platform;
use crate::error::{EngineError, EngineResult};

/// Strategy picking one calendar out of a non-empty list.
pub trait CalendarRanking: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Picks a calendar; returns `None` only for an empty list.
    fn choose<'a>(&self, calendars: &'a [CalendarDescriptor]) -> Option<&'a CalendarDescriptor>;
}

/// Prefers the `Default` source, then `iCloud`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSourceRanking;

impl CalendarRanking for DefaultSourceRanking {
    fn name(&self) -> &'static str {
        "default-source"
    }

    fn choose<'a>(&self, calendars: &'a [CalendarDescriptor]) -> Option<&'a CalendarDescriptor> {
        calendars
            .iter()
            .find(|c| c.source() == "Default")
            .or_else(|| calendars.iter().find(|c| c.source() == "iCloud"))
            .or_else(|| calendars.iter().find(|c| c.writable))
            .or_else(|| calendars.first())
    }
}

/// Prefers the primary calendar, then one backed by a cloud account.
#[derive(Debug, Clone)]
pub struct PrimaryRanking {
    cloud_source: Regex,
}

impl PrimaryRanking {
    /// Creates the ranking with a pattern matched against source names.
    pub fn new(cloud_source: Regex) -> Self {
        Self { cloud_source }
    }
}

impl CalendarRanking for PrimaryRanking {
    fn name(&self) -> &'static str {
        "primary"
    }

    fn choose<'a>(&self, calendars: &'a [CalendarDescriptor]) -> Option<&'a CalendarDescriptor> {
        calendars
            .iter()
            .find(|c| c.is_primary)
            .or_else(|| {
                calendars
                    .iter()
                    .find(|c| self.cloud_source.is_match(c.source()))
            })
            .or_else(|| calendars.iter().find(|c| c.writable))
            .or_else(|| calendars.first())
    }
}

/// Builds the ranking used on `platform`.
pub fn ranking_for(platform: Platform, cloud_source_pattern: &str) -> EngineResult<Box<dyn CalendarRanking>> {
    match platform {
        Platform::Ios => Ok(Box::new(DefaultSourceRanking)),
        Platform::Android => {
            let cloud_source =
                Regex::new(cloud_source_pattern).map_err(|source| EngineError::InvalidPattern {
                    pattern: cloud_source_pattern.to_string(),
                    source,
                })?;
            Ok(Box::new(PrimaryRanking::new(cloud_source)))
        }
    }
}

/// A chosen calendar together with everything that was enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedCalendar {
    /// Calendar entries will be written to.
    pub calendar: CalendarDescriptor,
    /// Every enumerated calendar, used to scope the duplicate sweep.
    pub all_calendars: Vec<CalendarDescriptor>,
    /// Whether the calendar was created during selection.
    pub created: bool,
}

/// Result of calendar selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A calendar was chosen.
    Selected(SelectedCalendar),
    /// No calendar exists and none could be created.
    NoneFound,
}

/// Chooses the calendar new entries are written to.
pub struct CalendarSelector {
    provider: Arc<dyn CalendarProvider>,
    ranking: Box<dyn CalendarRanking>,
    can_create: bool,
    timeout: Duration,
}

impl fmt::Debug for CalendarSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarSelector")
            .field("provider", &self.provider.name())
            .field("ranking", &self.ranking.name())
            .field("can_create", &self.can_create)
            .finish()
    }
}

impl CalendarSelector {
    /// Creates a selector with an explicit ranking.
    pub fn new(
        provider: Arc<dyn CalendarProvider>,
        ranking: Box<dyn CalendarRanking>,
        can_create: bool,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            ranking,
            can_create,
            timeout,
        }
    }

    /// Creates a selector following `platform` conventions.
    pub fn for_platform(
        provider: Arc<dyn CalendarProvider>,
        platform: Platform,
        cloud_source_pattern: &str,
        timeout: Duration,
    ) -> EngineResult<Self> {
        let ranking = ranking_for(platform, cloud_source_pattern)?;
        Ok(Self::new(provider, ranking, platform.can_create_calendars(), timeout))
    }

    /// Returns the ranking in use.
    pub fn ranking(&self) -> &dyn CalendarRanking {
        self.ranking.as_ref()
    }

    /// Enumerates calendars and picks one.
    ///
    /// Enumeration and creation failures read as [`Selection::NoneFound`];
    /// only timeouts are returned as errors.
    pub async fn select_calendar(&self) -> ProviderResult<Selection> {
        let calendars = match self.list().await? {
            Some(calendars) => calendars,
            None => return Ok(Selection::NoneFound),
        };

        if calendars.is_empty() {
            return self.create_fallback().await;
        }

        let Some(chosen) = self.ranking.choose(&calendars).cloned() else {
            return Ok(Selection::NoneFound);
        };
        debug!(
            calendar_id = %chosen.id,
            title = %chosen.title,
            ranking = self.ranking.name(),
            candidates = calendars.len(),
            "Selected calendar"
        );
        Ok(Selection::Selected(SelectedCalendar {
            calendar: chosen,
            all_calendars: calendars,
            created: false,
        }))
    }

    async fn list(&self) -> ProviderResult<Option<Vec<CalendarDescriptor>>> {
        let provider = self.provider.name();
        match bounded(self.timeout, "list_calendars", provider, self.provider.list_calendars()).await {
            Ok(calendars) => Ok(Some(calendars)),
            Err(e) if e.code() == ProviderErrorCode::Timeout => Err(e),
            Err(e) => {
                warn!(provider = %provider, error = %e, "Failed to enumerate calendars");
                Ok(None)
            }
        }
    }

    async fn create_fallback(&self) -> ProviderResult<Selection> {
        if !self.can_create {
            info!("No calendars configured and this platform cannot create one");
            return Ok(Selection::NoneFound);
        }

        let spec = NewCalendar::local_events();
        let provider = self.provider.name();
        let created_id =
            match bounded(self.timeout, "create_calendar", provider, self.provider.create_calendar(&spec)).await {
                Ok(id) => id,
                Err(e) if e.code() == ProviderErrorCode::Timeout => return Err(e),
                Err(e) => {
                    warn!(provider = %provider, error = %e, "Failed to create fallback calendar");
                    return Ok(Selection::NoneFound);
                }
            };
        info!(calendar_id = %created_id, title = %spec.title, "Created fallback calendar");

        let Some(calendars) = self.list().await? else {
            return Ok(Selection::NoneFound);
        };
        match calendars.iter().find(|c| c.id == created_id).cloned() {
            Some(calendar) => Ok(Selection::Selected(SelectedCalendar {
                calendar,
                all_calendars: calendars,
                created: true,
            })),
            None => {
                warn!(calendar_id = %created_id, "Created calendar missing from enumeration");
                Ok(Selection::NoneFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calsync_providers::{MemoryProvider, ProviderError};

    fn cal(id: &str) -> CalendarDescriptor {
        CalendarDescriptor::new(id, id)
    }

    fn primary() -> PrimaryRanking {
        PrimaryRanking::new(Regex::new("(?i)google").unwrap())
    }

    mod default_source {
        use super::*;

        #[test]
        fn prefers_default_then_icloud() {
            let calendars = vec![
                cal("work").with_source("Exchange"),
                cal("cloud").with_source("iCloud"),
                cal("default").with_source("Default"),
            ];
            let chosen = DefaultSourceRanking.choose(&calendars).unwrap();
            assert_eq!(chosen.id, "default");

            let chosen = DefaultSourceRanking.choose(&calendars[..2]).unwrap();
            assert_eq!(chosen.id, "cloud");
        }

        #[test]
        fn falls_back_to_writable_then_first() {
            let calendars = vec![
                cal("holidays").with_writable(false),
                cal("mine").with_source("Exchange"),
            ];
            assert_eq!(DefaultSourceRanking.choose(&calendars).unwrap().id, "mine");

            let read_only = vec![cal("a").with_writable(false), cal("b").with_writable(false)];
            assert_eq!(DefaultSourceRanking.choose(&read_only).unwrap().id, "a");
            assert!(DefaultSourceRanking.choose(&[]).is_none());
        }
    }

    mod primary_ranking {
        use super::*;

        #[test]
        fn prefers_primary() {
            let calendars = vec![
                cal("google").with_source("me@gmail via Google"),
                cal("main").with_primary(true),
            ];
            assert_eq!(primary().choose(&calendars).unwrap().id, "main");
        }

        #[test]
        fn then_cloud_source_case_insensitive() {
            let calendars = vec![
                cal("local").with_source("Local Calendar"),
                cal("g").with_source("com.GOOGLE"),
            ];
            assert_eq!(primary().choose(&calendars).unwrap().id, "g");
        }

        #[test]
        fn then_writable_then_first() {
            let calendars = vec![cal("ro").with_writable(false), cal("rw")];
            assert_eq!(primary().choose(&calendars).unwrap().id, "rw");

            let read_only = vec![cal("x").with_writable(false)];
            assert_eq!(primary().choose(&read_only).unwrap().id, "x");
        }

        #[test]
        fn invalid_pattern_is_rejected() {
            let err = ranking_for(Platform::Android, "(").unwrap_err();
            assert!(matches!(err, EngineError::InvalidPattern { .. }));
            assert!(ranking_for(Platform::Ios, "(").is_ok());
        }
    }

    mod selector {
        use super::*;

        fn selector(provider: Arc<MemoryProvider>, platform: Platform) -> CalendarSelector {
            CalendarSelector::for_platform(provider, platform, "(?i)google", Duration::from_secs(1))
                .unwrap()
        }

        #[tokio::test]
        async fn selects_and_returns_all_calendars() {
            let provider = Arc::new(
                MemoryProvider::new()
                    .with_calendar(cal("a"))
                    .with_calendar(cal("b").with_primary(true)),
            );
            let selection = selector(provider, Platform::Android)
                .select_calendar()
                .await
                .unwrap();

            let Selection::Selected(selected) = selection else {
                panic!("expected a calendar");
            };
            assert_eq!(selected.calendar.id, "b");
            assert_eq!(selected.all_calendars.len(), 2);
            assert!(!selected.created);
        }

        #[tokio::test]
        async fn creates_events_calendar_on_android() {
            let provider = Arc::new(MemoryProvider::new().with_calendar_creation(true));
            let selection = selector(provider.clone(), Platform::Android)
                .select_calendar()
                .await
                .unwrap();

            let Selection::Selected(selected) = selection else {
                panic!("expected a created calendar");
            };
            assert!(selected.created);
            assert_eq!(selected.calendar.title, "Events");
            assert_eq!(selected.calendar.source(), "Local Calendar");
            assert_eq!(provider.calls().create_calendar, 1);
            assert_eq!(provider.calls().list_calendars, 2);
        }

        #[tokio::test]
        async fn never_creates_on_ios() {
            let provider = Arc::new(MemoryProvider::new().with_calendar_creation(true));
            let selection = selector(provider.clone(), Platform::Ios)
                .select_calendar()
                .await
                .unwrap();

            assert_eq!(selection, Selection::NoneFound);
            assert_eq!(provider.calls().create_calendar, 0);
        }

        #[tokio::test]
        async fn failed_creation_is_none_found() {
            let provider = Arc::new(MemoryProvider::new());
            let selection = selector(provider.clone(), Platform::Android)
                .select_calendar()
                .await
                .unwrap();

            assert_eq!(selection, Selection::NoneFound);
            assert_eq!(provider.calls().create_calendar, 1);
        }

        #[tokio::test]
        async fn enumeration_error_is_none_found() {
            let provider = Arc::new(
                MemoryProvider::new()
                    .with_calendar(cal("a"))
                    .failing_list(ProviderError::internal("store unavailable")),
            );
            let selection = selector(provider, Platform::Android)
                .select_calendar()
                .await
                .unwrap();
            assert_eq!(selection, Selection::NoneFound);
        }

        #[tokio::test(start_paused = true)]
        async fn enumeration_timeout_is_an_error() {
            let provider = Arc::new(
                MemoryProvider::new()
                    .with_calendar(cal("a"))
                    .with_latency(Duration::from_secs(30)),
            );
            let err = selector(provider, Platform::Ios)
                .select_calendar()
                .await
                .unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::Timeout);
        }
    }
}
