//! Duplicate detection.
//!
//! Detection runs in two tiers:
//!
//! 1. **Ledger**: the event's [`SyncKey`] is looked up in the [`CacheStore`].
//!    A hit is authoritative and costs no provider call.
//! 2. **Sweep**: on a ledger miss, existing entries on the event's calendar
//!    day are fetched from every writable calendar and compared with
//!    [`MatchRules::assess`]. This catches entries added before the ledger
//!    existed, or by an earlier install.
//!
//! The comparison leans toward false positives: skipping a confusingly
//! similar event is preferable to showing the user a visible duplicate.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use calsync_core::{CalendarEntryData, DayZone, SyncKey};
use calsync_providers::{
    CalendarDescriptor, CalendarProvider, FetchOptions, ProviderEventRecord, strip_marker,
};
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::bounded::bounded;
use crate::cache::CacheStore;
use crate::error::SweepCheckFailed;

/// Length of the shared title prefix that counts as similar.
const SIMILAR_PREFIX_CHARS: usize = 5;

/// The fields of an entry that take part in duplicate matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSubject<'a> {
    /// Entry title, with or without the marker glyph.
    pub title: &'a str,
    /// Entry start.
    pub start: DateTime<Utc>,
    /// Entry location, if any.
    pub location: Option<&'a str>,
}

impl<'a> MatchSubject<'a> {
    /// Creates a subject without a location.
    pub fn new(title: &'a str, start: DateTime<Utc>) -> Self {
        Self {
            title,
            start,
            location: None,
        }
    }

    /// Builder: set the location.
    pub fn with_location(mut self, location: &'a str) -> Self {
        self.location = Some(location);
        self
    }

    /// Subject for an entry about to be written.
    pub fn from_entry(entry: &'a CalendarEntryData) -> Self {
        Self {
            title: &entry.title,
            start: entry.start,
            location: entry.location.as_deref(),
        }
    }

    /// Subject for an entry already in a calendar.
    pub fn from_record(record: &'a ProviderEventRecord) -> Self {
        Self {
            title: &record.title,
            start: record.start,
            location: record.location.as_deref(),
        }
    }
}

/// Individual signals of a comparison between two subjects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchAssessment {
    /// Normalized titles are equal.
    pub title_exact: bool,
    /// One normalized title contains the other, or they share a prefix.
    pub title_similar: bool,
    /// Starts are within the time tolerance.
    pub time_close: bool,
    /// Locations do not contradict each other.
    pub location_compatible: bool,
    /// Starts fall on the same calendar day.
    pub same_day: bool,
}

impl MatchAssessment {
    /// Returns true if the two subjects describe the same event.
    pub fn is_duplicate(&self) -> bool {
        (self.title_similar && self.time_close && self.location_compatible)
            || (self.title_exact && self.same_day)
    }
}

/// Thresholds for [`MatchRules::assess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRules {
    /// Largest start difference still considered close.
    pub time_tolerance: chrono::Duration,
    /// Zone in which calendar days are compared.
    pub day_zone: DayZone,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            time_tolerance: chrono::Duration::minutes(90),
            day_zone: DayZone::Local,
        }
    }
}

impl MatchRules {
    /// Creates rules with the given tolerance and day zone.
    pub fn new(time_tolerance: chrono::Duration, day_zone: DayZone) -> Self {
        Self {
            time_tolerance,
            day_zone,
        }
    }

    /// Compares a candidate entry with an existing one.
    pub fn assess(&self, candidate: &MatchSubject<'_>, existing: &MatchSubject<'_>) -> MatchAssessment {
        let a = normalize_title(candidate.title);
        let b = normalize_title(existing.title);

        MatchAssessment {
            title_exact: !a.is_empty() && a == b,
            title_similar: titles_similar(&a, &b),
            time_close: (candidate.start - existing.start).abs() <= self.time_tolerance,
            location_compatible: locations_compatible(candidate.location, existing.location),
            same_day: self.day_zone.same_day(candidate.start, existing.start),
        }
    }

    /// Returns true if `existing` duplicates `candidate`.
    pub fn is_duplicate(&self, candidate: &MatchSubject<'_>, existing: &MatchSubject<'_>) -> bool {
        self.assess(candidate, existing).is_duplicate()
    }
}

/// Strips the marker glyph, trims and case-folds a title.
pub fn normalize_title(title: &str) -> String {
    strip_marker(title).trim().to_lowercase()
}

fn titles_similar(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a.contains(b) || b.contains(a) {
        return true;
    }
    a.chars().count() > SIMILAR_PREFIX_CHARS
        && b.chars().count() > SIMILAR_PREFIX_CHARS
        && a.chars()
            .take(SIMILAR_PREFIX_CHARS)
            .eq(b.chars().take(SIMILAR_PREFIX_CHARS))
}

fn locations_compatible(a: Option<&str>, b: Option<&str>) -> bool {
    let a = a.map(str::trim).filter(|s| !s.is_empty());
    let b = b.map(str::trim).filter(|s| !s.is_empty());
    match (a, b) {
        (Some(a), Some(b)) => {
            let a = a.to_lowercase();
            let b = b.to_lowercase();
            a.contains(&b) || b.contains(&a)
        }
        _ => true,
    }
}

/// Two-tier duplicate detector.
pub struct DuplicateDetector {
    cache: CacheStore,
    provider: Arc<dyn CalendarProvider>,
    rules: MatchRules,
    sweep_enabled: bool,
    timeout: Duration,
}

impl fmt::Debug for DuplicateDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuplicateDetector")
            .field("cache", &self.cache)
            .field("provider", &self.provider.name())
            .field("rules", &self.rules)
            .field("sweep_enabled", &self.sweep_enabled)
            .finish()
    }
}

impl DuplicateDetector {
    /// Creates a detector with the sweep enabled.
    pub fn new(
        cache: CacheStore,
        provider: Arc<dyn CalendarProvider>,
        rules: MatchRules,
        timeout: Duration,
    ) -> Self {
        Self {
            cache,
            provider,
            rules,
            sweep_enabled: true,
            timeout,
        }
    }

    /// Builder: enable or disable the sweep.
    pub fn with_sweep(mut self, enabled: bool) -> Self {
        self.sweep_enabled = enabled;
        self
    }

    /// Returns the matching rules.
    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    /// Returns true if the sweep runs on ledger misses.
    pub fn sweep_enabled(&self) -> bool {
        self.sweep_enabled
    }

    /// Tier 1: returns true if the ledger records the key as synced.
    pub fn is_recorded(&self, key: &SyncKey) -> bool {
        self.cache.has(key)
    }

    /// Tier 2: looks for an existing entry matching `entry` on its day.
    ///
    /// Only writable calendars are searched. Returns `Ok(None)` when the
    /// sweep is disabled or there is nothing to search.
    pub async fn sweep(
        &self,
        entry: &CalendarEntryData,
        calendars: &[CalendarDescriptor],
    ) -> Result<Option<ProviderEventRecord>, SweepCheckFailed> {
        if !self.sweep_enabled {
            trace!("Sweep disabled");
            return Ok(None);
        }

        let calendar_ids: Vec<String> = calendars
            .iter()
            .filter(|c| c.writable)
            .map(|c| c.id.clone())
            .collect();
        if calendar_ids.is_empty() {
            debug!("No writable calendars to sweep");
            return Ok(None);
        }

        let window = self.rules.day_zone.day_window(entry.start);
        let options = FetchOptions::new(window.clone()).with_calendar_ids(calendar_ids);
        let provider = self.provider.name();
        let existing =
            bounded(self.timeout, "fetch_events", provider, self.provider.fetch_events(options)).await?;

        let candidate = MatchSubject::from_entry(entry);
        let found = existing.into_iter().find(|record| {
            let assessment = self.rules.assess(&candidate, &MatchSubject::from_record(record));
            trace!(
                existing = %record.title,
                assessment = ?assessment,
                "Compared with existing entry"
            );
            assessment.is_duplicate()
        });

        match &found {
            Some(record) => debug!(
                existing_id = %record.id,
                calendar_id = %record.calendar_id,
                "Sweep found matching entry"
            ),
            None => debug!(window = %window, "Sweep found no match"),
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 15, h, m, 0).unwrap()
    }

    fn rules() -> MatchRules {
        MatchRules::new(chrono::Duration::minutes(90), DayZone::Utc)
    }

    mod assessment {
        use super::*;

        #[test]
        fn marker_and_ten_minutes_apart_is_duplicate() {
            let candidate = MatchSubject::new("🎉 Tech Conference 2025", at(9, 0))
                .with_location("Online via Zoom");
            let existing =
                MatchSubject::new("Tech Conference 2025", at(9, 10)).with_location("Online via Zoom");

            let assessment = rules().assess(&candidate, &existing);
            assert!(assessment.title_exact);
            assert!(assessment.title_similar);
            assert!(assessment.time_close);
            assert!(assessment.location_compatible);
            assert!(assessment.is_duplicate());
        }

        #[test]
        fn different_titles_same_time_are_not_duplicates() {
            let candidate = MatchSubject::new("Tech Conference 2025", at(9, 0));
            let existing = MatchSubject::new("Art Exhibition", at(9, 0));

            let assessment = rules().assess(&candidate, &existing);
            assert!(!assessment.title_similar);
            assert!(!assessment.title_exact);
            assert!(assessment.time_close);
            assert!(!assessment.is_duplicate());
        }

        #[test]
        fn exact_title_same_day_far_apart() {
            let candidate = MatchSubject::new("Tech Conference 2025", at(8, 0));
            let existing = MatchSubject::new("tech conference 2025 ", at(20, 0));

            let assessment = rules().assess(&candidate, &existing);
            assert!(!assessment.time_close);
            assert!(assessment.same_day);
            assert!(assessment.is_duplicate());
        }

        #[test]
        fn similar_title_outside_tolerance() {
            let candidate = MatchSubject::new("Tech Conference 2025", at(8, 0));
            let existing = MatchSubject::new("Tech Conference Day 2", at(10, 0));

            let assessment = rules().assess(&candidate, &existing);
            assert!(assessment.title_similar);
            assert!(!assessment.title_exact);
            assert!(!assessment.is_duplicate());
        }

        #[test]
        fn tolerance_boundary_is_inclusive() {
            let candidate = MatchSubject::new("Tech Meetup", at(9, 0));
            let existing = MatchSubject::new("Tech Meetup Berlin", at(10, 30));
            assert!(rules().assess(&candidate, &existing).time_close);

            let later = MatchSubject::new("Tech Meetup Berlin", at(10, 31));
            assert!(!rules().assess(&candidate, &later).time_close);
        }

        #[test]
        fn conflicting_locations_block_fuzzy_match() {
            let candidate = MatchSubject::new("Chess Club", at(9, 0)).with_location("Room 101");
            let existing = MatchSubject::new("Chess Club Finals", at(9, 0)).with_location("Hall B");

            let assessment = rules().assess(&candidate, &existing);
            assert!(!assessment.location_compatible);
            assert!(!assessment.is_duplicate());
        }

        #[test]
        fn location_containment_is_case_insensitive() {
            assert!(locations_compatible(Some("Main Hall"), Some("main hall, building 2")));
            assert!(locations_compatible(None, Some("Hall")));
            assert!(locations_compatible(Some("  "), Some("Hall")));
            assert!(!locations_compatible(Some("Hall A"), Some("Hall B")));
        }

        #[test]
        fn title_similarity_rules() {
            assert!(titles_similar("tech conference", "tech"));
            assert!(titles_similar("robotics workshop", "robotics fair"));
            assert!(titles_similar("robot", "robotics"));
            assert!(!titles_similar("chess", "chest"));
            assert!(!titles_similar("", "anything"));
            assert!(!titles_similar("", ""));
        }

        #[test]
        fn empty_titles_never_match() {
            let candidate = MatchSubject::new("🎉", at(9, 0));
            let existing = MatchSubject::new("", at(9, 0));

            let assessment = rules().assess(&candidate, &existing);
            assert!(!assessment.title_exact);
            assert!(!assessment.title_similar);
            assert!(!assessment.is_duplicate());
        }

        #[test]
        fn same_day_follows_day_zone() {
            let late = Utc.with_ymd_and_hms(2025, 8, 15, 23, 30, 0).unwrap();
            let early = Utc.with_ymd_and_hms(2025, 8, 16, 0, 30, 0).unwrap();
            let candidate = MatchSubject::new("Night Run", late);
            let existing = MatchSubject::new("Night Run", early);

            assert!(!rules().assess(&candidate, &existing).same_day);

            let plus_two = MatchRules::new(
                chrono::Duration::minutes(0),
                "+02:00".parse::<DayZone>().unwrap(),
            );
            let assessment = plus_two.assess(&candidate, &existing);
            assert!(assessment.same_day);
            assert!(assessment.is_duplicate());
        }

        #[test]
        fn normalize_title_strips_marker() {
            assert_eq!(normalize_title("🎉 Tech Conference 2025"), "tech conference 2025");
            assert_eq!(normalize_title("  MIXED Case "), "mixed case");
        }
    }

    mod sweep {
        use super::*;
        use crate::store::MemoryStore;
        use calsync_providers::{MemoryProvider, ProviderError};

        fn entry() -> CalendarEntryData {
            CalendarEntryData {
                title: "🎉 Tech Conference 2025".into(),
                start: at(9, 0),
                end: at(17, 0),
                location: Some("Online via Zoom".into()),
                notes: String::new(),
            }
        }

        fn detector(provider: Arc<MemoryProvider>) -> DuplicateDetector {
            let cache = CacheStore::new(Arc::new(MemoryStore::new()), "test");
            DuplicateDetector::new(cache, provider, rules(), Duration::from_secs(1))
        }

        fn calendars() -> Vec<CalendarDescriptor> {
            vec![
                CalendarDescriptor::new("personal", "Personal"),
                CalendarDescriptor::new("holidays", "Holidays").with_writable(false),
            ]
        }

        #[tokio::test]
        async fn finds_match_in_writable_calendar() {
            let provider = Arc::new(
                MemoryProvider::new()
                    .with_calendar(CalendarDescriptor::new("personal", "Personal"))
                    .with_event(
                        ProviderEventRecord::new("x1", "personal", "Tech Conference 2025", at(9, 10), at(17, 0))
                            .with_location("Online via Zoom"),
                    ),
            );
            let found = detector(provider.clone())
                .sweep(&entry(), &calendars())
                .await
                .unwrap();

            assert_eq!(found.map(|r| r.id), Some("x1".to_string()));
            assert_eq!(provider.calls().fetch_events, 1);
        }

        #[tokio::test]
        async fn ignores_read_only_calendars() {
            let provider = Arc::new(MemoryProvider::new().with_event(ProviderEventRecord::new(
                "h1",
                "holidays",
                "Tech Conference 2025",
                at(9, 0),
                at(17, 0),
            )));
            let found = detector(provider).sweep(&entry(), &calendars()).await.unwrap();
            assert!(found.is_none());
        }

        #[tokio::test]
        async fn ignores_other_days() {
            let next_day = Utc.with_ymd_and_hms(2025, 8, 16, 9, 0, 0).unwrap();
            let provider = Arc::new(MemoryProvider::new().with_event(ProviderEventRecord::new(
                "x2",
                "personal",
                "Tech Conference 2025",
                next_day,
                next_day,
            )));
            let found = detector(provider).sweep(&entry(), &calendars()).await.unwrap();
            assert!(found.is_none());
        }

        #[tokio::test]
        async fn disabled_sweep_makes_no_call() {
            let provider = Arc::new(MemoryProvider::new());
            let detector = detector(provider.clone()).with_sweep(false);

            assert!(detector.sweep(&entry(), &calendars()).await.unwrap().is_none());
            assert_eq!(provider.calls().fetch_events, 0);
        }

        #[tokio::test]
        async fn no_writable_calendars_makes_no_call() {
            let provider = Arc::new(MemoryProvider::new());
            let read_only = vec![CalendarDescriptor::new("ro", "RO").with_writable(false)];

            let found = detector(provider.clone()).sweep(&entry(), &read_only).await.unwrap();
            assert!(found.is_none());
            assert_eq!(provider.calls().fetch_events, 0);
        }

        #[tokio::test]
        async fn provider_failure_is_reported() {
            let provider = Arc::new(
                MemoryProvider::new().failing_fetch(ProviderError::storage("index corrupt")),
            );
            let err = detector(provider)
                .sweep(&entry(), &calendars())
                .await
                .unwrap_err();
            assert!(err.to_string().contains("index corrupt"));
        }

        #[test]
        fn ledger_tier() {
            let detector = detector(Arc::new(MemoryProvider::new()));
            let key = SyncKey::from_raw("1:A:x");
            assert!(!detector.is_recorded(&key));
            detector.cache.put(&key);
            assert!(detector.is_recorded(&key));
        }
    }
}
