//! iCalendar rendering and parsing for local calendar entries.
//!
//! Each entry lives in its own `.ics` file holding a single VEVENT.

use calsync_core::CalendarEntryData;
use chrono::{DateTime, TimeZone, Utc};
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike,
};
use tracing::{debug, warn};

use crate::record::ProviderEventRecord;

/// Renders an entry as a complete iCalendar document.
pub fn render_entry(uid: &str, entry: &CalendarEntryData) -> String {
    let mut event = Event::new();
    event
        .uid(uid)
        .summary(&entry.title)
        .description(&entry.notes)
        .starts(entry.start)
        .ends(entry.end);
    if let Some(ref location) = entry.location {
        event.location(location);
    }

    Calendar::new().push(event.done()).done().to_string()
}

/// Parses ICS content and extracts entries for one calendar.
///
/// Unparseable documents yield no entries; VEVENTs without UID or DTSTART
/// are skipped.
pub fn parse_entries(ics: &str, calendar_id: &str) -> Vec<ProviderEventRecord> {
    let calendar = match ics.parse::<Calendar>() {
        Ok(cal) => cal,
        Err(e) => {
            warn!(error = %e, calendar_id = %calendar_id, "Failed to parse ICS content");
            return Vec::new();
        }
    };

    calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => parse_event(event, calendar_id),
            _ => None,
        })
        .collect()
}

fn parse_event(event: &Event, calendar_id: &str) -> Option<ProviderEventRecord> {
    let uid = event.get_uid()?;
    let start = convert_date_time(event.get_start()?);
    let end = event.get_end().map(convert_date_time).unwrap_or(start);

    let mut record = ProviderEventRecord::new(
        uid,
        calendar_id,
        event.get_summary().unwrap_or_default(),
        start,
        end,
    );
    if let Some(location) = event.get_location() {
        record = record.with_location(location);
    }

    debug!(uid = %record.id, title = %record.title, "Parsed entry from ICS");
    Some(record)
}

/// Converts icalendar DatePerhapsTime to a UTC instant.
///
/// All-day dates map to midnight UTC. Zoned times are read as UTC; entries
/// written by this crate are always UTC.
fn convert_date_time(dt: DatePerhapsTime) -> DateTime<Utc> {
    match dt {
        DatePerhapsTime::Date(date) => date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
        DatePerhapsTime::DateTime(cdt) => match cdt {
            CalendarDateTime::Utc(dt) => dt,
            CalendarDateTime::Floating(naive) => Utc.from_utc_datetime(&naive),
            CalendarDateTime::WithTimezone { date_time, tzid: _ } => {
                Utc.from_utc_datetime(&date_time)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ics() -> &'static str {
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Test//Test//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:evt-1@example.com\r\n\
         DTSTART:20250815T090000Z\r\n\
         DTEND:20250815T170000Z\r\n\
         SUMMARY:Tech Conference 2025\r\n\
         LOCATION:Online via Zoom\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR"
    }

    #[test]
    fn parse_basic_entry() {
        let records = parse_entries(sample_ics(), "personal");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "evt-1@example.com");
        assert_eq!(record.calendar_id, "personal");
        assert_eq!(record.title, "Tech Conference 2025");
        assert_eq!(record.location.as_deref(), Some("Online via Zoom"));
        assert_eq!(record.start, Utc.with_ymd_and_hms(2025, 8, 15, 9, 0, 0).unwrap());
        assert_eq!(record.end, Utc.with_ymd_and_hms(2025, 8, 15, 17, 0, 0).unwrap());
    }

    #[test]
    fn parse_all_day_entry() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   VERSION:2.0\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:holiday\r\n\
                   DTSTART;VALUE=DATE:20250815\r\n\
                   SUMMARY:Holiday\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR";
        let records = parse_entries(ics, "cal");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].start, Utc.with_ymd_and_hms(2025, 8, 15, 0, 0, 0).unwrap());
        assert_eq!(records[0].end, records[0].start);
        assert!(records[0].location.is_none());
    }

    #[test]
    fn render_then_parse() {
        let entry = CalendarEntryData {
            title: "🎉 Tech Conference 2025".to_string(),
            start: Utc.with_ymd_and_hms(2025, 8, 15, 9, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 8, 15, 17, 0, 0).unwrap(),
            location: Some("Online via Zoom".to_string()),
            notes: "📝 Talks".to_string(),
        };

        let ics = render_entry("uid-1", &entry);
        assert!(ics.contains("BEGIN:VEVENT"));

        let records = parse_entries(&ics, "cal");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "uid-1");
        assert_eq!(records[0].title, entry.title);
        assert_eq!(records[0].start, entry.start);
        assert_eq!(records[0].location, entry.location);
    }

    #[test]
    fn garbage_yields_nothing() {
        assert!(parse_entries("not a calendar", "cal").is_empty());
    }
}
