//! Event to CalendarEntryData conversion.
//!
//! This module turns a backend [`Event`] into the provider-agnostic
//! [`CalendarEntryData`] written to a calendar:
//!
//! 1. The title gets the [`ENTRY_MARKER`] prefix so entries created here can
//!    be recognised later.
//! 2. Description, location, organizer, seats and registration window are
//!    laid out as notes, one item per paragraph, always in the same order.
//!
//! The conversion is pure: the same event always yields byte-identical data.

use calsync_core::{CalendarEntryData, Event, Timestamp};

/// Glyph prefixed to every entry title created by calsync.
pub const ENTRY_MARKER: &str = "🎉";

/// Separator between note items.
const NOTE_SEPARATOR: &str = "\n\n";

/// Converts an [`Event`] to [`CalendarEntryData`].
pub fn normalize_event(event: &Event) -> CalendarEntryData {
    CalendarEntryData {
        title: format!("{} {}", ENTRY_MARKER, event.name),
        start: event.event_start.instant(),
        end: event.event_end.instant(),
        location: event.location().map(str::to_string),
        notes: build_notes(event),
    }
}

/// Removes the marker prefix (and the whitespace after it) from a title.
pub fn strip_marker(title: &str) -> &str {
    let trimmed = title.trim_start();
    match trimmed.strip_prefix(ENTRY_MARKER) {
        Some(rest) => rest.trim_start(),
        None => trimmed,
    }
}

fn build_notes(event: &Event) -> String {
    let mut notes = vec![format!("📝 {}", event.description)];

    if let Some(location) = event.location() {
        notes.push(format!("📍 Location: {}", location));
    }

    if let Some(organizer) = event.organizer() {
        notes.push(format!("🏢 Organized by: {}", organizer));
    }

    notes.push(format!("💺 Available seats: {}", event.seats_available));
    notes.push(format!(
        "📅 Registration: {} - {}",
        format_date(&event.registration_start),
        format_date(&event.registration_end)
    ));

    notes.join(NOTE_SEPARATOR)
}

fn format_date(ts: &Timestamp) -> String {
    ts.instant().format("%Y-%m-%d").to_string()
}
