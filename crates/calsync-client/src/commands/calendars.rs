//! `calsync calendars`: show calendars and the one new events go to.

use calsync_engine::{CalendarSelector, Selection};
use calsync_providers::{CalendarDescriptor, CalendarProvider};

use crate::config::ClientConfig;
use crate::error::ClientResult;

use super::build_provider;

/// Lists available calendars.
pub async fn list(config: &ClientConfig, json: bool) -> ClientResult<()> {
    let provider = build_provider(config);
    let calendars = provider.list_calendars().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&calendars)?);
        return Ok(());
    }

    if calendars.is_empty() {
        println!("No calendars in {}", config.calendar_dir().display());
    }
    for calendar in &calendars {
        println!("{}", describe(calendar));
    }
    Ok(())
}

/// Shows the calendar the platform ranking picks.
///
/// On platforms that allow it this creates the fallback calendar when none
/// exists, exactly as an add would.
pub async fn select(config: &ClientConfig, json: bool) -> ClientResult<()> {
    let selector = CalendarSelector::for_platform(
        build_provider(config),
        config.sync.platform,
        &config.sync.cloud_source_pattern,
        config.sync.provider_timeout(),
    )?;

    match selector.select_calendar().await? {
        Selection::Selected(selected) if json => {
            println!("{}", serde_json::to_string_pretty(&selected.calendar)?);
        }
        Selection::Selected(selected) => {
            println!(
                "{} ({} ranking{})",
                describe(&selected.calendar),
                selector.ranking().name(),
                if selected.created { ", created" } else { "" }
            );
        }
        Selection::NoneFound if json => println!("null"),
        Selection::NoneFound => println!("No calendar available for {}", config.sync.platform),
    }
    Ok(())
}

/// One-line description of a calendar.
pub fn describe(calendar: &CalendarDescriptor) -> String {
    let mut flags = Vec::new();
    if calendar.is_primary {
        flags.push("primary");
    }
    if !calendar.writable {
        flags.push("read-only");
    }

    let mut line = format!("{}  {}", calendar.id, calendar.title);
    if let Some(ref source) = calendar.source_name {
        line.push_str(&format!("  [{}]", source));
    }
    if !flags.is_empty() {
        line.push_str(&format!("  ({})", flags.join(", ")));
    }
    line
}
