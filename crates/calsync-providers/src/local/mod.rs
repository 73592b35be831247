//! Local calendar directory provider.
//!
//! This module provides a [`LocalProvider`] that stores calendars as
//! directories and entries as individual iCalendar files. It stands in for a
//! device calendar store on desktop hosts and in end-to-end tests.
//!
//! # Example
//!
//! ```ignore
//! use calsync_providers::local::{LocalConfig, LocalProvider};
//!
//! let provider = LocalProvider::new(LocalConfig::new("~/.local/share/calsync/calendars"));
//! let calendars = provider.list_calendars().await?;
//! ```

mod config;
mod ics;
mod provider;

pub use config::{CALENDAR_META_FILE, CalendarMeta, LocalConfig};
pub use provider::LocalProvider;
