//! Time windows and day boundaries.
//!
//! This module provides [`TimeWindow`] for defining query ranges and
//! [`DayZone`], which decides where a "calendar day" begins and ends when the
//! duplicate sweep looks at the day around an event.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A time window for querying calendar entries.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a time window from a start time and duration.
    pub fn from_duration(start: DateTime<Utc>, duration: Duration) -> Self {
        Self::new(start, start + duration)
    }

    /// Creates the window covering one calendar day in `tz`.
    ///
    /// The window runs from the first instant of `date` to the first instant
    /// of the next date, so a day with a daylight-saving change lasts 23 or 25
    /// hours.
    pub fn for_date<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
        let next = date.succ_opt().unwrap_or(date);
        Self {
            start: start_of_day(date, tz),
            end: start_of_day(next, tz),
        }
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window.
    ///
    /// Uses half-open interval semantics: `[start, end)`.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }

    /// Checks if an entry with the given start and end overlaps this window.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// First instant of `date` in `tz`, also when midnight falls in a gap.
fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight).earliest() {
        Some(start) => start.with_timezone(&Utc),
        None => {
            // Skipped midnight: the day starts when the clock jumps, which is
            // midnight read with the offset in force before the jump.
            let before = tz.offset_from_utc_datetime(&(midnight - Duration::days(1))).fix();
            Utc.from_utc_datetime(&(midnight - before))
        }
    }
}

/// Where calendar days begin.
///
/// Serialized as `"local"`, `"utc"` or a fixed offset such as `"+03:00"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DayZone {
    /// The host's local timezone.
    #[default]
    Local,
    /// UTC.
    Utc,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

impl DayZone {
    /// Returns the UTC offset in effect at the given instant.
    pub fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset {
        match self {
            Self::Local => Local.offset_from_utc_datetime(&instant.naive_utc()).fix(),
            Self::Utc => Utc.fix(),
            Self::Fixed(offset) => *offset,
        }
    }

    /// Returns the calendar date of an instant in this zone.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset_at(instant)).date_naive()
    }

    /// Returns the full calendar day containing the given instant.
    pub fn day_window(&self, instant: DateTime<Utc>) -> TimeWindow {
        let date = self.date_of(instant);
        match self {
            Self::Local => TimeWindow::for_date(date, &Local),
            Self::Utc => TimeWindow::for_date(date, &Utc),
            Self::Fixed(offset) => TimeWindow::for_date(date, offset),
        }
    }

    /// Returns true if both instants fall on the same calendar day.
    pub fn same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.date_of(a) == self.date_of(b)
    }
}

impl FromStr for DayZone {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "local" => return Ok(Self::Local),
            "utc" | "z" => return Ok(Self::Utc),
            _ => {}
        }

        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(CoreError::InvalidOffset(s.to_string())),
        };
        let (hours, minutes) = rest
            .split_once(':')
            .ok_or_else(|| CoreError::InvalidOffset(s.to_string()))?;
        let hours: i32 = hours
            .parse()
            .map_err(|_| CoreError::InvalidOffset(s.to_string()))?;
        let minutes: i32 = minutes
            .parse()
            .map_err(|_| CoreError::InvalidOffset(s.to_string()))?;
        if minutes >= 60 {
            return Err(CoreError::InvalidOffset(s.to_string()));
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Self::Fixed)
            .ok_or_else(|| CoreError::InvalidOffset(s.to_string()))
    }
}

impl TryFrom<String> for DayZone {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayZone> for String {
    fn from(value: DayZone) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DayZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Utc => f.write_str("utc"),
            Self::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{LocalResult, NaiveDateTime};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    mod time_window {
        use super::*;

        #[test]
        fn utc_day() {
            let window = DayZone::Utc.day_window(utc(2025, 8, 15, 9, 0));
            assert_eq!(window.start, utc(2025, 8, 15, 0, 0));
            assert_eq!(window.end, utc(2025, 8, 16, 0, 0));
            assert_eq!(window.duration(), Duration::days(1));
        }

        #[test]
        fn offset_day_can_start_on_previous_utc_date() {
            let zone: DayZone = "+03:00".parse().unwrap();
            let window = zone.day_window(utc(2025, 8, 15, 1, 0));
            assert_eq!(window.start, utc(2025, 8, 14, 21, 0));
            assert_eq!(window.end, utc(2025, 8, 15, 21, 0));
        }

        #[test]
        fn half_open() {
            let window = TimeWindow::new(utc(2025, 8, 15, 0, 0), utc(2025, 8, 16, 0, 0));
            assert!(window.contains(utc(2025, 8, 15, 0, 0)));
            assert!(!window.contains(utc(2025, 8, 16, 0, 0)));
        }

        #[test]
        fn overlap() {
            let window = TimeWindow::new(utc(2025, 8, 15, 0, 0), utc(2025, 8, 16, 0, 0));
            assert!(window.overlaps(utc(2025, 8, 14, 23, 0), utc(2025, 8, 15, 1, 0)));
            assert!(!window.overlaps(utc(2025, 8, 14, 20, 0), utc(2025, 8, 15, 0, 0)));
        }

        /// A zone moving from +01:00 to +02:00 at `switch` (UTC).
        #[derive(Debug, Clone, Copy)]
        struct SpringForward {
            switch: NaiveDateTime,
        }

        impl SpringForward {
            fn at(d: u32, h: u32) -> Self {
                Self {
                    switch: NaiveDate::from_ymd_opt(2025, 3, d)
                        .unwrap()
                        .and_hms_opt(h, 0, 0)
                        .unwrap(),
                }
            }

            fn winter() -> FixedOffset {
                FixedOffset::east_opt(3600).unwrap()
            }

            fn summer() -> FixedOffset {
                FixedOffset::east_opt(7200).unwrap()
            }
        }

        impl TimeZone for SpringForward {
            type Offset = FixedOffset;

            fn from_offset(_: &FixedOffset) -> Self {
                Self::at(30, 1)
            }

            fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
                self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
            }

            fn offset_from_local_datetime(
                &self,
                local: &NaiveDateTime,
            ) -> LocalResult<FixedOffset> {
                let winter = *local - Self::winter() < self.switch;
                let summer = *local - Self::summer() >= self.switch;
                match (winter, summer) {
                    (true, true) => LocalResult::Ambiguous(Self::winter(), Self::summer()),
                    (true, false) => LocalResult::Single(Self::winter()),
                    (false, true) => LocalResult::Single(Self::summer()),
                    (false, false) => LocalResult::None,
                }
            }

            fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
                self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
            }

            fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
                if *utc < self.switch {
                    Self::winter()
                } else {
                    Self::summer()
                }
            }
        }

        #[test]
        fn short_day_spans_local_midnights() {
            let zone = SpringForward::at(30, 1);
            let date = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap();
            let window = TimeWindow::for_date(date, &zone);

            assert_eq!(window.start, utc(2025, 3, 29, 23, 0));
            assert_eq!(window.end, utc(2025, 3, 30, 22, 0));
            assert_eq!(window.duration(), Duration::hours(23));
            // 23:30 local on the 29th belongs to the previous day.
            assert!(!window.contains(utc(2025, 3, 29, 22, 30)));
            assert!(window.contains(utc(2025, 3, 29, 23, 30)));
        }

        #[test]
        fn skipped_midnight_starts_at_the_jump() {
            let zone = SpringForward::at(29, 23);
            let date = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap();
            let window = TimeWindow::for_date(date, &zone);

            assert_eq!(window.start, utc(2025, 3, 29, 23, 0));
            assert_eq!(window.end, utc(2025, 3, 30, 22, 0));
        }

        #[test]
        #[should_panic(expected = "TimeWindow start must be <= end")]
        fn rejects_inverted() {
            TimeWindow::new(utc(2025, 8, 16, 0, 0), utc(2025, 8, 15, 0, 0));
        }
    }

    mod day_zone {
        use super::*;

        #[test]
        fn parse_variants() {
            assert_eq!("local".parse::<DayZone>().unwrap(), DayZone::Local);
            assert_eq!("UTC".parse::<DayZone>().unwrap(), DayZone::Utc);
            assert_eq!(
                "-05:30".parse::<DayZone>().unwrap(),
                DayZone::Fixed(FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap())
            );
            assert!("05:00".parse::<DayZone>().is_err());
            assert!("+5".parse::<DayZone>().is_err());
            assert!("+05:75".parse::<DayZone>().is_err());
        }

        #[test]
        fn same_day_respects_offset() {
            let zone: DayZone = "+03:00".parse().unwrap();
            // 22:30 UTC on the 14th is already the 15th at +03:00.
            assert!(zone.same_day(utc(2025, 8, 14, 22, 30), utc(2025, 8, 15, 9, 0)));
            assert!(!DayZone::Utc.same_day(utc(2025, 8, 14, 22, 30), utc(2025, 8, 15, 9, 0)));
        }

        #[test]
        fn display_roundtrip() {
            for raw in ["local", "utc", "+03:00"] {
                let zone: DayZone = raw.parse().unwrap();
                assert_eq!(zone.to_string(), raw);
            }
        }
    }
}
