//! Schedule time handling for GTFS feeds.
//!
//! GTFS gives stop times as "HH:MM:SS" measured from the start of the
//! service day. Trips that run past midnight keep counting, so "25:10:00"
//! is ten past one on the following morning and must stay 90600 seconds.

use chrono::{NaiveTime, Timelike};
use std::fmt;

/// Seconds in one day.
pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Error returned when parsing an invalid schedule time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid schedule time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A scheduled time as seconds since the start of the service day.
///
/// Values of 24:00:00 and beyond are legal and never wrapped.
///
/// # Examples
///
/// ```
/// use departure_board::domain::ScheduleTime;
///
/// let t = ScheduleTime::parse("25:10:00").unwrap();
/// assert_eq!(t.seconds(), 90600);
/// assert_eq!(t.to_string(), "25:10:00");
///
/// // Single-digit hours are common in feeds
/// assert_eq!(ScheduleTime::parse("7:05:00").unwrap().seconds(), 25500);
///
/// assert!(ScheduleTime::parse("12:60:00").is_err());
/// assert!(ScheduleTime::parse("12:00").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduleTime(u32);

impl ScheduleTime {
    /// Create a schedule time from a raw second count.
    pub fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Parse "H:MM:SS" or "HH:MM:SS"; hours are unbounded above.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.trim().split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TimeError::new("expected H:MM:SS format"));
        };

        let hours = parse_digits(h).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minutes = parse_two_digits(m).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minutes > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        let seconds =
            parse_two_digits(sec).ok_or_else(|| TimeError::new("invalid second digits"))?;
        if seconds > 59 {
            return Err(TimeError::new("second must be 0-59"));
        }

        hours
            .checked_mul(3600)
            .and_then(|h| h.checked_add(minutes * 60 + seconds))
            .map(Self)
            .ok_or_else(|| TimeError::new("hour out of range"))
    }

    /// Seconds since local midnight for a wall-clock time.
    pub fn from_time_of_day(time: NaiveTime) -> Self {
        Self(time.num_seconds_from_midnight())
    }

    /// Returns the raw second count.
    pub fn seconds(&self) -> u32 {
        self.0
    }

    /// Returns the hour component; may be 24 or more.
    pub fn hours(&self) -> u32 {
        self.0 / 3600
    }

    /// Whether this time falls on the calendar day after the service day.
    pub fn is_next_day(&self) -> bool {
        self.0 >= SECONDS_PER_DAY
    }

    /// Format as "HH:MM" for compact display.
    pub fn format_hhmm(&self) -> String {
        format!("{:02}:{:02}", self.hours(), (self.0 % 3600) / 60)
    }
}

impl fmt::Debug for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScheduleTime({self})")
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours(),
            (self.0 % 3600) / 60,
            self.0 % 60
        )
    }
}

/// Parse one or more ASCII digits into a u32.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse exactly two ASCII digits into a u32.
fn parse_two_digits(s: &str) -> Option<u32> {
    if s.len() != 2 {
        return None;
    }
    parse_digits(s)
}
