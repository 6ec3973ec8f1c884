//! Service dates in GTFS "YYYYMMDD" form.

use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;

/// Error returned when parsing an invalid service date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid service date: {reason}")]
pub struct InvalidDate {
    reason: &'static str,
}

/// A calendar date as used by `calendar.txt` and `calendar_dates.txt`.
///
/// Keeps the zero-padded 8-digit key alongside the parsed date, so range
/// checks can compare keys lexicographically: for this format lexicographic
/// and chronological order coincide.
///
/// # Examples
///
/// ```
/// use departure_board::domain::ServiceDate;
/// use chrono::{NaiveDate, Weekday};
///
/// let d = ServiceDate::parse("20240315").unwrap();
/// assert_eq!(d.key(), "20240315");
/// assert_eq!(d.weekday(), Weekday::Fri);
/// assert_eq!(d.weekday_column(), "friday");
///
/// assert!(ServiceDate::parse("2024-03-15").is_err());
/// assert!(ServiceDate::parse("20240230").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceDate(NaiveDate);

impl ServiceDate {
    /// Wrap a chrono date.
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse a zero-padded "YYYYMMDD" key.
    pub fn parse(s: &str) -> Result<Self, InvalidDate> {
        let s = s.trim();
        if !is_date_key(s) {
            return Err(InvalidDate {
                reason: "expected 8 digits YYYYMMDD",
            });
        }
        NaiveDate::parse_from_str(s, "%Y%m%d")
            .map(Self)
            .map_err(|_| InvalidDate {
                reason: "no such calendar day",
            })
    }

    /// Returns the wrapped chrono date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Returns the zero-padded "YYYYMMDD" key.
    pub fn key(&self) -> String {
        format!("{:04}{:02}{:02}", self.0.year(), self.0.month(), self.0.day())
    }

    /// Returns the day of the week.
    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Returns the `calendar.txt` column name for this date's weekday.
    pub fn weekday_column(&self) -> &'static str {
        match self.weekday() {
            Weekday::Mon => "monday",
            Weekday::Tue => "tuesday",
            Weekday::Wed => "wednesday",
            Weekday::Thu => "thursday",
            Weekday::Fri => "friday",
            Weekday::Sat => "saturday",
            Weekday::Sun => "sunday",
        }
    }

    /// The following day, if representable.
    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    /// The preceding day, if representable.
    pub fn pred(&self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }
}

impl From<NaiveDate> for ServiceDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Debug for ServiceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceDate({})", self.key())
    }
}

impl fmt::Display for ServiceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Whether `s` is shaped like a date key: exactly 8 ASCII digits.
pub fn is_date_key(s: &str) -> bool {
    s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_date() -> impl Strategy<Value = ServiceDate> {
        (0i64..200_000).prop_map(|offset| {
            let base = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
            ServiceDate::new(base + chrono::Duration::days(offset))
        })
    }

    proptest! {
        /// Lexicographic order of keys matches chronological order
        #[test]
        fn key_order_matches_date_order(a in any_date(), b in any_date()) {
            prop_assert_eq!(a.key().cmp(&b.key()), a.cmp(&b));
        }

        /// Keys always parse back to the same date
        #[test]
        fn key_roundtrip(d in any_date()) {
            prop_assert_eq!(ServiceDate::parse(&d.key()).unwrap(), d);
        }
    }
}
