//! Service calendar resolution.
//!
//! Determines which `service_id`s run on a date from the weekly patterns in
//! `calendar.txt` and the per-date exceptions in `calendar_dates.txt`.
//! Exceptions always win over the weekly pattern for their date.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::{ServiceDate, ServiceId, is_date_key};
use crate::feed::{CalendarDateRecord, CalendarRecord, FeedError, RowSource, Table};

/// `exception_type` value adding a service on a date.
const EXCEPTION_ADDED: &str = "1";

/// `exception_type` value removing a service on a date.
const EXCEPTION_REMOVED: &str = "2";

/// Compute the set of services active on `date`.
///
/// A feed without `calendar.txt` yields an empty set, exceptions included,
/// so callers fall back to every trip. A feed without `calendar_dates.txt`
/// has no exceptions. Rows with missing or malformed fields are skipped.
pub fn active_services<S: RowSource>(
    feed: &S,
    date: ServiceDate,
) -> Result<HashSet<ServiceId>, FeedError> {
    let day = date.key();
    let weekday = date.weekday();
    let mut active = HashSet::new();

    if !feed.has_table(Table::Calendar)? {
        debug!(date = %date, "feed has no weekly calendar");
        return Ok(active);
    }

    let stats = feed.scan(|row: CalendarRecord| {
        let Some(service) = ServiceId::from_field(row.service_id.as_deref()) else {
            return;
        };
        let (Some(start), Some(end)) = (row.start_date.as_deref(), row.end_date.as_deref())
        else {
            return;
        };
        if !is_date_key(start) || !is_date_key(end) {
            return;
        }
        if !(start <= day.as_str() && day.as_str() <= end) {
            return;
        }
        if row.weekday_flag(weekday) == Some("1") {
            active.insert(service);
        }
    })?;
    debug!(date = %date, rows = stats.rows, active = active.len(), "resolved weekly calendar");

    if feed.has_table(Table::CalendarDates)? {
        let mut added = 0usize;
        let mut removed = 0usize;
        feed.scan(|row: CalendarDateRecord| {
            if row.date.as_deref() != Some(day.as_str()) {
                return;
            }
            let Some(service) = ServiceId::from_field(row.service_id.as_deref()) else {
                return;
            };
            match row.exception_type.as_deref() {
                Some(EXCEPTION_ADDED) => {
                    added += 1;
                    active.insert(service);
                }
                Some(EXCEPTION_REMOVED) => {
                    removed += 1;
                    active.remove(&service);
                }
                _ => {}
            }
        })?;
        debug!(date = %date, added, removed, active = active.len(), "applied calendar exceptions");
    }

    Ok(active)
}
