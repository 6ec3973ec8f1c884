//! Trip stop sequences.

use tracing::debug;

use crate::domain::{RouteId, StopId, TripId};
use crate::feed::{FeedError, RouteRecord, RowSource, StopTimeRecord, TripRecord};

/// One call of a trip: its position in the trip and the stop visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripCall {
    pub sequence: u32,
    pub stop_id: StopId,
}

/// What the trips and routes tables say about a trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripInfo {
    pub route_id: Option<RouteId>,
    /// "short – long" route label, else the route id.
    pub route_label: Option<String>,
    pub headsign: Option<String>,
}

/// The ordered calls of `trip`.
///
/// A full scan of stop_times; nothing is cached. Rows without a stop id or
/// with a non-numeric sequence are skipped. Calls are sorted by sequence,
/// keeping feed order between equal sequences.
pub fn trip_stop_sequence<S: RowSource>(
    feed: &S,
    trip: &TripId,
) -> Result<Vec<TripCall>, FeedError> {
    let mut calls = Vec::new();
    let stats = feed.scan(|row: StopTimeRecord| {
        if row.trip_id.as_deref() != Some(trip.as_str()) {
            return;
        }
        let Some(stop_id) = StopId::from_field(row.stop_id.as_deref()) else {
            return;
        };
        let Some(sequence) = row.stop_sequence.and_then(|s| parse_sequence(&s)) else {
            return;
        };
        calls.push(TripCall { sequence, stop_id });
    })?;

    calls.sort_by_key(|c| c.sequence);
    debug!(trip = %trip, scanned = stats.rows, calls = calls.len(), "built trip stop sequence");
    Ok(calls)
}

/// Look up the route and headsign of `trip`.
///
/// Returns `None` when the trips table has no row for it.
pub fn trip_info<S: RowSource>(feed: &S, trip: &TripId) -> Result<Option<TripInfo>, FeedError> {
    let mut found: Option<TripRecord> = None;
    feed.scan(|row: TripRecord| {
        if row.trip_id.as_deref() == Some(trip.as_str()) {
            found = Some(row);
        }
    })?;
    let Some(row) = found else {
        return Ok(None);
    };

    let route_id = RouteId::from_field(row.route_id.as_deref());
    let mut route_label = None;
    if let Some(route) = &route_id {
        feed.scan(|r: RouteRecord| {
            if r.route_id.as_deref() == Some(route.as_str()) {
                route_label = r.label();
            }
        })?;
        if route_label.is_none() {
            route_label = Some(route.to_string());
        }
    }

    Ok(Some(TripInfo {
        route_id,
        route_label,
        headsign: row.trip_headsign,
    }))
}

/// A stop_sequence of plain digits within `u32`; larger values are malformed.
fn parse_sequence(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
