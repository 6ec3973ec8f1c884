//! Cached and returned departures.

use serde::Serialize;

use super::{RouteId, ScheduleTime, StopId, TripId};

/// One persisted stop-time row for a stop, enriched with display fields.
///
/// Calendar-agnostic: the same rows serve every date, and per-date
/// filtering happens when they are read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedDeparture {
    pub stop_id: StopId,
    pub trip_id: TripId,
    /// Departure time text exactly as scheduled (may exceed 24:00:00).
    pub departure_text: String,
    pub departure: ScheduleTime,
    pub stop_sequence: u32,
    /// Route short name, else long name, else route id; empty if the trip is unknown.
    pub route_name: String,
    pub headsign: String,
}

impl CachedDeparture {
    /// Join this row with the route of an active trip.
    pub fn into_departure(self, route_id: RouteId) -> Departure {
        Departure {
            stop_id: self.stop_id,
            trip_id: self.trip_id,
            route_id,
            departure_time: self.departure_text,
            departure_seconds: self.departure.seconds(),
            stop_sequence: self.stop_sequence,
            route_name: non_empty(self.route_name),
            headsign: non_empty(self.headsign),
        }
    }
}

/// A departure returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Departure {
    pub stop_id: StopId,
    pub trip_id: TripId,
    pub route_id: RouteId,
    pub departure_time: String,
    pub departure_seconds: u32,
    pub stop_sequence: u32,
    pub route_name: Option<String>,
    pub headsign: Option<String>,
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
