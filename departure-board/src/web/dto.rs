//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::board::{NextDepartures, TripRoute};
use crate::domain::{Departure, ScheduleTime};
use crate::stops::StopMatch;

/// Request to search stops by name.
#[derive(Debug, Deserialize)]
pub struct StopSearchRequest {
    /// Case-insensitive substring of the stop name
    #[serde(default)]
    pub q: String,

    /// Maximum number of results
    pub limit: Option<usize>,
}

/// A stop in search results.
#[derive(Debug, Serialize)]
pub struct StopSearchResult {
    pub stop_id: String,
    pub name: String,
}

/// Response for stop search.
#[derive(Debug, Serialize)]
pub struct StopSearchResponse {
    pub stops: Vec<StopSearchResult>,
}

/// Request for the next departures at a stop.
#[derive(Debug, Deserialize)]
pub struct DeparturesRequest {
    /// Maximum number of departures
    pub limit: Option<usize>,

    /// Merge the departures of the stop's child platforms
    #[serde(default)]
    pub include_children: bool,
}

/// A departure in a departures response.
#[derive(Debug, Serialize)]
pub struct DepartureResult {
    pub trip_id: String,
    pub route_id: String,
    pub route_name: Option<String>,
    pub headsign: Option<String>,

    /// Stop the departure leaves from (a child platform for station queries)
    pub stop_id: String,

    /// Scheduled time as in the feed, hours may exceed 23
    pub departure_time: String,

    /// Scheduled time as HH:MM
    pub departure_hhmm: String,

    pub departure_seconds: u32,
    pub stop_sequence: u32,

    /// Whether the time lies past the end of the service day
    pub next_day: bool,
}

/// Response for the next departures at a stop.
#[derive(Debug, Serialize)]
pub struct DeparturesResponse {
    pub stop_id: String,
    pub stop_name: Option<String>,

    /// Service date as YYYYMMDD
    pub date: String,

    /// Time of day the query was evaluated at
    pub now: String,

    /// False when no service ran on the date and all trips are shown
    pub calendar_filtered: bool,

    pub advisory: Option<String>,
    pub departures: Vec<DepartureResult>,
}

/// A stop along a trip.
#[derive(Debug, Serialize)]
pub struct TripStopResult {
    pub sequence: u32,
    pub stop_id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Response for a trip's route.
#[derive(Debug, Serialize)]
pub struct TripRouteResponse {
    pub trip_id: String,
    pub route_id: Option<String>,
    pub route_label: Option<String>,
    pub headsign: Option<String>,
    pub stops: Vec<TripStopResult>,
}

/// Response for a cache invalidation.
#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub stop_id: String,

    /// Whether the stop had a complete cache before
    pub was_cached: bool,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

// Conversion implementations

impl From<StopMatch> for StopSearchResult {
    fn from(m: StopMatch) -> Self {
        Self {
            stop_id: m.stop_id.into_inner(),
            name: m.name,
        }
    }
}

impl From<Departure> for DepartureResult {
    fn from(d: Departure) -> Self {
        let time = ScheduleTime::from_seconds(d.departure_seconds);
        Self {
            trip_id: d.trip_id.into_inner(),
            route_id: d.route_id.into_inner(),
            route_name: d.route_name,
            headsign: d.headsign,
            stop_id: d.stop_id.into_inner(),
            departure_time: d.departure_time,
            departure_hhmm: time.format_hhmm(),
            departure_seconds: d.departure_seconds,
            stop_sequence: d.stop_sequence,
            next_day: time.is_next_day(),
        }
    }
}

impl DeparturesResponse {
    /// Create from a board result and the stop's display name.
    pub fn from_next(next: NextDepartures, stop_name: Option<String>) -> Self {
        Self {
            advisory: next.advisory().map(str::to_string),
            stop_id: next.stop_id.into_inner(),
            stop_name,
            date: next.date.key(),
            now: next.now.to_string(),
            calendar_filtered: next.calendar_filtered,
            departures: next.departures.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<TripRoute> for TripRouteResponse {
    fn from(route: TripRoute) -> Self {
        Self {
            trip_id: route.trip_id.into_inner(),
            route_id: route.info.route_id.map(|r| r.into_inner()),
            route_label: route.info.route_label,
            headsign: route.info.headsign,
            stops: route
                .stops
                .into_iter()
                .map(|(sequence, stop)| TripStopResult {
                    sequence,
                    stop_id: stop.stop_id.into_inner(),
                    name: stop.name,
                    lat: stop.lat,
                    lon: stop.lon,
                })
                .collect(),
        }
    }
}
