//! Trip to route index.
//!
//! Maps every trip that may run on a service day to its route. The map is
//! the date-specific half of a departure query: cached stop rows are
//! calendar-agnostic, and only rows whose trip is in this map are shown.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::{RouteId, ServiceId, TripId};
use crate::feed::{FeedError, RowSource, TripRecord};

/// Trip id → route id for the trips considered running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripRouteMap {
    routes: HashMap<TripId, RouteId>,
}

impl TripRouteMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route of `trip`, if the trip is in the map.
    pub fn route_of(&self, trip: &str) -> Option<&RouteId> {
        self.routes.get(trip)
    }

    /// Whether `trip` is in the map.
    pub fn contains(&self, trip: &str) -> bool {
        self.routes.contains_key(trip)
    }

    /// Add a trip; a repeated trip id replaces the earlier route.
    pub fn insert(&mut self, trip: TripId, route: RouteId) {
        self.routes.insert(trip, route);
    }

    /// Number of trips in the map.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the map has no trips.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl FromIterator<(TripId, RouteId)> for TripRouteMap {
    fn from_iter<I: IntoIterator<Item = (TripId, RouteId)>>(iter: I) -> Self {
        Self {
            routes: iter.into_iter().collect(),
        }
    }
}

/// Build the map for trips whose service is in `active`.
pub fn build_active_trip_route_map<S: RowSource>(
    feed: &S,
    active: &HashSet<ServiceId>,
) -> Result<TripRouteMap, FeedError> {
    build(feed, |row| {
        row.service_id
            .as_deref()
            .is_some_and(|s| active.contains(s))
    })
}

/// Build the map for every trip, ignoring the calendar.
///
/// The fallback when no service runs on the query date.
pub fn build_all_trip_route_map<S: RowSource>(feed: &S) -> Result<TripRouteMap, FeedError> {
    build(feed, |_| true)
}

fn build<S, F>(feed: &S, include: F) -> Result<TripRouteMap, FeedError>
where
    S: RowSource,
    F: Fn(&TripRecord) -> bool,
{
    let mut map = TripRouteMap::new();
    let stats = feed.scan(|row: TripRecord| {
        let (Some(trip), Some(route)) = (
            TripId::from_field(row.trip_id.as_deref()),
            RouteId::from_field(row.route_id.as_deref()),
        ) else {
            return;
        };
        if include(&row) {
            map.insert(trip, route);
        }
    })?;
    debug!(rows = stats.rows, trips = map.len(), "built trip route map");
    Ok(map)
}
