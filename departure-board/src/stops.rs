//! Stop lookup and name search.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{Stop, StopId};
use crate::feed::{FeedError, RowSource, StopRecord};

/// A stop name search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopMatch {
    pub stop_id: StopId,
    pub name: String,
}

/// Read-only index of the feed's stops.
///
/// Loaded once per session. Stops without a name or with unparsable
/// coordinates are left out.
#[derive(Debug, Clone, Default)]
pub struct StopIndex {
    stops: HashMap<StopId, Stop>,
    children: HashMap<StopId, Vec<StopId>>,
}

impl StopIndex {
    /// Load all stops from the feed.
    pub fn load<S: RowSource>(feed: &S) -> Result<Self, FeedError> {
        let mut stops = Vec::new();
        let stats = feed.scan(|row: StopRecord| {
            if let Some(stop) = stop_from_record(row) {
                stops.push(stop);
            }
        })?;
        let index = Self::from_stops(stops);
        debug!(
            rows = stats.rows,
            stops = index.len(),
            "loaded stop index"
        );
        Ok(index)
    }

    /// Build an index from already validated stops.
    pub fn from_stops(stops: impl IntoIterator<Item = Stop>) -> Self {
        let mut index = Self::default();
        for stop in stops {
            index.stops.insert(stop.stop_id.clone(), stop);
        }
        for stop in index.stops.values() {
            if let Some(parent) = &stop.parent_station {
                index
                    .children
                    .entry(parent.clone())
                    .or_default()
                    .push(stop.stop_id.clone());
            }
        }
        for children in index.children.values_mut() {
            children.sort();
        }
        index
    }

    /// Look up a stop by id.
    pub fn get(&self, stop: &str) -> Option<&Stop> {
        self.stops.get(stop)
    }

    /// Whether the index contains `stop`.
    pub fn contains(&self, stop: &str) -> bool {
        self.stops.contains_key(stop)
    }

    /// Number of stops in the index.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Whether the index has no stops.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Stops whose parent station is `parent`, sorted by id.
    pub fn child_stop_ids(&self, parent: &str) -> &[StopId] {
        self.children.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Case-insensitive substring search over stop names.
    ///
    /// Hits are ordered by name length, then name, then stop id, so the
    /// most specific names come first. A blank query matches nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<StopMatch> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut hits: Vec<&Stop> = self
            .stops
            .values()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .collect();

        hits.sort_by(|a, b| {
            a.name
                .chars()
                .count()
                .cmp(&b.name.chars().count())
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.stop_id.cmp(&b.stop_id))
        });

        hits.into_iter()
            .take(limit)
            .map(|s| StopMatch {
                stop_id: s.stop_id.clone(),
                name: s.name.clone(),
            })
            .collect()
    }
}

/// Validate a stops.txt row.
fn stop_from_record(row: StopRecord) -> Option<Stop> {
    let stop_id = StopId::from_field(row.stop_id.as_deref())?;
    let name = row.stop_name.filter(|n| !n.is_empty())?;
    let lat = row.stop_lat?.parse::<f64>().ok()?;
    let lon = row.stop_lon?.parse::<f64>().ok()?;
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }

    Some(Stop {
        stop_id,
        name,
        lat,
        lon,
        parent_station: StopId::from_field(row.parent_station.as_deref()),
        location_type: row.location_type.and_then(|t| t.parse().ok()),
    })
}
