//! Stops and stations.

use serde::Serialize;

use super::StopId;

/// GTFS `location_type` code for a parent station.
pub const LOCATION_TYPE_STATION: u8 = 1;

/// A stop, platform or station from `stops.txt`.
///
/// Immutable once loaded; only stops with a name and coordinates are kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub stop_id: StopId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub parent_station: Option<StopId>,
    pub location_type: Option<u8>,
}

impl Stop {
    /// Whether this stop is a parent station grouping child platforms.
    pub fn is_station(&self) -> bool {
        self.location_type == Some(LOCATION_TYPE_STATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(location_type: Option<u8>) -> Stop {
        Stop {
            stop_id: StopId::new("S1").unwrap(),
            name: "Mannheim Hbf".to_string(),
            lat: 49.479,
            lon: 8.469,
            parent_station: None,
            location_type,
        }
    }

    #[test]
    fn station_detection() {
        assert!(stop(Some(1)).is_station());
        assert!(!stop(Some(0)).is_station());
        assert!(!stop(None).is_station());
    }
}
