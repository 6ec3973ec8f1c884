//! Typed rows of the GTFS tables.
//!
//! Every column is optional: the CSV reader maps header names onto fields,
//! absent columns and empty cells both become `None`, and validation is left
//! to the component that consumes the row.

use chrono::Weekday;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::Table;

/// A row type bound to the table it is read from.
pub trait FeedRecord: DeserializeOwned {
    const TABLE: Table;
}

/// A row of `stops.txt`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopRecord {
    pub stop_id: Option<String>,
    pub stop_name: Option<String>,
    pub stop_lat: Option<String>,
    pub stop_lon: Option<String>,
    pub parent_station: Option<String>,
    pub location_type: Option<String>,
}

impl FeedRecord for StopRecord {
    const TABLE: Table = Table::Stops;
}

/// A row of `trips.txt`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripRecord {
    pub trip_id: Option<String>,
    pub route_id: Option<String>,
    pub service_id: Option<String>,
    pub trip_headsign: Option<String>,
}

impl FeedRecord for TripRecord {
    const TABLE: Table = Table::Trips;
}

/// A row of `routes.txt`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteRecord {
    pub route_id: Option<String>,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
}

impl FeedRecord for RouteRecord {
    const TABLE: Table = Table::Routes;
}

impl RouteRecord {
    /// Compact name for departure rows: short name, else long name.
    pub fn display_name(&self) -> Option<&str> {
        self.route_short_name
            .as_deref()
            .or(self.route_long_name.as_deref())
    }

    /// Full label: "short – long" when both exist, else whichever exists.
    pub fn label(&self) -> Option<String> {
        match (self.route_short_name.as_deref(), self.route_long_name.as_deref()) {
            (Some(short), Some(long)) => Some(format!("{short} – {long}")),
            (Some(name), None) | (None, Some(name)) => Some(name.to_string()),
            (None, None) => None,
        }
    }
}

/// A row of `stop_times.txt`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopTimeRecord {
    pub trip_id: Option<String>,
    pub stop_id: Option<String>,
    pub departure_time: Option<String>,
    pub stop_sequence: Option<String>,
}

impl FeedRecord for StopTimeRecord {
    const TABLE: Table = Table::StopTimes;
}

/// A row of `calendar.txt`: a weekly pattern valid between two dates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarRecord {
    pub service_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub monday: Option<String>,
    pub tuesday: Option<String>,
    pub wednesday: Option<String>,
    pub thursday: Option<String>,
    pub friday: Option<String>,
    pub saturday: Option<String>,
    pub sunday: Option<String>,
}

impl FeedRecord for CalendarRecord {
    const TABLE: Table = Table::Calendar;
}

impl CalendarRecord {
    /// Raw value of the column for `weekday`.
    pub fn weekday_flag(&self, weekday: Weekday) -> Option<&str> {
        match weekday {
            Weekday::Mon => self.monday.as_deref(),
            Weekday::Tue => self.tuesday.as_deref(),
            Weekday::Wed => self.wednesday.as_deref(),
            Weekday::Thu => self.thursday.as_deref(),
            Weekday::Fri => self.friday.as_deref(),
            Weekday::Sat => self.saturday.as_deref(),
            Weekday::Sun => self.sunday.as_deref(),
        }
    }
}

/// A row of `calendar_dates.txt`: one added or removed service day.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarDateRecord {
    pub service_id: Option<String>,
    pub date: Option<String>,
    pub exception_type: Option<String>,
}

impl FeedRecord for CalendarDateRecord {
    const TABLE: Table = Table::CalendarDates;
}
