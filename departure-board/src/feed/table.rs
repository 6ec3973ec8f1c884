//! GTFS table names.

use std::fmt;

/// A table of a GTFS feed the departure board reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Stops,
    Trips,
    Routes,
    StopTimes,
    Calendar,
    CalendarDates,
}

impl Table {
    /// All tables, required ones first.
    pub const ALL: [Table; 6] = [
        Table::Stops,
        Table::Trips,
        Table::Routes,
        Table::StopTimes,
        Table::Calendar,
        Table::CalendarDates,
    ];

    /// File name of the table inside the feed archive.
    pub fn file_name(&self) -> &'static str {
        match self {
            Table::Stops => "stops.txt",
            Table::Trips => "trips.txt",
            Table::Routes => "routes.txt",
            Table::StopTimes => "stop_times.txt",
            Table::Calendar => "calendar.txt",
            Table::CalendarDates => "calendar_dates.txt",
        }
    }

    /// Whether a feed may legitimately omit this table.
    pub fn is_optional(&self) -> bool {
        matches!(self, Table::Calendar | Table::CalendarDates)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}
