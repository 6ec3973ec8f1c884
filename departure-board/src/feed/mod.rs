//! GTFS feed access.
//!
//! The rest of the crate reads feeds only through [`RowSource`]: a
//! forward-only scan that yields typed records, one at a time, for a named
//! table. [`ZipFeed`] reads a zipped feed from disk; [`MemoryFeed`] holds
//! tables as text for fixtures.

mod error;
mod fingerprint;
mod memory;
mod records;
mod source;
mod table;
mod zip_feed;

pub use error::FeedError;
pub use fingerprint::FeedFingerprint;
pub use memory::MemoryFeed;
pub use records::{
    CalendarDateRecord, CalendarRecord, FeedRecord, RouteRecord, StopRecord, StopTimeRecord,
    TripRecord,
};
pub use source::{RowSource, ScanStats, read_table};
pub use table::Table;
pub use zip_feed::ZipFeed;
