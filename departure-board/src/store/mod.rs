//! Persistent per-stop departure cache.
//!
//! A stop is cached by scanning the whole feed once ([`collect_stop_departures`])
//! and writing the result atomically ([`StopTimeStore::replace_stop`]).
//! Later queries for that stop read only the cache.

mod error;
mod scan;
mod sqlite;

pub use error::StoreError;
pub use scan::{StopScan, collect_departures_for_stops, collect_stop_departures};
pub use sqlite::{CachedStopInfo, StopTimeStore, StoreConfig, select_departures};
