//! Departure board over a static GTFS feed.
//!
//! Answers "what leaves this stop next, and where does that trip go" from
//! a zipped feed. Each stop's departures are scanned out of the feed once
//! and kept in a SQLite cache; queries join the cached rows with the trips
//! running on the query date.

pub mod board;
pub mod calendar;
pub mod config;
pub mod domain;
pub mod feed;
pub mod stops;
pub mod store;
pub mod trips;
pub mod web;
