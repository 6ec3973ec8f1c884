//! Domain types for the departure board.
//!
//! These types represent validated feed data. Identifiers, dates and times
//! enforce their invariants at construction time, so code that receives
//! them can trust their validity.

mod date;
mod departure;
mod ids;
mod stop;
mod time;

pub use date::{InvalidDate, ServiceDate, is_date_key};
pub use departure::{CachedDeparture, Departure};
pub use ids::{InvalidId, RouteId, ServiceId, StopId, TripId};
pub use stop::{LOCATION_TYPE_STATION, Stop};
pub use time::{SECONDS_PER_DAY, ScheduleTime, TimeError};
