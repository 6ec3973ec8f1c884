//! Feed identifier types.
//!
//! GTFS identifiers are opaque strings. The only validation is that they
//! are non-empty after trimming; each kind gets its own type so a trip id
//! can never be passed where a stop id is expected.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when constructing an identifier from an empty string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: identifier cannot be empty")]
pub struct InvalidId {
    kind: &'static str,
}

macro_rules! feed_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier, trimming surrounding whitespace.
            ///
            /// Returns an error if nothing is left after trimming.
            pub fn new(s: impl AsRef<str>) -> Result<Self, InvalidId> {
                let trimmed = s.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(InvalidId { kind: $kind });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Build an identifier from an optional raw field.
            ///
            /// Missing and blank fields both yield `None`.
            pub fn from_field(field: Option<&str>) -> Option<Self> {
                field.and_then(|s| Self::new(s).ok())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier and returns the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

feed_id!(
    /// A `stop_id` from `stops.txt` / `stop_times.txt`.
    ///
    /// ```
    /// use departure_board::domain::StopId;
    ///
    /// let stop = StopId::new(" de:08222:2417 ").unwrap();
    /// assert_eq!(stop.as_str(), "de:08222:2417");
    /// assert!(StopId::new("  ").is_err());
    /// ```
    StopId,
    "stop id"
);

feed_id!(
    /// A `trip_id` from `trips.txt` / `stop_times.txt`.
    TripId,
    "trip id"
);

feed_id!(
    /// A `route_id` from `routes.txt` / `trips.txt`.
    RouteId,
    "route id"
);

feed_id!(
    /// A `service_id` shared by `calendar.txt`, `calendar_dates.txt` and `trips.txt`.
    ServiceId,
    "service id"
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn trims_whitespace() {
        let trip = TripId::new("  T1 ").unwrap();
        assert_eq!(trip.as_str(), "T1");
        assert_eq!(trip.to_string(), "T1");
    }

    #[test]
    fn rejects_empty() {
        assert!(RouteId::new("").is_err());
        assert!(RouteId::new(" \t").is_err());
        let err = ServiceId::new("").unwrap_err();
        assert_eq!(err.to_string(), "invalid service id: identifier cannot be empty");
    }

    #[test]
    fn from_field_handles_missing_and_blank() {
        assert_eq!(StopId::from_field(None), None);
        assert_eq!(StopId::from_field(Some("")), None);
        assert_eq!(StopId::from_field(Some("S1")), Some(StopId::new("S1").unwrap()));
    }

    #[test]
    fn debug_names_the_kind() {
        let stop = StopId::new("S1").unwrap();
        assert_eq!(format!("{:?}", stop), "StopId(S1)");
    }

    #[test]
    fn map_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(TripId::new("T1").unwrap(), 1);
        assert_eq!(map.get("T1"), Some(&1));
        assert_eq!(map.get("T2"), None);
    }
}
