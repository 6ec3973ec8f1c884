//! The full-feed scan that produces one stop's cache rows.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::debug;

use crate::domain::{CachedDeparture, ScheduleTime, StopId, TripId};
use crate::feed::{FeedError, RouteRecord, RowSource, StopTimeRecord, TripRecord};

/// The rows collected for one stop.
#[derive(Debug, Clone, Default)]
pub struct StopScan {
    /// Complete, validated departures of the stop in feed order.
    pub rows: Vec<CachedDeparture>,
    /// Rows for the stop that were skipped as malformed.
    pub skipped: u64,
}

/// A stop_times row for a target stop that passed validation.
struct PendingRow {
    trip_id: TripId,
    departure_text: String,
    departure: ScheduleTime,
    stop_sequence: u32,
}

/// The parts of a trip needed to label its departures.
struct TripLabel {
    route_id: Option<String>,
    headsign: Option<String>,
}

/// Scan the feed for every departure at `stop`.
///
/// `stop_times.txt` is streamed exactly once and only rows for `stop` are
/// kept. Trips and routes are then streamed to label those rows, keeping
/// only the entries they reference. Rows missing a trip id, departure time
/// or stop sequence, or whose sequence is not an integer in `0..=u32::MAX`,
/// are skipped. Unknown trips and routes degrade the labels, never the row.
pub fn collect_stop_departures<S: RowSource>(
    feed: &S,
    stop: &StopId,
) -> Result<StopScan, FeedError> {
    let mut scans = collect_departures_for_stops(feed, std::slice::from_ref(stop))?;
    Ok(scans.remove(stop).unwrap_or_default())
}

/// Scan the feed once for the departures of several stops.
///
/// Same rules as [`collect_stop_departures`]; every requested stop gets an
/// entry, empty if the feed has nothing for it.
pub fn collect_departures_for_stops<S: RowSource>(
    feed: &S,
    stops: &[StopId],
) -> Result<HashMap<StopId, StopScan>, FeedError> {
    let started = Instant::now();
    let targets: HashMap<&str, &StopId> = stops.iter().map(|s| (s.as_str(), s)).collect();
    let mut pending: HashMap<&StopId, Vec<PendingRow>> = HashMap::with_capacity(targets.len());
    let mut skipped: HashMap<&StopId, u64> = HashMap::new();

    let stats = feed.scan(|row: StopTimeRecord| {
        let Some(&stop) = row.stop_id.as_deref().and_then(|id| targets.get(id)) else {
            return;
        };
        match pending_row(row) {
            Some(p) => pending.entry(stop).or_default().push(p),
            None => *skipped.entry(stop).or_default() += 1,
        }
    })?;

    let wanted_trips: HashSet<&str> = pending
        .values()
        .flatten()
        .map(|p| p.trip_id.as_str())
        .collect();
    let mut trips: HashMap<String, TripLabel> = HashMap::with_capacity(wanted_trips.len());
    feed.scan(|row: TripRecord| {
        let Some(trip_id) = row.trip_id else {
            return;
        };
        if wanted_trips.contains(trip_id.as_str()) {
            trips.insert(
                trip_id,
                TripLabel {
                    route_id: row.route_id,
                    headsign: row.trip_headsign,
                },
            );
        }
    })?;

    let wanted_routes: HashSet<&str> = trips
        .values()
        .filter_map(|t| t.route_id.as_deref())
        .collect();
    let mut route_names: HashMap<String, String> = HashMap::with_capacity(wanted_routes.len());
    feed.scan(|row: RouteRecord| {
        let Some(route_id) = row.route_id.as_deref() else {
            return;
        };
        if !wanted_routes.contains(route_id) {
            return;
        }
        let name = row.display_name().unwrap_or(route_id).to_string();
        route_names.insert(route_id.to_string(), name);
    })?;

    let label = |stop: &StopId, p: PendingRow| {
        let trip = trips.get(p.trip_id.as_str());
        let route_name = trip
            .and_then(|t| t.route_id.as_deref())
            .map(|route_id| {
                route_names
                    .get(route_id)
                    .cloned()
                    .unwrap_or_else(|| route_id.to_string())
            })
            .unwrap_or_default();
        let headsign = trip.and_then(|t| t.headsign.clone()).unwrap_or_default();

        CachedDeparture {
            stop_id: stop.clone(),
            trip_id: p.trip_id,
            departure_text: p.departure_text,
            departure: p.departure,
            stop_sequence: p.stop_sequence,
            route_name,
            headsign,
        }
    };

    let mut scans = HashMap::with_capacity(stops.len());
    for stop in stops {
        let rows: Vec<CachedDeparture> = pending
            .remove(stop)
            .unwrap_or_default()
            .into_iter()
            .map(|p| label(stop, p))
            .collect();
        let skipped = skipped.get(stop).copied().unwrap_or(0);
        debug!(stop = %stop, kept = rows.len(), skipped, "collected stop times");
        scans.insert(stop.clone(), StopScan { rows, skipped });
    }

    debug!(
        stops = stops.len(),
        scanned = stats.rows,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scanned stop times"
    );

    Ok(scans)
}

/// Validate the fields of a stop_times row needed for the cache.
fn pending_row(row: StopTimeRecord) -> Option<PendingRow> {
    let trip_id = TripId::from_field(row.trip_id.as_deref())?;
    let departure_text = row.departure_time.filter(|t| !t.is_empty())?;
    let departure = ScheduleTime::parse(&departure_text).ok()?;
    let sequence = row.stop_sequence?;
    if sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Digits beyond u32 overflow and count as malformed
    let stop_sequence = sequence.parse().ok()?;

    Some(PendingRow {
        trip_id,
        departure_text,
        departure,
        stop_sequence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{MemoryFeed, Table};

    fn feed() -> MemoryFeed {
        MemoryFeed::new()
            .with_table(
                Table::StopTimes,
                "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
                 T1,08:00:00,08:01:00,S1,1\n\
                 T1,08:10:00,08:11:00,S2,2\n\
                 T2,25:09:00,25:10:00,S1,3\n\
                 T3,09:00:00,09:00:00,S1,0\n\
                 T4,10:00:00,10:00:00,S1,4\n\
                 ,11:00:00,11:00:00,S1,1\n\
                 T5,,,S1,1\n\
                 T6,12:00:00,12:00:00,S1,\n\
                 T7,12:00:00,12:00:00,S1,-1\n\
                 T8,12:00:00,12:00:00,S1,2.5\n\
                 T9,12:00:00,noon,S1,1\n",
            )
            .with_table(
                Table::Trips,
                "route_id,service_id,trip_id,trip_headsign\n\
                 R1,WK,T1,Karlsruhe Hbf\n\
                 R2,WK,T2,\n\
                 R404,WK,T3,Nowhere\n\
                 R1,WK,T99,Unrelated\n",
            )
            .with_table(
                Table::Routes,
                "route_id,route_short_name,route_long_name\n\
                 R1,S3,Germersheim - Karlsruhe\n\
                 R2,,Rhein-Neckar Express\n",
            )
    }

    fn stop(id: &str) -> StopId {
        StopId::new(id).unwrap()
    }

    #[test]
    fn keeps_only_valid_rows_for_stop() {
        let scan = collect_stop_departures(&feed(), &stop("S1")).unwrap();
        let trips: Vec<&str> = scan.rows.iter().map(|r| r.trip_id.as_str()).collect();
        assert_eq!(trips, vec!["T1", "T2", "T3", "T4"]);
        assert_eq!(scan.skipped, 6);
    }

    #[test]
    fn overnight_departure_keeps_text_and_seconds() {
        let scan = collect_stop_departures(&feed(), &stop("S1")).unwrap();
        let t2 = &scan.rows[1];
        assert_eq!(t2.departure_text, "25:10:00");
        assert_eq!(t2.departure.seconds(), 90600);
        assert_eq!(t2.stop_sequence, 3);
    }

    #[test]
    fn labels_fall_back_step_by_step() {
        let scan = collect_stop_departures(&feed(), &stop("S1")).unwrap();
        // Short name
        assert_eq!(scan.rows[0].route_name, "S3");
        assert_eq!(scan.rows[0].headsign, "Karlsruhe Hbf");
        // Long name, no headsign
        assert_eq!(scan.rows[1].route_name, "Rhein-Neckar Express");
        assert_eq!(scan.rows[1].headsign, "");
        // Route missing from routes.txt: raw route id
        assert_eq!(scan.rows[2].route_name, "R404");
        // Trip missing from trips.txt: no labels
        assert_eq!(scan.rows[3].route_name, "");
        assert_eq!(scan.rows[3].headsign, "");
    }

    #[test]
    fn unknown_stop_yields_nothing() {
        let scan = collect_stop_departures(&feed(), &stop("NOPE")).unwrap();
        assert!(scan.rows.is_empty());
        assert_eq!(scan.skipped, 0);
    }

    #[test]
    fn one_pass_collects_several_stops() {
        let scans =
            collect_departures_for_stops(&feed(), &[stop("S1"), stop("S2"), stop("NOPE")]).unwrap();
        assert_eq!(scans.len(), 3);
        assert_eq!(scans[&stop("S1")].rows.len(), 4);
        assert_eq!(scans[&stop("S1")].skipped, 6);

        let s2 = &scans[&stop("S2")];
        assert_eq!(s2.rows.len(), 1);
        assert_eq!(s2.rows[0].stop_id, stop("S2"));
        assert_eq!(s2.rows[0].route_name, "S3");
        assert!(scans[&stop("NOPE")].rows.is_empty());
    }

    #[test]
    fn sequence_beyond_u32_is_skipped() {
        let feed = MemoryFeed::new()
            .with_table(
                Table::StopTimes,
                "trip_id,departure_time,stop_id,stop_sequence\n\
                 T1,08:00:00,S1,4294967295\n\
                 T2,09:00:00,S1,4294967296\n",
            )
            .with_table(Table::Trips, "route_id,service_id,trip_id\n")
            .with_table(Table::Routes, "route_id,route_short_name\n");
        let scan = collect_stop_departures(&feed, &stop("S1")).unwrap();
        assert_eq!(scan.rows.len(), 1);
        assert_eq!(scan.rows[0].stop_sequence, u32::MAX);
        assert_eq!(scan.skipped, 1);
    }

    #[test]
    fn missing_stop_times_is_an_error() {
        let feed = feed().without_table(Table::StopTimes);
        assert!(matches!(
            collect_stop_departures(&feed, &stop("S1")),
            Err(FeedError::MissingTable(Table::StopTimes))
        ));
    }
}
