//! The departure query engine.
//!
//! [`DepartureBoard`] answers "what leaves stop S next" by joining a stop's
//! cached rows with the trips running on the query date. A stop's cache is
//! built on its first query by a full feed scan; builds for the same stop
//! are serialized, builds for different stops are independent.
//!
//! Feed scans are blocking and may be slow on a large feed, so they run on
//! the blocking pool under a timeout. A cache build runs as its own task
//! holding the stop's build lock: a caller that times out only stops
//! waiting, the build still finishes and is stored, and a retry waits for
//! it instead of scanning again.

mod error;
mod service_day;
mod trip;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::BoardConfig;
use crate::domain::{Departure, ScheduleTime, ServiceDate, Stop, StopId, TripId};
use crate::feed::{FeedError, RowSource};
use crate::stops::{StopIndex, StopMatch};
use crate::store::{StopTimeStore, collect_departures_for_stops};

pub use error::BoardError;
pub use service_day::{ServiceDay, ServiceDayCache};
pub use trip::{TripCall, TripInfo, trip_info, trip_stop_sequence};

/// Shown alongside departures when the calendar could not filter them.
pub const FALLBACK_ADVISORY: &str =
    "No service is scheduled for this date; showing all trips regardless of calendar.";

/// The next departures at a stop as of one moment.
#[derive(Debug, Clone)]
pub struct NextDepartures {
    pub stop_id: StopId,
    pub date: ServiceDate,
    pub now: ScheduleTime,
    /// False when no service ran on `date` and every trip was considered.
    pub calendar_filtered: bool,
    pub departures: Vec<Departure>,
}

impl NextDepartures {
    /// Advisory text for the degraded, unfiltered mode.
    pub fn advisory(&self) -> Option<&'static str> {
        (!self.calendar_filtered).then_some(FALLBACK_ADVISORY)
    }
}

/// A trip's ordered stops joined with the stop index.
#[derive(Debug, Clone)]
pub struct TripRoute {
    pub trip_id: TripId,
    pub info: TripInfo,
    /// Calls whose stop is in the index, in sequence order.
    pub stops: Vec<(u32, Stop)>,
    /// Calls dropped because their stop is not in the index.
    pub unknown_stops: usize,
}

/// Per-stop build locks. An entry lives only while someone holds or
/// waits for its lock.
type BuildLocks = Arc<Mutex<HashMap<StopId, Arc<Mutex<()>>>>>;

/// Departure query engine over one feed and its stop-time cache.
pub struct DepartureBoard<S> {
    feed: Arc<S>,
    store: StopTimeStore,
    stops: StopIndex,
    service_days: ServiceDayCache,
    build_locks: BuildLocks,
    config: BoardConfig,
}

impl<S> DepartureBoard<S>
where
    S: RowSource + 'static,
{
    /// Load the stop index and bring the cache in line with the feed.
    ///
    /// If the feed's fingerprint differs from the one the cache was built
    /// from, every cached stop is dropped.
    pub async fn open(
        feed: Arc<S>,
        store: StopTimeStore,
        config: BoardConfig,
    ) -> Result<Self, BoardError> {
        let timeout = config.scan_timeout;

        let fingerprint = run_scan(&feed, timeout, "feed fingerprint", |f| f.fingerprint()).await?;
        store.sync_fingerprint(&fingerprint).await?;

        let stops = run_scan(&feed, timeout, "stops", |f| StopIndex::load(f)).await?;
        info!(stops = stops.len(), "departure board ready");

        Ok(Self {
            feed,
            store,
            stops,
            service_days: ServiceDayCache::new(config.service_day_capacity),
            build_locks: BuildLocks::default(),
            config,
        })
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn stops(&self) -> &StopIndex {
        &self.stops
    }

    pub fn store(&self) -> &StopTimeStore {
        &self.store
    }

    /// Stops whose name contains `query`, shortest names first.
    pub fn search_stops(&self, query: &str, limit: usize) -> Vec<StopMatch> {
        self.stops.search(query, limit.min(self.config.max_limit))
    }

    /// Services and trips of `date`, resolved once per date and cached.
    pub async fn service_day(&self, date: ServiceDate) -> Result<Arc<ServiceDay>, BoardError> {
        let feed = Arc::clone(&self.feed);
        let timeout = self.config.scan_timeout;
        self.service_days
            .get_or_resolve(date, async move {
                run_scan(&feed, timeout, "service calendar", move |f| {
                    ServiceDay::resolve(f, date)
                })
                .await
            })
            .await
    }

    /// Make sure `stop` has a complete cache, building it if needed.
    ///
    /// Returns whether this call built it.
    pub async fn ensure_stop_cached(&self, stop: &StopId) -> Result<bool, BoardError> {
        Ok(self.ensure_stops_cached(std::slice::from_ref(stop)).await? > 0)
    }

    /// Make sure every stop in `stops` has a complete cache.
    ///
    /// The missing ones are built together from a single stop_times scan.
    /// Returns how many stops this call built.
    pub async fn ensure_stops_cached(&self, stops: &[StopId]) -> Result<usize, BoardError> {
        let mut missing = Vec::new();
        for stop in stops {
            if !self.store.has_cached_stop(stop).await? {
                missing.push(stop.clone());
            }
        }
        if missing.is_empty() {
            return Ok(0);
        }

        let built = self.await_build(missing, false).await?;
        Ok(built.len())
    }

    /// Rebuild the cache of `stop` from the feed, replacing what is there.
    ///
    /// Returns the number of rows written.
    pub async fn build_cache_for_stop(&self, stop: &StopId) -> Result<u64, BoardError> {
        let built = self.await_build(vec![stop.clone()], true).await?;
        Ok(built.first().map_or(0, |(_, rows)| *rows))
    }

    /// Drop the cache of `stop`; the next query rebuilds it.
    pub async fn invalidate_stop(&self, stop: &StopId) -> Result<bool, BoardError> {
        let guard = lock_stop(&self.build_locks, stop).await;
        let dropped = self.store.invalidate_stop(stop).await;
        unlock_stop(&self.build_locks, stop, guard).await;
        Ok(dropped?)
    }

    /// Drop every cached stop and service day.
    pub async fn invalidate_all(&self) -> Result<u64, BoardError> {
        self.service_days.invalidate_all();
        Ok(self.store.invalidate_all().await?)
    }

    /// The next departures at `stop` as of the local wall clock.
    pub async fn next_departures(
        &self,
        stop: &StopId,
        limit: usize,
    ) -> Result<NextDepartures, BoardError> {
        self.next_departures_at(stop, limit, Local::now().naive_local())
            .await
    }

    /// The next `limit` departures at `stop` at or after `at`.
    ///
    /// Only trips running on `at`'s date are included, unless no service
    /// runs that day, in which case every trip is and `calendar_filtered`
    /// is false.
    pub async fn next_departures_at(
        &self,
        stop: &StopId,
        limit: usize,
        at: NaiveDateTime,
    ) -> Result<NextDepartures, BoardError> {
        self.require_stop(stop)?;
        let (date, now) = moment(at);
        let limit = limit.min(self.config.max_limit);

        self.ensure_stop_cached(stop).await?;
        let day = self.service_day(date).await?;
        let departures = self
            .store
            .next_departures(stop, &day.trips, limit, now, self.config.overfetch_factor)
            .await?;

        Ok(NextDepartures {
            stop_id: stop.clone(),
            date,
            now,
            calendar_filtered: day.calendar_filtered,
            departures,
        })
    }

    /// Next departures of a station and all its child stops, merged.
    pub async fn station_departures(
        &self,
        stop: &StopId,
        limit: usize,
    ) -> Result<NextDepartures, BoardError> {
        self.station_departures_at(stop, limit, Local::now().naive_local())
            .await
    }

    /// Next departures of a station and all its child stops at or after `at`.
    ///
    /// Each stop contributes up to `limit` departures; the merged list is
    /// ordered by departure time and cut to `limit`.
    pub async fn station_departures_at(
        &self,
        stop: &StopId,
        limit: usize,
        at: NaiveDateTime,
    ) -> Result<NextDepartures, BoardError> {
        self.require_stop(stop)?;
        let children = self.stops.child_stop_ids(stop.as_str());
        let mut members = Vec::with_capacity(children.len() + 1);
        members.push(stop.clone());
        members.extend(children.iter().cloned());
        self.ensure_stops_cached(&members).await?;

        let mut merged = self.next_departures_at(stop, limit, at).await?;
        let limit = limit.min(self.config.max_limit);

        for child in children {
            let next = self.next_departures_at(child, limit, at).await?;
            merged.departures.extend(next.departures);
        }

        merged.departures.sort_by(|a, b| {
            a.departure_seconds
                .cmp(&b.departure_seconds)
                .then_with(|| a.trip_id.cmp(&b.trip_id))
                .then_with(|| a.stop_id.cmp(&b.stop_id))
        });
        merged.departures.truncate(limit);
        Ok(merged)
    }

    /// The ordered calls of `trip`. Scans stop_times on every call.
    pub async fn trip_stop_sequence(&self, trip: &TripId) -> Result<Vec<TripCall>, BoardError> {
        let target = trip.clone();
        run_scan(&self.feed, self.config.scan_timeout, "trip stop times", move |f| {
            trip_stop_sequence(f, &target)
        })
        .await
    }

    /// The stops `trip` calls at, with route details.
    ///
    /// Fails with [`BoardError::UnknownTrip`] when the feed knows nothing
    /// about the trip.
    pub async fn trip_route(&self, trip: &TripId) -> Result<TripRoute, BoardError> {
        let target = trip.clone();
        let (info, calls) = run_scan(&self.feed, self.config.scan_timeout, "trip route", move |f| {
            Ok((trip_info(f, &target)?, trip_stop_sequence(f, &target)?))
        })
        .await?;

        if info.is_none() && calls.is_empty() {
            return Err(BoardError::UnknownTrip(trip.clone()));
        }

        let total = calls.len();
        let stops: Vec<(u32, Stop)> = calls
            .into_iter()
            .filter_map(|call| {
                let stop = self.stops.get(call.stop_id.as_str())?;
                Some((call.sequence, stop.clone()))
            })
            .collect();

        Ok(TripRoute {
            trip_id: trip.clone(),
            info: info.unwrap_or_default(),
            unknown_stops: total - stops.len(),
            stops,
        })
    }

    fn require_stop(&self, stop: &StopId) -> Result<(), BoardError> {
        if self.stops.contains(stop.as_str()) {
            Ok(())
        } else {
            Err(BoardError::UnknownStop(stop.clone()))
        }
    }

    /// Build `stops` on a detached task and wait for it up to the scan
    /// timeout. On timeout the build carries on and its result is kept.
    async fn await_build(
        &self,
        stops: Vec<StopId>,
        rebuild: bool,
    ) -> Result<Vec<(StopId, u64)>, BoardError> {
        let timeout = self.config.scan_timeout;
        let build = self.spawn_build(stops, rebuild);

        match tokio::time::timeout(timeout, build).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(BoardError::ScanAborted {
                what: "stop_times",
                message: join.to_string(),
            }),
            Err(_) => {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    "stop cache build still running, caller gave up waiting"
                );
                Err(BoardError::ScanTimeout {
                    what: "stop_times",
                    after: timeout,
                })
            }
        }
    }

    fn spawn_build(
        &self,
        stops: Vec<StopId>,
        rebuild: bool,
    ) -> JoinHandle<Result<Vec<(StopId, u64)>, BoardError>> {
        let feed = Arc::clone(&self.feed);
        let store = self.store.clone();
        let locks = Arc::clone(&self.build_locks);
        tokio::spawn(async move {
            let built = build_stops(&feed, &store, &locks, stops, rebuild).await;
            if let Err(e) = &built {
                warn!(error = %e, "stop cache build failed");
            }
            built
        })
    }
}

/// Lock `stops` in order, build the ones still missing (or all of them when
/// `rebuild`) from one stop_times scan, then release the locks.
async fn build_stops<S: RowSource + 'static>(
    feed: &Arc<S>,
    store: &StopTimeStore,
    locks: &BuildLocks,
    mut stops: Vec<StopId>,
    rebuild: bool,
) -> Result<Vec<(StopId, u64)>, BoardError> {
    // Sorted acquisition keeps overlapping multi-stop builds deadlock free
    stops.sort();
    stops.dedup();

    let mut guards = Vec::with_capacity(stops.len());
    for stop in &stops {
        guards.push(lock_stop(locks, stop).await);
    }

    let built = build_locked(feed, store, &stops, rebuild).await;

    for (stop, guard) in stops.iter().zip(guards) {
        unlock_stop(locks, stop, guard).await;
    }
    built
}

/// Scan and store `stops`. Callers hold their build locks.
async fn build_locked<S: RowSource + 'static>(
    feed: &Arc<S>,
    store: &StopTimeStore,
    stops: &[StopId],
    rebuild: bool,
) -> Result<Vec<(StopId, u64)>, BoardError> {
    let mut pending = Vec::with_capacity(stops.len());
    for stop in stops {
        // Another build may have finished this stop while we waited
        if rebuild || !store.has_cached_stop(stop).await? {
            pending.push(stop.clone());
        }
    }
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let started = Instant::now();
    let targets = pending.clone();
    let mut scans = scan_blocking(feed, "stop_times", move |f| {
        collect_departures_for_stops(f, &targets)
    })
    .await?;

    let mut built = Vec::with_capacity(pending.len());
    for stop in pending {
        let scan = scans.remove(&stop).unwrap_or_default();
        let rows = store.replace_stop(&stop, &scan).await?;
        info!(
            stop = %stop,
            rows,
            skipped = scan.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built stop cache"
        );
        built.push((stop, rows));
    }
    Ok(built)
}

async fn lock_stop(locks: &BuildLocks, stop: &StopId) -> OwnedMutexGuard<()> {
    let lock = Arc::clone(locks.lock().await.entry(stop.clone()).or_default());
    lock.lock_owned().await
}

/// Release `guard` and forget the lock once nobody else holds or awaits it.
async fn unlock_stop(locks: &BuildLocks, stop: &StopId, guard: OwnedMutexGuard<()>) {
    drop(guard);
    let mut locks = locks.lock().await;
    if locks.get(stop).is_some_and(|lock| Arc::strong_count(lock) == 1) {
        locks.remove(stop);
    }
}

/// Split a wall-clock moment into service date and time of day.
fn moment(at: NaiveDateTime) -> (ServiceDate, ScheduleTime) {
    (
        ServiceDate::from(at.date()),
        ScheduleTime::from_time_of_day(at.time()),
    )
}

/// Run a blocking feed scan on the blocking pool.
async fn scan_blocking<S, T, F>(feed: &Arc<S>, what: &'static str, scan: F) -> Result<T, BoardError>
where
    S: RowSource + 'static,
    T: Send + 'static,
    F: FnOnce(&S) -> Result<T, FeedError> + Send + 'static,
{
    let feed = Arc::clone(feed);
    match tokio::task::spawn_blocking(move || scan(&feed)).await {
        Ok(result) => Ok(result?),
        Err(join) => Err(BoardError::ScanAborted {
            what,
            message: join.to_string(),
        }),
    }
}

/// Run a blocking feed scan on the blocking pool, bounded by `timeout`.
///
/// On timeout the scan is left to finish and its result is dropped.
async fn run_scan<S, T, F>(
    feed: &Arc<S>,
    timeout: Duration,
    what: &'static str,
    scan: F,
) -> Result<T, BoardError>
where
    S: RowSource + 'static,
    T: Send + 'static,
    F: FnOnce(&S) -> Result<T, FeedError> + Send + 'static,
{
    match tokio::time::timeout(timeout, scan_blocking(feed, what, scan)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(scan = what, timeout_secs = timeout.as_secs(), "feed scan timed out");
            Err(BoardError::ScanTimeout {
                what,
                after: timeout,
            })
        }
    }
}
