//! SQLite-backed stop-time cache.
//!
//! One table holds the departure rows of every scanned stop; a second
//! table marks which stops were scanned to completion. Rows and marker are
//! written in one transaction, so a stop is either absent or complete.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::domain::{CachedDeparture, Departure, ScheduleTime, StopId, TripId};
use crate::feed::FeedFingerprint;
use crate::trips::TripRouteMap;

use super::error::StoreError;
use super::scan::StopScan;

/// Default rows per INSERT statement.
const DEFAULT_BATCH_ROWS: usize = 4000;

/// Largest batch that keeps an INSERT under SQLite's bound-parameter limit.
const MAX_BATCH_ROWS: usize = 32766 / INSERT_COLUMNS;

/// Number of bound values per cached row.
const INSERT_COLUMNS: usize = 7;

/// `feed_meta` key holding the fingerprint the cache was built from.
const FINGERPRINT_KEY: &str = "feed_fingerprint";

const SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS stop_times_cache (
        stop_id TEXT NOT NULL,
        trip_id TEXT NOT NULL,
        departure_time TEXT NOT NULL,
        departure_sec INTEGER NOT NULL,
        stop_sequence INTEGER NOT NULL,
        route_name TEXT NOT NULL DEFAULT '',
        headsign TEXT NOT NULL DEFAULT ''
    )",
    "CREATE INDEX IF NOT EXISTS idx_stop_depsec ON stop_times_cache(stop_id, departure_sec)",
    "CREATE TABLE IF NOT EXISTS cached_stops (
        stop_id TEXT PRIMARY KEY,
        row_count INTEGER NOT NULL,
        skipped INTEGER NOT NULL,
        built_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS feed_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_stop_trip ON stop_times_cache(stop_id, trip_id)",
];

/// Configuration for the stop-time cache.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
    /// Rows per INSERT statement when writing a stop.
    pub batch_rows: usize,
    /// How long a connection waits for another writer's lock.
    pub busy_timeout: Duration,
}

impl StoreConfig {
    /// Create a config for the given database path with default batching.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            batch_rows: DEFAULT_BATCH_ROWS,
            busy_timeout: Duration::from_secs(30),
        }
    }

    /// Set the INSERT batch size, clamped to what SQLite accepts.
    pub fn with_batch_rows(mut self, rows: usize) -> Self {
        self.batch_rows = rows.clamp(1, MAX_BATCH_ROWS);
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("gtfs_cache.db")
    }
}

/// Bookkeeping for one completely cached stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedStopInfo {
    pub row_count: u64,
    pub skipped: u64,
    pub built_at: String,
}

/// A cache row as stored.
#[derive(Debug, sqlx::FromRow)]
struct CachedRow {
    stop_id: String,
    trip_id: String,
    departure_time: String,
    departure_sec: i64,
    stop_sequence: i64,
    route_name: String,
    headsign: String,
}

impl TryFrom<CachedRow> for CachedDeparture {
    type Error = StoreError;

    fn try_from(row: CachedRow) -> Result<Self, Self::Error> {
        let invalid = |what: &str| StoreError::InvalidRow(format!("{what} for stop {}", row.stop_id));
        Ok(CachedDeparture {
            stop_id: StopId::new(&row.stop_id).map_err(|_| invalid("empty stop_id"))?,
            trip_id: TripId::new(&row.trip_id).map_err(|_| invalid("empty trip_id"))?,
            departure: u32::try_from(row.departure_sec)
                .map(ScheduleTime::from_seconds)
                .map_err(|_| invalid("departure_sec out of range"))?,
            stop_sequence: u32::try_from(row.stop_sequence)
                .map_err(|_| invalid("stop_sequence out of range"))?,
            departure_text: row.departure_time,
            route_name: row.route_name,
            headsign: row.headsign,
        })
    }
}

/// Durable per-stop cache of scheduled departures.
#[derive(Debug, Clone)]
pub struct StopTimeStore {
    pool: SqlitePool,
    batch_rows: usize,
}

impl StopTimeStore {
    /// Open (or create) the cache database and its schema.
    ///
    /// Creates parent directories if they don't exist.
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        create_parent_dir(&config.path).await?;

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }

        debug!(path = %config.path.display(), "opened stop-time cache");

        Ok(Self {
            pool,
            batch_rows: config.batch_rows.clamp(1, MAX_BATCH_ROWS),
        })
    }

    /// Compare the stored feed fingerprint with `fingerprint`.
    ///
    /// On a mismatch every cached stop is dropped and the new fingerprint
    /// recorded. Returns whether the cache was cleared.
    pub async fn sync_fingerprint(&self, fingerprint: &FeedFingerprint) -> Result<bool, StoreError> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT value FROM feed_meta WHERE key = ?")
                .bind(FINGERPRINT_KEY)
                .fetch_optional(&self.pool)
                .await?;

        if stored.as_deref() == Some(fingerprint.as_str()) {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;
        let cleared = sqlx::query("DELETE FROM cached_stops")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM stop_times_cache")
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO feed_meta (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(FINGERPRINT_KEY)
        .bind(fingerprint.as_str())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        if stored.is_some() {
            warn!(stops = cleared, "feed changed, cleared stop-time cache");
        }
        Ok(stored.is_some())
    }

    /// Whether `stop` has been scanned to completion.
    pub async fn has_cached_stop(&self, stop: &StopId) -> Result<bool, StoreError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM cached_stops WHERE stop_id = ?")
            .bind(stop.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Bookkeeping for a completely cached stop.
    pub async fn cached_stop_info(&self, stop: &StopId) -> Result<Option<CachedStopInfo>, StoreError> {
        let row: Option<(i64, i64, String)> = sqlx::query_as(
            "SELECT row_count, skipped, built_at FROM cached_stops WHERE stop_id = ?",
        )
        .bind(stop.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(row_count, skipped, built_at)| CachedStopInfo {
            row_count: row_count.max(0) as u64,
            skipped: skipped.max(0) as u64,
            built_at,
        }))
    }

    /// Number of rows stored for `stop`.
    pub async fn row_count(&self, stop: &StopId) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stop_times_cache WHERE stop_id = ?")
            .bind(stop.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// Number of completely cached stops.
    pub async fn cached_stop_count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cached_stops")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// Replace everything cached for `stop` with the rows of `scan`.
    ///
    /// Old rows are deleted, new rows inserted in batches, and the
    /// completion marker written, all in one transaction: readers see
    /// either the previous state or the finished rebuild. Every row must
    /// belong to `stop`; otherwise nothing is written.
    pub async fn replace_stop(&self, stop: &StopId, scan: &StopScan) -> Result<u64, StoreError> {
        if let Some(stray) = scan.rows.iter().find(|row| row.stop_id != *stop) {
            return Err(StoreError::InvalidRow(format!(
                "row of stop {} (trip {}) in cache build for stop {stop}",
                stray.stop_id, stray.trip_id
            )));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cached_stops WHERE stop_id = ?")
            .bind(stop.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM stop_times_cache WHERE stop_id = ?")
            .bind(stop.as_str())
            .execute(&mut *tx)
            .await?;

        for chunk in scan.rows.chunks(self.batch_rows) {
            let mut insert = QueryBuilder::<Sqlite>::new(
                "INSERT INTO stop_times_cache \
                 (stop_id, trip_id, departure_time, departure_sec, stop_sequence, route_name, headsign) ",
            );
            insert.push_values(chunk, |mut b, row| {
                b.push_bind(stop.as_str())
                    .push_bind(row.trip_id.as_str())
                    .push_bind(row.departure_text.as_str())
                    .push_bind(i64::from(row.departure.seconds()))
                    .push_bind(i64::from(row.stop_sequence))
                    .push_bind(row.route_name.as_str())
                    .push_bind(row.headsign.as_str());
            });
            insert.build().execute(&mut *tx).await?;
        }

        let row_count = scan.rows.len() as u64;
        sqlx::query(
            "INSERT INTO cached_stops (stop_id, row_count, skipped, built_at) VALUES (?, ?, ?, ?)",
        )
        .bind(stop.as_str())
        .bind(row_count as i64)
        .bind(scan.skipped as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(stop = %stop, rows = row_count, skipped = scan.skipped, "cached stop departures");
        Ok(row_count)
    }

    /// Cached rows of `stop` departing at or after `from`, earliest first,
    /// at most `cap` of them.
    pub async fn departures_from(
        &self,
        stop: &StopId,
        from: ScheduleTime,
        cap: usize,
    ) -> Result<Vec<CachedDeparture>, StoreError> {
        let rows: Vec<CachedRow> = sqlx::query_as(
            "SELECT stop_id, trip_id, departure_time, departure_sec, stop_sequence, route_name, headsign
             FROM stop_times_cache
             WHERE stop_id = ? AND departure_sec >= ?
             ORDER BY departure_sec ASC, trip_id ASC
             LIMIT ?",
        )
        .bind(stop.as_str())
        .bind(i64::from(from.seconds()))
        .bind(i64::try_from(cap).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CachedDeparture::try_from).collect()
    }

    /// The next `limit` departures of `stop` at or after `now` whose trip
    /// is in `trips`.
    ///
    /// Reads a working set of `limit * overfetch` rows and filters it, so
    /// fewer than `limit` departures come back when the working set holds
    /// too few running trips.
    pub async fn next_departures(
        &self,
        stop: &StopId,
        trips: &TripRouteMap,
        limit: usize,
        now: ScheduleTime,
        overfetch: usize,
    ) -> Result<Vec<Departure>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let cap = limit.saturating_mul(overfetch.max(1));
        let window = self.departures_from(stop, now, cap).await?;
        Ok(select_departures(window, trips, limit))
    }

    /// Drop everything cached for `stop`. Returns whether it was cached.
    pub async fn invalidate_stop(&self, stop: &StopId) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let marked = sqlx::query("DELETE FROM cached_stops WHERE stop_id = ?")
            .bind(stop.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM stop_times_cache WHERE stop_id = ?")
            .bind(stop.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(stop = %stop, was_cached = marked > 0, "invalidated stop cache");
        Ok(marked > 0)
    }

    /// Drop every cached stop. Returns how many stops were cached.
    pub async fn invalidate_all(&self) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let marked = sqlx::query("DELETE FROM cached_stops")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM stop_times_cache")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(stops = marked, "invalidated whole stop-time cache");
        Ok(marked)
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Keep the first `limit` rows of an ordered working set whose trip runs.
pub fn select_departures(
    window: Vec<CachedDeparture>,
    trips: &TripRouteMap,
    limit: usize,
) -> Vec<Departure> {
    window
        .into_iter()
        .filter_map(|row| {
            let route = trips.route_of(row.trip_id.as_str())?.clone();
            Some(row.into_departure(route))
        })
        .take(limit)
        .collect()
}

async fn create_parent_dir(path: &Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if !parent.as_os_str().is_empty() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RouteId;
    use tempfile::{TempDir, tempdir};

    fn stop(id: &str) -> StopId {
        StopId::new(id).unwrap()
    }

    fn row(stop_id: &str, trip: &str, seconds: u32) -> CachedDeparture {
        let departure = ScheduleTime::from_seconds(seconds);
        CachedDeparture {
            stop_id: stop(stop_id),
            trip_id: TripId::new(trip).unwrap(),
            departure_text: departure.to_string(),
            departure,
            stop_sequence: 1,
            route_name: "RE 1".to_string(),
            headsign: "Karlsruhe".to_string(),
        }
    }

    fn scan(rows: Vec<CachedDeparture>) -> StopScan {
        StopScan { rows, skipped: 0 }
    }

    fn trips(ids: &[&str]) -> TripRouteMap {
        ids.iter()
            .map(|t| (TripId::new(t).unwrap(), RouteId::new("R1").unwrap()))
            .collect()
    }

    async fn open_store(batch_rows: usize) -> (TempDir, StopTimeStore) {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path().join("cache.db")).with_batch_rows(batch_rows);
        let store = StopTimeStore::open(&config).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn empty_store_has_no_stops() {
        let (_dir, store) = open_store(10).await;
        assert!(!store.has_cached_stop(&stop("S1")).await.unwrap());
        assert_eq!(store.cached_stop_info(&stop("S1")).await.unwrap(), None);
        assert_eq!(store.cached_stop_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn replace_writes_rows_in_batches() {
        let (_dir, store) = open_store(3).await;
        let rows: Vec<_> = (0..10).map(|i| row("S1", &format!("T{i}"), 100 * i)).collect();

        let written = store.replace_stop(&stop("S1"), &scan(rows)).await.unwrap();
        assert_eq!(written, 10);
        assert_eq!(store.row_count(&stop("S1")).await.unwrap(), 10);
        assert!(store.has_cached_stop(&stop("S1")).await.unwrap());

        let info = store.cached_stop_info(&stop("S1")).await.unwrap().unwrap();
        assert_eq!(info.row_count, 10);
        assert_eq!(info.skipped, 0);
    }

    #[tokio::test]
    async fn replace_is_a_clean_rebuild() {
        let (_dir, store) = open_store(100).await;
        let first = vec![row("S1", "T1", 100), row("S1", "T2", 200)];
        store.replace_stop(&stop("S1"), &scan(first.clone())).await.unwrap();
        store.replace_stop(&stop("S1"), &scan(first)).await.unwrap();
        assert_eq!(store.row_count(&stop("S1")).await.unwrap(), 2);

        store
            .replace_stop(&stop("S1"), &scan(vec![row("S1", "T9", 900)]))
            .await
            .unwrap();
        let rows = store
            .departures_from(&stop("S1"), ScheduleTime::from_seconds(0), 10)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trip_id.as_str(), "T9");
    }

    #[tokio::test]
    async fn rows_of_another_stop_are_rejected() {
        let (_dir, store) = open_store(100).await;
        store
            .replace_stop(&stop("S1"), &scan(vec![row("S1", "T1", 100)]))
            .await
            .unwrap();

        let mixed = vec![row("S1", "T2", 200), row("S2", "T3", 300)];
        let err = store.replace_stop(&stop("S1"), &scan(mixed)).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidRow(_)));

        // The previous build is untouched and S2 was never written
        let rows = store
            .departures_from(&stop("S1"), ScheduleTime::from_seconds(0), 10)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trip_id.as_str(), "T1");
        assert_eq!(store.row_count(&stop("S2")).await.unwrap(), 0);
        assert!(!store.has_cached_stop(&stop("S2")).await.unwrap());
    }

    #[tokio::test]
    async fn stop_without_departures_is_still_complete() {
        let (_dir, store) = open_store(100).await;
        store.replace_stop(&stop("S1"), &scan(Vec::new())).await.unwrap();
        assert!(store.has_cached_stop(&stop("S1")).await.unwrap());
        assert_eq!(store.row_count(&stop("S1")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn departures_from_orders_and_caps() {
        let (_dir, store) = open_store(100).await;
        let rows = vec![
            row("S1", "A", 500),
            row("S1", "B", 100),
            row("S1", "C", 900),
            row("S1", "D", 300),
        ];
        store.replace_stop(&stop("S1"), &scan(rows)).await.unwrap();
        store
            .replace_stop(&stop("S2"), &scan(vec![row("S2", "E", 400)]))
            .await
            .unwrap();

        let from_200 = store
            .departures_from(&stop("S1"), ScheduleTime::from_seconds(200), 10)
            .await
            .unwrap();
        let seconds: Vec<u32> = from_200.iter().map(|r| r.departure.seconds()).collect();
        assert_eq!(seconds, vec![300, 500, 900]);

        let capped = store
            .departures_from(&stop("S1"), ScheduleTime::from_seconds(0), 2)
            .await
            .unwrap();
        assert_eq!(capped.len(), 2);

        // Inclusive lower bound
        let at_500 = store
            .departures_from(&stop("S1"), ScheduleTime::from_seconds(500), 10)
            .await
            .unwrap();
        assert_eq!(at_500[0].departure.seconds(), 500);
    }

    #[tokio::test]
    async fn next_departures_filters_inactive_trips() {
        let (_dir, store) = open_store(100).await;
        let rows = vec![
            row("S1", "T500", 500),
            row("S1", "T100", 100),
            row("S1", "T900", 900),
            row("S1", "T300", 300),
        ];
        store.replace_stop(&stop("S1"), &scan(rows)).await.unwrap();

        let active = trips(&["T500", "T900", "T300"]);
        let deps = store
            .next_departures(&stop("S1"), &active, 2, ScheduleTime::from_seconds(200), 20)
            .await
            .unwrap();
        let seconds: Vec<u32> = deps.iter().map(|d| d.departure_seconds).collect();
        assert_eq!(seconds, vec![300, 500]);
        assert_eq!(deps[0].route_id.as_str(), "R1");
        assert_eq!(deps[0].headsign.as_deref(), Some("Karlsruhe"));
    }

    #[tokio::test]
    async fn next_departures_returns_fewer_when_window_runs_out() {
        let (_dir, store) = open_store(100).await;
        let rows = vec![
            row("S1", "X1", 100),
            row("S1", "X2", 200),
            row("S1", "X3", 300),
            row("S1", "OK", 400),
        ];
        store.replace_stop(&stop("S1"), &scan(rows)).await.unwrap();

        // limit 1 * overfetch 2 = working set of the first two rows
        let deps = store
            .next_departures(&stop("S1"), &trips(&["OK"]), 1, ScheduleTime::from_seconds(0), 2)
            .await
            .unwrap();
        assert!(deps.is_empty());

        let deps = store
            .next_departures(&stop("S1"), &trips(&["OK"]), 1, ScheduleTime::from_seconds(0), 20)
            .await
            .unwrap();
        assert_eq!(deps.len(), 1);

        let deps = store
            .next_departures(&stop("S1"), &trips(&["OK"]), 0, ScheduleTime::from_seconds(0), 20)
            .await
            .unwrap();
        assert!(deps.is_empty());
    }

    #[tokio::test]
    async fn invalidate_stop_and_all() {
        let (_dir, store) = open_store(100).await;
        store
            .replace_stop(&stop("S1"), &scan(vec![row("S1", "T1", 100)]))
            .await
            .unwrap();
        store
            .replace_stop(&stop("S2"), &scan(vec![row("S2", "T1", 100)]))
            .await
            .unwrap();

        assert!(store.invalidate_stop(&stop("S1")).await.unwrap());
        assert!(!store.invalidate_stop(&stop("S1")).await.unwrap());
        assert!(!store.has_cached_stop(&stop("S1")).await.unwrap());
        assert_eq!(store.row_count(&stop("S1")).await.unwrap(), 0);
        assert!(store.has_cached_stop(&stop("S2")).await.unwrap());

        assert_eq!(store.invalidate_all().await.unwrap(), 1);
        assert_eq!(store.cached_stop_count().await.unwrap(), 0);
        assert_eq!(store.row_count(&stop("S2")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn fingerprint_change_clears_cache() {
        let (_dir, store) = open_store(100).await;
        let v1 = FeedFingerprint::new("v1");
        let v2 = FeedFingerprint::new("v2");

        // First sync on a fresh store records without clearing
        assert!(!store.sync_fingerprint(&v1).await.unwrap());
        store
            .replace_stop(&stop("S1"), &scan(vec![row("S1", "T1", 100)]))
            .await
            .unwrap();

        assert!(!store.sync_fingerprint(&v1).await.unwrap());
        assert!(store.has_cached_stop(&stop("S1")).await.unwrap());

        assert!(store.sync_fingerprint(&v2).await.unwrap());
        assert!(!store.has_cached_stop(&stop("S1")).await.unwrap());
        assert_eq!(store.row_count(&stop("S1")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn cache_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path().join("nested").join("cache.db"));
        {
            let store = StopTimeStore::open(&config).await.unwrap();
            store
                .replace_stop(&stop("S1"), &scan(vec![row("S1", "T1", 90600)]))
                .await
                .unwrap();
            store.close().await;
        }

        let store = StopTimeStore::open(&config).await.unwrap();
        assert!(store.has_cached_stop(&stop("S1")).await.unwrap());
        let rows = store
            .departures_from(&stop("S1"), ScheduleTime::from_seconds(0), 10)
            .await
            .unwrap();
        assert_eq!(rows[0].departure_text, "25:10:00");
        assert_eq!(rows[0].departure.seconds(), 90600);
    }

    #[test]
    fn batch_rows_are_clamped() {
        assert_eq!(StoreConfig::new("x.db").with_batch_rows(0).batch_rows, 1);
        assert_eq!(
            StoreConfig::new("x.db").with_batch_rows(1_000_000).batch_rows,
            MAX_BATCH_ROWS
        );
        assert_eq!(StoreConfig::default().batch_rows, DEFAULT_BATCH_ROWS);
    }

    #[test]
    fn select_departures_keeps_order_and_limit() {
        let window = vec![row("S1", "A", 100), row("S1", "B", 200), row("S1", "C", 300)];
        let deps = select_departures(window, &trips(&["A", "C"]), 5);
        let ids: Vec<&str> = deps.iter().map(|d| d.trip_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
    }
}
