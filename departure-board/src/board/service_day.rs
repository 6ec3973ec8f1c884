//! Per-date service resolution and its in-memory cache.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use moka::future::Cache as MokaCache;
use tracing::{debug, warn};

use crate::calendar::active_services;
use crate::domain::{ServiceDate, ServiceId};
use crate::feed::{FeedError, RowSource};
use crate::trips::{TripRouteMap, build_active_trip_route_map, build_all_trip_route_map};

use super::error::BoardError;

/// Everything a departure query needs to know about one date.
#[derive(Debug, Clone)]
pub struct ServiceDay {
    pub date: ServiceDate,
    /// Services running on `date`. Empty in fallback mode.
    pub active_services: HashSet<ServiceId>,
    /// Trips shown on `date`.
    pub trips: TripRouteMap,
    /// False when no service ran and every trip is shown instead.
    pub calendar_filtered: bool,
}

impl ServiceDay {
    /// Resolve the services and trips of `date`.
    ///
    /// When the calendar activates nothing, falls back to every trip in the
    /// feed rather than showing an empty board.
    pub fn resolve<S: RowSource>(feed: &S, date: ServiceDate) -> Result<Self, FeedError> {
        let active_services = active_services(feed, date)?;

        if active_services.is_empty() {
            let trips = build_all_trip_route_map(feed)?;
            warn!(
                date = %date,
                trips = trips.len(),
                "no service active on date, showing all trips"
            );
            return Ok(Self {
                date,
                active_services,
                trips,
                calendar_filtered: false,
            });
        }

        let trips = build_active_trip_route_map(feed, &active_services)?;
        debug!(
            date = %date,
            services = active_services.len(),
            trips = trips.len(),
            "resolved service day"
        );
        Ok(Self {
            date,
            active_services,
            trips,
            calendar_filtered: true,
        })
    }
}

/// Bounded cache of resolved service days, keyed by date.
///
/// Concurrent lookups of the same missing date share one computation.
#[derive(Clone)]
pub struct ServiceDayCache {
    days: MokaCache<ServiceDate, Arc<ServiceDay>>,
}

impl ServiceDayCache {
    /// Create a cache holding at most `capacity` dates.
    pub fn new(capacity: u64) -> Self {
        Self {
            days: MokaCache::builder().max_capacity(capacity).build(),
        }
    }

    /// Get the cached day for `date`, computing it with `resolve` if absent.
    ///
    /// Failures are not cached.
    pub async fn get_or_resolve<F>(
        &self,
        date: ServiceDate,
        resolve: F,
    ) -> Result<Arc<ServiceDay>, BoardError>
    where
        F: Future<Output = Result<ServiceDay, BoardError>>,
    {
        self.days
            .try_get_with(date, async move { resolve.await.map(Arc::new) })
            .await
            .map_err(BoardError::from)
    }

    /// Whether `date` is currently cached.
    pub fn contains(&self, date: ServiceDate) -> bool {
        self.days.contains_key(&date)
    }

    /// Drop every cached day.
    pub fn invalidate_all(&self) {
        self.days.invalidate_all();
    }
}
