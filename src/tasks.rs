//! Interval background tasks.
//!
//! Each task ticks immediately on spawn, then on its configured interval.
//! Failures are logged and retried on the next tick.

use crate::actions::{Clock, GenerateDailyUsageSummary};
use crate::cache::MemoryCache;
use crate::db::{Database, DbError};
use crate::telemetry::spans;
use chrono::TimeDelta;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, info, warn};

/// Generate yesterday's usage summary whenever it is missing.
pub fn spawn_daily_summary_task(strategy: GenerateDailyUsageSummary, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let result = strategy.execute().instrument(spans::task("daily_usage_summary")).await;
            match result {
                Ok(true) => {}
                Ok(false) => debug!("Daily usage summary already present"),
                Err(e) => warn!(error = %e, "Daily usage summary failed"),
            }
        }
    });
}

/// Drop expired cache entries.
pub fn spawn_cache_prune_task(cache: Arc<MemoryCache>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let removed = cache.prune_expired();
            if removed > 0 {
                debug!(removed = removed, "Expired cache entries pruned");
            }
        }
    });
}

/// Permanently remove gadgets deleted longer than `window_days` ago.
pub async fn purge_expired_gadgets(
    db: &Database,
    clock: &dyn Clock,
    window_days: i64,
) -> Result<u64, DbError> {
    let cutoff = clock.now() - TimeDelta::days(window_days).num_seconds();
    db.tabs().purge_deleted_gadgets(cutoff).await
}

pub fn spawn_gadget_purge_task(
    db: Database,
    clock: Arc<dyn Clock>,
    window_days: i64,
    every: Duration,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let result = purge_expired_gadgets(&db, clock.as_ref(), window_days)
                .instrument(spans::task("gadget_purge"))
                .await;
            match result {
                Ok(0) => {}
                Ok(removed) => info!(removed = removed, "Expired deleted gadgets purged"),
                Err(e) => warn!(error = %e, "Gadget purge failed"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::FixedClock;

    #[tokio::test]
    async fn purge_respects_undelete_window() {
        let db = Database::new(":memory:").await.unwrap();
        let person = db.people().create("jdoe", "Jane", false).await.unwrap();
        let tab = db.tabs().start_tab(person.id).await.unwrap();
        let gadget = db.tabs().add_gadget(tab.id, "g", 0).await.unwrap();
        db.tabs().delete_gadget(gadget.id).await.unwrap();

        let now = chrono::Utc::now().timestamp();
        let within = FixedClock(now + 3600);
        assert_eq!(purge_expired_gadgets(&db, &within, 7).await.unwrap(), 0);

        let later = FixedClock(now + TimeDelta::days(8).num_seconds());
        assert_eq!(purge_expired_gadgets(&db, &later, 7).await.unwrap(), 1);
    }
}
