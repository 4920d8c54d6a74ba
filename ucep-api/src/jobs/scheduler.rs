//! Periodic background scheduler
//!
//! Each tick runs, one after another: the analytics rollup for today and
//! yesterday, then the retention sweep. A failing step is logged and the
//! loop carries on. The interval is re-read from settings every tick.

use super::{run_retention_sweep, run_rollup};
use crate::db;
use chrono::{Duration as ChronoDuration, Utc};
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Used when the interval setting cannot be read
const FALLBACK_INTERVAL_SECS: u64 = 3600;

/// Background job runner
#[derive(Clone)]
pub struct Scheduler {
    db: SqlitePool,
    cancel_token: CancellationToken,
}

impl Scheduler {
    pub fn new(db: SqlitePool, cancel_token: CancellationToken) -> Self {
        Self { db, cancel_token }
    }

    /// Run one tick: rollups for today and yesterday, then the sweep
    pub async fn tick(&self) {
        let today = Utc::now().date_naive();

        for day in [today, today - ChronoDuration::days(1)] {
            if let Err(e) = run_rollup(&self.db, day).await {
                error!("Analytics rollup for {} failed: {}", day, e);
            }
        }

        if let Err(e) = run_retention_sweep(&self.db).await {
            error!("Retention sweep failed: {}", e);
        }
    }

    async fn interval(&self) -> Duration {
        match db::settings::scheduler_interval_secs(&self.db).await {
            Ok(secs) => Duration::from_secs(secs),
            Err(e) => {
                warn!(
                    "Could not read scheduler interval ({}), using {}s",
                    e, FALLBACK_INTERVAL_SECS
                );
                Duration::from_secs(FALLBACK_INTERVAL_SECS)
            }
        }
    }

    /// Loop until the cancellation token fires; the first tick runs immediately
    pub async fn run(self) {
        info!("Background scheduler started");

        loop {
            self.tick().await;

            let wait = self.interval().await;
            debug!("Next scheduler tick in {:?}", wait);

            tokio::select! {
                _ = self.cancel_token.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!("Background scheduler stopped");
    }
}

/// Spawn the scheduler loop on the runtime
pub fn spawn_scheduler(db: SqlitePool, cancel_token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(Scheduler::new(db, cancel_token).run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_db;

    #[tokio::test]
    async fn test_tick_writes_rollups_and_sweep_entry() {
        let (pool, _dir) = setup_test_db().await;
        Scheduler::new(pool.clone(), CancellationToken::new()).tick().await;

        let rollups: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analytics_daily")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rollups, 2);

        let sweeps: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM audit_log WHERE action = 'retention.sweep'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(sweeps, 1);
    }

    #[tokio::test]
    async fn test_cancelled_scheduler_stops() {
        let (pool, _dir) = setup_test_db().await;
        let token = CancellationToken::new();
        let handle = spawn_scheduler(pool, token.clone());

        token.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }
}
