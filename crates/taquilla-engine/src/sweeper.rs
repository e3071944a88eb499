//! # Stale Turn Sweeper
//!
//! Background task that evicts turns whose clients stopped heartbeating.
//!
//! ## Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   every sweep_interval ──► QueueService::evict_stale_turns()            │
//! │                             DELETE FROM turns                           │
//! │                             WHERE last_heartbeat_at < now - threshold   │
//! │                                                                         │
//! │   SweeperHandle::shutdown() ──► loop exits after the current pass       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The delete is one statement filtered on a cutoff, so several instances
//! sweeping the same database at once simply find nothing left to delete.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::error::EngineResult;
use crate::queue::QueueService;

/// Periodically removes stale turns.
pub struct StaleTurnSweeper {
    queues: Arc<QueueService>,
    interval: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping a running sweeper.
#[derive(Clone)]
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SweeperHandle {
    /// Asks the sweeper to stop. Returns false if it already stopped.
    pub async fn shutdown(&self) -> bool {
        self.shutdown_tx.send(()).await.is_ok()
    }
}

impl StaleTurnSweeper {
    /// Creates a sweeper and the handle that stops it.
    pub fn new(queues: Arc<QueueService>, interval: Duration) -> (Self, SweeperHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let sweeper = StaleTurnSweeper {
            queues,
            interval,
            shutdown_rx,
        };

        (sweeper, SweeperHandle { shutdown_tx })
    }

    /// One sweep pass.
    pub async fn sweep_once(&self) -> EngineResult<u64> {
        self.queues.evict_stale_turns().await
    }

    /// Runs the sweep loop until shut down.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "Stale turn sweeper starting");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        error!(?e, "Stale turn sweep failed");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Stale turn sweeper shutting down");
                    break;
                }
            }
        }

        info!("Stale turn sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use taquilla_core::{Event, ManualClock};
    use taquilla_db::{Database, DbConfig};

    async fn setup() -> (Arc<QueueService>, Arc<ManualClock>, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
        db.catalog()
            .insert_event(&Event {
                id: "evt-1".into(),
                name: "Concierto".into(),
                starts_at: start,
            })
            .await
            .unwrap();

        let clock = Arc::new(ManualClock::new(start));
        let store = Arc::new(db);
        let service = Arc::new(QueueService::new(
            store.clone(),
            store,
            clock.clone(),
            EngineConfig::default(),
        ));
        let queue = service.create_queue("evt-1").await.unwrap();
        (service, clock, queue.id)
    }

    #[tokio::test]
    async fn test_sweep_once_evicts_only_stale() {
        let (service, clock, queue_id) = setup().await;
        service.join_queue("silent", "evt-1").await.unwrap();
        clock.advance(ChronoDuration::seconds(30));
        service.join_queue("active", "evt-1").await.unwrap();

        let (sweeper, _handle) = StaleTurnSweeper::new(service.clone(), Duration::from_secs(60));

        clock.advance(ChronoDuration::seconds(31));
        assert_eq!(sweeper.sweep_once().await.unwrap(), 1);
        assert_eq!(sweeper.sweep_once().await.unwrap(), 0);

        let pos = service.get_position("active", &queue_id).await.unwrap();
        assert_eq!(pos.position, 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (service, clock, queue_id) = setup().await;
        service.join_queue("silent", "evt-1").await.unwrap();
        clock.advance(ChronoDuration::seconds(120));

        let (sweeper, handle) = StaleTurnSweeper::new(service.clone(), Duration::from_millis(10));
        let task = tokio::spawn(sweeper.run());

        // The first tick fires immediately
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(service.get_position("silent", &queue_id).await.is_err());

        assert!(handle.shutdown().await);
        task.await.unwrap();
        assert!(!handle.shutdown().await);
    }
}
