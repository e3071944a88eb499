//! # Queue Admission Service
//!
//! The virtual waiting room in front of order placement.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create_queue(event) ──► Queue (one per event)                          │
//! │                                                                         │
//! │  join_queue(client, event) ──► Turn { joined_at, last_heartbeat_at }    │
//! │        │                                                                │
//! │        ├── every few seconds: heartbeat(client, queue)                  │
//! │        ├── every few seconds: get_position(client, queue)               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  position ≤ admission window ──► OrderService may place orders          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  leave_queue / order confirmed / stale sweep ──► Turn removed           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Positions are computed from the stored turns on every read.

use std::sync::Arc;

use async_trait::async_trait;
use taquilla_core::validation::validate_id;
use taquilla_core::{Clock, CoreError, Queue, QueuePosition, Turn};
use taquilla_db::repository::generate_id;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::store::{CatalogStore, QueueStore};

// =============================================================================
// Admission Gate
// =============================================================================

/// What order placement needs from the waiting room.
#[async_trait]
pub trait AdmissionGate: Send + Sync {
    /// Succeeds iff the client may purchase for the event right now.
    async fn ensure_admitted(&self, client_id: &str, event_id: &str) -> EngineResult<()>;

    /// Frees the client's place after a completed purchase.
    async fn release(&self, client_id: &str, event_id: &str) -> EngineResult<()>;
}

// =============================================================================
// Service
// =============================================================================

pub struct QueueService {
    store: Arc<dyn QueueStore>,
    catalog: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl QueueService {
    pub fn new(
        store: Arc<dyn QueueStore>,
        catalog: Arc<dyn CatalogStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        QueueService {
            store,
            catalog,
            clock,
            config,
        }
    }

    /// Creates the queue for an event.
    ///
    /// ## Errors
    /// * `EventNotFound` - unknown event
    /// * `QueueAlreadyExists` - the event already has a queue
    pub async fn create_queue(&self, event_id: &str) -> EngineResult<Queue> {
        let event_id = validate_id("event_id", event_id)?;

        if self.catalog.event(event_id).await?.is_none() {
            return Err(CoreError::EventNotFound(event_id.to_string()).into());
        }

        if self.store.queue_by_event(event_id).await?.is_some() {
            return Err(CoreError::QueueAlreadyExists(event_id.to_string()).into());
        }

        let queue = Queue {
            id: generate_id(),
            event_id: event_id.to_string(),
            created_at: self.clock.now(),
            is_active: true,
        };

        match self.store.insert_queue(&queue).await {
            Ok(()) => {}
            // Lost a race with another instance creating the same queue
            Err(err) if err.is_unique_violation() => {
                return Err(CoreError::QueueAlreadyExists(event_id.to_string()).into());
            }
            Err(err) => return Err(err.into()),
        }

        info!(queue_id = %queue.id, event_id = %event_id, "Queue created");
        Ok(queue)
    }

    /// Stops new joins for an event's queue. Existing turns stay.
    pub async fn close_queue(&self, event_id: &str) -> EngineResult<Queue> {
        let mut queue = self.queue_for_event(event_id).await?;

        self.store.set_queue_active(&queue.id, false).await?;
        queue.is_active = false;

        info!(queue_id = %queue.id, event_id = %queue.event_id, "Queue closed");
        Ok(queue)
    }

    /// Adds the client to the event's queue.
    ///
    /// Joining again returns the existing turn with a fresh heartbeat; the
    /// join time, and so the position, is kept.
    pub async fn join_queue(&self, client_id: &str, event_id: &str) -> EngineResult<Turn> {
        let client_id = validate_id("client_id", client_id)?;
        let queue = self.queue_for_event(event_id).await?;

        if !queue.is_active {
            return Err(CoreError::QueueClosed(queue.id).into());
        }

        let now = self.clock.now();

        if let Some(turn) = self.refresh_existing(&queue.id, client_id).await? {
            debug!(queue_id = %queue.id, client_id = %client_id, "Client re-joined queue");
            return Ok(turn);
        }

        let turn = Turn {
            id: generate_id(),
            client_id: client_id.to_string(),
            queue_id: queue.id.clone(),
            joined_at: now,
            last_heartbeat_at: now,
        };

        match self.store.insert_turn(&turn).await {
            Ok(()) => {
                info!(queue_id = %queue.id, client_id = %client_id, "Client joined queue");
                Ok(turn)
            }
            // Concurrent join by the same client: the other insert won
            Err(err) if err.is_unique_violation() => self
                .refresh_existing(&queue.id, client_id)
                .await?
                .ok_or_else(|| EngineError::Storage(err)),
            Err(err) => Err(err.into()),
        }
    }

    /// Current position of the client in a queue.
    pub async fn get_position(&self, client_id: &str, queue_id: &str) -> EngineResult<QueuePosition> {
        let client_id = validate_id("client_id", client_id)?;
        let queue_id = validate_id("queue_id", queue_id)?;

        let turn = self.require_turn(queue_id, client_id).await?;
        self.position_of(&turn).await
    }

    /// Records a liveness signal.
    ///
    /// ## Errors
    /// * `TurnNotFound` - no turn (expired or never joined); the client
    ///   must join again
    pub async fn heartbeat(&self, client_id: &str, queue_id: &str) -> EngineResult<Turn> {
        let client_id = validate_id("client_id", client_id)?;
        let queue_id = validate_id("queue_id", queue_id)?;

        let now = self.clock.now();
        if !self.store.touch_turn(queue_id, client_id, now).await? {
            return Err(turn_not_found(queue_id, client_id));
        }

        self.require_turn(queue_id, client_id).await
    }

    /// Removes the client's turn. Leaving twice is not an error.
    pub async fn leave_queue(&self, client_id: &str, queue_id: &str) -> EngineResult<()> {
        let client_id = validate_id("client_id", client_id)?;
        let queue_id = validate_id("queue_id", queue_id)?;

        if self.store.delete_turn(queue_id, client_id).await? {
            info!(queue_id = %queue_id, client_id = %client_id, "Client left queue");
        }
        Ok(())
    }

    /// Deletes every turn whose heartbeat is older than the stale threshold.
    ///
    /// ## Returns
    /// Number of turns evicted.
    pub async fn evict_stale_turns(&self) -> EngineResult<u64> {
        let cutoff = self.clock.now() - self.config.stale_threshold();
        let evicted = self.store.delete_stale_turns(cutoff).await?;

        if evicted > 0 {
            info!(evicted, cutoff = %cutoff, "Evicted stale turns");
        } else {
            debug!(cutoff = %cutoff, "No stale turns");
        }
        Ok(evicted)
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    async fn queue_for_event(&self, event_id: &str) -> EngineResult<Queue> {
        let event_id = validate_id("event_id", event_id)?;

        self.store
            .queue_by_event(event_id)
            .await?
            .ok_or_else(|| CoreError::QueueNotFound(event_id.to_string()).into())
    }

    async fn refresh_existing(&self, queue_id: &str, client_id: &str) -> EngineResult<Option<Turn>> {
        let now = self.clock.now();
        if !self.store.touch_turn(queue_id, client_id, now).await? {
            return Ok(None);
        }
        Ok(self.store.find_turn(queue_id, client_id).await?)
    }

    async fn require_turn(&self, queue_id: &str, client_id: &str) -> EngineResult<Turn> {
        self.store
            .find_turn(queue_id, client_id)
            .await?
            .ok_or_else(|| turn_not_found(queue_id, client_id))
    }

    async fn position_of(&self, turn: &Turn) -> EngineResult<QueuePosition> {
        let position = self.store.turn_rank(turn).await?;
        let waiting = self.store.count_turns(&turn.queue_id).await?;

        Ok(QueuePosition {
            queue_id: turn.queue_id.clone(),
            client_id: turn.client_id.clone(),
            position,
            waiting,
            admitted: position <= self.config.admission_window,
        })
    }
}

fn turn_not_found(queue_id: &str, client_id: &str) -> EngineError {
    CoreError::TurnNotFound {
        client_id: client_id.to_string(),
        queue_id: queue_id.to_string(),
    }
    .into()
}

#[async_trait]
impl AdmissionGate for QueueService {
    async fn ensure_admitted(&self, client_id: &str, event_id: &str) -> EngineResult<()> {
        let client_id = validate_id("client_id", client_id)?;
        let event_id = validate_id("event_id", event_id)?;
        let window = self.config.admission_window;
        let not_admitted = |position: Option<i64>| -> EngineError {
            CoreError::NotAdmitted {
                client_id: client_id.to_string(),
                position,
                window,
            }
            .into()
        };

        let Some(queue) = self.store.queue_by_event(event_id).await? else {
            return Err(not_admitted(None));
        };
        let Some(turn) = self.store.find_turn(&queue.id, client_id).await? else {
            return Err(not_admitted(None));
        };

        let position = self.store.turn_rank(&turn).await?;
        if position > window {
            return Err(not_admitted(Some(position)));
        }
        Ok(())
    }

    async fn release(&self, client_id: &str, event_id: &str) -> EngineResult<()> {
        let client_id = validate_id("client_id", client_id)?;
        let event_id = validate_id("event_id", event_id)?;
        if self.store.delete_turn_for_event(event_id, client_id).await? {
            debug!(event_id = %event_id, client_id = %client_id, "Released turn after purchase");
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use taquilla_core::{ErrorKind, Event, ManualClock};
    use taquilla_db::{Database, DbConfig};

    struct Fixture {
        db: Database,
        clock: Arc<ManualClock>,
        service: QueueService,
    }

    async fn fixture(config: EngineConfig) -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
        db.catalog()
            .insert_event(&Event {
                id: "evt-1".into(),
                name: "Concierto".into(),
                starts_at: start + Duration::days(10),
            })
            .await
            .unwrap();

        let clock = Arc::new(ManualClock::new(start));
        let store = Arc::new(db.clone());
        let service = QueueService::new(store.clone(), store, clock.clone(), config);
        Fixture { db, clock, service }
    }

    async fn with_queue() -> (Fixture, Queue) {
        let f = fixture(EngineConfig::default()).await;
        let queue = f.service.create_queue("evt-1").await.unwrap();
        (f, queue)
    }

    #[tokio::test]
    async fn test_create_queue_policies() {
        let (f, queue) = with_queue().await;
        assert!(queue.is_active);

        let err = f.service.create_queue("evt-1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = f.service.create_queue("unknown").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_positions_follow_join_order() {
        let (f, queue) = with_queue().await;

        f.service.join_queue("alice", "evt-1").await.unwrap();
        f.clock.advance(Duration::milliseconds(5));
        f.service.join_queue("bob", "evt-1").await.unwrap();

        let a = f.service.get_position("alice", &queue.id).await.unwrap();
        let b = f.service.get_position("bob", &queue.id).await.unwrap();
        assert_eq!((a.position, a.waiting, a.admitted), (1, 2, true));
        assert_eq!((b.position, b.waiting, b.admitted), (2, 2, false));

        f.service.leave_queue("alice", &queue.id).await.unwrap();
        let b = f.service.get_position("bob", &queue.id).await.unwrap();
        assert_eq!(b.position, 1);
        assert!(b.admitted);

        // Leaving twice is fine
        f.service.leave_queue("alice", &queue.id).await.unwrap();
        let err = f.service.get_position("alice", &queue.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_rejoin_keeps_place_and_refreshes_heartbeat() {
        let (f, queue) = with_queue().await;

        let first = f.service.join_queue("alice", "evt-1").await.unwrap();
        f.service.join_queue("bob", "evt-1").await.unwrap();

        f.clock.advance(Duration::seconds(30));
        let again = f.service.join_queue("alice", "evt-1").await.unwrap();

        assert_eq!(again.id, first.id);
        assert_eq!(again.joined_at, first.joined_at);
        assert_eq!(again.last_heartbeat_at, f.clock.now());
        assert_eq!(f.db.queues().count_turns(&queue.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_padded_ids_name_the_same_queue_and_turn() {
        let f = fixture(EngineConfig::default()).await;

        let queue = f.service.create_queue(" evt-1").await.unwrap();
        assert_eq!(queue.event_id, "evt-1");
        let err = f.service.create_queue("evt-1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let padded = f.service.join_queue(" alice ", "evt-1 ").await.unwrap();
        assert_eq!(padded.client_id, "alice");
        let plain = f.service.join_queue("alice", "evt-1").await.unwrap();
        assert_eq!(plain.id, padded.id);
        assert_eq!(f.db.queues().count_turns(&queue.id).await.unwrap(), 1);

        let position = f
            .service
            .get_position("alice ", &format!(" {}", queue.id))
            .await
            .unwrap();
        assert_eq!(position.position, 1);
    }

    #[tokio::test]
    async fn test_join_unknown_or_closed_queue() {
        let f = fixture(EngineConfig::default()).await;
        let err = f.service.join_queue("alice", "evt-1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        f.service.create_queue("evt-1").await.unwrap();
        let closed = f.service.close_queue("evt-1").await.unwrap();
        assert!(!closed.is_active);

        let err = f.service.join_queue("alice", "evt-1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_heartbeat_requires_turn() {
        let (f, queue) = with_queue().await;

        let err = f.service.heartbeat("ghost", &queue.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        f.service.join_queue("alice", "evt-1").await.unwrap();
        f.clock.advance(Duration::seconds(10));
        let turn = f.service.heartbeat("alice", &queue.id).await.unwrap();
        assert_eq!(turn.last_heartbeat_at, f.clock.now());
    }

    #[tokio::test]
    async fn test_heartbeat_keeps_turn_alive_through_sweeps() {
        let (f, queue) = with_queue().await;
        f.service.join_queue("alice", "evt-1").await.unwrap();
        f.service.join_queue("bob", "evt-1").await.unwrap();

        // Alice heartbeats every 40s, Bob goes silent
        for _ in 0..3 {
            f.clock.advance(Duration::seconds(40));
            f.service.heartbeat("alice", &queue.id).await.unwrap();
            f.service.evict_stale_turns().await.unwrap();
        }

        assert!(f.service.get_position("alice", &queue.id).await.is_ok());
        let err = f.service.get_position("bob", &queue.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // Evicted client must re-join
        let err = f.service.heartbeat("bob", &queue.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_eviction_threshold_is_strict() {
        let (f, _) = with_queue().await;
        f.service.join_queue("alice", "evt-1").await.unwrap();

        f.clock.advance(Duration::seconds(60));
        assert_eq!(f.service.evict_stale_turns().await.unwrap(), 0);

        f.clock.advance(Duration::milliseconds(1));
        assert_eq!(f.service.evict_stale_turns().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_admission_gate() {
        let f = fixture(EngineConfig::default().admission_window(2)).await;

        let err = f.service.ensure_admitted("alice", "evt-1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        f.service.create_queue("evt-1").await.unwrap();
        for client in ["alice", "bob", "carol"] {
            f.service.join_queue(client, "evt-1").await.unwrap();
            f.clock.advance(Duration::milliseconds(1));
        }

        f.service.ensure_admitted("alice", "evt-1").await.unwrap();
        f.service.ensure_admitted("bob", "evt-1").await.unwrap();
        let err = f.service.ensure_admitted("carol", "evt-1").await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::NotAdmitted {
                position: Some(3),
                window: 2,
                ..
            })
        ));

        f.service.release("alice", "evt-1").await.unwrap();
        f.service.ensure_admitted("carol", "evt-1").await.unwrap();
        // Releasing again is harmless
        f.service.release("alice", "evt-1").await.unwrap();
    }
}
