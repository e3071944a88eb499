//! # Queue Repository
//!
//! Database operations for queues and turns.
//!
//! ## Turn Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Turn Lifecycle                                   │
//! │                                                                         │
//! │  1. JOIN                                                               │
//! │     └── insert_turn() → UNIQUE (client_id, queue_id)                   │
//! │                                                                         │
//! │  2. WAIT                                                               │
//! │     └── rank_of() → 1 + turns ahead by (joined_at, id)                 │
//! │     └── touch_turn() → last_heartbeat_at = now                         │
//! │                                                                         │
//! │  3. LEAVE (any of)                                                     │
//! │     └── delete_turn()        explicit leave / order confirmed          │
//! │     └── delete_stale_turns() heartbeat older than the cutoff           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Positions are never stored: every read ranks the turn against the rows
//! currently in the table, so removals shift everyone behind immediately.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::{from_millis, to_millis};
use crate::error::{DbError, DbResult};
use taquilla_core::{Queue, Turn};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct QueueRow {
    id: String,
    event_id: String,
    created_at: i64,
    is_active: bool,
}

impl TryFrom<QueueRow> for Queue {
    type Error = DbError;

    fn try_from(row: QueueRow) -> DbResult<Self> {
        Ok(Queue {
            id: row.id,
            event_id: row.event_id,
            created_at: from_millis("queues.created_at", row.created_at)?,
            is_active: row.is_active,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TurnRow {
    id: String,
    client_id: String,
    queue_id: String,
    joined_at: i64,
    last_heartbeat_at: i64,
}

impl TryFrom<TurnRow> for Turn {
    type Error = DbError;

    fn try_from(row: TurnRow) -> DbResult<Self> {
        Ok(Turn {
            id: row.id,
            client_id: row.client_id,
            queue_id: row.queue_id,
            joined_at: from_millis("turns.joined_at", row.joined_at)?,
            last_heartbeat_at: from_millis("turns.last_heartbeat_at", row.last_heartbeat_at)?,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for queue and turn database operations.
#[derive(Debug, Clone)]
pub struct QueueRepository {
    pool: SqlitePool,
}

impl QueueRepository {
    /// Creates a new QueueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        QueueRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Queues
    // -------------------------------------------------------------------------

    /// Inserts a queue.
    ///
    /// ## Errors
    /// * `DuplicateQueue` - the event already has a queue
    /// * `UnknownReference` - the event is not in the catalogue
    pub async fn insert_queue(&self, queue: &Queue) -> DbResult<()> {
        debug!(id = %queue.id, event_id = %queue.event_id, "Inserting queue");

        sqlx::query(
            r#"
            INSERT INTO queues (id, event_id, created_at, is_active)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&queue.id)
        .bind(&queue.event_id)
        .bind(to_millis(queue.created_at))
        .bind(queue.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets the queue for an event.
    pub async fn get_by_event(&self, event_id: &str) -> DbResult<Option<Queue>> {
        let row: Option<QueueRow> = sqlx::query_as(
            r#"
            SELECT id, event_id, created_at, is_active
            FROM queues
            WHERE event_id = ?1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Queue::try_from).transpose()
    }

    /// Opens or closes a queue for new turns.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE queues SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Queue", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Turns
    // -------------------------------------------------------------------------

    /// Inserts a turn.
    ///
    /// ## Errors
    /// * `DuplicateTurn` - the client already holds a turn in this queue
    pub async fn insert_turn(&self, turn: &Turn) -> DbResult<()> {
        debug!(queue_id = %turn.queue_id, client_id = %turn.client_id, "Inserting turn");

        sqlx::query(
            r#"
            INSERT INTO turns (id, client_id, queue_id, joined_at, last_heartbeat_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&turn.id)
        .bind(&turn.client_id)
        .bind(&turn.queue_id)
        .bind(to_millis(turn.joined_at))
        .bind(to_millis(turn.last_heartbeat_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Finds a client's turn in a queue.
    pub async fn find_turn(&self, queue_id: &str, client_id: &str) -> DbResult<Option<Turn>> {
        let row: Option<TurnRow> = sqlx::query_as(
            r#"
            SELECT id, client_id, queue_id, joined_at, last_heartbeat_at
            FROM turns
            WHERE queue_id = ?1 AND client_id = ?2
            "#,
        )
        .bind(queue_id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Turn::try_from).transpose()
    }

    /// 1-based rank of a turn in its queue.
    ///
    /// Ordered by `joined_at`, ties broken by turn id so two turns never
    /// share a position.
    pub async fn rank_of(&self, turn: &Turn) -> DbResult<i64> {
        let joined = to_millis(turn.joined_at);

        let ahead: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM turns
            WHERE queue_id = ?1
              AND (joined_at < ?2 OR (joined_at = ?2 AND id < ?3))
            "#,
        )
        .bind(&turn.queue_id)
        .bind(joined)
        .bind(&turn.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ahead + 1)
    }

    /// Number of turns currently in a queue.
    pub async fn count_turns(&self, queue_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM turns WHERE queue_id = ?1")
            .bind(queue_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Refreshes a turn's heartbeat. Returns false when no turn matched.
    pub async fn touch_turn(
        &self,
        queue_id: &str,
        client_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE turns SET last_heartbeat_at = ?3
            WHERE queue_id = ?1 AND client_id = ?2
            "#,
        )
        .bind(queue_id)
        .bind(client_id)
        .bind(to_millis(at))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a client's turn. Returns false when there was none.
    pub async fn delete_turn(&self, queue_id: &str, client_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM turns WHERE queue_id = ?1 AND client_id = ?2")
            .bind(queue_id)
            .bind(client_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a client's turn from the queue of an event.
    pub async fn delete_turn_for_event(&self, event_id: &str, client_id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM turns
            WHERE client_id = ?2
              AND queue_id IN (SELECT id FROM queues WHERE event_id = ?1)
            "#,
        )
        .bind(event_id)
        .bind(client_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every turn whose last heartbeat is strictly older than
    /// `cutoff`, across all queues, in one statement.
    ///
    /// ## Returns
    /// Number of turns removed.
    pub async fn delete_stale_turns(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM turns WHERE last_heartbeat_at < ?1")
            .bind(to_millis(cutoff))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::generate_id;
    use chrono::{Duration, TimeZone};
    use taquilla_core::Event;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap()
    }

    async fn setup() -> (Database, Queue) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog()
            .insert_event(&Event {
                id: "evt-1".into(),
                name: "Concierto".into(),
                starts_at: t0() + Duration::days(30),
            })
            .await
            .unwrap();

        let queue = Queue {
            id: generate_id(),
            event_id: "evt-1".into(),
            created_at: t0(),
            is_active: true,
        };
        db.queues().insert_queue(&queue).await.unwrap();
        (db, queue)
    }

    fn turn(queue: &Queue, id: &str, client: &str, joined: DateTime<Utc>) -> Turn {
        Turn {
            id: id.into(),
            client_id: client.into(),
            queue_id: queue.id.clone(),
            joined_at: joined,
            last_heartbeat_at: joined,
        }
    }

    #[tokio::test]
    async fn test_queue_unique_per_event() {
        let (db, queue) = setup().await;

        let found = db.queues().get_by_event("evt-1").await.unwrap().unwrap();
        assert_eq!(found, queue);

        let second = Queue {
            id: generate_id(),
            ..queue.clone()
        };
        let err = db.queues().insert_queue(&second).await.unwrap_err();
        assert!(matches!(err, DbError::DuplicateQueue));
    }

    #[tokio::test]
    async fn test_queue_requires_known_event() {
        let (db, _) = setup().await;
        let orphan = Queue {
            id: generate_id(),
            event_id: "nope".into(),
            created_at: t0(),
            is_active: true,
        };
        let err = db.queues().insert_queue(&orphan).await.unwrap_err();
        assert!(matches!(err, DbError::UnknownReference(_)));
    }

    #[tokio::test]
    async fn test_turn_unique_per_client() {
        let (db, queue) = setup().await;
        let repo = db.queues();

        repo.insert_turn(&turn(&queue, "t1", "alice", t0())).await.unwrap();
        let err = repo
            .insert_turn(&turn(&queue, "t2", "alice", t0()))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateTurn));
    }

    #[tokio::test]
    async fn test_rank_uses_join_time_then_id() {
        let (db, queue) = setup().await;
        let repo = db.queues();

        let a = turn(&queue, "b-turn", "alice", t0());
        let b = turn(&queue, "a-turn", "bob", t0());
        let c = turn(&queue, "c-turn", "carol", t0() - Duration::seconds(1));
        for t in [&a, &b, &c] {
            repo.insert_turn(t).await.unwrap();
        }

        assert_eq!(repo.rank_of(&c).await.unwrap(), 1);
        assert_eq!(repo.rank_of(&b).await.unwrap(), 2);
        assert_eq!(repo.rank_of(&a).await.unwrap(), 3);
        assert_eq!(repo.count_turns(&queue.id).await.unwrap(), 3);

        // Removing the head shifts everyone up
        assert!(repo.delete_turn(&queue.id, "carol").await.unwrap());
        assert_eq!(repo.rank_of(&b).await.unwrap(), 1);
        assert_eq!(repo.rank_of(&a).await.unwrap(), 2);
        assert!(!repo.delete_turn(&queue.id, "carol").await.unwrap());
    }

    #[tokio::test]
    async fn test_touch_turn() {
        let (db, queue) = setup().await;
        let repo = db.queues();
        repo.insert_turn(&turn(&queue, "t1", "alice", t0())).await.unwrap();

        let later = t0() + Duration::seconds(30);
        assert!(repo.touch_turn(&queue.id, "alice", later).await.unwrap());
        assert!(!repo.touch_turn(&queue.id, "bob", later).await.unwrap());

        let found = repo.find_turn(&queue.id, "alice").await.unwrap().unwrap();
        assert_eq!(found.last_heartbeat_at, later);
        assert_eq!(found.joined_at, t0());
    }

    #[tokio::test]
    async fn test_delete_stale_turns_is_strict() {
        let (db, queue) = setup().await;
        let repo = db.queues();

        repo.insert_turn(&turn(&queue, "t1", "old", t0())).await.unwrap();
        repo.insert_turn(&turn(&queue, "t2", "edge", t0() + Duration::seconds(10)))
            .await
            .unwrap();
        repo.insert_turn(&turn(&queue, "t3", "fresh", t0() + Duration::seconds(20)))
            .await
            .unwrap();

        let removed = repo
            .delete_stale_turns(t0() + Duration::seconds(10))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(repo.find_turn(&queue.id, "old").await.unwrap().is_none());
        assert!(repo.find_turn(&queue.id, "edge").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_set_active_and_delete_for_event() {
        let (db, queue) = setup().await;
        let repo = db.queues();

        repo.set_active(&queue.id, false).await.unwrap();
        assert!(!repo.get_by_event("evt-1").await.unwrap().unwrap().is_active);
        assert!(repo.set_active("missing", true).await.is_err());

        repo.insert_turn(&turn(&queue, "t1", "alice", t0())).await.unwrap();
        assert!(repo.delete_turn_for_event("evt-1", "alice").await.unwrap());
        assert_eq!(repo.count_turns(&queue.id).await.unwrap(), 0);
    }
}
