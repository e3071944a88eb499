//! # Database Error Types
//!
//! SQLite failures classified by the constraint that raised them.
//!
//! ```text
//! SQLite message                                         DbError
//! ─────────────────────────────────────────────────────  ─────────────────────
//! UNIQUE constraint failed: queues.event_id              DuplicateQueue
//! UNIQUE constraint failed: turns.client_id, turns.queue_id
//!                                                        DuplicateTurn
//! UNIQUE constraint failed: <anything else>              UniqueViolation
//! FOREIGN KEY constraint failed                          UnknownReference
//! CHECK constraint failed: zone_within_capacity          CapacityExceeded
//! CHECK constraint failed: points_balance_non_negative   NegativeBalance
//! CHECK constraint failed: <anything else>               CheckViolation
//! ```
//!
//! The two duplicate variants are expected under concurrency (two instances
//! creating one queue, one client joining twice at once) and the engine
//! turns them into conflicts or idempotent replies. The capacity and balance
//! checks sit behind guarded updates and only fire if a guard is bypassed.

use thiserror::Error;

const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";
const CHECK_PREFIX: &str = "CHECK constraint failed: ";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// `queues.event_id` is unique: one waiting room per event.
    #[error("Event already has a queue")]
    DuplicateQueue,

    /// `(client_id, queue_id)` is unique on turns.
    #[error("Client already has a turn in this queue")]
    DuplicateTurn,

    /// Any other UNIQUE or PRIMARY KEY collision (re-seeded ids).
    #[error("Duplicate value for {columns}")]
    UniqueViolation { columns: String },

    /// A queue, zone, tariff or line pointing at a missing parent row.
    #[error("Referenced row does not exist: {0}")]
    UnknownReference(String),

    /// `zone_within_capacity`: purchased_count left `0..=capacity`.
    #[error("Zone capacity exceeded")]
    CapacityExceeded,

    /// `points_balance_non_negative`.
    #[error("Points balance would go negative")]
    NegativeBalance,

    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored data could not be decoded (bad timestamp, bad JSON).
    #[error("Corrupt {column} value: {message}")]
    Corrupt { column: String, message: String },

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn corrupt(column: impl Into<String>, message: impl ToString) -> Self {
        DbError::Corrupt {
            column: column.into(),
            message: message.to_string(),
        }
    }

    /// True for every UNIQUE collision, named or not.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DbError::DuplicateQueue | DbError::DuplicateTurn | DbError::UniqueViolation { .. }
        )
    }

    /// Maps a SQLite error message to the constraint that raised it.
    fn from_sqlite_message(msg: &str) -> Self {
        if let Some(columns) = msg.strip_prefix(UNIQUE_PREFIX) {
            return match columns {
                "queues.event_id" => DbError::DuplicateQueue,
                "turns.client_id, turns.queue_id" => DbError::DuplicateTurn,
                other => DbError::UniqueViolation {
                    columns: other.to_string(),
                },
            };
        }

        if let Some(check) = msg.strip_prefix(CHECK_PREFIX) {
            return match check {
                "zone_within_capacity" => DbError::CapacityExceeded,
                "points_balance_non_negative" => DbError::NegativeBalance,
                other => DbError::CheckViolation(other.to_string()),
            };
        }

        if msg.starts_with("FOREIGN KEY constraint failed") {
            return DbError::UnknownReference(msg.to_string());
        }

        DbError::QueryFailed(msg.to_string())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => DbError::from_sqlite_message(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::corrupt("attendee_ids", err)
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_messages_map_to_schema_constraints() {
        let err = DbError::from_sqlite_message("UNIQUE constraint failed: queues.event_id");
        assert!(matches!(err, DbError::DuplicateQueue));
        assert!(err.is_unique_violation());

        let err = DbError::from_sqlite_message(
            "UNIQUE constraint failed: turns.client_id, turns.queue_id",
        );
        assert!(matches!(err, DbError::DuplicateTurn));

        let err = DbError::from_sqlite_message("UNIQUE constraint failed: events.id");
        assert!(matches!(&err, DbError::UniqueViolation { columns } if columns == "events.id"));
        assert!(err.is_unique_violation());

        let err = DbError::from_sqlite_message("CHECK constraint failed: zone_within_capacity");
        assert!(matches!(err, DbError::CapacityExceeded));
        assert!(!err.is_unique_violation());

        let err =
            DbError::from_sqlite_message("CHECK constraint failed: points_balance_non_negative");
        assert!(matches!(err, DbError::NegativeBalance));

        let err = DbError::from_sqlite_message("FOREIGN KEY constraint failed");
        assert!(matches!(err, DbError::UnknownReference(_)));

        let err = DbError::from_sqlite_message("database is locked");
        assert!(matches!(err, DbError::QueryFailed(_)));
    }
}
