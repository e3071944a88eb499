//! # Repository Module
//!
//! Database repository implementations for Taquilla.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Engine service                                                        │
//! │       │                                                                 │
//! │       │  db.queues().rank_of(&turn)                                    │
//! │       ▼                                                                 │
//! │  QueueRepository                                                       │
//! │  ├── insert_turn(&self, turn)                                          │
//! │  ├── find_turn(&self, queue_id, client_id)                             │
//! │  ├── rank_of(&self, turn)                                              │
//! │  └── delete_stale_turns(&self, cutoff)                                 │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Row structs (`*Row`) mirror the stored columns; conversion into the   │
//! │  domain types decodes millisecond timestamps and JSON columns.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`QueueRepository`](queue::QueueRepository) - Queues and turns
//! - [`CatalogRepository`](catalog::CatalogRepository) - Events, zones, tariffs
//! - [`OrderRepository`](order::OrderRepository) - Orders and the order transaction
//! - [`PointsRepository`](points::PointsRepository) - Loyalty balances

pub mod catalog;
pub mod order;
pub mod points;
pub mod queue;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Converts a stored millisecond timestamp into a UTC instant.
pub(crate) fn from_millis(column: &str, millis: i64) -> DbResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| DbError::corrupt(column, format!("timestamp {millis} out of range")))
}

/// Converts a UTC instant into its stored millisecond form.
#[inline]
pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Generates a new row id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_millis_conversion() {
        let at = Utc.with_ymd_and_hms(2026, 6, 1, 18, 30, 0).unwrap();
        assert_eq!(from_millis("t", to_millis(at)).unwrap(), at);
        assert!(from_millis("t", i64::MAX).is_err());
    }

    #[test]
    fn test_generate_id_is_uuid() {
        let id = generate_id();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(id, generate_id());
    }
}
