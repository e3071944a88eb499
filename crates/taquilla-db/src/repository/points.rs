//! # Points Repository
//!
//! Loyalty balances per client. A client with no row has a balance of 0.
//! Credits and debits during confirmation go through
//! [`OrderTx`](super::order::OrderTx) so they commit with the order.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::to_millis;
use crate::error::DbResult;

/// Repository for loyalty point balances.
#[derive(Debug, Clone)]
pub struct PointsRepository {
    pool: SqlitePool,
}

impl PointsRepository {
    /// Creates a new PointsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PointsRepository { pool }
    }

    /// Current balance; 0 for unknown clients.
    pub async fn get_balance(&self, client_id: &str) -> DbResult<i64> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM client_points WHERE client_id = ?1")
                .bind(client_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(balance.unwrap_or(0))
    }

    /// Overwrites a balance (seeding and support tooling).
    pub async fn set_balance(&self, client_id: &str, balance: i64, at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO client_points (client_id, balance, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (client_id) DO UPDATE SET
                balance = excluded.balance,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(client_id)
        .bind(balance)
        .bind(to_millis(at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_unknown_client_has_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(db.points().get_balance("nobody").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_balance_upserts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.points();

        repo.set_balance("alice", 40, Utc::now()).await.unwrap();
        repo.set_balance("alice", 15, Utc::now()).await.unwrap();
        assert_eq!(repo.get_balance("alice").await.unwrap(), 15);

        let err = repo.set_balance("alice", -1, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::NegativeBalance));
    }
}
