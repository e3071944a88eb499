//! Embedded schema migrations.
//!
//! `migrations/sqlite/` at the workspace root is compiled into the binary.
//! Every instance applies pending files when it opens the database; sqlx
//! records each one in `_sqlx_migrations`, so concurrent starts against the
//! same file apply a migration once.
//!
//! Files are `NNN_description.sql` and are never edited after release. The
//! named constraints in them (`zone_within_capacity`,
//! `points_balance_non_negative`) are matched by [`crate::error`].

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every migration not yet recorded. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(embedded = MIGRATOR.migrations.len(), "Schema up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_reopening_applies_nothing_new() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        run_migrations(&db.pool).await.unwrap();

        let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(applied as usize, MIGRATOR.migrations.len());

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('events', 'zones', 'tariffs', 'queues', 'turns', 'orders', 'order_lines', 'client_points')",
        )
        .fetch_one(&db.pool)
        .await
        .unwrap();
        assert_eq!(tables, 8);
    }
}
