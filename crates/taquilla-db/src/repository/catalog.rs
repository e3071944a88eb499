//! # Catalog Repository
//!
//! Read access to events, zones and tariffs.
//!
//! The catalogue is owned by another component; this service only reads it,
//! apart from the `purchased_count` column that order placement bumps inside
//! the order transaction (see [`OrderTx`](super::order::OrderTx)). The
//! insert helpers exist for seeding and tests.

use sqlx::SqlitePool;
use tracing::debug;

use super::{from_millis, to_millis};
use crate::error::{DbError, DbResult};
use taquilla_core::{Event, Tariff, TariffKind, Zone};

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: String,
    name: String,
    starts_at: i64,
}

impl TryFrom<EventRow> for Event {
    type Error = DbError;

    fn try_from(row: EventRow) -> DbResult<Self> {
        Ok(Event {
            id: row.id,
            name: row.name,
            starts_at: from_millis("events.starts_at", row.starts_at)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ZoneRow {
    id: String,
    event_id: String,
    name: String,
    capacity: i64,
    purchased_count: i64,
}

impl From<ZoneRow> for Zone {
    fn from(row: ZoneRow) -> Self {
        Zone {
            id: row.id,
            event_id: row.event_id,
            name: row.name,
            capacity: row.capacity,
            purchased_count: row.purchased_count,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TariffRow {
    id: String,
    zone_id: String,
    kind: TariffKind,
    price_cents: i64,
    valid_from: i64,
    valid_until: i64,
}

impl TryFrom<TariffRow> for Tariff {
    type Error = DbError;

    fn try_from(row: TariffRow) -> DbResult<Self> {
        Ok(Tariff {
            id: row.id,
            zone_id: row.zone_id,
            kind: row.kind,
            price_cents: row.price_cents,
            valid_from: from_millis("tariffs.valid_from", row.valid_from)?,
            valid_until: from_millis("tariffs.valid_until", row.valid_until)?,
        })
    }
}

/// Repository for catalogue reads.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Gets an event by ID.
    pub async fn get_event(&self, id: &str) -> DbResult<Option<Event>> {
        let row: Option<EventRow> =
            sqlx::query_as("SELECT id, name, starts_at FROM events WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Event::try_from).transpose()
    }

    /// Gets a zone by ID.
    pub async fn get_zone(&self, id: &str) -> DbResult<Option<Zone>> {
        let row: Option<ZoneRow> = sqlx::query_as(
            r#"
            SELECT id, event_id, name, capacity, purchased_count
            FROM zones
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Zone::from))
    }

    /// All zones of an event, in name order.
    pub async fn zones_for_event(&self, event_id: &str) -> DbResult<Vec<Zone>> {
        let rows: Vec<ZoneRow> = sqlx::query_as(
            r#"
            SELECT id, event_id, name, capacity, purchased_count
            FROM zones
            WHERE event_id = ?1
            ORDER BY name, id
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Zone::from).collect())
    }

    /// All tariffs of a zone, earliest first.
    pub async fn tariffs_for_zone(&self, zone_id: &str) -> DbResult<Vec<Tariff>> {
        let rows: Vec<TariffRow> = sqlx::query_as(
            r#"
            SELECT id, zone_id, kind, price_cents, valid_from, valid_until
            FROM tariffs
            WHERE zone_id = ?1
            ORDER BY valid_from, id
            "#,
        )
        .bind(zone_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Tariff::try_from).collect()
    }

    // -------------------------------------------------------------------------
    // Seeding
    // -------------------------------------------------------------------------

    /// Inserts an event.
    pub async fn insert_event(&self, event: &Event) -> DbResult<()> {
        debug!(id = %event.id, "Inserting event");

        sqlx::query("INSERT INTO events (id, name, starts_at) VALUES (?1, ?2, ?3)")
            .bind(&event.id)
            .bind(&event.name)
            .bind(to_millis(event.starts_at))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Inserts a zone.
    pub async fn insert_zone(&self, zone: &Zone) -> DbResult<()> {
        debug!(id = %zone.id, event_id = %zone.event_id, capacity = zone.capacity, "Inserting zone");

        sqlx::query(
            r#"
            INSERT INTO zones (id, event_id, name, capacity, purchased_count)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&zone.id)
        .bind(&zone.event_id)
        .bind(&zone.name)
        .bind(zone.capacity)
        .bind(zone.purchased_count)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a tariff.
    pub async fn insert_tariff(&self, tariff: &Tariff) -> DbResult<()> {
        debug!(id = %tariff.id, zone_id = %tariff.zone_id, kind = ?tariff.kind, "Inserting tariff");

        sqlx::query(
            r#"
            INSERT INTO tariffs (id, zone_id, kind, price_cents, valid_from, valid_until)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&tariff.id)
        .bind(&tariff.zone_id)
        .bind(tariff.kind)
        .bind(tariff.price_cents)
        .bind(to_millis(tariff.valid_from))
        .bind(to_millis(tariff.valid_until))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of events in the catalogue.
    pub async fn count_events(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, TimeZone, Utc};

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let starts = Utc.with_ymd_and_hms(2026, 9, 1, 21, 0, 0).unwrap();
        db.catalog()
            .insert_event(&Event {
                id: "evt-1".into(),
                name: "Festival".into(),
                starts_at: starts,
            })
            .await
            .unwrap();
        db
    }

    fn zone(id: &str, name: &str, capacity: i64) -> Zone {
        Zone {
            id: id.into(),
            event_id: "evt-1".into(),
            name: name.into(),
            capacity,
            purchased_count: 0,
        }
    }

    #[tokio::test]
    async fn test_event_roundtrip() {
        let db = setup().await;
        let event = db.catalog().get_event("evt-1").await.unwrap().unwrap();
        assert_eq!(event.name, "Festival");
        assert!(db.catalog().get_event("missing").await.unwrap().is_none());
        assert_eq!(db.catalog().count_events().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_zones_for_event() {
        let db = setup().await;
        let repo = db.catalog();
        repo.insert_zone(&zone("z2", "Platea", 100)).await.unwrap();
        repo.insert_zone(&zone("z1", "Campo", 500)).await.unwrap();

        let zones = repo.zones_for_event("evt-1").await.unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].name, "Campo");
        assert_eq!(zones[0].available(), 500);
        assert!(repo.zones_for_event("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zone_capacity_check() {
        let db = setup().await;
        let mut overfull = zone("z1", "Campo", 10);
        overfull.purchased_count = 11;
        let err = db.catalog().insert_zone(&overfull).await.unwrap_err();
        assert!(matches!(err, DbError::CapacityExceeded));
    }

    #[tokio::test]
    async fn test_tariffs_for_zone() {
        let db = setup().await;
        let repo = db.catalog();
        repo.insert_zone(&zone("z1", "Campo", 10)).await.unwrap();

        let now = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let normal = Tariff {
            id: "t-normal".into(),
            zone_id: "z1".into(),
            kind: TariffKind::Normal,
            price_cents: 10000,
            valid_from: now,
            valid_until: now + Duration::days(30),
        };
        let presale = Tariff {
            id: "t-presale".into(),
            zone_id: "z1".into(),
            kind: TariffKind::Presale,
            price_cents: 8000,
            valid_from: now - Duration::days(7),
            valid_until: now,
        };
        repo.insert_tariff(&normal).await.unwrap();
        repo.insert_tariff(&presale).await.unwrap();

        let tariffs = repo.tariffs_for_zone("z1").await.unwrap();
        assert_eq!(tariffs, vec![presale, normal]);
    }
}
