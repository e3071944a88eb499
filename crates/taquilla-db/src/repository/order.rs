//! # Order Repository
//!
//! Database operations for orders, order lines, and the transaction that
//! places or confirms an order.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. PLACE (one OrderTx)                                                │
//! │     └── insert_order()   → takes the SQLite writer lock first          │
//! │     └── tickets_held()   → per-client limit, includes this order       │
//! │     └── reserve_seats()  → guarded purchased_count bump per line       │
//! │     └── insert_line()    → price frozen on the line                    │
//! │     └── commit()                                                       │
//! │                                                                         │
//! │  2. CONFIRM (one OrderTx)                                              │
//! │     └── complete_order() → pending → completed, guarded                │
//! │     └── credit_points() / debit_points()                               │
//! │     └── commit()                                                       │
//! │                                                                         │
//! │  Any failure → rollback(): stock, status and points stay untouched.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why write first?
//! A deferred SQLite transaction that reads before writing can fail with
//! `SQLITE_BUSY` when it tries to upgrade its snapshot. Every `OrderTx`
//! opens with a write, so concurrent placements queue on the writer lock
//! (bounded by `busy_timeout`) and each one sees the committed stock of
//! the previous one.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use super::{from_millis, to_millis};
use crate::error::{DbError, DbResult};
use taquilla_core::{Order, OrderDetails, OrderLine, OrderStatus, TariffKind, Zone};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    client_id: String,
    event_id: String,
    status: OrderStatus,
    total_cents: i64,
    ticket_count: i64,
    created_at: i64,
    completed_at: Option<i64>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        Ok(Order {
            id: row.id,
            client_id: row.client_id,
            event_id: row.event_id,
            status: row.status,
            total_cents: row.total_cents,
            ticket_count: row.ticket_count,
            created_at: from_millis("orders.created_at", row.created_at)?,
            completed_at: row
                .completed_at
                .map(|ms| from_millis("orders.completed_at", ms))
                .transpose()?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: String,
    order_id: String,
    zone_id: String,
    quantity: i64,
    unit_price_cents: i64,
    tariff_kind: TariffKind,
    subtotal_cents: i64,
    attendee_ids: String,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = DbError;

    fn try_from(row: OrderLineRow) -> DbResult<Self> {
        Ok(OrderLine {
            id: row.id,
            order_id: row.order_id,
            zone_id: row.zone_id,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            tariff_kind: row.tariff_kind,
            subtotal_cents: row.subtotal_cents,
            attendee_ids: serde_json::from_str(&row.attendee_ids)?,
        })
    }
}

const SELECT_ORDER: &str = r#"
    SELECT id, client_id, event_id, status, total_cents, ticket_count,
           created_at, completed_at
    FROM orders
    WHERE id = ?1
"#;

const SELECT_LINES: &str = r#"
    SELECT id, order_id, zone_id, quantity, unit_price_cents, tariff_kind,
           subtotal_cents, attendee_ids
    FROM order_lines
    WHERE order_id = ?1
    ORDER BY position
"#;

const SELECT_TICKETS_HELD: &str = r#"
    SELECT COALESCE(SUM(ticket_count), 0)
    FROM orders
    WHERE client_id = ?1 AND event_id = ?2
      AND status IN ('pending', 'completed')
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for order reads and for opening order transactions.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Opens a transaction for placing or confirming an order.
    pub async fn begin(&self) -> DbResult<OrderTx> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(OrderTx { tx })
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(SELECT_ORDER)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    /// Gets all lines of an order, in placement order.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let rows: Vec<OrderLineRow> = sqlx::query_as(SELECT_LINES)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(OrderLine::try_from).collect()
    }

    /// Gets an order together with its lines.
    pub async fn get_details(&self, id: &str) -> DbResult<Option<OrderDetails>> {
        let Some(order) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let lines = self.get_lines(id).await?;
        Ok(Some(OrderDetails { order, lines }))
    }

    /// Tickets a client holds for an event in pending or completed orders.
    pub async fn tickets_held(&self, client_id: &str, event_id: &str) -> DbResult<i64> {
        let held: i64 = sqlx::query_scalar(SELECT_TICKETS_HELD)
            .bind(client_id)
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(held)
    }
}

// =============================================================================
// Order Transaction
// =============================================================================

/// One order placement or confirmation, all-or-nothing.
///
/// Dropping an `OrderTx` without calling [`commit`](OrderTx::commit) rolls
/// it back.
pub struct OrderTx {
    tx: Transaction<'static, Sqlite>,
}

impl OrderTx {
    /// Inserts the order header.
    pub async fn insert_order(&mut self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, client_id = %order.client_id, event_id = %order.event_id, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, client_id, event_id, status,
                total_cents, ticket_count, created_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&order.id)
        .bind(&order.client_id)
        .bind(&order.event_id)
        .bind(order.status)
        .bind(order.total_cents)
        .bind(order.ticket_count)
        .bind(to_millis(order.created_at))
        .bind(order.completed_at.map(to_millis))
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    /// Tickets a client holds for an event, as seen by this transaction.
    pub async fn tickets_held(&mut self, client_id: &str, event_id: &str) -> DbResult<i64> {
        let held: i64 = sqlx::query_scalar(SELECT_TICKETS_HELD)
            .bind(client_id)
            .bind(event_id)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(held)
    }

    /// Takes `quantity` seats from a zone if they are still available.
    ///
    /// Returns false, changing nothing, when the zone would go over
    /// capacity.
    pub async fn reserve_seats(&mut self, zone_id: &str, quantity: i64) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE zones
            SET purchased_count = purchased_count + ?2
            WHERE id = ?1 AND purchased_count + ?2 <= capacity
            "#,
        )
        .bind(zone_id)
        .bind(quantity)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Reads a zone inside the transaction.
    pub async fn zone(&mut self, zone_id: &str) -> DbResult<Option<Zone>> {
        let row: Option<(String, String, String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT id, event_id, name, capacity, purchased_count
            FROM zones
            WHERE id = ?1
            "#,
        )
        .bind(zone_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(|(id, event_id, name, capacity, purchased_count)| Zone {
            id,
            event_id,
            name,
            capacity,
            purchased_count,
        }))
    }

    /// Inserts an order line. `position` keeps lines in request order.
    pub async fn insert_line(&mut self, line: &OrderLine, position: i64) -> DbResult<()> {
        let attendees = serde_json::to_string(&line.attendee_ids)?;

        sqlx::query(
            r#"
            INSERT INTO order_lines (
                id, order_id, zone_id, quantity, unit_price_cents,
                tariff_kind, subtotal_cents, attendee_ids, position
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&line.id)
        .bind(&line.order_id)
        .bind(&line.zone_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.tariff_kind)
        .bind(line.subtotal_cents)
        .bind(attendees)
        .bind(position)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    /// Moves a pending order to completed.
    ///
    /// Returns false when the order is missing or already completed.
    pub async fn complete_order(&mut self, order_id: &str, at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET status = 'completed', completed_at = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(order_id)
        .bind(to_millis(at))
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Reads an order inside the transaction.
    pub async fn order(&mut self, order_id: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(SELECT_ORDER)
            .bind(order_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(Order::try_from).transpose()
    }

    /// Reads an order's lines inside the transaction.
    pub async fn lines(&mut self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let rows: Vec<OrderLineRow> = sqlx::query_as(SELECT_LINES)
            .bind(order_id)
            .fetch_all(&mut *self.tx)
            .await?;

        rows.into_iter().map(OrderLine::try_from).collect()
    }

    /// Current points balance as seen by this transaction.
    pub async fn points_balance(&mut self, client_id: &str) -> DbResult<i64> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM client_points WHERE client_id = ?1")
                .bind(client_id)
                .fetch_optional(&mut *self.tx)
                .await?;

        Ok(balance.unwrap_or(0))
    }

    /// Adds points, creating the balance row if needed. Returns the new balance.
    pub async fn credit_points(
        &mut self,
        client_id: &str,
        points: i64,
        at: DateTime<Utc>,
    ) -> DbResult<i64> {
        sqlx::query(
            r#"
            INSERT INTO client_points (client_id, balance, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (client_id) DO UPDATE SET
                balance = balance + excluded.balance,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(client_id)
        .bind(points)
        .bind(to_millis(at))
        .execute(&mut *self.tx)
        .await?;

        self.points_balance(client_id).await
    }

    /// Removes points if the balance covers them.
    ///
    /// Returns the new balance, or `None` (balance untouched) when it is
    /// insufficient.
    pub async fn debit_points(
        &mut self,
        client_id: &str,
        points: i64,
        at: DateTime<Utc>,
    ) -> DbResult<Option<i64>> {
        if points == 0 {
            return self.points_balance(client_id).await.map(Some);
        }

        let result = sqlx::query(
            r#"
            UPDATE client_points
            SET balance = balance - ?2, updated_at = ?3
            WHERE client_id = ?1 AND balance >= ?2
            "#,
        )
        .bind(client_id)
        .bind(points)
        .bind(to_millis(at))
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.points_balance(client_id).await.map(Some)
    }

    /// Commits the transaction.
    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    /// Rolls the transaction back.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
