//! # Storage Ports
//!
//! The services reach storage only through these traits, one per
//! aggregate. [`taquilla_db::Database`] implements all of them.
//!
//! ```text
//! QueueService  ──► QueueStore   ─┐
//!               ──► CatalogStore ─┤
//! OrderService  ──► CatalogStore ─┼──► taquilla_db::Database (SQLite)
//!               ──► OrderStore   ─┘
//!                     └── begin() → Box<dyn OrderTransaction>
//! ```
//!
//! [`OrderTransaction`] makes the placement / confirmation boundary explicit:
//! every mutation between `begin()` and `commit()` lands together or not at
//! all. Dropping a transaction without committing rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taquilla_core::{Event, Order, OrderDetails, OrderLine, Queue, Tariff, Turn, Zone};
use taquilla_db::{Database, DbResult, OrderTx};

// =============================================================================
// Queue Store
// =============================================================================

#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn insert_queue(&self, queue: &Queue) -> DbResult<()>;
    async fn queue_by_event(&self, event_id: &str) -> DbResult<Option<Queue>>;
    async fn set_queue_active(&self, queue_id: &str, active: bool) -> DbResult<()>;

    async fn insert_turn(&self, turn: &Turn) -> DbResult<()>;
    async fn find_turn(&self, queue_id: &str, client_id: &str) -> DbResult<Option<Turn>>;
    /// 1-based rank by (joined_at, id).
    async fn turn_rank(&self, turn: &Turn) -> DbResult<i64>;
    async fn count_turns(&self, queue_id: &str) -> DbResult<i64>;
    async fn touch_turn(&self, queue_id: &str, client_id: &str, at: DateTime<Utc>)
        -> DbResult<bool>;
    async fn delete_turn(&self, queue_id: &str, client_id: &str) -> DbResult<bool>;
    async fn delete_turn_for_event(&self, event_id: &str, client_id: &str) -> DbResult<bool>;
    /// Single-statement delete of turns with `last_heartbeat_at < cutoff`.
    async fn delete_stale_turns(&self, cutoff: DateTime<Utc>) -> DbResult<u64>;
}

// =============================================================================
// Catalog Store
// =============================================================================

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn event(&self, event_id: &str) -> DbResult<Option<Event>>;
    async fn zone(&self, zone_id: &str) -> DbResult<Option<Zone>>;
    async fn zones_for_event(&self, event_id: &str) -> DbResult<Vec<Zone>>;
    async fn tariffs_for_zone(&self, zone_id: &str) -> DbResult<Vec<Tariff>>;
}

// =============================================================================
// Order Store
// =============================================================================

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn begin(&self) -> DbResult<Box<dyn OrderTransaction>>;
    async fn order_details(&self, order_id: &str) -> DbResult<Option<OrderDetails>>;
}

/// Mutations of one order placement or confirmation.
#[async_trait]
pub trait OrderTransaction: Send {
    async fn insert_order(&mut self, order: &Order) -> DbResult<()>;
    async fn tickets_held(&mut self, client_id: &str, event_id: &str) -> DbResult<i64>;
    /// Guarded stock take; false when the zone would exceed capacity.
    async fn reserve_seats(&mut self, zone_id: &str, quantity: i64) -> DbResult<bool>;
    async fn zone(&mut self, zone_id: &str) -> DbResult<Option<Zone>>;
    async fn insert_line(&mut self, line: &OrderLine, position: i64) -> DbResult<()>;
    /// Guarded pending → completed; false when not pending.
    async fn complete_order(&mut self, order_id: &str, at: DateTime<Utc>) -> DbResult<bool>;
    async fn order(&mut self, order_id: &str) -> DbResult<Option<Order>>;
    async fn lines(&mut self, order_id: &str) -> DbResult<Vec<OrderLine>>;
    async fn points_balance(&mut self, client_id: &str) -> DbResult<i64>;
    async fn credit_points(&mut self, client_id: &str, points: i64, at: DateTime<Utc>)
        -> DbResult<i64>;
    /// Guarded debit; `None` when the balance does not cover it.
    async fn debit_points(
        &mut self,
        client_id: &str,
        points: i64,
        at: DateTime<Utc>,
    ) -> DbResult<Option<i64>>;
    async fn commit(self: Box<Self>) -> DbResult<()>;
    async fn rollback(self: Box<Self>) -> DbResult<()>;
}

// =============================================================================
// SQLite Implementations
// =============================================================================

#[async_trait]
impl QueueStore for Database {
    async fn insert_queue(&self, queue: &Queue) -> DbResult<()> {
        self.queues().insert_queue(queue).await
    }

    async fn queue_by_event(&self, event_id: &str) -> DbResult<Option<Queue>> {
        self.queues().get_by_event(event_id).await
    }

    async fn set_queue_active(&self, queue_id: &str, active: bool) -> DbResult<()> {
        self.queues().set_active(queue_id, active).await
    }

    async fn insert_turn(&self, turn: &Turn) -> DbResult<()> {
        self.queues().insert_turn(turn).await
    }

    async fn find_turn(&self, queue_id: &str, client_id: &str) -> DbResult<Option<Turn>> {
        self.queues().find_turn(queue_id, client_id).await
    }

    async fn turn_rank(&self, turn: &Turn) -> DbResult<i64> {
        self.queues().rank_of(turn).await
    }

    async fn count_turns(&self, queue_id: &str) -> DbResult<i64> {
        self.queues().count_turns(queue_id).await
    }

    async fn touch_turn(
        &self,
        queue_id: &str,
        client_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        self.queues().touch_turn(queue_id, client_id, at).await
    }

    async fn delete_turn(&self, queue_id: &str, client_id: &str) -> DbResult<bool> {
        self.queues().delete_turn(queue_id, client_id).await
    }

    async fn delete_turn_for_event(&self, event_id: &str, client_id: &str) -> DbResult<bool> {
        self.queues().delete_turn_for_event(event_id, client_id).await
    }

    async fn delete_stale_turns(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        self.queues().delete_stale_turns(cutoff).await
    }
}

#[async_trait]
impl CatalogStore for Database {
    async fn event(&self, event_id: &str) -> DbResult<Option<Event>> {
        self.catalog().get_event(event_id).await
    }

    async fn zone(&self, zone_id: &str) -> DbResult<Option<Zone>> {
        self.catalog().get_zone(zone_id).await
    }

    async fn zones_for_event(&self, event_id: &str) -> DbResult<Vec<Zone>> {
        self.catalog().zones_for_event(event_id).await
    }

    async fn tariffs_for_zone(&self, zone_id: &str) -> DbResult<Vec<Tariff>> {
        self.catalog().tariffs_for_zone(zone_id).await
    }
}

#[async_trait]
impl OrderStore for Database {
    async fn begin(&self) -> DbResult<Box<dyn OrderTransaction>> {
        let tx = self.orders().begin().await?;
        Ok(Box::new(tx))
    }

    async fn order_details(&self, order_id: &str) -> DbResult<Option<OrderDetails>> {
        self.orders().get_details(order_id).await
    }
}

#[async_trait]
impl OrderTransaction for OrderTx {
    async fn insert_order(&mut self, order: &Order) -> DbResult<()> {
        OrderTx::insert_order(self, order).await
    }

    async fn tickets_held(&mut self, client_id: &str, event_id: &str) -> DbResult<i64> {
        OrderTx::tickets_held(self, client_id, event_id).await
    }

    async fn reserve_seats(&mut self, zone_id: &str, quantity: i64) -> DbResult<bool> {
        OrderTx::reserve_seats(self, zone_id, quantity).await
    }

    async fn zone(&mut self, zone_id: &str) -> DbResult<Option<Zone>> {
        OrderTx::zone(self, zone_id).await
    }

    async fn insert_line(&mut self, line: &OrderLine, position: i64) -> DbResult<()> {
        OrderTx::insert_line(self, line, position).await
    }

    async fn complete_order(&mut self, order_id: &str, at: DateTime<Utc>) -> DbResult<bool> {
        OrderTx::complete_order(self, order_id, at).await
    }

    async fn order(&mut self, order_id: &str) -> DbResult<Option<Order>> {
        OrderTx::order(self, order_id).await
    }

    async fn lines(&mut self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        OrderTx::lines(self, order_id).await
    }

    async fn points_balance(&mut self, client_id: &str) -> DbResult<i64> {
        OrderTx::points_balance(self, client_id).await
    }

    async fn credit_points(
        &mut self,
        client_id: &str,
        points: i64,
        at: DateTime<Utc>,
    ) -> DbResult<i64> {
        OrderTx::credit_points(self, client_id, points, at).await
    }

    async fn debit_points(
        &mut self,
        client_id: &str,
        points: i64,
        at: DateTime<Utc>,
    ) -> DbResult<Option<i64>> {
        OrderTx::debit_points(self, client_id, points, at).await
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        OrderTx::commit(*self).await
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        OrderTx::rollback(*self).await
    }
}
