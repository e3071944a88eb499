//! # Order Placement Service
//!
//! Places orders without overselling, confirms them, and keeps the loyalty
//! ledger in step.
//!
//! ## place_order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. validate request            (lines, attendees, duplicates)          │
//! │  2. event exists                                                        │
//! │  3. admission gate              (position within window)                │
//! │  4. price every line            (tariff resolver at `now`)              │
//! │  ───────────────────────────── BEGIN ─────────────────────────────────  │
//! │  5. INSERT order                (takes the writer lock)                 │
//! │  6. per-client ticket limit     (counts this order too)                 │
//! │  7. per line: guarded UPDATE zones ... WHERE purchased + q <= capacity  │
//! │  8. INSERT lines                                                        │
//! │  ───────────────────────────── COMMIT ────────────────────────────────  │
//! │  any failure in 5-8 ──► ROLLBACK, nothing changed                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## confirm_standard / confirm_preventa
//! ```text
//! BEGIN
//!   UPDATE orders SET status = 'completed' WHERE id = ? AND status = 'pending'
//!   standard: credit points_earned(total)
//!   presale:  debit points_spent(total) WHERE balance >= spend
//! COMMIT ──► broadcast CompletedOrder ──► release the client's turn
//! ```

use std::sync::Arc;

use taquilla_core::points::{can_spend, points_earned, points_spent};
use taquilla_core::tariff::{min_active_price, resolve_active_price};
use taquilla_core::validation::{check_ticket_limit, validate_id, validate_order_request};
use taquilla_core::{
    Clock, CompletedOrder, ConfirmationKind, CoreError, EventPricing, Money, Order, OrderDetails,
    OrderLine, OrderRequest, OrderStatus, Tariff, ZonePricing,
};
use taquilla_db::repository::generate_id;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::queue::AdmissionGate;
use crate::store::{CatalogStore, OrderStore, OrderTransaction};

/// Capacity of the completed-order broadcast channel.
const COMPLETED_CHANNEL_CAPACITY: usize = 256;

pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogStore>,
    gate: Option<Arc<dyn AdmissionGate>>,
    clock: Arc<dyn Clock>,
    max_tickets_per_client: i64,
    completed_tx: broadcast::Sender<CompletedOrder>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let (completed_tx, _) = broadcast::channel(COMPLETED_CHANNEL_CAPACITY);

        OrderService {
            orders,
            catalog,
            gate: None,
            clock,
            max_tickets_per_client: config.max_tickets_per_client,
            completed_tx,
        }
    }

    /// Requires callers to be admitted by `gate` before placing orders, and
    /// releases their turn once an order is confirmed.
    pub fn with_gate(mut self, gate: Arc<dyn AdmissionGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Completed orders, for the ticket delivery component.
    pub fn subscribe(&self) -> broadcast::Receiver<CompletedOrder> {
        self.completed_tx.subscribe()
    }

    // -------------------------------------------------------------------------
    // Placement
    // -------------------------------------------------------------------------

    /// Places an order, taking stock from every zone atomically.
    ///
    /// ## Errors
    /// * `Validation` - empty order, empty line, blank or duplicate attendee
    /// * `EventNotFound` / `ZoneNotFound`
    /// * `NotAdmitted` - a gate is configured and the client is not admitted
    /// * `NotOnSale` - a zone has no active tariff
    /// * `TicketLimitExceeded` - the client would hold too many tickets
    /// * `SoldOut` - a zone lacks capacity; nothing was taken
    pub async fn place_order(
        &self,
        client_id: &str,
        request: &OrderRequest,
    ) -> EngineResult<OrderDetails> {
        let client_id = validate_id("client_id", client_id)?;
        validate_order_request(request)?;

        let event_id = validate_id("event_id", &request.event_id)?;
        if self.catalog.event(event_id).await?.is_none() {
            return Err(CoreError::EventNotFound(event_id.to_string()).into());
        }

        if let Some(gate) = &self.gate {
            gate.ensure_admitted(client_id, event_id).await?;
        }

        let now = self.clock.now();
        let order_id = generate_id();
        let mut lines = Vec::with_capacity(request.lines.len());

        for line in &request.lines {
            let zone_id = line.zone_id.trim();
            let zone = self
                .catalog
                .zone(zone_id)
                .await?
                .filter(|zone| zone.event_id == event_id)
                .ok_or_else(|| CoreError::ZoneNotFound {
                    zone_id: zone_id.to_string(),
                    event_id: event_id.to_string(),
                })?;

            let tariffs = self.catalog.tariffs_for_zone(&zone.id).await?;
            let active = resolve_active_price(&tariffs, now)
                .ok_or_else(|| CoreError::NotOnSale(zone.id.clone()))?;

            let quantity = line.quantity();
            lines.push(OrderLine {
                id: generate_id(),
                order_id: order_id.clone(),
                zone_id: zone.id,
                quantity,
                unit_price_cents: active.price.cents(),
                tariff_kind: active.kind,
                subtotal_cents: active.price.multiply_quantity(quantity).cents(),
                attendee_ids: line.attendee_ids.iter().map(|a| a.trim().to_string()).collect(),
            });
        }

        let total: Money = lines.iter().map(|l| Money::from_cents(l.subtotal_cents)).sum();
        let order = Order {
            id: order_id,
            client_id: client_id.to_string(),
            event_id: event_id.to_string(),
            status: OrderStatus::Pending,
            total_cents: total.cents(),
            ticket_count: request.ticket_count(),
            created_at: now,
            completed_at: None,
        };

        let mut tx = self.orders.begin().await?;

        // Written first so this transaction holds the writer lock before it
        // reads anything.
        tx.insert_order(&order).await?;

        let held = tx.tickets_held(client_id, event_id).await? - order.ticket_count;
        if let Err(err) = check_ticket_limit(held, order.ticket_count, self.max_tickets_per_client) {
            return abort(tx, err.into()).await;
        }

        for (position, line) in lines.iter().enumerate() {
            if !tx.reserve_seats(&line.zone_id, line.quantity).await? {
                let available = tx
                    .zone(&line.zone_id)
                    .await?
                    .map(|zone| zone.available())
                    .unwrap_or(0);
                let err = CoreError::SoldOut {
                    zone_id: line.zone_id.clone(),
                    available,
                    requested: line.quantity,
                };
                debug!(order_id = %order.id, zone_id = %line.zone_id, "Zone sold out, rolling back");
                return abort(tx, err.into()).await;
            }
            tx.insert_line(line, position as i64).await?;
        }

        tx.commit().await?;

        info!(
            order_id = %order.id,
            client_id = %client_id,
            event_id = %event_id,
            tickets = order.ticket_count,
            total = %order.total(),
            "Order placed"
        );

        Ok(OrderDetails { order, lines })
    }

    // -------------------------------------------------------------------------
    // Confirmation
    // -------------------------------------------------------------------------

    /// Completes an order and credits `points_earned(total)`.
    pub async fn confirm_standard(&self, order_id: &str) -> EngineResult<CompletedOrder> {
        self.confirm(order_id, ConfirmationKind::Standard).await
    }

    /// Completes an order and debits `points_spent(total)`.
    ///
    /// ## Errors
    /// * `InsufficientPoints` - balance too low; the order stays pending
    pub async fn confirm_preventa(&self, order_id: &str) -> EngineResult<CompletedOrder> {
        self.confirm(order_id, ConfirmationKind::Presale).await
    }

    async fn confirm(&self, order_id: &str, kind: ConfirmationKind) -> EngineResult<CompletedOrder> {
        let order_id = validate_id("order_id", order_id)?;
        let now = self.clock.now();

        let mut tx = self.orders.begin().await?;

        if !tx.complete_order(order_id, now).await? {
            let err = match tx.order(order_id).await? {
                Some(_) => CoreError::OrderAlreadyCompleted(order_id.to_string()),
                None => CoreError::OrderNotFound(order_id.to_string()),
            };
            return abort(tx, err.into()).await;
        }

        let Some(order) = tx.order(order_id).await? else {
            return abort(tx, CoreError::OrderNotFound(order_id.to_string()).into()).await;
        };

        let (points_delta, points_balance) = match kind {
            ConfirmationKind::Standard => {
                let earned = points_earned(order.total());
                let balance = tx.credit_points(&order.client_id, earned, now).await?;
                (earned, balance)
            }
            ConfirmationKind::Presale => {
                let required = points_spent(order.total());
                let balance = tx.points_balance(&order.client_id).await?;
                if !can_spend(balance, required) {
                    let err = CoreError::InsufficientPoints { balance, required };
                    return abort(tx, err.into()).await;
                }
                // The guarded debit has the final say.
                let Some(balance) = tx.debit_points(&order.client_id, required, now).await? else {
                    let err = CoreError::InsufficientPoints { balance, required };
                    return abort(tx, err.into()).await;
                };
                (-required, balance)
            }
        };

        let lines = tx.lines(order_id).await?;
        tx.commit().await?;

        info!(
            order_id = %order_id,
            client_id = %order.client_id,
            confirmation = ?kind,
            points_delta,
            points_balance,
            "Order confirmed"
        );

        let completed = CompletedOrder {
            order,
            lines,
            confirmation: kind,
            points_delta,
            points_balance,
        };

        if self.completed_tx.send(completed.clone()).is_err() {
            debug!(order_id = %order_id, "No completed-order subscribers");
        }

        if let Some(gate) = &self.gate {
            if let Err(e) = gate
                .release(&completed.order.client_id, &completed.order.event_id)
                .await
            {
                warn!(?e, order_id = %order_id, "Failed to release turn after confirmation");
            }
        }

        Ok(completed)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// An order with its lines.
    pub async fn get_order(&self, order_id: &str) -> EngineResult<OrderDetails> {
        let order_id = validate_id("order_id", order_id)?;

        self.orders
            .order_details(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    /// Listing view: active price and remaining capacity per zone.
    pub async fn event_pricing(&self, event_id: &str) -> EngineResult<EventPricing> {
        let event_id = validate_id("event_id", event_id)?;

        if self.catalog.event(event_id).await?.is_none() {
            return Err(CoreError::EventNotFound(event_id.to_string()).into());
        }

        let now = self.clock.now();
        let zones = self.catalog.zones_for_event(event_id).await?;

        let mut tariffs: Vec<Vec<Tariff>> = Vec::with_capacity(zones.len());
        for zone in &zones {
            tariffs.push(self.catalog.tariffs_for_zone(&zone.id).await?);
        }

        let rows = zones
            .iter()
            .zip(&tariffs)
            .map(|(zone, zone_tariffs)| ZonePricing {
                zone_id: zone.id.clone(),
                zone_name: zone.name.clone(),
                available: zone.available(),
                active_price: resolve_active_price(zone_tariffs, now),
            })
            .collect();

        Ok(EventPricing {
            event_id: event_id.to_string(),
            zones: rows,
            min_price: min_active_price(tariffs.iter().map(Vec::as_slice), now),
        })
    }
}

/// Rolls back and returns `err`. A failed rollback is logged; the
/// connection discards the transaction either way.
async fn abort<T>(tx: Box<dyn OrderTransaction>, err: EngineError) -> EngineResult<T> {
    if let Err(e) = tx.rollback().await {
        warn!(?e, "Rollback failed");
    }
    Err(err)
}

// =============================================================================
// Unit Tests
// =============================================================================
