//! # Domain Types
//!
//! Core domain types used throughout Taquilla.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Waiting room                      Catalogue (read model)               │
//! │  ┌─────────────────┐               ┌─────────────────┐                  │
//! │  │     Queue       │ 1 per event   │     Event       │                  │
//! │  │  event_id (UQ)  │◄──────────────│                 │                  │
//! │  └────────┬────────┘               └────────┬────────┘                  │
//! │           │ 1..n                            │ 1..n                      │
//! │  ┌────────▼────────┐               ┌────────▼────────┐   ┌───────────┐ │
//! │  │      Turn       │               │      Zone       │──►│  Tariff   │ │
//! │  │ (client,queue)UQ│               │ capacity        │   │ normal /  │ │
//! │  │ joined_at       │               │ purchased_count │   │ presale   │ │
//! │  │ last_heartbeat  │               └────────▲────────┘   └───────────┘ │
//! │  └─────────────────┘                        │                           │
//! │                                    ┌────────┴────────┐                  │
//! │  Purchases                         │   OrderLine     │ frozen price     │
//! │  ┌─────────────────┐  1..n         │  attendee_ids   │                  │
//! │  │     Order       │──────────────►│                 │                  │
//! │  │ pending→complete│               └─────────────────┘                  │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Waiting Room
// =============================================================================

/// The virtual waiting room for one event's on-sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    pub id: String,
    pub event_id: String,
    pub created_at: DateTime<Utc>,
    /// Inactive queues accept no new turns.
    pub is_active: bool,
}

/// One client's membership in a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub id: String,
    pub client_id: String,
    pub queue_id: String,
    pub joined_at: DateTime<Utc>,
    pub last_heartbeat_at: DateTime<Utc>,
}

/// A client's rank in a queue, recomputed on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePosition {
    pub queue_id: String,
    pub client_id: String,
    /// 1-based rank by (joined_at, turn id).
    pub position: i64,
    /// Number of turns currently in the queue.
    pub waiting: i64,
    /// Position is within the admission window.
    pub admitted: bool,
}

// =============================================================================
// Catalogue
// =============================================================================

/// A sellable event, as supplied by the external catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub starts_at: DateTime<Utc>,
}

/// A purchasable section of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub capacity: i64,
    pub purchased_count: i64,
}

impl Zone {
    /// Tickets still for sale.
    #[inline]
    pub fn available(&self) -> i64 {
        (self.capacity - self.purchased_count).max(0)
    }
}

/// Pricing tier of a tariff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TariffKind {
    /// Regular on-sale price.
    Normal,
    /// Early, points-gated price (preventa).
    Presale,
}

/// A priced, time-windowed rate attached to a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tariff {
    pub id: String,
    pub zone_id: String,
    pub kind: TariffKind,
    pub price_cents: i64,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl Tariff {
    /// Returns the price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Orders
// =============================================================================

/// The status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, stock taken, not yet confirmed.
    #[default]
    Pending,
    /// Confirmed; points applied.
    Completed,
}

/// A purchase of tickets for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub client_id: String,
    pub event_id: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub ticket_count: i64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Per-zone breakdown of an order.
/// Uses snapshot pattern: price and tariff kind are frozen at placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub zone_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub tariff_kind: TariffKind,
    pub subtotal_cents: i64,
    /// One attendee per ticket; `len() == quantity`.
    pub attendee_ids: Vec<String>,
}

/// Inbound order line: the quantity is the number of attendees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub zone_id: String,
    pub attendee_ids: Vec<String>,
}

impl OrderLineRequest {
    #[inline]
    pub fn quantity(&self) -> i64 {
        self.attendee_ids.len() as i64
    }
}

/// Inbound order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub event_id: String,
    pub lines: Vec<OrderLineRequest>,
}

impl OrderRequest {
    /// Total tickets requested across all lines.
    pub fn ticket_count(&self) -> i64 {
        self.lines.iter().map(OrderLineRequest::quantity).sum()
    }
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Which points policy a confirmation applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationKind {
    /// Earn points on the total.
    Standard,
    /// Spend points on the total.
    Presale,
}

/// Result of a confirmation, handed to the ticket delivery component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedOrder {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub confirmation: ConfirmationKind,
    /// Positive when earned, negative when spent.
    pub points_delta: i64,
    pub points_balance: i64,
}

// =============================================================================
// Listing
// =============================================================================

/// Price resolved for a zone at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePrice {
    pub kind: TariffKind,
    pub price: Money,
}

/// One row of an event's price listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZonePricing {
    pub zone_id: String,
    pub zone_name: String,
    pub available: i64,
    pub active_price: Option<ActivePrice>,
}

/// Listing view for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPricing {
    pub event_id: String,
    pub zones: Vec<ZonePricing>,
    /// Minimum active price across zones; `None` when nothing is on sale.
    pub min_price: Option<Money>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_available_never_negative() {
        let zone = Zone {
            id: "z".into(),
            event_id: "e".into(),
            name: "Campo".into(),
            capacity: 10,
            purchased_count: 10,
        };
        assert_eq!(zone.available(), 0);
    }

    #[test]
    fn test_order_request_ticket_count() {
        let req = OrderRequest {
            event_id: "e".into(),
            lines: vec![
                OrderLineRequest {
                    zone_id: "a".into(),
                    attendee_ids: vec!["1".into(), "2".into()],
                },
                OrderLineRequest {
                    zone_id: "b".into(),
                    attendee_ids: vec!["3".into()],
                },
            ],
        };
        assert_eq!(req.ticket_count(), 3);
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_order_request_deserializes_camel_case() {
        let json = r#"{"eventId":"e1","lines":[{"zoneId":"z1","attendeeIds":["111"]}]}"#;
        let req: OrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.event_id, "e1");
        assert_eq!(req.lines[0].zone_id, "z1");
        assert_eq!(req.lines[0].quantity(), 1);
    }
}
