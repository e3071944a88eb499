//! # Error Types
//!
//! Domain-specific error types for taquilla-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  taquilla-core errors (this file)                                      │
//! │  ├── CoreError        - Domain failures (sold out, not found, ...)     │
//! │  └── ValidationError  - Malformed input                                │
//! │                                                                         │
//! │  taquilla-db errors                                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  taquilla-engine errors                                                │
//! │  └── EngineError      - Core | Storage, classified by ErrorKind        │
//! │                                                                         │
//! │  apps/api errors                                                       │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError → Client   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Caller-facing classification of every failure in the system.
///
/// | Kind         | HTTP |
/// |--------------|------|
/// | `Validation` | 400  |
/// | `NotFound`   | 404  |
/// | `Conflict`   | 409  |
/// | `Internal`   | 500  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Event does not exist in the catalogue.
    #[error("Event not found: {0}")]
    EventNotFound(String),

    /// No queue exists for the event / with the id.
    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    /// The caller holds no turn in the queue.
    #[error("Turn not found for client {client_id} in queue {queue_id}")]
    TurnNotFound { client_id: String, queue_id: String },

    /// Zone does not exist or belongs to a different event.
    #[error("Zone {zone_id} not found for event {event_id}")]
    ZoneNotFound { zone_id: String, event_id: String },

    /// Order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// A queue was already created for the event.
    #[error("Queue already exists for event {0}")]
    QueueAlreadyExists(String),

    /// The queue has been closed for new entries.
    #[error("Queue {0} is closed")]
    QueueClosed(String),

    /// The client is not (yet) inside the admission window.
    ///
    /// ## User Workflow
    /// ```text
    /// Client polls position: 3
    ///      │
    ///      ▼
    /// POST /orders
    ///      │
    ///      ▼
    /// NotAdmitted { position: Some(3), window: 1 }
    ///      │
    ///      ▼
    /// Client keeps waiting and heartbeating
    /// ```
    #[error("Client {client_id} is not admitted (position {position:?}, window {window})")]
    NotAdmitted {
        client_id: String,
        position: Option<i64>,
        window: i64,
    },

    /// Zone has no price at the moment of placement.
    #[error("Zone {0} has no active tariff")]
    NotOnSale(String),

    /// Not enough remaining capacity in a zone.
    #[error("Zone {zone_id} sold out: available {available}, requested {requested}")]
    SoldOut {
        zone_id: String,
        available: i64,
        requested: i64,
    },

    /// Client would exceed the per-event ticket limit.
    #[error("Ticket limit exceeded: holding {held}, requested {requested}, limit {limit}")]
    TicketLimitExceeded { held: i64, requested: i64, limit: i64 },

    /// Presale confirmation without enough points.
    #[error("Insufficient points: balance {balance}, required {required}")]
    InsufficientPoints { balance: i64, required: i64 },

    /// Order is no longer pending.
    #[error("Order {0} is already completed")]
    OrderAlreadyCompleted(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies the error for callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::EventNotFound(_)
            | CoreError::QueueNotFound(_)
            | CoreError::TurnNotFound { .. }
            | CoreError::ZoneNotFound { .. }
            | CoreError::OrderNotFound(_) => ErrorKind::NotFound,

            CoreError::QueueAlreadyExists(_)
            | CoreError::QueueClosed(_)
            | CoreError::NotAdmitted { .. }
            | CoreError::NotOnSale(_)
            | CoreError::SoldOut { .. }
            | CoreError::TicketLimitExceeded { .. }
            | CoreError::InsufficientPoints { .. }
            | CoreError::OrderAlreadyCompleted(_) => ErrorKind::Conflict,

            CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
/// Used for early validation before any storage access.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Duplicate value (e.g., the same attendee twice in one order).
    #[error("{field} '{value}' is duplicated")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
