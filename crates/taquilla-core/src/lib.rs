//! # taquilla-core: Pure Business Logic for Taquilla
//!
//! This crate is the **heart** of Taquilla. It contains the on-sale rules
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Taquilla Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (HTTP)                              │   │
//! │  │    join queue ──► heartbeat ──► place order ──► confirm         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                taquilla-engine (services)                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ taquilla-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  tariff   │  │  points   │  │ validation│  │   │
//! │  │   │  Queue    │  │ resolver  │  │  ledger   │  │   rules   │  │   │
//! │  │   │  Order    │  │           │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 taquilla-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Queue, Turn, Zone, Tariff, Order, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`tariff`] - Active price selection for a zone at an instant
//! - [`points`] - Loyalty points earned / spent for a subtotal
//! - [`validation`] - Order request validation
//! - [`clock`] - Injectable time source
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use taquilla_core::money::Money;
//! use taquilla_core::points::{points_earned, points_spent};
//!
//! let subtotal = Money::from_major_minor(100, 0);
//! assert_eq!(points_earned(subtotal), 5);
//! assert_eq!(points_spent(subtotal), 10);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod error;
pub mod money;
pub mod points;
pub mod tariff;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default per-client ticket limit for one event.
///
/// ## Business Reason
/// Spreads a scarce on-sale across more buyers. Configurable per deployment
/// through the engine configuration.
pub const DEFAULT_MAX_TICKETS_PER_CLIENT: i64 = 4;

/// Default stale threshold for queue turns, in seconds.
pub const DEFAULT_STALE_TURN_SECS: u64 = 60;

/// Default cadence of the stale-turn sweep, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Maximum length of any externally supplied identifier.
pub const MAX_ID_LEN: usize = 64;
