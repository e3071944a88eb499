//! # taquilla-db: Database Layer for Taquilla
//!
//! This crate provides durable storage for queues, turns, orders and
//! loyalty points. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Taquilla Data Flow                               │
//! │                                                                         │
//! │  taquilla-engine (QueueService / OrderService / StaleTurnSweeper)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   taquilla-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ QueueRepo     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CatalogRepo   │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ OrderRepo/Tx  │    │              │  │   │
//! │  │   │ Management    │    │ PointsRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │         SQLite Database (one file shared by all instances)      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use taquilla_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("taquilla.db")).await?;
//! let queue = db.queues().get_by_event("evt-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::order::{OrderRepository, OrderTx};
pub use repository::points::PointsRepository;
pub use repository::queue::QueueRepository;
