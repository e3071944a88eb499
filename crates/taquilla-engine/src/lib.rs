//! # taquilla-engine
//!
//! Services that turn the pure rules of `taquilla-core` into operations over
//! the SQLite store of `taquilla-db`.
//!
//! ## Modules
//! - [`queue`]: waiting room membership, positions and the admission gate
//! - [`order`]: order placement, confirmation and price listing
//! - [`sweeper`]: background eviction of stale turns
//! - [`store`]: storage ports the services depend on
//! - [`config`]: tunables
//! - [`error`]: the engine error type
//!
//! ## Wiring
//! ```rust,no_run
//! use std::sync::Arc;
//! use taquilla_core::SystemClock;
//! use taquilla_db::{Database, DbConfig};
//! use taquilla_engine::{EngineConfig, OrderService, QueueService};
//!
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Arc::new(Database::new(DbConfig::new("taquilla.db")).await?);
//! let clock = Arc::new(SystemClock);
//! let config = EngineConfig::default();
//!
//! let queues = Arc::new(QueueService::new(db.clone(), db.clone(), clock.clone(), config.clone()));
//! let orders = OrderService::new(db.clone(), db, clock, config).with_gate(queues);
//! # let _ = orders;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod order;
pub mod queue;
pub mod store;
pub mod sweeper;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use order::OrderService;
pub use queue::{AdmissionGate, QueueService};
pub use store::{CatalogStore, OrderStore, OrderTransaction, QueueStore};
pub use sweeper::{StaleTurnSweeper, SweeperHandle};
