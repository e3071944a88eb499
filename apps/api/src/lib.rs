//! # Taquilla API
//!
//! HTTP server for the waiting room and ticket orders.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         API Routes                                      │
//! │                                                                         │
//! │  ┌──────────────────────────────┐  ┌──────────────────────────────────┐│
//! │  │  Waiting room                │  │  Orders                          ││
//! │  │                              │  │                                  ││
//! │  │ • POST   /queues/{event}     │  │ • POST  /orders                  ││
//! │  │ • POST   …/{event}/close     │  │                                  ││
//! │  │ • POST   …/{event}/turns     │  │ • GET   /orders/{id}             ││
//! │  │ • GET    …/turns/{client}    │  │ • PATCH /orders/{id}/confirm-*   ││
//! │  │ • POST   …/{client}/heartbeat│  │ • GET   /events/{id}/pricing     ││
//! │  │ • DELETE …/turns/{client}    │  │                                  ││
//! │  └──────────────────────────────┘  └──────────────────────────────────┘│
//! │                                                                         │
//! │  GET /health                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - HTTP server port (default: 8080)
//! - `DATABASE_PATH` - SQLite file (default: taquilla.db)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `DB_BUSY_TIMEOUT_MS` - writer wait on a locked database (default: 5000)
//! - `STALE_TURN_SECS` - heartbeat age before eviction (default: 60)
//! - `SWEEP_INTERVAL_SECS` - sweep cadence (default: 60)
//! - `MAX_TICKETS_PER_CLIENT` - per-event limit (default: 4)
//! - `ADMISSION_WINDOW` - positions allowed to buy (default: 1)
//! - `REQUIRE_ADMISSION` - gate orders on the queue (default: true)
//! - `RUN_SWEEPER` - run the stale-turn sweeper here (default: true)

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use taquilla_core::{Clock, SystemClock};
use taquilla_db::Database;
use taquilla_engine::{EngineConfig, OrderService, QueueService};

// Re-exports
pub use config::ApiConfig;
pub use error::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub queues: Arc<QueueService>,
    pub orders: Arc<OrderService>,
}

impl AppState {
    /// Builds both services over `db`. With `require_admission`, orders are
    /// gated on the client's queue position.
    pub fn new(
        db: Database,
        clock: Arc<dyn Clock>,
        engine: EngineConfig,
        require_admission: bool,
    ) -> Self {
        let store = Arc::new(db.clone());

        let queues = Arc::new(QueueService::new(
            store.clone(),
            store.clone(),
            clock.clone(),
            engine.clone(),
        ));

        let mut orders = OrderService::new(store.clone(), store, clock, engine);
        if require_admission {
            orders = orders.with_gate(queues.clone());
        }

        AppState {
            db,
            queues,
            orders: Arc::new(orders),
        }
    }

    /// State for the running server, on the system clock.
    pub fn from_config(db: Database, config: &ApiConfig) -> Self {
        Self::new(
            db,
            Arc::new(SystemClock),
            config.engine_config(),
            config.require_admission,
        )
    }
}

/// The full HTTP surface.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        // The first segment is an event id for create/join and a queue id
        // below `/turns/{client_id}`.
        .route("/queues/{id}", post(routes::create_queue))
        .route("/queues/{id}/close", post(routes::close_queue))
        .route("/queues/{id}/turns", post(routes::join_queue))
        .route(
            "/queues/{id}/turns/{client_id}",
            get(routes::get_position).delete(routes::leave_queue),
        )
        .route(
            "/queues/{id}/turns/{client_id}/heartbeat",
            post(routes::heartbeat),
        )
        .route("/orders", post(routes::place_order))
        .route("/orders/{id}", get(routes::get_order))
        .route("/orders/{id}/confirm-standard", patch(routes::confirm_standard))
        .route("/orders/{id}/confirm-preventa", patch(routes::confirm_preventa))
        .route("/events/{id}/pricing", get(routes::event_pricing))
        .with_state(state)
}
