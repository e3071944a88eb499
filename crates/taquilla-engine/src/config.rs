//! # Engine Configuration
//!
//! Tunables shared by the services and the sweeper.
//!
//! | Setting                  | Default | Meaning                                   |
//! |--------------------------|---------|-------------------------------------------|
//! | `stale_turn_secs`        | 60      | heartbeat age after which a turn is stale |
//! | `sweep_interval_secs`    | 60      | cadence of the stale-turn sweep           |
//! | `max_tickets_per_client` | 4       | per-event ticket limit per client         |
//! | `admission_window`       | 1       | positions allowed to place orders         |
//! | `run_sweeper`            | true    | run the sweeper on this instance          |
//!
//! Worst-case staleness of a silent turn is about
//! `stale_turn_secs + sweep_interval_secs`.

use std::time::Duration;

use taquilla_core::{
    DEFAULT_MAX_TICKETS_PER_CLIENT, DEFAULT_STALE_TURN_SECS, DEFAULT_SWEEP_INTERVAL_SECS,
};

/// Default number of head-of-queue positions admitted to purchase.
pub const DEFAULT_ADMISSION_WINDOW: i64 = 1;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub stale_turn_secs: u64,
    pub sweep_interval_secs: u64,
    pub max_tickets_per_client: i64,
    pub admission_window: i64,
    pub run_sweeper: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            stale_turn_secs: DEFAULT_STALE_TURN_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            max_tickets_per_client: DEFAULT_MAX_TICKETS_PER_CLIENT,
            admission_window: DEFAULT_ADMISSION_WINDOW,
            run_sweeper: true,
        }
    }
}

impl EngineConfig {
    /// Sets the stale threshold in seconds.
    pub fn stale_turn_secs(mut self, secs: u64) -> Self {
        self.stale_turn_secs = secs;
        self
    }

    /// Sets the sweep cadence in seconds.
    pub fn sweep_interval_secs(mut self, secs: u64) -> Self {
        self.sweep_interval_secs = secs;
        self
    }

    /// Sets the per-client ticket limit.
    pub fn max_tickets_per_client(mut self, limit: i64) -> Self {
        self.max_tickets_per_client = limit;
        self
    }

    /// Sets how many head-of-queue positions may purchase.
    pub fn admission_window(mut self, window: i64) -> Self {
        self.admission_window = window;
        self
    }

    /// Enables or disables the sweeper on this instance.
    pub fn run_sweeper(mut self, run: bool) -> Self {
        self.run_sweeper = run;
        self
    }

    /// Stale threshold as a chrono duration, for cutoff arithmetic.
    pub fn stale_threshold(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stale_turn_secs as i64)
    }

    /// Sweep cadence as a std duration, for the tokio interval.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
