//! Managed ranges and rebalancing.
//!
//! Provides:
//! - The per-pool managed range and its write-once owner binding
//! - Out-of-range detection with a half-open upper bound
//! - Deterministic re-centering of a range around a tick

mod manager;
mod rebalance;

pub use manager::*;
pub use rebalance::*;
