//! Vault event history.
//!
//! This module records what the vault did, pool by pool:
//! registrations, deposits, withdrawals, rebalances and tick width changes.

mod events;
mod log;

pub use events::*;
pub use log::*;
