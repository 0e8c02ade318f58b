//! Auto-centering concentrated liquidity vault.
//!
//! This crate keeps one managed tick range per pool centered on the market
//! price and splits ownership of the liquidity parked there between
//! depositors:
//! - Range registration, out-of-range detection and re-centering
//! - Proportional share issuance and redemption
//! - Authenticated single-shot settlement against the engine
//! - Event history and engine/accounting reconciliation

/// Prelude module for convenient imports.
pub mod prelude;

/// Share accounting.
pub mod accounting;
/// Vault configuration.
pub mod config;
/// Engine collaborator interfaces.
pub mod engine;
/// Error types.
pub mod error;
/// Vault event history.
pub mod lifecycle;
/// Managed ranges and rebalancing.
pub mod position;
/// Settlement of user actions against the engine.
pub mod settlement;
/// Engine/accounting reconciliation.
pub mod sync;
/// Top-level vault service.
pub mod vault;

#[cfg(test)]
mod testing;

pub use error::{Result, VaultError};
pub use vault::Vault;
