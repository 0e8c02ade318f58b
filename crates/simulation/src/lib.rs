//! Simulation harness for the tick vault.
//!
//! This crate provides an in-memory engine the vault can be attached to,
//! together with tick path generators and a scenario runner:
//! - Pool manager with transaction rollback and token custody
//! - Seeded Gaussian and deterministic tick paths
//! - End-to-end runs with depositors, swaps and rebalances

/// In-memory AMM engine.
pub mod engine;
/// Error types.
pub mod error;
/// Prelude module for convenient imports.
pub mod prelude;
/// Tick path generators.
pub mod price_path;
/// Scenario runner.
pub mod runner;

pub use engine::{NoHooks, SimulatedEngine};
pub use error::SimulationError;
