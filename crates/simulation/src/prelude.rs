//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use tick_vault_simulation::prelude::*;
//! ```

// Engine
pub use crate::engine::{NoHooks, SimulatedEngine};

// Errors
pub use crate::error::SimulationError;

// Tick path generators
pub use crate::price_path::{DeterministicTickPath, GaussianTickWalk, TickPathGenerator};

// Runner
pub use crate::runner::{SimulationConfig, SimulationSummary, VaultSimulation};
