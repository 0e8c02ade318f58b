//! Domain types and fixed-point math for the tick vault.
//!
//! This crate provides the building blocks shared by the vault and the
//! simulated engine:
//! - Addresses, currencies, pool keys and price snapshots
//! - Tick ranges and managed pool positions
//! - Token amounts and signed balance deltas
//! - Q64.96 tick math and amount/liquidity conversions

/// Error types.
pub mod error;
/// Fixed-point math.
pub mod math;
/// Pool identity and price state.
pub mod pool;
/// Tick ranges and managed positions.
pub mod position;
/// Currencies, amounts and balance deltas.
pub mod token;

pub use error::MathError;
pub use pool::{PoolId, PoolKey, Slot0};
pub use position::{PoolPosition, TickRange};
pub use token::{Address, BalanceDelta, Currency, TokenAmounts};

pub use primitive_types::U256;
