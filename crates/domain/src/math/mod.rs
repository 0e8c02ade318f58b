//! Fixed-point math for concentrated liquidity.
//!
//! Prices are carried as Q64.96 square roots in `U256`, liquidity as `u128`,
//! exactly as the engine reports them.

/// 512-bit intermediate multiplication and division.
pub mod full_math;
/// Amount <-> liquidity conversions.
pub mod liquidity_amounts;
/// Tick <-> sqrt price conversions and tick alignment.
pub mod tick_math;

pub use full_math::{Q96, div_rounding_up, mul_div, mul_div_rounding_up, to_u128};
pub use liquidity_amounts::{
    get_amount0_delta, get_amount1_delta, get_amounts_for_liquidity, get_liquidity_for_amount0,
    get_liquidity_for_amount1, get_liquidity_for_amounts,
};
pub use tick_math::{
    MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, align_tick, get_sqrt_ratio_at_tick,
    get_tick_at_sqrt_ratio, max_usable_tick, min_usable_tick, sqrt_price_to_price, tick_to_price,
};
