//! Range centering and rebalance decisions.

use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};
use tick_vault_domain::math::{MAX_TICK, MIN_TICK, align_tick};
use tick_vault_domain::{BalanceDelta, PoolId, TickRange};

/// Outcome of observing a new pool price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceDecision {
    /// Keep the current range.
    NoOp,
    /// Move the liquidity from `from` to the freshly centered `to`.
    Rebalance { from: TickRange, to: TickRange },
}

impl RebalanceDecision {
    pub fn is_rebalance(&self) -> bool {
        matches!(self, RebalanceDecision::Rebalance { .. })
    }
}

/// Result of a rebalance applied against the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceOutcome {
    pub pool: PoolId,
    pub tick: i32,
    pub old_range: TickRange,
    pub new_range: TickRange,
    /// Liquidity moved; unchanged by the move.
    pub liquidity: u128,
    /// Net engine delta of the remove/add pair, settled against the vault's reserves.
    pub net_delta: BalanceDelta,
}

/// Computes the range of `half_width` spacings on each side of `center_tick`.
///
/// The center is aligned with truncating division, both bounds are clamped to
/// `[MIN_TICK, MAX_TICK]` and re-aligned. Bounds that end up unordered are a
/// [`VaultError::DegenerateRange`].
pub fn centered_range(center_tick: i32, half_width: u32, tick_spacing: i32) -> Result<TickRange> {
    if tick_spacing <= 0 {
        return Err(VaultError::InvalidTickSpacing(tick_spacing));
    }
    if half_width == 0 {
        return Err(VaultError::InvalidTickWidth);
    }

    let aligned = i64::from(align_tick(center_tick, tick_spacing)?);
    let offset = i64::from(half_width) * i64::from(tick_spacing);

    let lower = clamp_tick(aligned - offset);
    let upper = clamp_tick(aligned + offset);

    let lower = align_tick(lower, tick_spacing)?;
    let upper = align_tick(upper, tick_spacing)?;

    if lower >= upper {
        return Err(VaultError::DegenerateRange { lower, upper });
    }
    Ok(TickRange::new(lower, upper))
}

fn clamp_tick(tick: i64) -> i32 {
    // Clamped into i32 range, so the narrowing cannot truncate.
    tick.clamp(i64::from(MIN_TICK), i64::from(MAX_TICK)) as i32
}
