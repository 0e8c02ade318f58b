//! Managed ranges, one per registered pool.

use super::rebalance::{RebalanceDecision, RebalanceOutcome, centered_range};
use crate::engine::{EngineContext, settle_balance_delta};
use crate::error::{Result, VaultError};
use std::collections::BTreeMap;
use tick_vault_domain::math::{MAX_TICK, MIN_TICK};
use tick_vault_domain::{Address, MathError, PoolId, PoolPosition, TickRange};
use tracing::{debug, info};

/// Owns the managed range of every registered pool and decides when to re-center it.
///
/// Knows nothing about shares or token amounts. Liquidity changes and tick
/// width updates are reserved to a single owner bound once.
#[derive(Debug, Clone)]
pub struct PositionManager {
    positions: BTreeMap<PoolId, PoolPosition>,
    default_tick_width: u32,
    owner: Option<Address>,
}

impl PositionManager {
    /// Creates a manager that seeds new ranges with `default_tick_width`.
    pub fn new(default_tick_width: u32) -> Self {
        Self {
            positions: BTreeMap::new(),
            default_tick_width,
            owner: None,
        }
    }

    /// Binds the single account allowed to mutate liquidity and tick widths.
    pub fn bind_owner(&mut self, owner: Address) -> Result<()> {
        if self.owner.is_some() {
            return Err(VaultError::VaultAlreadySet);
        }
        self.owner = Some(owner);
        Ok(())
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner
    }

    fn ensure_owner(&self, caller: Address) -> Result<()> {
        match self.owner {
            None => Err(VaultError::OwnerNotSet),
            Some(owner) if owner == caller => Ok(()),
            Some(_) => Err(VaultError::OnlyVault { caller }),
        }
    }

    /// Same as [`centered_range`].
    pub fn compute_centered_range(
        center_tick: i32,
        half_width: u32,
        tick_spacing: i32,
    ) -> Result<TickRange> {
        centered_range(center_tick, half_width, tick_spacing)
    }

    /// Starts managing `pool` with a range centered on `current_tick`.
    pub fn register(
        &mut self,
        pool: PoolId,
        current_tick: i32,
        tick_spacing: i32,
    ) -> Result<&PoolPosition> {
        if self.positions.contains_key(&pool) {
            return Err(VaultError::AlreadyRegistered(pool));
        }
        if tick_spacing <= 0 {
            return Err(VaultError::InvalidTickSpacing(tick_spacing));
        }
        if !(MIN_TICK..=MAX_TICK).contains(&current_tick) {
            return Err(MathError::TickOutOfBounds(current_tick).into());
        }

        let range = centered_range(current_tick, self.default_tick_width, tick_spacing)?;
        info!(
            pool = %pool,
            tick = current_tick,
            tick_spacing,
            range = %range,
            "Registered pool"
        );

        let position = PoolPosition {
            range,
            tick_width: self.default_tick_width,
            tick_spacing,
            liquidity: 0,
            initialized: true,
        };
        Ok(self.positions.entry(pool).or_insert(position))
    }

    /// Decides whether the position has to move after the pool price changed.
    ///
    /// Unregistered pools and empty positions never rebalance.
    pub fn on_price_observed(&self, pool: &PoolId, current_tick: i32) -> Result<RebalanceDecision> {
        let Some(position) = self.positions.get(pool) else {
            return Ok(RebalanceDecision::NoOp);
        };
        if !position.initialized || position.liquidity == 0 {
            return Ok(RebalanceDecision::NoOp);
        }
        if position.is_in_range(current_tick) {
            return Ok(RebalanceDecision::NoOp);
        }

        let to = centered_range(current_tick, position.tick_width, position.tick_spacing)?;
        debug!(
            pool = %pool,
            tick = current_tick,
            from = %position.range,
            to = %to,
            "Position out of range"
        );
        Ok(RebalanceDecision::Rebalance {
            from: position.range,
            to,
        })
    }

    /// Moves all liquidity of `pool` into a range centered on `current_tick`.
    ///
    /// Must run inside an engine transaction context: the remove, the add and
    /// the settlement of their net delta against `caller`'s own balance either
    /// all apply or the enclosing transaction aborts. Returns `None` when the
    /// position is empty or already centered there.
    pub fn apply_rebalance(
        &mut self,
        ctx: &mut dyn EngineContext,
        caller: Address,
        pool: &PoolId,
        current_tick: i32,
    ) -> Result<Option<RebalanceOutcome>> {
        self.ensure_owner(caller)?;
        let position = self.position(pool)?;
        if position.liquidity == 0 {
            return Ok(None);
        }

        let old_range = position.range;
        let liquidity = position.liquidity;
        let new_range = centered_range(current_tick, position.tick_width, position.tick_spacing)?;
        if new_range == old_range {
            return Ok(None);
        }

        let signed = i128::try_from(liquidity).map_err(|_| MathError::Overflow)?;
        let removed = ctx.modify_liquidity(caller, pool, old_range, -signed)?;
        let added = ctx.modify_liquidity(caller, pool, new_range, signed)?;
        let net_delta = removed.checked_add(added).ok_or(MathError::Overflow)?;

        let key = ctx.pool_key(pool)?;
        settle_balance_delta(ctx, caller, &key, net_delta, caller)?;

        if let Some(position) = self.positions.get_mut(pool) {
            position.range = new_range;
        }

        info!(
            pool = %pool,
            tick = current_tick,
            old_range = %old_range,
            new_range = %new_range,
            liquidity,
            net0 = net_delta.amount0,
            net1 = net_delta.amount1,
            "Rebalanced position"
        );

        Ok(Some(RebalanceOutcome {
            pool: pool.clone(),
            tick: current_tick,
            old_range,
            new_range,
            liquidity,
            net_delta,
        }))
    }

    /// Updates the half-width used by future rebalances; the current range stays put.
    pub fn set_tick_width(&mut self, caller: Address, pool: &PoolId, width: u32) -> Result<u32> {
        self.ensure_owner(caller)?;
        if width == 0 {
            return Err(VaultError::InvalidTickWidth);
        }
        let position = self
            .positions
            .get_mut(pool)
            .ok_or_else(|| VaultError::NotRegistered(pool.clone()))?;

        let previous = position.tick_width;
        position.tick_width = width;
        debug!(pool = %pool, previous, width, "Tick width updated");
        Ok(previous)
    }

    /// Checks that a signed liquidity change would not over- or underflow.
    pub fn check_liquidity_delta(&self, pool: &PoolId, delta: i128) -> Result<u128> {
        let position = self.position(pool)?;
        let magnitude = delta.unsigned_abs();
        let updated = if delta >= 0 {
            position.liquidity.checked_add(magnitude)
        } else {
            position.liquidity.checked_sub(magnitude)
        };
        updated.ok_or_else(|| MathError::Overflow.into())
    }

    /// Records a liquidity change the owner has already applied in the engine.
    pub fn apply_liquidity_delta(
        &mut self,
        caller: Address,
        pool: &PoolId,
        delta: i128,
    ) -> Result<u128> {
        self.ensure_owner(caller)?;
        let updated = self.check_liquidity_delta(pool, delta)?;
        if let Some(position) = self.positions.get_mut(pool) {
            position.liquidity = updated;
        }
        Ok(updated)
    }

    pub fn position(&self, pool: &PoolId) -> Result<&PoolPosition> {
        self.positions
            .get(pool)
            .ok_or_else(|| VaultError::NotRegistered(pool.clone()))
    }

    pub fn is_registered(&self, pool: &PoolId) -> bool {
        self.positions.contains_key(pool)
    }

    pub fn pools(&self) -> impl Iterator<Item = (&PoolId, &PoolPosition)> {
        self.positions.iter()
    }
}
