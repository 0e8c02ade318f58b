//! Minimal in-crate engine double for unit tests.

use crate::engine::{EngineContext, EngineError, PoolEngine, UnlockCallback};
use std::collections::HashMap;
use tick_vault_domain::math::get_sqrt_ratio_at_tick;
use tick_vault_domain::{
    Address, BalanceDelta, Currency, PoolId, PoolKey, Slot0, TickRange,
};

/// Records liquidity per range and charges `L` of token0 and `2L` of token1 per unit.
pub(crate) struct FakeEngine {
    address: Address,
    pool: PoolId,
    key: PoolKey,
    tick: i32,
    positions: HashMap<(Address, TickRange), u128>,
    open: BalanceDelta,
    payments: Vec<(Currency, Address, i128)>,
    modify_calls: usize,
    fail_after: Option<usize>,
    unlocked: bool,
}

impl FakeEngine {
    pub(crate) fn new(pool: PoolId, tick_spacing: i32) -> Self {
        let mut engine = Self::for_key(fixture_key(tick_spacing));
        engine.pool = pool;
        engine
    }

    /// Engine whose only pool is `key`, addressed by `key.id()`.
    pub(crate) fn for_key(key: PoolKey) -> Self {
        Self {
            address: Address::from_low_u64_be(0xe0),
            pool: key.id(),
            key,
            tick: 0,
            positions: HashMap::new(),
            open: BalanceDelta::ZERO,
            payments: Vec::new(),
            modify_calls: 0,
            fail_after: None,
            unlocked: true,
        }
    }

    pub(crate) fn locked(mut self) -> Self {
        self.unlocked = false;
        self
    }

    pub(crate) fn set_tick(&mut self, tick: i32) {
        self.tick = tick;
    }

    pub(crate) fn seed_position(&mut self, owner: Address, range: TickRange, liquidity: u128) {
        self.positions.insert((owner, range), liquidity);
    }

    pub(crate) fn liquidity_of(&self, owner: Address, range: TickRange) -> u128 {
        self.positions.get(&(owner, range)).copied().unwrap_or(0)
    }

    pub(crate) fn fail_modify_after(&mut self, calls: usize) {
        self.fail_after = Some(calls);
    }

    pub(crate) fn modify_calls(&self) -> usize {
        self.modify_calls
    }

    pub(crate) fn open_delta(&self) -> BalanceDelta {
        self.open
    }

    pub(crate) fn payments(&self) -> &[(Currency, Address, i128)] {
        &self.payments
    }

    fn check_pool(&self, pool: &PoolId) -> Result<(), EngineError> {
        if pool != &self.pool {
            return Err(EngineError::PoolNotInitialized(pool.clone()));
        }
        Ok(())
    }
}

/// Pool key with currencies `0xc0`/`0xc1` and the vault fixture `0x7a` as hooks.
pub(crate) fn fixture_key(tick_spacing: i32) -> PoolKey {
    PoolKey::new(
        Currency::from_low_u64(0xc0),
        Currency::from_low_u64(0xc1),
        3000,
        tick_spacing,
        Address::from_low_u64_be(0x7a),
    )
    .unwrap()
}

impl EngineContext for FakeEngine {
    fn address(&self) -> Address {
        self.address
    }

    fn pool_key(&self, pool: &PoolId) -> Result<PoolKey, EngineError> {
        self.check_pool(pool)?;
        Ok(self.key.clone())
    }

    fn slot0(&self, pool: &PoolId) -> Result<Slot0, EngineError> {
        self.check_pool(pool)?;
        Ok(Slot0 {
            sqrt_price_x96: get_sqrt_ratio_at_tick(self.tick)?,
            tick: self.tick,
        })
    }

    fn position_liquidity(
        &self,
        pool: &PoolId,
        owner: Address,
        range: TickRange,
    ) -> Result<u128, EngineError> {
        self.check_pool(pool)?;
        Ok(self.liquidity_of(owner, range))
    }

    fn modify_liquidity(
        &mut self,
        caller: Address,
        pool: &PoolId,
        range: TickRange,
        liquidity_delta: i128,
    ) -> Result<BalanceDelta, EngineError> {
        self.check_pool(pool)?;
        if !self.unlocked {
            return Err(EngineError::ManagerLocked);
        }
        if self.fail_after == Some(self.modify_calls) {
            return Err(EngineError::Paused);
        }
        self.modify_calls += 1;

        let current = self.liquidity_of(caller, range);
        let magnitude = liquidity_delta.unsigned_abs();
        let updated = if liquidity_delta >= 0 {
            current + magnitude
        } else {
            current
                .checked_sub(magnitude)
                .ok_or(EngineError::InsufficientLiquidity {
                    requested: magnitude,
                    available: current,
                })?
        };
        self.positions.insert((caller, range), updated);

        let delta = BalanceDelta::new(-liquidity_delta, -2 * liquidity_delta);
        self.open = self.open + delta;
        Ok(delta)
    }

    fn settle(
        &mut self,
        _caller: Address,
        currency: Currency,
        payer: Address,
        amount: u128,
    ) -> Result<(), EngineError> {
        let amount = amount as i128;
        if currency == self.key.currency0 {
            self.open.amount0 += amount;
        } else {
            self.open.amount1 += amount;
        }
        self.payments.push((currency, payer, -amount));
        Ok(())
    }

    fn take(
        &mut self,
        _caller: Address,
        currency: Currency,
        recipient: Address,
        amount: u128,
    ) -> Result<(), EngineError> {
        let amount = amount as i128;
        if currency == self.key.currency0 {
            self.open.amount0 -= amount;
        } else {
            self.open.amount1 -= amount;
        }
        self.payments.push((currency, recipient, amount));
        Ok(())
    }
}

impl PoolEngine for FakeEngine {
    fn unlock<C: UnlockCallback>(
        &mut self,
        _caller: Address,
        callback: &mut C,
        data: &[u8],
    ) -> Result<Vec<u8>, C::Error> {
        // No rollback here; the simulated engine covers atomicity.
        let was_unlocked = std::mem::replace(&mut self.unlocked, true);
        let sender = self.address;
        let result = callback.unlock_callback(sender, self, data);
        self.unlocked = was_unlocked;
        result
    }
}
