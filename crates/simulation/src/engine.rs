//! In-memory AMM engine.
//!
//! Implements the vault's collaborator traits with the semantics of a
//! singleton pool manager: liquidity changes and payments only inside an
//! unlocked transaction, per-caller open deltas that must net to zero, and
//! a full rollback of engine state when a transaction fails.

use std::collections::{BTreeMap, HashMap};
use tick_vault_core::engine::{
    EngineContext, EngineError, PoolEngine, PoolHooks, UnlockCallback,
};
use tick_vault_domain::math::{
    get_amounts_for_liquidity, get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio,
};
use tick_vault_domain::{
    Address, BalanceDelta, Currency, MathError, PoolId, PoolKey, Slot0, TickRange, TokenAmounts,
    U256,
};
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct PoolRecord {
    key: PoolKey,
    slot0: Slot0,
}

#[derive(Debug, Clone, Default)]
struct EngineState {
    pools: BTreeMap<PoolId, PoolRecord>,
    positions: HashMap<(PoolId, Address, TickRange), u128>,
    wallets: HashMap<(Address, Currency), u128>,
    reserves: HashMap<Currency, u128>,
    deltas: HashMap<(Address, Currency), i128>,
}

/// Hooks that accept everything, for pools without a vault attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl PoolHooks for NoHooks {
    type Error = EngineError;

    fn after_initialize(&mut self, _: Address, _: &PoolKey, _: i32) -> Result<(), EngineError> {
        Ok(())
    }

    fn after_swap(
        &mut self,
        _: Address,
        _: &mut dyn EngineContext,
        _: &PoolKey,
        _: i32,
    ) -> Result<(), EngineError> {
        Ok(())
    }
}

/// A single-process pool manager holding pools, positions and token custody.
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    address: Address,
    state: EngineState,
    unlocked: bool,
    paused: bool,
}

impl SimulatedEngine {
    /// Creates an empty engine identified by `address`.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            state: EngineState::default(),
            unlocked: false,
            paused: false,
        }
    }

    /// Creates a pool at `sqrt_price_x96` and notifies `hooks`.
    ///
    /// The pool is dropped again if the hook rejects it.
    pub fn initialize<H: PoolHooks>(
        &mut self,
        key: PoolKey,
        sqrt_price_x96: U256,
        hooks: &mut H,
    ) -> Result<PoolId, H::Error> {
        let pool = key.id();
        if self.state.pools.contains_key(&pool) {
            return Err(EngineError::PoolAlreadyInitialized(pool).into());
        }
        let tick = get_tick_at_sqrt_ratio(sqrt_price_x96).map_err(EngineError::from)?;

        self.state.pools.insert(
            pool.clone(),
            PoolRecord {
                key: key.clone(),
                slot0: Slot0 {
                    sqrt_price_x96,
                    tick,
                },
            },
        );
        if let Err(e) = hooks.after_initialize(self.address, &key, tick) {
            self.state.pools.remove(&pool);
            return Err(e);
        }

        info!(pool = %pool, tick, "Pool initialized");
        Ok(pool)
    }

    /// Moves the price of `pool` to `tick`, trading against `trader`.
    ///
    /// The trader pays in or receives the change in token backing of all
    /// positions in the pool. `after_swap` runs inside the same
    /// transaction; if it fails, the price move is rolled back as well.
    /// Returns the trader's delta (positive = received).
    pub fn swap_to_tick<H: PoolHooks>(
        &mut self,
        trader: Address,
        pool: &PoolId,
        tick: i32,
        hooks: &mut H,
    ) -> Result<BalanceDelta, H::Error> {
        if self.unlocked {
            return Err(EngineError::AlreadyUnlocked.into());
        }
        let snapshot = self.state.clone();
        self.unlocked = true;
        let result = self.swap_inner(trader, pool, tick, hooks);
        self.unlocked = false;

        if result.is_err() {
            debug!(pool = %pool, tick, "Swap rolled back");
            self.state = snapshot;
        }
        result
    }

    fn swap_inner<H: PoolHooks>(
        &mut self,
        trader: Address,
        pool: &PoolId,
        tick: i32,
        hooks: &mut H,
    ) -> Result<BalanceDelta, H::Error> {
        let record = self.pool(pool)?.clone();
        let sqrt_next = get_sqrt_ratio_at_tick(tick).map_err(EngineError::from)?;

        // Both sides round in the engine's favor.
        let before = self.backing(pool, record.slot0.sqrt_price_x96, false)?;
        let after = self.backing(pool, sqrt_next, true)?;
        let trader_delta = BalanceDelta::new(
            signed(before.amount0)? - signed(after.amount0)?,
            signed(before.amount1)? - signed(after.amount1)?,
        );

        if let Some(entry) = self.state.pools.get_mut(pool) {
            entry.slot0 = Slot0 {
                sqrt_price_x96: sqrt_next,
                tick,
            };
        }
        self.pay_trader(trader, record.key.currency0, trader_delta.amount0)?;
        self.pay_trader(trader, record.key.currency1, trader_delta.amount1)?;

        hooks.after_swap(self.address, self, &record.key, tick)?;
        self.ensure_settled()?;

        debug!(
            pool = %pool,
            from = record.slot0.tick,
            to = tick,
            delta0 = trader_delta.amount0,
            delta1 = trader_delta.amount1,
            "Swap executed"
        );
        Ok(trader_delta)
    }

    /// Credits `amount` of `currency` to `account` out of thin air.
    pub fn mint(
        &mut self,
        account: Address,
        currency: Currency,
        amount: u128,
    ) -> Result<(), EngineError> {
        let wallet = self.state.wallets.entry((account, currency)).or_insert(0);
        *wallet = wallet.checked_add(amount).ok_or(MathError::Overflow)?;
        Ok(())
    }

    pub fn balance_of(&self, account: Address, currency: Currency) -> u128 {
        self.state
            .wallets
            .get(&(account, currency))
            .copied()
            .unwrap_or(0)
    }

    /// Tokens held by the engine on behalf of all positions.
    pub fn reserves_of(&self, currency: Currency) -> u128 {
        self.state.reserves.get(&currency).copied().unwrap_or(0)
    }

    /// Pausing blocks every liquidity change, including rebalances triggered by swaps.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn pools(&self) -> impl Iterator<Item = &PoolId> {
        self.state.pools.keys()
    }

    /// Sum of liquidity of every position in `pool`.
    pub fn pool_liquidity(&self, pool: &PoolId) -> u128 {
        self.state
            .positions
            .iter()
            .filter(|((id, _, _), _)| id == pool)
            .fold(0u128, |acc, (_, l)| acc.saturating_add(*l))
    }

    fn pool(&self, pool: &PoolId) -> Result<&PoolRecord, EngineError> {
        self.state
            .pools
            .get(pool)
            .ok_or_else(|| EngineError::PoolNotInitialized(pool.clone()))
    }

    fn ensure_unlocked(&self) -> Result<(), EngineError> {
        if self.unlocked {
            Ok(())
        } else {
            Err(EngineError::ManagerLocked)
        }
    }

    /// Token amounts backing every position of `pool` at `sqrt_price`.
    fn backing(
        &self,
        pool: &PoolId,
        sqrt_price: U256,
        round_up: bool,
    ) -> Result<TokenAmounts, EngineError> {
        let mut total = TokenAmounts::zero();
        for ((id, _, range), liquidity) in &self.state.positions {
            if id != pool {
                continue;
            }
            let amounts = get_amounts_for_liquidity(
                sqrt_price,
                get_sqrt_ratio_at_tick(range.lower)?,
                get_sqrt_ratio_at_tick(range.upper)?,
                *liquidity,
                round_up,
            )?;
            total.amount0 = total
                .amount0
                .checked_add(amounts.amount0)
                .ok_or(MathError::Overflow)?;
            total.amount1 = total
                .amount1
                .checked_add(amounts.amount1)
                .ok_or(MathError::Overflow)?;
        }
        Ok(total)
    }

    fn pay_trader(
        &mut self,
        trader: Address,
        currency: Currency,
        amount: i128,
    ) -> Result<(), EngineError> {
        let magnitude = amount.unsigned_abs();
        if amount > 0 {
            self.withdraw_reserves(currency, magnitude)?;
            self.mint(trader, currency, magnitude)
        } else if amount < 0 {
            self.debit_wallet(trader, currency, magnitude)?;
            self.deposit_reserves(currency, magnitude)
        } else {
            Ok(())
        }
    }

    fn debit_wallet(
        &mut self,
        account: Address,
        currency: Currency,
        amount: u128,
    ) -> Result<(), EngineError> {
        let available = self.balance_of(account, currency);
        if available < amount {
            return Err(EngineError::InsufficientBalance {
                account,
                currency,
                required: amount,
                available,
            });
        }
        self.state
            .wallets
            .insert((account, currency), available - amount);
        Ok(())
    }

    fn deposit_reserves(&mut self, currency: Currency, amount: u128) -> Result<(), EngineError> {
        let reserve = self.state.reserves.entry(currency).or_insert(0);
        *reserve = reserve.checked_add(amount).ok_or(MathError::Overflow)?;
        Ok(())
    }

    fn withdraw_reserves(&mut self, currency: Currency, amount: u128) -> Result<(), EngineError> {
        let available = self.reserves_of(currency);
        if available < amount {
            return Err(EngineError::InsufficientReserves {
                currency,
                required: amount,
                available,
            });
        }
        self.state.reserves.insert(currency, available - amount);
        Ok(())
    }

    fn accrue(
        &mut self,
        account: Address,
        currency: Currency,
        amount: i128,
    ) -> Result<(), EngineError> {
        let delta = self.state.deltas.entry((account, currency)).or_insert(0);
        *delta = delta.checked_add(amount).ok_or(MathError::Overflow)?;
        Ok(())
    }

    fn ensure_settled(&mut self) -> Result<(), EngineError> {
        self.state.deltas.retain(|_, amount| *amount != 0);
        match self.state.deltas.iter().next() {
            None => Ok(()),
            Some((&(account, currency), &amount)) => Err(EngineError::CurrencyNotSettled {
                account,
                currency,
                amount,
            }),
        }
    }
}

fn signed(amount: u128) -> Result<i128, EngineError> {
    i128::try_from(amount).map_err(|_| MathError::Overflow.into())
}

impl EngineContext for SimulatedEngine {
    fn address(&self) -> Address {
        self.address
    }

    fn pool_key(&self, pool: &PoolId) -> Result<PoolKey, EngineError> {
        Ok(self.pool(pool)?.key.clone())
    }

    fn slot0(&self, pool: &PoolId) -> Result<Slot0, EngineError> {
        Ok(self.pool(pool)?.slot0)
    }

    fn position_liquidity(
        &self,
        pool: &PoolId,
        owner: Address,
        range: TickRange,
    ) -> Result<u128, EngineError> {
        self.pool(pool)?;
        Ok(self
            .state
            .positions
            .get(&(pool.clone(), owner, range))
            .copied()
            .unwrap_or(0))
    }

    fn modify_liquidity(
        &mut self,
        caller: Address,
        pool: &PoolId,
        range: TickRange,
        liquidity_delta: i128,
    ) -> Result<BalanceDelta, EngineError> {
        self.ensure_unlocked()?;
        if self.paused {
            return Err(EngineError::Paused);
        }
        let record = self.pool(pool)?;
        if !range.is_valid(record.key.tick_spacing) {
            return Err(EngineError::InvalidRange(range));
        }
        let sqrt_price = record.slot0.sqrt_price_x96;
        let (currency0, currency1) = (record.key.currency0, record.key.currency1);

        let slot = (pool.clone(), caller, range);
        let current = self.state.positions.get(&slot).copied().unwrap_or(0);
        let magnitude = liquidity_delta.unsigned_abs();
        let updated = if liquidity_delta >= 0 {
            current.checked_add(magnitude).ok_or(MathError::Overflow)?
        } else {
            current
                .checked_sub(magnitude)
                .ok_or(EngineError::InsufficientLiquidity {
                    requested: magnitude,
                    available: current,
                })?
        };

        // Adding rounds up what the caller owes, removing rounds down what it receives.
        let amounts = get_amounts_for_liquidity(
            sqrt_price,
            get_sqrt_ratio_at_tick(range.lower)?,
            get_sqrt_ratio_at_tick(range.upper)?,
            magnitude,
            liquidity_delta > 0,
        )?;
        let (amount0, amount1) = (signed(amounts.amount0)?, signed(amounts.amount1)?);
        let delta = if liquidity_delta > 0 {
            BalanceDelta::new(-amount0, -amount1)
        } else {
            BalanceDelta::new(amount0, amount1)
        };

        if updated == 0 {
            self.state.positions.remove(&slot);
        } else {
            self.state.positions.insert(slot, updated);
        }
        self.accrue(caller, currency0, delta.amount0)?;
        self.accrue(caller, currency1, delta.amount1)?;

        debug!(
            pool = %pool,
            caller = ?caller,
            range = %range,
            liquidity_delta,
            delta0 = delta.amount0,
            delta1 = delta.amount1,
            "Liquidity modified"
        );
        Ok(delta)
    }

    fn settle(
        &mut self,
        caller: Address,
        currency: Currency,
        payer: Address,
        amount: u128,
    ) -> Result<(), EngineError> {
        self.ensure_unlocked()?;
        let credit = signed(amount)?;
        self.debit_wallet(payer, currency, amount)?;
        self.deposit_reserves(currency, amount)?;
        self.accrue(caller, currency, credit)
    }

    fn take(
        &mut self,
        caller: Address,
        currency: Currency,
        recipient: Address,
        amount: u128,
    ) -> Result<(), EngineError> {
        self.ensure_unlocked()?;
        let debit = signed(amount)?;
        self.withdraw_reserves(currency, amount)?;
        self.mint(recipient, currency, amount)?;
        self.accrue(caller, currency, -debit)
    }
}

impl PoolEngine for SimulatedEngine {
    fn unlock<C: UnlockCallback>(
        &mut self,
        caller: Address,
        callback: &mut C,
        data: &[u8],
    ) -> Result<Vec<u8>, C::Error> {
        if self.unlocked {
            return Err(EngineError::AlreadyUnlocked.into());
        }
        let snapshot = self.state.clone();
        self.unlocked = true;

        let sender = self.address;
        let result = match callback.unlock_callback(sender, self, data) {
            Ok(output) => self
                .ensure_settled()
                .map(|()| output)
                .map_err(C::Error::from),
            Err(e) => Err(e),
        };
        self.unlocked = false;

        if result.is_err() {
            debug!(caller = ?caller, "Transaction rolled back");
            self.state = snapshot;
        }
        result
    }
}
