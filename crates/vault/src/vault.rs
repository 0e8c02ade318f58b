//! The vault service: one object owning every pool's position and share ledger.

use crate::accounting::{ShareAccounting, VaultState};
use crate::config::VaultConfig;
use crate::engine::{EngineContext, PoolEngine, PoolHooks, UnlockCallback};
use crate::error::{Result, VaultError};
use crate::lifecycle::{EventLog, VaultEventKind};
use crate::position::{PositionManager, RebalanceDecision, RebalanceOutcome};
use crate::settlement::{PendingSettlement, SettlementCoordinator, SettlementReceipt};
use crate::sync::{ReconcileReport, reconcile};
use serde::{Deserialize, Serialize};
use tick_vault_domain::math::{
    get_amounts_for_liquidity, get_liquidity_for_amounts, get_sqrt_ratio_at_tick,
};
use tick_vault_domain::{
    Address, MathError, PoolId, PoolKey, PoolPosition, TickRange, TokenAmounts, U256,
};
use tracing::{debug, error, info};

/// Result of a committed deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositOutcome {
    pub shares: u128,
    pub liquidity: u128,
    /// Amounts actually paid in.
    pub amounts: TokenAmounts,
}

/// Result of a committed withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawOutcome {
    pub shares: u128,
    pub liquidity: u128,
    /// Amounts actually received.
    pub amounts: TokenAmounts,
}

/// What a deposit would do at the current price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositPreview {
    pub liquidity: u128,
    pub shares: u128,
    /// Amounts the engine would charge, rounded up.
    pub amounts: TokenAmounts,
}

/// What a withdrawal would do at the current price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawPreview {
    pub liquidity: u128,
    /// Amounts the engine would pay out, rounded down.
    pub amounts: TokenAmounts,
}

/// Auto-centering liquidity vault attached to a single engine.
///
/// The vault is the hook account of its pools and the owner of their
/// engine-side positions. Registration and rebalancing are driven by the
/// engine through [`PoolHooks`]; deposits and withdrawals open an engine
/// transaction and are settled from [`UnlockCallback`].
#[derive(Debug)]
pub struct Vault {
    address: Address,
    config: VaultConfig,
    positions: PositionManager,
    accounting: ShareAccounting,
    settlement: SettlementCoordinator,
    events: EventLog,
}

impl Vault {
    /// Creates a vault at `address` that trusts callbacks from `pool_manager` only.
    pub fn new(address: Address, pool_manager: Address, config: VaultConfig) -> Result<Self> {
        config.validate()?;
        let mut positions = PositionManager::new(config.default_tick_width);
        positions.bind_owner(address)?;
        info!(
            vault = ?address,
            pool_manager = ?pool_manager,
            default_tick_width = config.default_tick_width,
            "Vault created"
        );
        Ok(Self {
            address,
            config,
            positions,
            accounting: ShareAccounting::new(),
            settlement: SettlementCoordinator::new(pool_manager),
            events: EventLog::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn pool_manager(&self) -> Address {
        self.settlement.pool_manager()
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Starts managing the pool of `key`. Only the engine may register pools.
    pub fn register(&mut self, sender: Address, key: &PoolKey, tick: i32) -> Result<PoolPosition> {
        self.settlement.authenticate(sender)?;
        let pool = key.id();
        let position = self
            .positions
            .register(pool.clone(), tick, key.tick_spacing)?
            .clone();
        self.accounting.open(pool.clone())?;
        self.events.record(
            &pool,
            VaultEventKind::Registered {
                tick,
                range: position.range,
            },
        );
        Ok(position)
    }

    /// Reacts to a price change reported by the engine, re-centering if needed.
    ///
    /// Runs inside the engine transaction of the swap that moved the price,
    /// so a failed rebalance aborts that swap.
    pub fn on_price_observed(
        &mut self,
        sender: Address,
        ctx: &mut dyn EngineContext,
        key: &PoolKey,
        tick: i32,
    ) -> Result<Option<RebalanceOutcome>> {
        self.settlement.authenticate(sender)?;
        let pool = key.id();

        let decision = self.positions.on_price_observed(&pool, tick)?;
        if decision == RebalanceDecision::NoOp {
            return Ok(None);
        }

        // Rebalancing never resizes liquidity.
        self.check_lockstep(&pool)?;
        let Some(outcome) = self
            .positions
            .apply_rebalance(ctx, self.address, &pool, tick)?
        else {
            return Ok(None);
        };
        self.events.record(
            &pool,
            VaultEventKind::Rebalanced {
                tick,
                old_range: outcome.old_range,
                new_range: outcome.new_range,
                liquidity: outcome.liquidity,
            },
        );
        Ok(Some(outcome))
    }

    /// Adds liquidity worth at most `desired` on behalf of `actor` and issues shares.
    ///
    /// Fails with [`VaultError::SlippageExceeded`] if the amounts actually
    /// paid fall below `min_amounts`; the engine then rolls the change back.
    pub fn deposit<E: PoolEngine>(
        &mut self,
        engine: &mut E,
        actor: Address,
        pool: &PoolId,
        desired: TokenAmounts,
        min_amounts: TokenAmounts,
    ) -> Result<DepositOutcome> {
        if desired.is_zero() {
            return Err(VaultError::ZeroDeposit);
        }
        let range = self.positions.position(pool)?.range;
        let liquidity = self.liquidity_for(&*engine, pool, range, desired)?;
        if liquidity == 0 {
            return Err(VaultError::ZeroLiquidity);
        }

        let plan = self.accounting.plan_deposit(pool, actor, liquidity)?;
        let signed = i128::try_from(liquidity).map_err(|_| MathError::Overflow)?;
        self.positions.check_liquidity_delta(pool, signed)?;

        let receipt = self.run_settlement(
            engine,
            PendingSettlement::Add {
                pool: pool.clone(),
                actor,
                range,
                liquidity,
                requested_amounts: desired,
                min_amounts,
            },
        )?;

        self.positions
            .apply_liquidity_delta(self.address, pool, signed)?;
        self.accounting.commit(&plan)?;
        self.check_lockstep(pool)?;

        let outcome = DepositOutcome {
            shares: plan.shares(),
            liquidity,
            amounts: receipt.amounts,
        };
        info!(
            pool = %pool,
            actor = ?actor,
            liquidity,
            shares = outcome.shares,
            amounts = %outcome.amounts,
            "Deposit settled"
        );
        self.events.record(
            pool,
            VaultEventKind::Deposited {
                actor,
                liquidity,
                shares: outcome.shares,
                amounts: outcome.amounts,
            },
        );
        Ok(outcome)
    }

    /// Burns `shares` of `actor` and pays out the liquidity they redeem.
    pub fn withdraw<E: PoolEngine>(
        &mut self,
        engine: &mut E,
        actor: Address,
        pool: &PoolId,
        shares: u128,
        min_amounts: TokenAmounts,
    ) -> Result<WithdrawOutcome> {
        let plan = self.accounting.plan_withdraw(pool, actor, shares)?;
        let liquidity = plan.liquidity();
        if liquidity == 0 {
            return Err(VaultError::ZeroLiquidity);
        }
        let range = self.positions.position(pool)?.range;
        let signed = i128::try_from(liquidity).map_err(|_| MathError::Overflow)?;
        self.positions.check_liquidity_delta(pool, -signed)?;

        let receipt = self.run_settlement(
            engine,
            PendingSettlement::Remove {
                pool: pool.clone(),
                actor,
                range,
                liquidity,
                min_amounts,
            },
        )?;

        self.positions
            .apply_liquidity_delta(self.address, pool, -signed)?;
        self.accounting.commit(&plan)?;
        self.check_lockstep(pool)?;

        let outcome = WithdrawOutcome {
            shares,
            liquidity,
            amounts: receipt.amounts,
        };
        info!(
            pool = %pool,
            actor = ?actor,
            liquidity,
            shares,
            amounts = %outcome.amounts,
            "Withdrawal settled"
        );
        self.events.record(
            pool,
            VaultEventKind::Withdrawn {
                actor,
                liquidity,
                shares,
                amounts: outcome.amounts,
            },
        );
        Ok(outcome)
    }

    /// Changes the half-width used by the next rebalance of `pool`.
    pub fn set_tick_width(&mut self, pool: &PoolId, width: u32) -> Result<u32> {
        let previous = self.positions.set_tick_width(self.address, pool, width)?;
        self.events
            .record(pool, VaultEventKind::TickWidthUpdated { previous, width });
        Ok(previous)
    }

    pub fn position(&self, pool: &PoolId) -> Result<&PoolPosition> {
        self.positions.position(pool)
    }

    pub fn vault_state(&self, pool: &PoolId) -> Result<&VaultState> {
        self.accounting.state(pool)
    }

    pub fn shares_of(&self, pool: &PoolId, holder: &Address) -> Result<u128> {
        self.accounting.shares_of(pool, holder)
    }

    /// Liquidity currently redeemable by `holder`.
    pub fn liquidity_of(&self, pool: &PoolId, holder: &Address) -> Result<u128> {
        self.accounting.state(pool)?.liquidity_of(holder)
    }

    pub fn pools(&self) -> impl Iterator<Item = &PoolId> {
        self.positions.pools().map(|(pool, _)| pool)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn preview_deposit(
        &self,
        ctx: &dyn EngineContext,
        pool: &PoolId,
        desired: TokenAmounts,
    ) -> Result<DepositPreview> {
        let range = self.positions.position(pool)?.range;
        let liquidity = self.liquidity_for(ctx, pool, range, desired)?;
        let shares = self
            .accounting
            .state(pool)?
            .shares_for_liquidity(liquidity)?;
        let amounts = self.amounts_for(ctx, pool, range, liquidity, true)?;
        Ok(DepositPreview {
            liquidity,
            shares,
            amounts,
        })
    }

    pub fn preview_withdraw(
        &self,
        ctx: &dyn EngineContext,
        pool: &PoolId,
        shares: u128,
    ) -> Result<WithdrawPreview> {
        let range = self.positions.position(pool)?.range;
        let liquidity = self
            .accounting
            .state(pool)?
            .liquidity_for_shares(shares)?;
        let amounts = self.amounts_for(ctx, pool, range, liquidity, false)?;
        Ok(WithdrawPreview { liquidity, amounts })
    }

    /// Compares the vault's books with the engine's positions.
    pub fn reconcile(&self, ctx: &dyn EngineContext) -> Result<ReconcileReport> {
        reconcile(ctx, self.address, &self.positions, &self.accounting)
    }

    fn run_settlement<E: PoolEngine>(
        &mut self,
        engine: &mut E,
        pending: PendingSettlement,
    ) -> Result<SettlementReceipt> {
        let payload = self.settlement.begin(pending)?;
        let caller = self.address;
        let result = engine.unlock(caller, self, &payload);
        let settled = self.settlement.finish();

        let receipt = SettlementReceipt::decode(&result?)?;
        if settled != Some(receipt) {
            return Err(VaultError::InvariantViolation(
                "engine returned without settling the request".to_string(),
            ));
        }
        Ok(receipt)
    }

    fn check_lockstep(&self, pool: &PoolId) -> Result<()> {
        let position = self.positions.position(pool)?;
        let state = self.accounting.state(pool)?;
        if position.liquidity != state.total_liquidity {
            error!(
                pool = %pool,
                position = position.liquidity,
                ledger = state.total_liquidity,
                "Position and ledger liquidity diverged"
            );
            return Err(VaultError::InvariantViolation(format!(
                "pool {pool}: position liquidity {} != ledger liquidity {}",
                position.liquidity, state.total_liquidity
            )));
        }
        self.accounting.check_invariants(pool)
    }

    fn sqrt_bounds(range: TickRange) -> Result<(U256, U256)> {
        Ok((
            get_sqrt_ratio_at_tick(range.lower)?,
            get_sqrt_ratio_at_tick(range.upper)?,
        ))
    }

    fn liquidity_for(
        &self,
        ctx: &dyn EngineContext,
        pool: &PoolId,
        range: TickRange,
        amounts: TokenAmounts,
    ) -> Result<u128> {
        let slot0 = ctx.slot0(pool)?;
        let (sqrt_lower, sqrt_upper) = Self::sqrt_bounds(range)?;
        let liquidity =
            get_liquidity_for_amounts(slot0.sqrt_price_x96, sqrt_lower, sqrt_upper, amounts)?;
        debug!(pool = %pool, tick = slot0.tick, %amounts, liquidity, "Converted amounts");
        Ok(liquidity)
    }

    fn amounts_for(
        &self,
        ctx: &dyn EngineContext,
        pool: &PoolId,
        range: TickRange,
        liquidity: u128,
        round_up: bool,
    ) -> Result<TokenAmounts> {
        let slot0 = ctx.slot0(pool)?;
        let (sqrt_lower, sqrt_upper) = Self::sqrt_bounds(range)?;
        Ok(get_amounts_for_liquidity(
            slot0.sqrt_price_x96,
            sqrt_lower,
            sqrt_upper,
            liquidity,
            round_up,
        )?)
    }
}

impl UnlockCallback for Vault {
    type Error = VaultError;

    fn unlock_callback(
        &mut self,
        sender: Address,
        ctx: &mut dyn EngineContext,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        let caller = self.address;
        let receipt = self.settlement.on_callback(sender, ctx, caller, data)?;
        receipt.encode()
    }
}

impl PoolHooks for Vault {
    type Error = VaultError;

    fn after_initialize(&mut self, sender: Address, key: &PoolKey, tick: i32) -> Result<()> {
        self.register(sender, key, tick).map(|_| ())
    }

    fn after_swap(
        &mut self,
        sender: Address,
        ctx: &mut dyn EngineContext,
        key: &PoolKey,
        tick: i32,
    ) -> Result<()> {
        self.on_price_observed(sender, ctx, key, tick).map(|_| ())
    }
}
