//! End-to-end vault simulation over a tick path.

use crate::engine::SimulatedEngine;
use crate::error::SimulationError;
use crate::price_path::TickPathGenerator;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tick_vault_core::Vault;
use tick_vault_core::config::VaultConfig;
use tick_vault_core::engine::EngineContext;
use tick_vault_domain::math::{get_sqrt_ratio_at_tick, tick_to_price};
use tick_vault_domain::{Address, Currency, PoolId, PoolKey, TickRange, TokenAmounts};
use tracing::{info, warn};

/// Engine account.
pub const ENGINE_ADDRESS: u64 = 0xe0;
/// Vault account, also the hook address of the simulated pool.
pub const VAULT_ADDRESS: u64 = 0x7a;
/// Account on the other side of every swap.
pub const TRADER_ADDRESS: u64 = 0x22;
/// First depositor account; the others follow consecutively.
pub const FIRST_DEPOSITOR: u64 = 0x100;

const CURRENCY0: u64 = 0xc0;
const CURRENCY1: u64 = 0xc1;
const TRADER_FUNDS: u128 = 1_000_000_000_000_000_000_000_000;

/// Parameters of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub initial_tick: i32,
    pub tick_spacing: i32,
    pub fee: u32,
    pub vault: VaultConfig,
    pub depositors: usize,
    /// Desired amount of each token per depositor.
    pub deposit_amount: u128,
    /// Tokens of each currency the vault keeps for settling rebalances.
    pub vault_reserve: u128,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_tick: 0,
            tick_spacing: 60,
            fee: 3000,
            vault: VaultConfig::default(),
            depositors: 3,
            deposit_amount: 1_000_000_000_000,
            vault_reserve: 1_000_000_000_000_000_000,
        }
    }
}

/// What happened over a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub steps: usize,
    pub swaps: usize,
    pub rejected_swaps: usize,
    pub rebalances: usize,
    pub deposits: usize,
    pub withdrawals: usize,
    pub final_tick: i32,
    pub final_price: Decimal,
    pub final_range: TickRange,
    /// Liquidity still managed after everyone exited.
    pub residual_liquidity: u128,
    pub deposited: TokenAmounts,
    pub withdrawn: TokenAmounts,
    pub in_sync: bool,
}

/// A vault attached to a freshly initialized pool of a simulated engine.
#[derive(Debug)]
pub struct VaultSimulation {
    pub config: SimulationConfig,
    pub engine: SimulatedEngine,
    pub vault: Vault,
    pub pool: PoolId,
    pub key: PoolKey,
}

impl VaultSimulation {
    /// Creates the engine, the vault and the pool, and funds every account.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        if config.depositors == 0 {
            return Err(SimulationError::InvalidParameter(
                "at least one depositor is required".to_string(),
            ));
        }

        let engine_address = Address::from_low_u64_be(ENGINE_ADDRESS);
        let vault_address = Address::from_low_u64_be(VAULT_ADDRESS);
        let mut engine = SimulatedEngine::new(engine_address);
        let mut vault = Vault::new(vault_address, engine_address, config.vault.clone())?;

        let key = PoolKey::new(
            Currency::from_low_u64(CURRENCY0),
            Currency::from_low_u64(CURRENCY1),
            config.fee,
            config.tick_spacing,
            vault_address,
        )?;
        let pool = engine.initialize(
            key.clone(),
            get_sqrt_ratio_at_tick(config.initial_tick)?,
            &mut vault,
        )?;

        for currency in [key.currency0, key.currency1] {
            engine.mint(Self::trader(), currency, TRADER_FUNDS)?;
            engine.mint(vault_address, currency, config.vault_reserve)?;
            for depositor in Self::depositors(config.depositors) {
                engine.mint(depositor, currency, config.deposit_amount)?;
            }
        }

        Ok(Self {
            config,
            engine,
            vault,
            pool,
            key,
        })
    }

    pub fn trader() -> Address {
        Address::from_low_u64_be(TRADER_ADDRESS)
    }

    pub fn depositors(count: usize) -> impl Iterator<Item = Address> {
        (0..count as u64).map(|i| Address::from_low_u64_be(FIRST_DEPOSITOR + i))
    }

    /// Swaps the pool to `tick`. Returns whether the swap went through.
    pub fn swap_to(&mut self, tick: i32) -> bool {
        match self
            .engine
            .swap_to_tick(Self::trader(), &self.pool, tick, &mut self.vault)
        {
            Ok(_) => true,
            Err(e) => {
                warn!(tick, error = %e, "Swap rejected");
                false
            }
        }
    }

    /// Runs the standard scenario: everyone deposits, the price follows
    /// `path`, the first depositor takes out half mid-way, and everyone
    /// exits at the end.
    pub fn run<G: TickPathGenerator>(
        &mut self,
        path: &mut G,
        steps: usize,
    ) -> Result<SimulationSummary, SimulationError> {
        let depositors: Vec<Address> = Self::depositors(self.config.depositors).collect();
        let amount = self.config.deposit_amount;
        let mut deposited = TokenAmounts::zero();
        let mut withdrawn = TokenAmounts::zero();
        let mut deposits = 0;
        let mut withdrawals = 0;

        for depositor in &depositors {
            let outcome = self.vault.deposit(
                &mut self.engine,
                *depositor,
                &self.pool,
                TokenAmounts::new(amount, amount),
                TokenAmounts::zero(),
            )?;
            deposited = add_amounts(deposited, outcome.amounts);
            deposits += 1;
        }

        let ticks = path.generate(steps);
        let midpoint = ticks.len() / 2;
        let mut swaps = 0;
        let mut rejected_swaps = 0;

        for (step, tick) in ticks.iter().enumerate().skip(1) {
            if self.swap_to(*tick) {
                swaps += 1;
            } else {
                rejected_swaps += 1;
            }

            if step == midpoint {
                let first = depositors[0];
                let half = self.vault.shares_of(&self.pool, &first)? / 2;
                if half > 0 {
                    let outcome = self.vault.withdraw(
                        &mut self.engine,
                        first,
                        &self.pool,
                        half,
                        TokenAmounts::zero(),
                    )?;
                    withdrawn = add_amounts(withdrawn, outcome.amounts);
                    withdrawals += 1;
                }
            }
        }

        for depositor in &depositors {
            let shares = self.vault.shares_of(&self.pool, depositor)?;
            if shares == 0 {
                continue;
            }
            let outcome = self.vault.withdraw(
                &mut self.engine,
                *depositor,
                &self.pool,
                shares,
                TokenAmounts::zero(),
            )?;
            withdrawn = add_amounts(withdrawn, outcome.amounts);
            withdrawals += 1;
        }

        let slot0 = self.engine.slot0(&self.pool)?;
        let position = self.vault.position(&self.pool)?;
        let summary = SimulationSummary {
            steps,
            swaps,
            rejected_swaps,
            rebalances: self.vault.events().count("rebalanced"),
            deposits,
            withdrawals,
            final_tick: slot0.tick,
            final_price: tick_to_price(slot0.tick)?,
            final_range: position.range,
            residual_liquidity: position.liquidity,
            deposited,
            withdrawn,
            in_sync: self.vault.reconcile(&self.engine)?.is_in_sync(),
        };

        info!(
            steps,
            swaps,
            rebalances = summary.rebalances,
            final_tick = summary.final_tick,
            "Simulation finished"
        );
        Ok(summary)
    }
}

fn add_amounts(a: TokenAmounts, b: TokenAmounts) -> TokenAmounts {
    TokenAmounts::new(
        a.amount0.saturating_add(b.amount0),
        a.amount1.saturating_add(b.amount1),
    )
}
