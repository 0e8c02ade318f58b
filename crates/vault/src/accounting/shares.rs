//! Proportional share accounting over each pool's managed liquidity.

use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tick_vault_domain::math::{mul_div, to_u128};
use tick_vault_domain::{Address, MathError, PoolId, U256};
use tracing::error;

/// Share ledger of one pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultState {
    pub total_shares: u128,
    pub total_liquidity: u128,
    pub shares: BTreeMap<Address, u128>,
}

impl VaultState {
    pub fn is_empty(&self) -> bool {
        self.total_shares == 0
    }

    pub fn shares_of(&self, holder: &Address) -> u128 {
        self.shares.get(holder).copied().unwrap_or(0)
    }

    /// Liquidity redeemable by `holder` right now, rounded down.
    pub fn liquidity_of(&self, holder: &Address) -> Result<u128> {
        self.liquidity_for_shares(self.shares_of(holder))
    }

    /// Liquidity backing `shares`, rounded down. Redeeming every share is exact.
    pub fn liquidity_for_shares(&self, shares: u128) -> Result<u128> {
        if shares == 0 {
            return Ok(0);
        }
        if shares > self.total_shares {
            return Err(VaultError::InsufficientShares {
                requested: shares,
                available: self.total_shares,
            });
        }
        if shares == self.total_shares {
            return Ok(self.total_liquidity);
        }
        Ok(to_u128(mul_div(
            U256::from(shares),
            U256::from(self.total_liquidity),
            U256::from(self.total_shares),
        )?)?)
    }

    /// Shares issued for `liquidity`, rounded down. The first deposit defines the unit.
    pub fn shares_for_liquidity(&self, liquidity: u128) -> Result<u128> {
        if self.total_shares == 0 {
            return Ok(liquidity);
        }
        if self.total_liquidity == 0 {
            return Err(VaultError::InvariantViolation(
                "outstanding shares with zero liquidity".to_string(),
            ));
        }
        Ok(to_u128(mul_div(
            U256::from(liquidity),
            U256::from(self.total_shares),
            U256::from(self.total_liquidity),
        )?)?)
    }
}

/// A validated share mint or burn, computed before the engine is touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SharePlan {
    Mint {
        pool: PoolId,
        holder: Address,
        shares: u128,
        liquidity: u128,
    },
    Burn {
        pool: PoolId,
        holder: Address,
        shares: u128,
        liquidity: u128,
    },
}

impl SharePlan {
    pub fn pool(&self) -> &PoolId {
        match self {
            SharePlan::Mint { pool, .. } | SharePlan::Burn { pool, .. } => pool,
        }
    }

    pub fn shares(&self) -> u128 {
        match self {
            SharePlan::Mint { shares, .. } | SharePlan::Burn { shares, .. } => *shares,
        }
    }

    pub fn liquidity(&self) -> u128 {
        match self {
            SharePlan::Mint { liquidity, .. } | SharePlan::Burn { liquidity, .. } => *liquidity,
        }
    }
}

/// Tracks who owns what fraction of each pool's managed liquidity.
#[derive(Debug, Clone, Default)]
pub struct ShareAccounting {
    vaults: BTreeMap<PoolId, VaultState>,
}

impl ShareAccounting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an empty ledger for a newly registered pool.
    pub fn open(&mut self, pool: PoolId) -> Result<()> {
        if self.vaults.contains_key(&pool) {
            return Err(VaultError::AlreadyRegistered(pool));
        }
        self.vaults.insert(pool, VaultState::default());
        Ok(())
    }

    pub fn state(&self, pool: &PoolId) -> Result<&VaultState> {
        self.vaults
            .get(pool)
            .ok_or_else(|| VaultError::NotRegistered(pool.clone()))
    }

    pub fn shares_of(&self, pool: &PoolId, holder: &Address) -> Result<u128> {
        Ok(self.state(pool)?.shares_of(holder))
    }

    pub fn holders(&self, pool: &PoolId) -> Result<impl Iterator<Item = (&Address, &u128)>> {
        Ok(self.state(pool)?.shares.iter())
    }

    /// Plans issuing shares to `holder` for `liquidity` newly added to `pool`.
    pub fn plan_deposit(&self, pool: &PoolId, holder: Address, liquidity: u128) -> Result<SharePlan> {
        let state = self.state(pool)?;
        if liquidity == 0 {
            return Err(VaultError::ZeroLiquidity);
        }

        let shares = state.shares_for_liquidity(liquidity)?;
        if shares == 0 {
            return Err(VaultError::ZeroShares);
        }
        state
            .total_liquidity
            .checked_add(liquidity)
            .ok_or(MathError::Overflow)?;
        state
            .total_shares
            .checked_add(shares)
            .ok_or(MathError::Overflow)?;

        Ok(SharePlan::Mint {
            pool: pool.clone(),
            holder,
            shares,
            liquidity,
        })
    }

    /// Plans burning `shares` of `holder` in `pool`.
    pub fn plan_withdraw(&self, pool: &PoolId, holder: Address, shares: u128) -> Result<SharePlan> {
        let state = self.state(pool)?;
        if shares == 0 {
            return Err(VaultError::ZeroShares);
        }
        let available = state.shares_of(&holder);
        if shares > available {
            return Err(VaultError::InsufficientShares {
                requested: shares,
                available,
            });
        }

        let liquidity = state.liquidity_for_shares(shares)?;
        Ok(SharePlan::Burn {
            pool: pool.clone(),
            holder,
            shares,
            liquidity,
        })
    }

    /// Applies a plan. Nothing is written unless every update fits.
    pub fn commit(&mut self, plan: &SharePlan) -> Result<()> {
        let state = self
            .vaults
            .get_mut(plan.pool())
            .ok_or_else(|| VaultError::NotRegistered(plan.pool().clone()))?;

        let (total_shares, total_liquidity, holder, balance) = match plan {
            SharePlan::Mint {
                holder,
                shares,
                liquidity,
                ..
            } => (
                state.total_shares.checked_add(*shares),
                state.total_liquidity.checked_add(*liquidity),
                *holder,
                state.shares_of(holder).checked_add(*shares),
            ),
            SharePlan::Burn {
                holder,
                shares,
                liquidity,
                ..
            } => (
                state.total_shares.checked_sub(*shares),
                state.total_liquidity.checked_sub(*liquidity),
                *holder,
                state.shares_of(holder).checked_sub(*shares),
            ),
        };
        let (Some(total_shares), Some(total_liquidity), Some(balance)) =
            (total_shares, total_liquidity, balance)
        else {
            return Err(MathError::Overflow.into());
        };

        state.total_shares = total_shares;
        state.total_liquidity = total_liquidity;
        if balance == 0 {
            state.shares.remove(&holder);
        } else {
            state.shares.insert(holder, balance);
        }
        Ok(())
    }

    /// Verifies the empty-vault equivalence and that holder balances add up.
    pub fn check_invariants(&self, pool: &PoolId) -> Result<()> {
        let state = self.state(pool)?;

        if (state.total_shares == 0) != (state.total_liquidity == 0) {
            error!(
                pool = %pool,
                total_shares = state.total_shares,
                total_liquidity = state.total_liquidity,
                "Share/liquidity emptiness mismatch"
            );
            return Err(VaultError::InvariantViolation(format!(
                "pool {pool}: total_shares={} total_liquidity={}",
                state.total_shares, state.total_liquidity
            )));
        }

        let sum = state
            .shares
            .values()
            .try_fold(0u128, |acc, v| acc.checked_add(*v));
        if sum != Some(state.total_shares) {
            error!(pool = %pool, total_shares = state.total_shares, "Holder balances do not add up");
            return Err(VaultError::InvariantViolation(format!(
                "pool {pool}: holder balances {sum:?} != total_shares {}",
                state.total_shares
            )));
        }
        Ok(())
    }

    pub fn pools(&self) -> impl Iterator<Item = (&PoolId, &VaultState)> {
        self.vaults.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> PoolId {
        PoolId::new("pool-a")
    }

    fn alice() -> Address {
        Address::from_low_u64_be(0xa1)
    }

    fn bob() -> Address {
        Address::from_low_u64_be(0xb0)
    }

    fn ledger() -> ShareAccounting {
        let mut accounting = ShareAccounting::new();
        accounting.open(pool()).unwrap();
        accounting
    }

    fn deposit(accounting: &mut ShareAccounting, holder: Address, liquidity: u128) -> u128 {
        let plan = accounting.plan_deposit(&pool(), holder, liquidity).unwrap();
        accounting.commit(&plan).unwrap();
        plan.shares()
    }

    fn withdraw(accounting: &mut ShareAccounting, holder: Address, shares: u128) -> u128 {
        let plan = accounting.plan_withdraw(&pool(), holder, shares).unwrap();
        accounting.commit(&plan).unwrap();
        plan.liquidity()
    }

    #[test]
    fn test_first_deposit_bootstraps_one_to_one() {
        let mut accounting = ledger();
        assert_eq!(deposit(&mut accounting, alice(), 1000), 1000);
        let state = accounting.state(&pool()).unwrap();
        assert_eq!(state.total_shares, 1000);
        assert_eq!(state.total_liquidity, 1000);
    }

    #[test]
    fn test_two_depositors_then_full_exit() {
        let mut accounting = ledger();
        assert_eq!(deposit(&mut accounting, alice(), 1000), 1000);
        assert_eq!(deposit(&mut accounting, bob(), 500), 500);

        let state = accounting.state(&pool()).unwrap();
        assert_eq!(state.total_liquidity, 1500);
        assert_eq!(state.total_shares, 1500);

        assert_eq!(withdraw(&mut accounting, alice(), 1000), 1000);
        let state = accounting.state(&pool()).unwrap();
        assert_eq!(state.total_liquidity, 500);
        assert_eq!(state.total_shares, 500);
        assert_eq!(state.liquidity_of(&bob()).unwrap(), 500);
        assert_eq!(state.shares_of(&alice()), 0);
        accounting.check_invariants(&pool()).unwrap();
    }

    #[test]
    fn test_sole_holder_exit_leaves_no_dust() {
        let mut accounting = ledger();
        deposit(&mut accounting, alice(), 777);
        withdraw(&mut accounting, alice(), 300);
        let remaining = accounting.shares_of(&pool(), &alice()).unwrap();
        withdraw(&mut accounting, alice(), remaining);

        let state = accounting.state(&pool()).unwrap();
        assert_eq!(state.total_liquidity, 0);
        assert_eq!(state.total_shares, 0);
        assert!(state.shares.is_empty());
        accounting.check_invariants(&pool()).unwrap();
    }

    #[test]
    fn test_mint_rounds_down_in_favor_of_holders() {
        let mut accounting = ledger();
        deposit(&mut accounting, alice(), 3);
        // Pretend the position earned liquidity: 3 shares now back 4 liquidity.
        let state = accounting.vaults.get_mut(&pool()).unwrap();
        state.total_liquidity = 4;

        // 5 * 3 / 4 = 3.75 -> 3
        let plan = accounting.plan_deposit(&pool(), bob(), 5).unwrap();
        assert_eq!(plan.shares(), 3);

        // 1 * 3 / 4 = 0.75 -> 0 shares, rejected.
        assert!(matches!(
            accounting.plan_deposit(&pool(), bob(), 1),
            Err(VaultError::ZeroShares)
        ));
    }

    #[test]
    fn test_redeem_rounds_down_in_favor_of_pool() {
        let mut accounting = ledger();
        deposit(&mut accounting, alice(), 10);
        deposit(&mut accounting, bob(), 10);
        let state = accounting.vaults.get_mut(&pool()).unwrap();
        state.total_liquidity = 21;

        // 10 * 21 / 20 = 10.5 -> 10
        let plan = accounting.plan_withdraw(&pool(), alice(), 10).unwrap();
        assert_eq!(plan.liquidity(), 10);
        accounting.commit(&plan).unwrap();

        // Bob is now the last holder and receives everything left.
        let plan = accounting.plan_withdraw(&pool(), bob(), 10).unwrap();
        assert_eq!(plan.liquidity(), 11);
    }

    #[test]
    fn test_withdraw_preconditions() {
        let mut accounting = ledger();
        deposit(&mut accounting, alice(), 100);
        assert!(matches!(
            accounting.plan_withdraw(&pool(), alice(), 0),
            Err(VaultError::ZeroShares)
        ));
        assert!(matches!(
            accounting.plan_withdraw(&pool(), alice(), 101),
            Err(VaultError::InsufficientShares {
                requested: 101,
                available: 100
            })
        ));
        assert!(matches!(
            accounting.plan_withdraw(&pool(), bob(), 1),
            Err(VaultError::InsufficientShares { available: 0, .. })
        ));
    }

    #[test]
    fn test_planning_does_not_mutate() {
        let mut accounting = ledger();
        deposit(&mut accounting, alice(), 100);
        let before = accounting.state(&pool()).unwrap().clone();
        let _ = accounting.plan_deposit(&pool(), bob(), 50).unwrap();
        let _ = accounting.plan_withdraw(&pool(), alice(), 50).unwrap();
        assert_eq!(accounting.state(&pool()).unwrap(), &before);
    }

    #[test]
    fn test_unregistered_pool() {
        let accounting = ShareAccounting::new();
        assert!(matches!(
            accounting.plan_deposit(&pool(), alice(), 10),
            Err(VaultError::NotRegistered(_))
        ));
        let mut accounting = ledger();
        assert!(matches!(
            accounting.open(pool()),
            Err(VaultError::AlreadyRegistered(_))
        ));
    }

    #[test]
    fn test_overflowing_deposit_is_rejected() {
        let mut accounting = ledger();
        deposit(&mut accounting, alice(), u128::MAX - 1);
        assert!(matches!(
            accounting.plan_deposit(&pool(), bob(), 2),
            Err(VaultError::Math(MathError::Overflow))
        ));
    }

    #[test]
    fn test_conservation_across_many_operations() {
        let mut accounting = ledger();
        let holders: Vec<Address> = (1..=5).map(Address::from_low_u64_be).collect();
        for (i, holder) in holders.iter().enumerate() {
            deposit(&mut accounting, *holder, 1_000 + 137 * i as u128);
        }
        for holder in holders.iter().take(3) {
            let shares = accounting.shares_of(&pool(), holder).unwrap();
            withdraw(&mut accounting, *holder, shares / 3);
        }
        accounting.check_invariants(&pool()).unwrap();

        let state = accounting.state(&pool()).unwrap();
        let implied: u128 = holders
            .iter()
            .map(|h| state.liquidity_of(h).unwrap())
            .sum();
        assert!(implied <= state.total_liquidity);
        assert!(state.total_liquidity - implied < holders.len() as u128);
    }

    #[test]
    fn test_liquidity_for_more_than_outstanding_shares() {
        let mut accounting = ledger();
        deposit(&mut accounting, alice(), 1000);
        let state = accounting.state(&pool()).unwrap();

        assert_eq!(state.liquidity_for_shares(1000).unwrap(), 1000);
        assert!(matches!(
            state.liquidity_for_shares(1001),
            Err(VaultError::InsufficientShares {
                requested: 1001,
                available: 1000
            })
        ));
    }

    #[test]
    fn test_invariant_check_detects_mismatch() {
        let mut accounting = ledger();
        deposit(&mut accounting, alice(), 100);
        accounting.vaults.get_mut(&pool()).unwrap().total_liquidity = 0;
        assert!(matches!(
            accounting.check_invariants(&pool()),
            Err(VaultError::InvariantViolation(_))
        ));
    }
}
