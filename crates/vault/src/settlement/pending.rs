use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};
use tick_vault_domain::{Address, BalanceDelta, MathError, PoolId, TickRange, TokenAmounts};

/// A single liquidity change requested by a user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingSettlement {
    /// Deposit: add `liquidity`, paid for by `actor`.
    Add {
        pool: PoolId,
        actor: Address,
        range: TickRange,
        liquidity: u128,
        requested_amounts: TokenAmounts,
        min_amounts: TokenAmounts,
    },
    /// Withdrawal: remove `liquidity`, proceeds to `actor`.
    Remove {
        pool: PoolId,
        actor: Address,
        range: TickRange,
        liquidity: u128,
        min_amounts: TokenAmounts,
    },
}

impl PendingSettlement {
    pub fn pool(&self) -> &PoolId {
        match self {
            PendingSettlement::Add { pool, .. } | PendingSettlement::Remove { pool, .. } => pool,
        }
    }

    pub fn actor(&self) -> Address {
        match self {
            PendingSettlement::Add { actor, .. } | PendingSettlement::Remove { actor, .. } => *actor,
        }
    }

    pub fn range(&self) -> TickRange {
        match self {
            PendingSettlement::Add { range, .. } | PendingSettlement::Remove { range, .. } => *range,
        }
    }

    pub fn liquidity(&self) -> u128 {
        match self {
            PendingSettlement::Add { liquidity, .. }
            | PendingSettlement::Remove { liquidity, .. } => *liquidity,
        }
    }

    pub fn min_amounts(&self) -> TokenAmounts {
        match self {
            PendingSettlement::Add { min_amounts, .. }
            | PendingSettlement::Remove { min_amounts, .. } => *min_amounts,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, PendingSettlement::Add { .. })
    }

    /// Signed change to apply in the engine: positive for Add, negative for Remove.
    pub fn liquidity_delta(&self) -> Result<i128> {
        let magnitude = i128::try_from(self.liquidity()).map_err(|_| MathError::Overflow)?;
        Ok(if self.is_add() { magnitude } else { -magnitude })
    }

    /// Token amounts the actor actually paid (Add) or received (Remove) for `delta`.
    pub fn actual_amounts(&self, delta: BalanceDelta) -> TokenAmounts {
        if self.is_add() {
            delta.owed_to_engine()
        } else {
            delta.owed_to_caller()
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// What a completed settlement moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Engine-reported delta of the liquidity change.
    pub delta: BalanceDelta,
    /// Amounts paid in or taken out on behalf of the actor.
    pub amounts: TokenAmounts,
}

impl SettlementReceipt {
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(VaultError::from)
    }
}
