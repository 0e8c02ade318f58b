use crate::accounting::ShareAccounting;
use crate::engine::EngineContext;
use crate::error::Result;
use crate::position::PositionManager;
use serde::{Deserialize, Serialize};
use tick_vault_domain::{Address, PoolId, TickRange};
use tracing::{debug, warn};

/// Whether the three views of a pool's liquidity agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconcileStatus {
    InSync,
    Drifted(Vec<String>),
}

/// Liquidity of one pool as seen by the engine, the position and the share ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReconciliation {
    pub pool: PoolId,
    pub range: TickRange,
    pub engine_liquidity: u128,
    pub position_liquidity: u128,
    pub accounted_liquidity: u128,
    pub total_shares: u128,
    pub holder_shares: u128,
    pub status: ReconcileStatus,
}

/// Per-pool reconciliation results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub pools: Vec<PoolReconciliation>,
}

impl ReconcileReport {
    pub fn is_in_sync(&self) -> bool {
        self.pools.iter().all(|p| p.status == ReconcileStatus::InSync)
    }

    pub fn drifted(&self) -> impl Iterator<Item = &PoolReconciliation> {
        self.pools
            .iter()
            .filter(|p| p.status != ReconcileStatus::InSync)
    }
}

/// Compares every registered pool against what the engine holds for `owner`.
pub fn reconcile(
    ctx: &dyn EngineContext,
    owner: Address,
    positions: &PositionManager,
    accounting: &ShareAccounting,
) -> Result<ReconcileReport> {
    let mut report = ReconcileReport::default();

    for (pool, position) in positions.pools() {
        let engine_liquidity = ctx.position_liquidity(pool, owner, position.range)?;
        let state = accounting.state(pool)?;
        let holder_shares = state
            .shares
            .values()
            .fold(0u128, |acc, v| acc.saturating_add(*v));

        let mut issues = Vec::new();
        if engine_liquidity != position.liquidity {
            issues.push(format!(
                "engine holds {engine_liquidity}, position records {}",
                position.liquidity
            ));
        }
        if position.liquidity != state.total_liquidity {
            issues.push(format!(
                "position records {}, ledger records {}",
                position.liquidity, state.total_liquidity
            ));
        }
        if holder_shares != state.total_shares {
            issues.push(format!(
                "holders own {holder_shares} shares, ledger records {}",
                state.total_shares
            ));
        }
        if (state.total_shares == 0) != (state.total_liquidity == 0) {
            issues.push("shares and liquidity disagree on emptiness".to_string());
        }

        let status = if issues.is_empty() {
            debug!(pool = %pool, liquidity = engine_liquidity, "Pool in sync");
            ReconcileStatus::InSync
        } else {
            warn!(pool = %pool, issues = ?issues, "Pool drifted");
            ReconcileStatus::Drifted(issues)
        };

        report.pools.push(PoolReconciliation {
            pool: pool.clone(),
            range: position.range,
            engine_liquidity,
            position_liquidity: position.liquidity,
            accounted_liquidity: state.total_liquidity,
            total_shares: state.total_shares,
            holder_shares,
            status,
        });
    }

    Ok(report)
}
