use super::pending::{PendingSettlement, SettlementReceipt};
use crate::engine::{EngineContext, settle_balance_delta};
use crate::error::{Result, VaultError};
use tick_vault_domain::Address;
use tracing::{debug, warn};

/// Progress of the single in-flight settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SettlementPhase {
    #[default]
    Idle,
    /// Payload handed to the engine, callback not yet received.
    Requested(PendingSettlement),
    /// Callback authenticated, liquidity change under way.
    InCallback(PendingSettlement),
    Settled(SettlementReceipt),
}

impl SettlementPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, SettlementPhase::Idle)
    }
}

/// Drives one liquidity change per user action through the engine's unlock callback.
#[derive(Debug, Clone)]
pub struct SettlementCoordinator {
    pool_manager: Address,
    phase: SettlementPhase,
}

impl SettlementCoordinator {
    /// Creates a coordinator that only accepts callbacks from `pool_manager`.
    pub fn new(pool_manager: Address) -> Self {
        Self {
            pool_manager,
            phase: SettlementPhase::Idle,
        }
    }

    pub fn pool_manager(&self) -> Address {
        self.pool_manager
    }

    pub fn phase(&self) -> &SettlementPhase {
        &self.phase
    }

    /// Claims the slot for `pending` and returns the payload to pass to the engine.
    pub fn begin(&mut self, pending: PendingSettlement) -> Result<Vec<u8>> {
        if !self.phase.is_idle() {
            return Err(VaultError::SettlementInProgress);
        }
        let payload = pending.encode()?;
        debug!(
            pool = %pending.pool(),
            actor = ?pending.actor(),
            liquidity = pending.liquidity(),
            add = pending.is_add(),
            "Settlement requested"
        );
        self.phase = SettlementPhase::Requested(pending);
        Ok(payload)
    }

    pub fn authenticate(&self, sender: Address) -> Result<()> {
        if sender != self.pool_manager {
            warn!(sender = ?sender, expected = ?self.pool_manager, "Callback from unknown sender");
            return Err(VaultError::NotPoolManager { sender });
        }
        Ok(())
    }

    /// Accepts the callback payload if it is exactly the one this coordinator issued.
    pub fn enter(&mut self, data: &[u8]) -> Result<PendingSettlement> {
        let SettlementPhase::Requested(expected) = &self.phase else {
            warn!(phase = ?self.phase, "Callback without a requested settlement");
            return Err(VaultError::UnsolicitedCallback);
        };
        let received = PendingSettlement::decode(data)?;
        if &received != expected {
            warn!(pool = %received.pool(), "Callback payload does not match the request");
            return Err(VaultError::UnsolicitedCallback);
        }
        self.phase = SettlementPhase::InCallback(received.clone());
        Ok(received)
    }

    /// Applies the liquidity change and settles its delta with the actor.
    ///
    /// Slippage is checked last, while the engine transaction is still open,
    /// so a failure rolls back the liquidity change and the payments.
    pub fn execute(
        &mut self,
        ctx: &mut dyn EngineContext,
        caller: Address,
    ) -> Result<SettlementReceipt> {
        let SettlementPhase::InCallback(pending) = &self.phase else {
            return Err(VaultError::UnsolicitedCallback);
        };
        let pending = pending.clone();

        let key = ctx.pool_key(pending.pool())?;
        let delta = ctx.modify_liquidity(
            caller,
            pending.pool(),
            pending.range(),
            pending.liquidity_delta()?,
        )?;
        settle_balance_delta(ctx, caller, &key, delta, pending.actor())?;

        let amounts = pending.actual_amounts(delta);
        let minimum = pending.min_amounts();
        if !amounts.meets(&minimum) {
            debug!(
                pool = %pending.pool(),
                %minimum,
                actual = %amounts,
                "Settlement below minimum amounts"
            );
            return Err(VaultError::SlippageExceeded {
                minimum,
                actual: amounts,
            });
        }

        let receipt = SettlementReceipt { delta, amounts };
        debug!(
            pool = %pending.pool(),
            delta0 = delta.amount0,
            delta1 = delta.amount1,
            "Settlement executed"
        );
        self.phase = SettlementPhase::Settled(receipt);
        Ok(receipt)
    }

    /// Full callback handling: authenticate, match the payload, execute.
    pub fn on_callback(
        &mut self,
        sender: Address,
        ctx: &mut dyn EngineContext,
        caller: Address,
        data: &[u8],
    ) -> Result<SettlementReceipt> {
        self.authenticate(sender)?;
        self.enter(data)?;
        self.execute(ctx, caller)
    }

    /// Returns the slot to idle, whatever happened, and hands back the receipt if settled.
    pub fn finish(&mut self) -> Option<SettlementReceipt> {
        match std::mem::take(&mut self.phase) {
            SettlementPhase::Settled(receipt) => Some(receipt),
            _ => None,
        }
    }
}
