//! Interfaces of the AMM engine the vault is attached to.
//!
//! The engine owns prices, liquidity bookkeeping and token custody. The vault
//! only ever sees it through these traits: read-only views, liquidity
//! mutation and payment primitives inside an engine-granted transaction
//! context, and the unlock/callback handshake that opens that context.

use thiserror::Error;
use tick_vault_domain::{
    Address, BalanceDelta, Currency, MathError, PoolId, PoolKey, Slot0, TickRange,
};

/// Errors reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine is locked; liquidity and payments need an open transaction")]
    ManagerLocked,
    #[error("a transaction is already open")]
    AlreadyUnlocked,
    #[error("pool {0} is not initialized")]
    PoolNotInitialized(PoolId),
    #[error("pool {0} is already initialized")]
    PoolAlreadyInitialized(PoolId),
    #[error("invalid range {0}")]
    InvalidRange(TickRange),
    #[error("position holds {available} liquidity, cannot remove {requested}")]
    InsufficientLiquidity { requested: u128, available: u128 },
    #[error("{account:?} holds {available} of {currency}, needs {required}")]
    InsufficientBalance {
        account: Address,
        currency: Currency,
        required: u128,
        available: u128,
    },
    #[error("engine holds {available} of {currency}, cannot pay out {required}")]
    InsufficientReserves {
        currency: Currency,
        required: u128,
        available: u128,
    },
    #[error("{account:?} left {currency} unsettled by {amount}")]
    CurrencyNotSettled {
        account: Address,
        currency: Currency,
        amount: i128,
    },
    #[error("liquidity operations are paused")]
    Paused,
    #[error(transparent)]
    Math(#[from] MathError),
}

/// Operations available on the engine, some of them only inside a transaction context.
pub trait EngineContext {
    /// Identity the engine uses when it calls back into hooks and callbacks.
    fn address(&self) -> Address;

    fn pool_key(&self, pool: &PoolId) -> Result<PoolKey, EngineError>;

    /// Current tick and sqrt price of a pool.
    fn slot0(&self, pool: &PoolId) -> Result<Slot0, EngineError>;

    /// Liquidity the engine records for `owner` in `range`.
    fn position_liquidity(
        &self,
        pool: &PoolId,
        owner: Address,
        range: TickRange,
    ) -> Result<u128, EngineError>;

    /// Applies a signed liquidity change for `caller` and reports the resulting token obligations.
    fn modify_liquidity(
        &mut self,
        caller: Address,
        pool: &PoolId,
        range: TickRange,
        liquidity_delta: i128,
    ) -> Result<BalanceDelta, EngineError>;

    /// Pays `amount` of `currency` from `payer` towards `caller`'s debt.
    fn settle(
        &mut self,
        caller: Address,
        currency: Currency,
        payer: Address,
        amount: u128,
    ) -> Result<(), EngineError>;

    /// Withdraws `amount` of `currency` owed to `caller` into `recipient`.
    fn take(
        &mut self,
        caller: Address,
        currency: Currency,
        recipient: Address,
        amount: u128,
    ) -> Result<(), EngineError>;
}

/// Receives the engine's callback once a transaction context is open.
pub trait UnlockCallback {
    type Error: From<EngineError>;

    fn unlock_callback(
        &mut self,
        sender: Address,
        ctx: &mut dyn EngineContext,
        data: &[u8],
    ) -> Result<Vec<u8>, Self::Error>;
}

/// An engine that can open transaction contexts.
pub trait PoolEngine: EngineContext {
    /// Opens a transaction, invokes `callback` exactly once and closes it.
    ///
    /// Every caller delta must be zero when the callback returns. If the
    /// callback fails or leaves deltas open, all engine state is restored to
    /// what it was before the call.
    fn unlock<C: UnlockCallback>(
        &mut self,
        caller: Address,
        callback: &mut C,
        data: &[u8],
    ) -> Result<Vec<u8>, C::Error>;
}

/// Hooks the engine invokes on the account registered in a pool key.
pub trait PoolHooks {
    type Error: From<EngineError>;

    fn after_initialize(
        &mut self,
        sender: Address,
        key: &PoolKey,
        tick: i32,
    ) -> Result<(), Self::Error>;

    /// Runs inside the swap's transaction context after the price has moved.
    fn after_swap(
        &mut self,
        sender: Address,
        ctx: &mut dyn EngineContext,
        key: &PoolKey,
        tick: i32,
    ) -> Result<(), Self::Error>;
}

/// Pays every negative component of `delta` from `account` and sends every
/// positive component to it.
pub fn settle_balance_delta(
    ctx: &mut dyn EngineContext,
    caller: Address,
    key: &PoolKey,
    delta: BalanceDelta,
    account: Address,
) -> Result<(), EngineError> {
    for (currency, amount) in [
        (key.currency0, delta.amount0),
        (key.currency1, delta.amount1),
    ] {
        if amount < 0 {
            ctx.settle(caller, currency, account, amount.unsigned_abs())?;
        } else if amount > 0 {
            ctx.take(caller, currency, account, amount.unsigned_abs())?;
        }
    }
    Ok(())
}
