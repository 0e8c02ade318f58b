use crate::engine::EngineError;
use thiserror::Error;
use tick_vault_domain::{Address, MathError, PoolId, TokenAmounts};

/// Errors returned by vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    // Preconditions
    #[error("both deposit amounts are zero")]
    ZeroDeposit,
    #[error("operation would mint or burn zero shares")]
    ZeroShares,
    #[error("amounts convert to zero liquidity")]
    ZeroLiquidity,
    #[error("pool {0} is already registered")]
    AlreadyRegistered(PoolId),
    #[error("pool {0} is not registered")]
    NotRegistered(PoolId),
    #[error("tick width must be positive")]
    InvalidTickWidth,
    #[error("tick spacing must be positive, got {0}")]
    InvalidTickSpacing(i32),
    #[error("invalid configuration: {0}")]
    Config(String),

    // Authorization
    #[error("sender {sender:?} is not the pool manager")]
    NotPoolManager { sender: Address },
    #[error("caller {caller:?} is not the vault")]
    OnlyVault { caller: Address },
    #[error("vault owner has not been bound")]
    OwnerNotSet,
    #[error("vault owner is already set")]
    VaultAlreadySet,

    // Economic
    #[error("insufficient shares: requested {requested}, available {available}")]
    InsufficientShares { requested: u128, available: u128 },
    #[error("slippage exceeded: minimum {minimum}, actual {actual}")]
    SlippageExceeded {
        minimum: TokenAmounts,
        actual: TokenAmounts,
    },

    // Settlement protocol
    #[error("a settlement is already in flight")]
    SettlementInProgress,
    #[error("callback was not initiated by this vault")]
    UnsolicitedCallback,
    #[error("malformed settlement payload: {0}")]
    Payload(#[from] serde_json::Error),

    // Invariant failures
    #[error("degenerate range [{lower}, {upper})")]
    DegenerateRange { lower: i32, upper: i32 },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Math(#[from] MathError),
}

/// Result alias for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
