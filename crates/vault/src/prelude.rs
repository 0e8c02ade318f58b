//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use tick_vault_core::prelude::*;
//! ```

// Accounting
pub use crate::accounting::{ShareAccounting, SharePlan, VaultState};

// Configuration
pub use crate::config::{DEFAULT_TICK_WIDTH, VaultConfig};

// Engine interfaces
pub use crate::engine::{EngineContext, EngineError, PoolEngine, PoolHooks, UnlockCallback};

// Errors
pub use crate::error::{Result, VaultError};

// Events
pub use crate::lifecycle::{EventLog, VaultEvent, VaultEventKind};

// Positions
pub use crate::position::{PositionManager, RebalanceDecision, RebalanceOutcome, centered_range};

// Settlement
pub use crate::settlement::{
    PendingSettlement, SettlementCoordinator, SettlementPhase, SettlementReceipt,
};

// Reconciliation
pub use crate::sync::{ReconcileReport, ReconcileStatus, reconcile};

// Vault
pub use crate::vault::{DepositOutcome, DepositPreview, Vault, WithdrawOutcome, WithdrawPreview};
