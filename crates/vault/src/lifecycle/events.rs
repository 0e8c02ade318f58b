use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tick_vault_domain::{Address, PoolId, TickRange, TokenAmounts};
use uuid::Uuid;

/// Kinds of vault events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultEventKind {
    /// Pool registered and range seeded.
    Registered {
        /// Tick at registration.
        tick: i32,
        /// Initial range.
        range: TickRange,
    },
    /// Liquidity added and shares issued.
    Deposited {
        actor: Address,
        liquidity: u128,
        shares: u128,
        amounts: TokenAmounts,
    },
    /// Shares burned and liquidity removed.
    Withdrawn {
        actor: Address,
        liquidity: u128,
        shares: u128,
        amounts: TokenAmounts,
    },
    /// Position moved to a range centered on `tick`.
    Rebalanced {
        tick: i32,
        old_range: TickRange,
        new_range: TickRange,
        liquidity: u128,
    },
    /// Half-width for future rebalances changed.
    TickWidthUpdated { previous: u32, width: u32 },
}

impl VaultEventKind {
    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            VaultEventKind::Registered { .. } => "registered",
            VaultEventKind::Deposited { .. } => "deposited",
            VaultEventKind::Withdrawn { .. } => "withdrawn",
            VaultEventKind::Rebalanced { .. } => "rebalanced",
            VaultEventKind::TickWidthUpdated { .. } => "tick_width_updated",
        }
    }
}

/// A recorded vault event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEvent {
    /// Unique identifier.
    pub id: Uuid,
    /// Wall-clock time the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// Pool the event belongs to.
    pub pool: PoolId,
    /// What happened.
    pub kind: VaultEventKind,
}

impl VaultEvent {
    pub fn new(pool: PoolId, kind: VaultEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            pool,
            kind,
        }
    }
}
