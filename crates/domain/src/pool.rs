use crate::error::MathError;
use crate::token::{Address, Currency};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a pool inside the engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolId(pub String);

impl PoolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static description of a pool: its two currencies, fee tier, tick spacing and hook account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub currency0: Currency,
    pub currency1: Currency,
    pub fee: u32, // in hundredths of a bip, e.g. 3000 for 0.3%
    pub tick_spacing: i32,
    pub hooks: Address,
}

impl PoolKey {
    /// Builds a key, rejecting unsorted currencies and non-positive spacing.
    pub fn new(
        currency0: Currency,
        currency1: Currency,
        fee: u32,
        tick_spacing: i32,
        hooks: Address,
    ) -> Result<Self, MathError> {
        if tick_spacing <= 0 {
            return Err(MathError::InvalidTickSpacing(tick_spacing));
        }
        if currency0 >= currency1 {
            return Err(MathError::UnsortedCurrencies);
        }
        Ok(Self {
            currency0,
            currency1,
            fee,
            tick_spacing,
            hooks,
        })
    }

    /// Deterministic identifier derived from every field of the key.
    pub fn id(&self) -> PoolId {
        PoolId(format!(
            "{:?}/{:?}/{}/{}/{:?}",
            self.currency0.0, self.currency1.0, self.fee, self.tick_spacing, self.hooks
        ))
    }
}

/// Read-only price view of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
}
