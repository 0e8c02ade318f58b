use primitive_types::H160;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg};

/// A 20-byte account identifier.
pub type Address = H160;

/// A token traded in a pool, identified by its contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Currency(pub Address);

impl Currency {
    pub fn new(address: Address) -> Self {
        Self(address)
    }

    /// Builds a currency from a small integer, useful for fixtures.
    pub fn from_low_u64(v: u64) -> Self {
        Self(Address::from_low_u64_be(v))
    }

    pub fn address(&self) -> Address {
        self.0
    }
}

impl From<Address> for Currency {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Unsigned token amounts along both axes of a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmounts {
    pub amount0: u128,
    pub amount1: u128,
}

impl TokenAmounts {
    pub fn new(amount0: u128, amount1: u128) -> Self {
        Self { amount0, amount1 }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.amount0 == 0 && self.amount1 == 0
    }

    /// Returns true when both components are at least the given minimums.
    pub fn meets(&self, min: &TokenAmounts) -> bool {
        self.amount0 >= min.amount0 && self.amount1 >= min.amount1
    }
}

impl fmt::Display for TokenAmounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.amount0, self.amount1)
    }
}

/// Signed token obligations reported by the engine after a liquidity change.
///
/// Negative components are owed to the engine, positive ones are owed to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BalanceDelta {
    pub amount0: i128,
    pub amount1: i128,
}

impl BalanceDelta {
    pub const ZERO: BalanceDelta = BalanceDelta {
        amount0: 0,
        amount1: 0,
    };

    pub fn new(amount0: i128, amount1: i128) -> Self {
        Self { amount0, amount1 }
    }

    pub fn is_zero(&self) -> bool {
        self.amount0 == 0 && self.amount1 == 0
    }

    /// Amounts the caller has to pay in, per axis.
    pub fn owed_to_engine(&self) -> TokenAmounts {
        TokenAmounts::new(
            negative_part(self.amount0),
            negative_part(self.amount1),
        )
    }

    /// Amounts the caller can take out, per axis.
    pub fn owed_to_caller(&self) -> TokenAmounts {
        TokenAmounts::new(positive_part(self.amount0), positive_part(self.amount1))
    }

    pub fn checked_add(self, rhs: BalanceDelta) -> Option<BalanceDelta> {
        Some(BalanceDelta {
            amount0: self.amount0.checked_add(rhs.amount0)?,
            amount1: self.amount1.checked_add(rhs.amount1)?,
        })
    }
}

impl Add for BalanceDelta {
    type Output = BalanceDelta;

    fn add(self, rhs: BalanceDelta) -> BalanceDelta {
        BalanceDelta {
            amount0: self.amount0 + rhs.amount0,
            amount1: self.amount1 + rhs.amount1,
        }
    }
}

impl Neg for BalanceDelta {
    type Output = BalanceDelta;

    fn neg(self) -> BalanceDelta {
        BalanceDelta {
            amount0: -self.amount0,
            amount1: -self.amount1,
        }
    }
}

fn negative_part(v: i128) -> u128 {
    if v < 0 { v.unsigned_abs() } else { 0 }
}

fn positive_part(v: i128) -> u128 {
    if v > 0 { v as u128 } else { 0 }
}
