//! Share issuance and redemption.
//!
//! Each registered pool carries its own ledger: total shares, total managed
//! liquidity and per-holder balances. Mints and burns are planned first and
//! committed only after the engine has accepted the matching liquidity
//! change.

mod shares;

pub use shares::*;
