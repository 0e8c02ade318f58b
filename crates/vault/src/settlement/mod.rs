//! Settlement of deposits and withdrawals against the engine.
//!
//! A user action is described by a [`PendingSettlement`], handed to the
//! engine as an opaque payload and executed when the engine calls back.
//! The [`SettlementCoordinator`] holds the single in-flight slot and checks
//! that every callback comes from the engine and carries the payload it
//! issued.

mod coordinator;
mod pending;

pub use coordinator::*;
pub use pending::*;
