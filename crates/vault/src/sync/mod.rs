//! Engine/accounting reconciliation.

mod reconciler;

pub use reconciler::*;
