use thiserror::Error;

/// Errors raised by the fixed-point math routines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("tick {0} is outside [MIN_TICK, MAX_TICK]")]
    TickOutOfBounds(i32),
    #[error("sqrt price is outside [MIN_SQRT_RATIO, MAX_SQRT_RATIO)")]
    SqrtPriceOutOfBounds,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("currency0 must sort strictly before currency1")]
    UnsortedCurrencies,
    #[error("tick spacing must be positive, got {0}")]
    InvalidTickSpacing(i32),
}
