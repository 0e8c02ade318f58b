use crate::math::tick_math::{MAX_TICK, MIN_TICK};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open tick interval `[lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    pub fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }

    /// A position is in range up to but not including `upper`.
    pub fn contains(&self, tick: i32) -> bool {
        tick >= self.lower && tick < self.upper
    }

    pub fn width(&self) -> i64 {
        i64::from(self.upper) - i64::from(self.lower)
    }

    /// Checks ordering, bounds and alignment.
    pub fn is_valid(&self, tick_spacing: i32) -> bool {
        tick_spacing > 0
            && self.lower < self.upper
            && self.lower >= MIN_TICK
            && self.upper <= MAX_TICK
            && self.lower % tick_spacing == 0
            && self.upper % tick_spacing == 0
    }
}

impl fmt::Display for TickRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.lower, self.upper)
    }
}

/// The managed range of one pool and the liquidity currently parked in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolPosition {
    pub range: TickRange,
    /// Half-width of a freshly centered range, in multiples of `tick_spacing`.
    pub tick_width: u32,
    pub tick_spacing: i32,
    pub liquidity: u128,
    pub initialized: bool,
}

impl PoolPosition {
    pub fn tick_lower(&self) -> i32 {
        self.range.lower
    }

    pub fn tick_upper(&self) -> i32 {
        self.range.upper
    }

    pub fn is_in_range(&self, tick: i32) -> bool {
        self.range.contains(tick)
    }
}
