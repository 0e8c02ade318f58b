use crate::error::MathError;
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Lowest tick the engine accepts.
pub const MIN_TICK: i32 = -887272;
/// Highest tick the engine accepts.
pub const MAX_TICK: i32 = -MIN_TICK;

/// `get_sqrt_ratio_at_tick(MIN_TICK)`.
pub const MIN_SQRT_RATIO: U256 = U256([4295128739, 0, 0, 0]);
/// `get_sqrt_ratio_at_tick(MAX_TICK)`.
pub const MAX_SQRT_RATIO: U256 = U256([0x5d951d5263988d26, 0xefd1fc6a50648849, 0xfffd8963, 0]);

const Q128: U256 = U256([0, 0, 1, 0]);

// sqrt(1.0001)^-1 as Q128.128, used when bit 0 of |tick| is set.
const RATIO_BIT0: U256 = U256([0xaa2d162d1a594001, 0xfffcb933bd6fad37, 0, 0]);

// sqrt(1.0001)^-(2^i) as Q128.128 for i = 1..=19.
const RATIO_BITS: [U256; 19] = [
    U256([0x59a46990580e213a, 0xfff97272373d4132, 0, 0]),
    U256([0xef12357cf3c7fdcc, 0xfff2e50f5f656932, 0, 0]),
    U256([0x1c3624eaa0941cd0, 0xffe5caca7e10e4e6, 0, 0]),
    U256([0xc9db58835c926644, 0xffcb9843d60f6159, 0, 0]),
    U256([0x472e6896dfb254c0, 0xff973b41fa98c081, 0, 0]),
    U256([0x43ec78b326b52861, 0xff2ea16466c96a38, 0, 0]),
    U256([0x11c461f1969c3053, 0xfe5dee046a99a2a8, 0, 0]),
    U256([0xdcffc83b479aa3a4, 0xfcbe86c7900a88ae, 0, 0]),
    U256([0x6f2b074cf7815e54, 0xf987a7253ac41317, 0, 0]),
    U256([0x940c7a398e4b70f3, 0xf3392b0822b70005, 0, 0]),
    U256([0x43b29c7fa6e889d9, 0xe7159475a2c29b74, 0, 0]),
    U256([0x845ad8f792aa5825, 0xd097f3bdfd2022b8, 0, 0]),
    U256([0x8a65dc1f90e061e5, 0xa9f746462d870fdf, 0, 0]),
    U256([0x90bb3df62baf32f7, 0x70d869a156d2a1b8, 0, 0]),
    U256([0x81231505542fcfa6, 0x31be135f97d08fd9, 0, 0]),
    U256([0xc677de54f3e99bc9, 0x09aa508b5b7a84e1, 0, 0]),
    U256([0x6699c329225ee604, 0x005d6af8dedb8119, 0, 0]),
    U256([0x1ea926041bedfe98, 0x00002216e584f5fa, 0, 0]),
    U256([0x91f7dc42444e8fa2, 0x00000000048a1703, 0, 0]),
];

/// Returns sqrt(1.0001^tick) as a Q64.96 number, rounded up.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, MathError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(MathError::TickOutOfBounds(tick));
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 1 != 0 { RATIO_BIT0 } else { Q128 };
    for (i, factor) in RATIO_BITS.iter().enumerate() {
        if abs_tick & (1 << (i + 1)) != 0 {
            // ratio <= 2^128 and factor < 2^128, so the product fits.
            ratio = (ratio * *factor) >> 128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up so the result never undershoots the tick.
    let shifted = ratio >> 32;
    if (ratio & U256::from(u32::MAX)).is_zero() {
        Ok(shifted)
    } else {
        Ok(shifted + U256::one())
    }
}

/// Returns the greatest tick whose sqrt ratio is less than or equal to `sqrt_price_x96`.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32, MathError> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(MathError::SqrtPriceOutOfBounds);
    }

    let (mut lo, mut hi) = (MIN_TICK, MAX_TICK);
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if get_sqrt_ratio_at_tick(mid)? <= sqrt_price_x96 {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Ok(lo)
}

/// Aligns a tick to a multiple of `tick_spacing`.
///
/// Uses truncating division, so negative ticks move toward zero:
/// `align_tick(-90, 60) == -60`. The same rule keeps clamped bounds inside
/// `[MIN_TICK, MAX_TICK]`.
pub fn align_tick(tick: i32, tick_spacing: i32) -> Result<i32, MathError> {
    if tick_spacing <= 0 {
        return Err(MathError::InvalidTickSpacing(tick_spacing));
    }
    Ok((tick / tick_spacing) * tick_spacing)
}

/// Lowest tick usable at the given spacing.
pub fn min_usable_tick(tick_spacing: i32) -> Result<i32, MathError> {
    align_tick(MIN_TICK, tick_spacing)
}

/// Highest tick usable at the given spacing.
pub fn max_usable_tick(tick_spacing: i32) -> Result<i32, MathError> {
    align_tick(MAX_TICK, tick_spacing)
}

/// Returns the price corresponding to a given tick.
/// P = 1.0001 ^ tick
pub fn tick_to_price(tick: i32) -> Result<Decimal, MathError> {
    let base = 1.0001f64;
    let price_f64 = base.powi(tick);
    Decimal::from_f64(price_f64).ok_or(MathError::Overflow)
}

/// Returns the price encoded by a Q64.96 sqrt price.
/// P = (sqrt / 2^96) ^ 2
pub fn sqrt_price_to_price(sqrt_price_x96: U256) -> Result<Decimal, MathError> {
    let sqrt = u256_to_f64(sqrt_price_x96) / 2f64.powi(96);
    Decimal::from_f64(sqrt * sqrt).ok_or(MathError::Overflow)
}

fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0f64, |acc, limb| acc * 2f64.powi(64) + *limb as f64)
}
