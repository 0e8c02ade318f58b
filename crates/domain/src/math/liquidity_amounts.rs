use super::full_math::{Q96, div_rounding_up, mul_div, mul_div_rounding_up, to_u128};
use crate::error::MathError;
use crate::token::TokenAmounts;
use primitive_types::U256;

fn sorted(sqrt_a: U256, sqrt_b: U256) -> (U256, U256) {
    if sqrt_a <= sqrt_b {
        (sqrt_a, sqrt_b)
    } else {
        (sqrt_b, sqrt_a)
    }
}

/// Calculates liquidity for a given amount of token0 and price range.
/// L = amount0 * (sqrt(P_a) * sqrt(P_b)) / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount0(
    sqrt_a: U256,
    sqrt_b: U256,
    amount0: u128,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_a, sqrt_b);
    let intermediate = mul_div(lower, upper, Q96)?;
    to_u128(mul_div(U256::from(amount0), intermediate, upper - lower)?)
}

/// Calculates liquidity for a given amount of token1 and price range.
/// L = amount1 / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount1(
    sqrt_a: U256,
    sqrt_b: U256,
    amount1: u128,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_a, sqrt_b);
    to_u128(mul_div(U256::from(amount1), Q96, upper - lower)?)
}

/// Calculates the largest liquidity both amounts can fund at the current price.
///
/// Below the range only token0 counts, above it only token1; inside the range
/// the smaller of the two axis-implied values wins, which is why one side of a
/// deposit is usually only partially consumed.
pub fn get_liquidity_for_amounts(
    sqrt_price: U256,
    sqrt_a: U256,
    sqrt_b: U256,
    amounts: TokenAmounts,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_a, sqrt_b);

    if sqrt_price <= lower {
        get_liquidity_for_amount0(lower, upper, amounts.amount0)
    } else if sqrt_price < upper {
        let liquidity0 = get_liquidity_for_amount0(sqrt_price, upper, amounts.amount0)?;
        let liquidity1 = get_liquidity_for_amount1(lower, sqrt_price, amounts.amount1)?;
        Ok(liquidity0.min(liquidity1))
    } else {
        get_liquidity_for_amount1(lower, upper, amounts.amount1)
    }
}

/// Calculates the amount of token0 (x) spanned by liquidity between two prices.
/// delta_x = L * (1/sqrt(P_a) - 1/sqrt(P_b))
pub fn get_amount0_delta(
    sqrt_a: U256,
    sqrt_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_a, sqrt_b);
    if lower.is_zero() {
        return Err(MathError::DivisionByZero);
    }

    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = upper - lower;

    let amount = if round_up {
        div_rounding_up(mul_div_rounding_up(numerator1, numerator2, upper)?, lower)?
    } else {
        mul_div(numerator1, numerator2, upper)? / lower
    };
    to_u128(amount)
}

/// Calculates the amount of token1 (y) spanned by liquidity between two prices.
/// delta_y = L * (sqrt(P_b) - sqrt(P_a))
pub fn get_amount1_delta(
    sqrt_a: U256,
    sqrt_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_a, sqrt_b);
    let amount = if round_up {
        mul_div_rounding_up(U256::from(liquidity), upper - lower, Q96)?
    } else {
        mul_div(U256::from(liquidity), upper - lower, Q96)?
    };
    to_u128(amount)
}

/// Calculates the token amounts backing `liquidity` in a range at the current price.
pub fn get_amounts_for_liquidity(
    sqrt_price: U256,
    sqrt_a: U256,
    sqrt_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<TokenAmounts, MathError> {
    let (lower, upper) = sorted(sqrt_a, sqrt_b);

    if sqrt_price <= lower {
        Ok(TokenAmounts::new(
            get_amount0_delta(lower, upper, liquidity, round_up)?,
            0,
        ))
    } else if sqrt_price < upper {
        Ok(TokenAmounts::new(
            get_amount0_delta(sqrt_price, upper, liquidity, round_up)?,
            get_amount1_delta(lower, sqrt_price, liquidity, round_up)?,
        ))
    } else {
        Ok(TokenAmounts::new(
            0,
            get_amount1_delta(lower, upper, liquidity, round_up)?,
        ))
    }
}
