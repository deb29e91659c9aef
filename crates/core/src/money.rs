//! Two-decimal settlement money policy.
//!
//! Everything user-visible in the settlement currency is quantized to two
//! decimal places, with a direction-dependent policy: credits to the house
//! truncate, payouts round half-up. Decimal arithmetic throughout; floats
//! never touch money.

use rust_decimal::{Decimal, RoundingStrategy};

/// Monetary amount. Exact decimal, not a float.
pub type Amount = Decimal;

/// Truncate toward zero at two decimal places (never rounds up).
///
/// Used for deposit conversion and the `should_send` aggregate.
pub fn trunc2(x: Amount) -> Amount {
    x.trunc_with_scale(2)
}

/// Round half-up (midpoint away from zero) at two decimal places.
///
/// Used for withdrawal conversion and the `sent` aggregate.
pub fn round2(x: Amount) -> Amount {
    x.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn trunc2_never_rounds_up() {
        assert_eq!(trunc2(dec!(52.2875816)), dec!(52.28));
        assert_eq!(trunc2(dec!(1.999999)), dec!(1.99));
        assert_eq!(trunc2(dec!(7)), dec!(7));
    }

    #[test]
    fn trunc2_truncates_toward_zero() {
        assert_eq!(trunc2(dec!(-1.019)), dec!(-1.01));
    }

    #[test]
    fn round2_is_half_up() {
        assert_eq!(round2(dec!(37.2262773)), dec!(37.23));
        assert_eq!(round2(dec!(0.005)), dec!(0.01));
        assert_eq!(round2(dec!(2.344)), dec!(2.34));
    }
}
