use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ValuationError;
use crate::types::{Money, Percent, Rate};
use crate::IvResult;

/// Sanity cap on explicit forecast periods.
pub const MAX_FORECAST_YEARS: u32 = 200;

/// Convert an analyst-entered percentage (12 = 12%) to a decimal rate.
pub fn pct_to_rate(pct: Percent) -> Rate {
    pct / dec!(100)
}

/// Rate as a percentage, for methodology notes and warnings. Saturates at
/// the decimal range instead of failing, since it only feeds text.
pub fn rate_to_pct(rate: Rate) -> Percent {
    rate.saturating_mul(dec!(100))
}

/// Reject a discount rate at or below -100%, where `(1 + r)^t` stops being a
/// usable divisor.
pub fn validate_discount_rate(field: &str, rate: Rate) -> IvResult<()> {
    if rate <= dec!(-1) {
        return Err(ValuationError::InvalidInput {
            field: field.into(),
            reason: format!("Discount rate must be greater than -100%, got {rate}"),
        });
    }
    Ok(())
}

/// Explicit forecast periods must be a positive integer no larger than
/// [`MAX_FORECAST_YEARS`].
pub fn validate_periods(field: &str, periods: u32) -> IvResult<()> {
    if periods == 0 {
        return Err(ValuationError::InvalidInput {
            field: field.into(),
            reason: "Must be at least 1 year".into(),
        });
    }
    if periods > MAX_FORECAST_YEARS {
        return Err(ValuationError::InvalidInput {
            field: field.into(),
            reason: format!("{periods} years exceeds {MAX_FORECAST_YEARS}; likely an input error"),
        });
    }
    Ok(())
}

/// A perpetuity needs `discount_rate > growth_rate`; equality fails too.
pub fn ensure_positive_spread(model: &str, discount_rate: Rate, growth_rate: Rate) -> IvResult<Rate> {
    if growth_rate >= discount_rate {
        tracing::debug!(
            model,
            %discount_rate,
            %growth_rate,
            "perpetuity growth rate does not sit below the discount rate"
        );
        return Err(ValuationError::InvalidGrowthAssumption {
            model: model.into(),
            discount_rate,
            growth_rate,
        });
    }
    Ok(discount_rate - growth_rate)
}

/// Value one period before `next_cash_flow` of a stream growing at
/// `growth_rate` forever: `CF / (r - g)`.
pub fn perpetuity_value(
    model: &str,
    next_cash_flow: Money,
    discount_rate: Rate,
    growth_rate: Rate,
) -> IvResult<Money> {
    let spread = ensure_positive_spread(model, discount_rate, growth_rate)?;
    checked_div(model, next_cash_flow, spread)
}

/// Multiply `value` by `(1 + rate)`, failing instead of overflowing.
pub fn grow(field: &str, value: Decimal, rate: Rate) -> IvResult<Decimal> {
    let factor = checked_add(field, Decimal::ONE, rate)?;
    checked_mul(field, value, factor)
}

fn out_of_range(field: &str) -> ValuationError {
    ValuationError::InvalidInput {
        field: field.into(),
        reason: "Result exceeds the supported decimal range".into(),
    }
}

/// `a + b`, or `InvalidInput` on overflow.
pub fn checked_add(field: &str, a: Decimal, b: Decimal) -> IvResult<Decimal> {
    a.checked_add(b).ok_or_else(|| out_of_range(field))
}

/// `a - b`, or `InvalidInput` on overflow.
pub fn checked_sub(field: &str, a: Decimal, b: Decimal) -> IvResult<Decimal> {
    a.checked_sub(b).ok_or_else(|| out_of_range(field))
}

/// `a * b`, or `InvalidInput` on overflow.
pub fn checked_mul(field: &str, a: Decimal, b: Decimal) -> IvResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| out_of_range(field))
}

/// `numerator / denominator`. A denominator that is zero, or has decayed to
/// zero at 28 decimal places, is an error like an overflowing quotient.
pub fn checked_div(field: &str, numerator: Decimal, denominator: Decimal) -> IvResult<Decimal> {
    if denominator.is_zero() {
        return Err(ValuationError::InvalidInput {
            field: field.into(),
            reason: "Division by a value that is zero at decimal precision".into(),
        });
    }
    numerator
        .checked_div(denominator)
        .ok_or_else(|| out_of_range(field))
}

/// Sum of `values`, or `InvalidInput` on overflow.
pub fn checked_sum<I>(field: &str, values: I) -> IvResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| checked_add(field, acc, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pct_to_rate() {
        assert_eq!(pct_to_rate(dec!(12)), dec!(0.12));
        assert_eq!(rate_to_pct(dec!(0.035)), dec!(3.5));
    }

    #[test]
    fn test_perpetuity_basic() {
        let v = perpetuity_value("test", dec!(10), dec!(0.12), dec!(0.05)).unwrap();
        assert!((v - dec!(142.857142857142857)).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_perpetuity_equal_rates_rejected() {
        let err = perpetuity_value("test", dec!(10), dec!(0.12), dec!(0.12)).unwrap_err();
        assert!(matches!(err, ValuationError::InvalidGrowthAssumption { .. }));
    }

    #[test]
    fn test_validate_periods() {
        assert!(validate_periods("n", 0).is_err());
        assert!(validate_periods("n", 1).is_ok());
        assert!(validate_periods("n", MAX_FORECAST_YEARS + 1).is_err());
    }

    #[test]
    fn test_grow_overflow_is_an_error() {
        assert!(grow("d", Decimal::MAX, dec!(0.5)).is_err());
    }

    #[test]
    fn test_perpetuity_vanishing_spread_is_an_error() {
        // Ke - g = 1e-28; 10 / 1e-28 is beyond Decimal::MAX
        let err = perpetuity_value(
            "Gordon Growth DDM",
            dec!(10),
            dec!(0.12),
            dec!(0.1199999999999999999999999999),
        )
        .unwrap_err();
        assert!(matches!(err, ValuationError::InvalidInput { .. }));
    }

    #[test]
    fn test_checked_div_zero_denominator() {
        let err = checked_div("x", dec!(1), Decimal::ZERO).unwrap_err();
        match err {
            ValuationError::InvalidInput { field, reason } => {
                assert_eq!(field, "x");
                assert!(reason.contains("zero"));
            }
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_checked_sum_overflow() {
        assert_eq!(checked_sum("s", [dec!(1), dec!(2)]).unwrap(), dec!(3));
        assert!(checked_sum("s", [Decimal::MAX, Decimal::ONE]).is_err());
    }

    #[test]
    fn test_rate_to_pct_saturates() {
        assert_eq!(rate_to_pct(Decimal::MAX), Decimal::MAX);
    }
}
