//! Gordon Growth (constant growth) Dividend Discount Model.
//!
//! P = D₁ / (Ke - g), defined only while g < Ke.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::time_value::{checked_div, ensure_positive_spread, rate_to_pct};
use crate::types::{with_metadata, ComputationOutput, Money, ModelOutput, Rate, TraceEntry};
use crate::IvResult;

const MODEL: &str = "Gordon Growth DDM";

/// Input for the Gordon Growth model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GordonGrowthInput {
    /// Expected dividend next year (D₁).
    pub d1: Money,
    /// Cost of equity (Ke).
    pub cost_of_equity: Rate,
    /// Perpetual dividend growth rate (g).
    pub growth_rate: Rate,
}

/// Output of the Gordon Growth model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GordonGrowthOutput {
    /// Intrinsic value per share.
    pub intrinsic_value: Money,
    /// Dividend capitalised (D₁).
    pub d1: Money,
    /// Ke - g.
    pub spread: Rate,
}

impl ModelOutput for GordonGrowthOutput {
    fn intrinsic_value(&self) -> Money {
        self.intrinsic_value
    }

    fn trace(&self) -> Vec<TraceEntry> {
        vec![
            TraceEntry::new("Expected dividend (D1)", self.d1),
            TraceEntry::new("Ke - g", self.spread),
            TraceEntry::new("Intrinsic value per share", self.intrinsic_value),
        ]
    }
}

/// Calculate the Gordon Growth intrinsic value.
pub fn calculate_gordon_growth(
    input: &GordonGrowthInput,
) -> IvResult<ComputationOutput<GordonGrowthOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let spread = ensure_positive_spread(MODEL, input.cost_of_equity, input.growth_rate)?;

    if input.d1 < Decimal::ZERO {
        warnings.push(format!("Negative expected dividend ({})", input.d1));
    }

    let intrinsic_value = checked_div("growth_rate", input.d1, spread)?;
    tracing::debug!(%intrinsic_value, %spread, "gordon growth valued");

    let methodology = format!(
        "Gordon DDM: D1={}, Ke={:.2}%, g={:.2}%",
        input.d1,
        rate_to_pct(input.cost_of_equity),
        rate_to_pct(input.growth_rate)
    );

    let output = GordonGrowthOutput {
        intrinsic_value,
        d1: input.d1,
        spread,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(&methodology, input, warnings, elapsed, output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValuationError;
    use rust_decimal_macros::dec;

    fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
        (a - b).abs() < eps
    }

    fn sample_input() -> GordonGrowthInput {
        GordonGrowthInput {
            d1: dec!(10),
            cost_of_equity: dec!(0.12),
            growth_rate: dec!(0.05),
        }
    }

    #[test]
    fn test_basic_value() {
        let out = calculate_gordon_growth(&sample_input()).unwrap();
        // 10 / 0.07 = 142.857142...
        assert!(approx_eq(
            out.result.intrinsic_value,
            dec!(142.85714285714285714285714286),
            dec!(0.000000001)
        ));
        assert_eq!(out.result.spread, dec!(0.07));
    }

    #[test]
    fn test_methodology_note() {
        let out = calculate_gordon_growth(&sample_input()).unwrap();
        assert_eq!(out.methodology, "Gordon DDM: D1=10, Ke=12.00%, g=5.00%");
    }

    #[test]
    fn test_growth_equal_to_ke_rejected() {
        let mut input = sample_input();
        input.growth_rate = dec!(0.12);
        match calculate_gordon_growth(&input).unwrap_err() {
            ValuationError::InvalidGrowthAssumption {
                discount_rate,
                growth_rate,
                ..
            } => {
                assert_eq!(discount_rate, dec!(0.12));
                assert_eq!(growth_rate, dec!(0.12));
            }
            e => panic!("Expected InvalidGrowthAssumption, got {e:?}"),
        }
    }

    #[test]
    fn test_growth_above_ke_rejected() {
        let mut input = sample_input();
        input.growth_rate = dec!(0.15);
        assert!(calculate_gordon_growth(&input).is_err());
    }

    #[test]
    fn test_negative_growth_allowed() {
        let mut input = sample_input();
        input.growth_rate = dec!(-0.03);
        let out = calculate_gordon_growth(&input).unwrap();
        assert_eq!(out.result.intrinsic_value, dec!(10) / dec!(0.15));
    }

    #[test]
    fn test_vanishing_spread_is_an_error_not_a_panic() {
        let mut input = sample_input();
        input.growth_rate = dec!(0.1199999999999999999999999999);
        match calculate_gordon_growth(&input).unwrap_err() {
            ValuationError::InvalidInput { field, .. } => assert_eq!(field, "growth_rate"),
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_negative_dividend_warning() {
        let mut input = sample_input();
        input.d1 = dec!(-1);
        let out = calculate_gordon_growth(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("Negative expected dividend")));
    }
}
