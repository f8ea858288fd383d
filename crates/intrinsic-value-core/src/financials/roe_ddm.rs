//! ROE-based Dividend Discount Model.
//!
//! Growth is not an input: it is the sustainable rate implied by return on
//! equity and the payout ratio, g = ROE * (1 - payout), and next year's
//! dividend is EPS * payout. The result is then capitalised as in Gordon.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::growth::{retention_ratio, sustainable_growth};
use crate::time_value::{checked_div, checked_mul, ensure_positive_spread, rate_to_pct};
use crate::types::{with_metadata, ComputationOutput, Money, ModelOutput, Rate, TraceEntry};
use crate::IvResult;

const MODEL: &str = "ROE-based DDM";

/// Input for the ROE-based DDM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoeDdmInput {
    /// Expected earnings per share next year.
    pub eps: Money,
    /// Return on equity.
    pub roe: Rate,
    /// Dividend payout ratio.
    pub payout: Rate,
    /// Cost of equity (Ke).
    pub cost_of_equity: Rate,
}

/// Output of the ROE-based DDM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoeDdmOutput {
    pub intrinsic_value: Money,
    /// Implied sustainable growth rate.
    pub growth_rate: Rate,
    /// 1 - payout.
    pub retention_ratio: Rate,
    /// EPS * payout.
    pub d1: Money,
    /// Ke - g.
    pub spread: Rate,
}

impl ModelOutput for RoeDdmOutput {
    fn intrinsic_value(&self) -> Money {
        self.intrinsic_value
    }

    fn trace(&self) -> Vec<TraceEntry> {
        vec![
            TraceEntry::new("Retention ratio", self.retention_ratio),
            TraceEntry::new("Sustainable growth (g)", self.growth_rate),
            TraceEntry::new("Expected dividend (D1)", self.d1),
            TraceEntry::new("Ke - g", self.spread),
            TraceEntry::new("Intrinsic value per share", self.intrinsic_value),
        ]
    }
}

/// Calculate the ROE-based DDM intrinsic value.
pub fn calculate_roe_ddm(input: &RoeDdmInput) -> IvResult<ComputationOutput<RoeDdmOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let growth_rate = sustainable_growth(input.roe, input.payout)?;
    let retention = retention_ratio(input.payout)?;
    let d1 = checked_mul("eps", input.eps, input.payout)?;
    let spread = ensure_positive_spread(MODEL, input.cost_of_equity, growth_rate)?;

    if input.payout > Decimal::ONE {
        warnings.push(format!(
            "Payout ratio ({:.2}%) exceeds 100%; retention and growth are negative",
            rate_to_pct(input.payout)
        ));
    }
    if input.payout < Decimal::ZERO {
        warnings.push("Negative payout ratio".into());
    }

    let intrinsic_value = checked_div("payout", d1, spread)?;
    tracing::debug!(%intrinsic_value, %growth_rate, "roe-based ddm valued");

    let methodology = format!(
        "ROE-DDM: EPS={}, ROE={:.2}%, payout={:.2}%, g={:.2}%",
        input.eps,
        rate_to_pct(input.roe),
        rate_to_pct(input.payout),
        rate_to_pct(growth_rate)
    );

    let output = RoeDdmOutput {
        intrinsic_value,
        growth_rate,
        retention_ratio: retention,
        d1,
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

    fn sample_input() -> RoeDdmInput {
        RoeDdmInput {
            eps: dec!(50),
            roe: dec!(0.15),
            payout: dec!(0.40),
            cost_of_equity: dec!(0.12),
        }
    }

    #[test]
    fn test_basic_value() {
        let out = calculate_roe_ddm(&sample_input()).unwrap();
        // g = 0.15 * 0.6 = 0.09, D1 = 20, IV = 20 / 0.03
        assert_eq!(out.result.growth_rate, dec!(0.09));
        assert_eq!(out.result.d1, dec!(20));
        assert!((out.result.intrinsic_value - dec!(666.66666666666)).abs() < dec!(0.00001));
    }

    #[test]
    fn test_growth_equal_to_ke_rejected() {
        // payout 20% -> g = 0.12 == Ke
        let mut input = sample_input();
        input.payout = dec!(0.20);
        let err = calculate_roe_ddm(&input).unwrap_err();
        assert!(matches!(err, ValuationError::InvalidGrowthAssumption { .. }));
    }

    #[test]
    fn test_payout_above_one_warns() {
        let mut input = sample_input();
        input.payout = dec!(1.10);
        let out = calculate_roe_ddm(&input).unwrap();
        assert!(out.result.growth_rate < Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("exceeds 100%")));
    }

    #[test]
    fn test_oversized_eps_is_an_error() {
        let mut input = sample_input();
        input.eps = Decimal::MAX;
        input.payout = dec!(2);
        match calculate_roe_ddm(&input).unwrap_err() {
            ValuationError::InvalidInput { field, .. } => assert_eq!(field, "eps"),
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_trace_order() {
        let out = calculate_roe_ddm(&sample_input()).unwrap();
        let trace = out.result.trace();
        assert_eq!(trace[0].label, "Retention ratio");
        assert_eq!(trace.last().unwrap().label, "Intrinsic value per share");
    }
}
