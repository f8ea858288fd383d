//! Two-Stage Dividend Discount Model.
//!
//! Dividends grow at a high rate for `n` years, then at a stable rate
//! forever. The stable phase is valued with a Gordon terminal value at the
//! end of year `n`:
//!
//!   PV_div = Σ D₀(1+g_high)^t / (1+Ke)^t,  t = 1..n
//!   TV     = D_n(1+g_stable) / (Ke - g_stable)
//!   P      = PV_div + TV / (1+Ke)^n
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::time_value::{
    checked_add, checked_div, ensure_positive_spread, grow, perpetuity_value, rate_to_pct,
    validate_discount_rate, validate_periods,
};
use crate::types::{with_metadata, ComputationOutput, Money, ModelOutput, Rate, TraceEntry};
use crate::IvResult;

const MODEL: &str = "Two-stage DDM";

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Input for the two-stage DDM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoStageInput {
    /// Last paid dividend per share (D₀).
    pub d0: Money,
    /// Growth rate during the high-growth stage.
    pub high_growth_rate: Rate,
    /// Length of the high-growth stage in years.
    pub high_growth_years: u32,
    /// Perpetual growth rate after the high-growth stage.
    pub stable_growth_rate: Rate,
    /// Cost of equity (Ke).
    pub cost_of_equity: Rate,
}

/// Year-by-year dividend detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendYear {
    /// Year number (1-indexed).
    pub year: u32,
    /// Projected dividend for this year.
    pub dividend: Money,
    /// Present value of this year's dividend.
    pub pv: Money,
}

/// Output of the two-stage DDM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoStageOutput {
    /// Intrinsic value per share.
    pub intrinsic_value: Money,
    /// Year-by-year dividends through the high-growth stage.
    pub year_by_year: Vec<DividendYear>,
    /// Sum of PVs of the high-growth dividends.
    pub pv_dividends: Money,
    /// First stable-phase dividend, D_{n+1}.
    pub terminal_dividend: Money,
    /// Gordon value at the end of year n.
    pub terminal_value: Money,
    /// Terminal value discounted to today.
    pub pv_terminal_value: Money,
    /// PV of terminal value as a percentage of intrinsic value.
    pub terminal_pct: Decimal,
}

impl ModelOutput for TwoStageOutput {
    fn intrinsic_value(&self) -> Money {
        self.intrinsic_value
    }

    fn trace(&self) -> Vec<TraceEntry> {
        let mut trace: Vec<TraceEntry> = self
            .year_by_year
            .iter()
            .map(|y| TraceEntry::new(format!("Dividend D{}", y.year), y.dividend))
            .collect();
        let next_year = self.year_by_year.len() + 1;
        trace.push(TraceEntry::new("PV of dividends", self.pv_dividends));
        trace.push(TraceEntry::new(
            format!("Terminal dividend D{next_year}"),
            self.terminal_dividend,
        ));
        trace.push(TraceEntry::new("Terminal value", self.terminal_value));
        trace.push(TraceEntry::new("PV of terminal value", self.pv_terminal_value));
        trace.push(TraceEntry::new("Intrinsic value per share", self.intrinsic_value));
        trace
    }
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Calculate the two-stage DDM intrinsic value.
pub fn calculate_two_stage(input: &TwoStageInput) -> IvResult<ComputationOutput<TwoStageOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    validate_input(input)?;

    let ke = input.cost_of_equity;

    let mut dividend = input.d0;
    let mut compounding = Decimal::ONE;
    let mut pv_dividends = Decimal::ZERO;
    let mut year_by_year = Vec::with_capacity(input.high_growth_years as usize);

    for year in 1..=input.high_growth_years {
        dividend = grow("high_growth_rate", dividend, input.high_growth_rate)?;
        compounding = grow("cost_of_equity", compounding, ke)?;

        let pv = checked_div("cost_of_equity", dividend, compounding)?;
        pv_dividends = checked_add("high_growth_years", pv_dividends, pv)?;
        year_by_year.push(DividendYear {
            year,
            dividend,
            pv,
        });
    }

    // TV = D_n * (1 + g_stable) / (Ke - g_stable)
    let terminal_dividend = grow("stable_growth_rate", dividend, input.stable_growth_rate)?;
    let terminal_value =
        perpetuity_value(MODEL, terminal_dividend, ke, input.stable_growth_rate)?;
    let pv_terminal_value = checked_div("cost_of_equity", terminal_value, compounding)?;

    let intrinsic_value = checked_add("stable_growth_rate", pv_dividends, pv_terminal_value)?;

    let terminal_pct = if intrinsic_value.is_zero() {
        Decimal::ZERO
    } else {
        rate_to_pct(checked_div("stable_growth_rate", pv_terminal_value, intrinsic_value)?)
    };
    if terminal_pct > dec!(75) {
        warnings.push(format!(
            "Terminal value represents {terminal_pct:.1}% of intrinsic value; consider a longer high-growth stage"
        ));
    }
    if input.high_growth_rate >= ke {
        warnings.push(format!(
            "High-growth rate ({:.2}%) is at or above Ke ({:.2}%); acceptable for a finite stage only",
            rate_to_pct(input.high_growth_rate),
            rate_to_pct(ke)
        ));
    }

    tracing::debug!(%intrinsic_value, years = input.high_growth_years, "two-stage ddm valued");

    let methodology = format!(
        "Two-stage DDM: D0={}, g_high={:.2}%, n={}, g_stable={:.2}%",
        input.d0,
        rate_to_pct(input.high_growth_rate),
        input.high_growth_years,
        rate_to_pct(input.stable_growth_rate)
    );

    let output = TwoStageOutput {
        intrinsic_value,
        year_by_year,
        pv_dividends,
        terminal_dividend,
        terminal_value,
        pv_terminal_value,
        terminal_pct,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(&methodology, input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &TwoStageInput) -> IvResult<()> {
    validate_periods("high_growth_years", input.high_growth_years)?;
    validate_discount_rate("cost_of_equity", input.cost_of_equity)?;
    ensure_positive_spread(MODEL, input.cost_of_equity, input.stable_growth_rate)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValuationError;
    use rust_decimal_macros::dec;

    fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
        (a - b).abs() < eps
    }

    fn sample_input() -> TwoStageInput {
        TwoStageInput {
            d0: dec!(2.00),
            high_growth_rate: dec!(0.10),
            high_growth_years: 5,
            stable_growth_rate: dec!(0.04),
            cost_of_equity: dec!(0.12),
        }
    }

    #[test]
    fn test_year_by_year_dividends() {
        let out = calculate_two_stage(&sample_input()).unwrap();
        let years = &out.result.year_by_year;
        assert_eq!(years.len(), 5);
        assert_eq!(years[0].dividend, dec!(2.20));
        assert_eq!(years[1].dividend, dec!(2.42));
        assert_eq!(years[4].dividend, dec!(2.00) * dec!(1.61051));
    }

    #[test]
    fn test_components_sum_to_value() {
        let out = calculate_two_stage(&sample_input()).unwrap();
        let r = &out.result;
        assert_eq!(r.intrinsic_value, r.pv_dividends + r.pv_terminal_value);
        let pv_sum: Decimal = r.year_by_year.iter().map(|y| y.pv).sum();
        assert_eq!(pv_sum, r.pv_dividends);
    }

    #[test]
    fn test_terminal_value() {
        let out = calculate_two_stage(&sample_input()).unwrap();
        let r = &out.result;
        // D6 = 2 * 1.1^5 * 1.04 = 3.349861, TV = D6 / 0.08
        let d6 = dec!(2.00) * dec!(1.61051) * dec!(1.04);
        assert_eq!(r.terminal_dividend, d6);
        assert!(approx_eq(r.terminal_value, d6 / dec!(0.08), dec!(0.000000001)));
        let expected_pv = r.terminal_value / dec!(1.7623416832);
        assert!(approx_eq(r.pv_terminal_value, expected_pv, dec!(0.000000001)));
    }

    #[test]
    fn test_reference_value() {
        // PV(dividends) ~ 9.4769, PV(TV) ~ 23.7600 -> ~33.2369
        let out = calculate_two_stage(&sample_input()).unwrap();
        assert!(
            approx_eq(out.result.intrinsic_value, dec!(33.2369), dec!(0.0001)),
            "Expected ~33.2369, got {}",
            out.result.intrinsic_value
        );
    }

    #[test]
    fn test_stable_growth_equal_to_ke_rejected() {
        let mut input = sample_input();
        input.stable_growth_rate = dec!(0.12);
        let err = calculate_two_stage(&input).unwrap_err();
        assert!(matches!(err, ValuationError::InvalidGrowthAssumption { .. }));
    }

    #[test]
    fn test_zero_years_rejected() {
        let mut input = sample_input();
        input.high_growth_years = 0;
        let err = calculate_two_stage(&input).unwrap_err();
        assert!(matches!(err, ValuationError::InvalidInput { .. }));
    }

    #[test]
    fn test_negative_ke_over_long_stage_is_an_error_not_a_panic() {
        // (1 + Ke)^t decays towards zero while dividends compound
        let input = TwoStageInput {
            d0: dec!(2),
            high_growth_rate: dec!(0.10),
            high_growth_years: 150,
            stable_growth_rate: dec!(-0.60),
            cost_of_equity: dec!(-0.50),
        };
        let err = calculate_two_stage(&input).unwrap_err();
        assert!(matches!(err, ValuationError::InvalidInput { .. }), "got {err:?}");
    }

    #[test]
    fn test_high_growth_above_ke_warns_but_values() {
        let mut input = sample_input();
        input.high_growth_rate = dec!(0.20);
        let out = calculate_two_stage(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("High-growth rate")));
    }

    #[test]
    fn test_trace_exposes_every_dividend() {
        let out = calculate_two_stage(&sample_input()).unwrap();
        let trace = out.result.trace();
        for year in 1..=5 {
            let label = format!("Dividend D{year}");
            assert!(trace.iter().any(|e| e.label == label), "missing {label}");
        }
        assert!(trace.iter().any(|e| e.label == "Terminal dividend D6"));
        assert!(trace.iter().any(|e| e.label == "PV of dividends"));
        assert!(trace.iter().any(|e| e.label == "PV of terminal value"));
    }
}
