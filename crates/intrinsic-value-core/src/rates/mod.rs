//! Discount-rate derivation: cost of equity (direct or CAPM) and weighted
//! average cost of capital (direct or built from market-value weights).

pub mod cost_of_equity;
pub mod wacc;

pub use cost_of_equity::{cost_of_equity, CostOfEquityInput};
pub use wacc::{cost_of_capital, CapitalStructureInput, CostOfCapital};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::time_value::{pct_to_rate, rate_to_pct};
use crate::types::{with_metadata, ComputationOutput, Percent, Rate, TraceEntry};
use crate::IvResult;

/// Everything needed to resolve both discount rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateDerivationInput {
    pub cost_of_equity: CostOfEquityInput,
    pub capital_structure: CapitalStructureInput,
}

/// Resolved discount rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateDerivationOutput {
    /// Cost of equity in percent
    pub cost_of_equity_pct: Percent,
    /// Cost of equity as a decimal
    pub cost_of_equity: Rate,
    /// WACC, weights and after-tax cost of debt
    #[serde(flatten)]
    pub cost_of_capital: CostOfCapital,
}

impl RateDerivationOutput {
    pub fn trace(&self) -> Vec<TraceEntry> {
        let mut trace = vec![
            TraceEntry::new("Cost of equity (Ke)", self.cost_of_equity),
            TraceEntry::new("WACC", self.cost_of_capital.wacc),
        ];
        if let Some(we) = self.cost_of_capital.equity_weight {
            trace.push(TraceEntry::new("Equity weight (We)", we));
        }
        if let Some(wd) = self.cost_of_capital.debt_weight {
            trace.push(TraceEntry::new("Debt weight (Wd)", wd));
        }
        if let Some(kd) = self.cost_of_capital.after_tax_cost_of_debt {
            trace.push(TraceEntry::new("After-tax cost of debt", kd));
        }
        trace
    }
}

/// Resolve cost of equity and WACC together, with reasonableness warnings.
pub fn derive_rates(
    input: &RateDerivationInput,
) -> IvResult<ComputationOutput<RateDerivationOutput>> {
    let start = Instant::now();
    let mut warnings = rate_warnings(&input.cost_of_equity, Some(&input.capital_structure));

    let ke_pct = cost_of_equity(&input.cost_of_equity)?;
    let ke = pct_to_rate(ke_pct);
    let coc = cost_of_capital(&input.capital_structure, ke)?;

    if coc.wacc > dec!(0.20) {
        warnings.push(format!(
            "WACC of {:.2}% exceeds 20%; appropriate for high-risk situations only",
            rate_to_pct(coc.wacc)
        ));
    }

    let methodology = match input.cost_of_equity {
        CostOfEquityInput::Direct { .. } => "Direct cost of equity",
        CostOfEquityInput::Capm { .. } => "Cost of equity via CAPM",
    };
    let methodology = match input.capital_structure {
        CapitalStructureInput::DirectWacc { .. } => format!("{methodology}; direct WACC"),
        CapitalStructureInput::Computed { .. } => {
            format!("{methodology}; WACC from market-value weights")
        }
    };

    let output = RateDerivationOutput {
        cost_of_equity_pct: ke_pct,
        cost_of_equity: ke,
        cost_of_capital: coc,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(&methodology, input, warnings, elapsed, output))
}

/// Warnings on the raw rate inputs. Shared with the orchestrator.
pub fn rate_warnings(
    equity: &CostOfEquityInput,
    structure: Option<&CapitalStructureInput>,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if let CostOfEquityInput::Capm { beta, erp_pct, .. } = equity {
        if *beta > dec!(3.0) {
            warnings.push(format!(
                "High beta ({beta}): verify market data; betas above 3.0 are unusual"
            ));
        }
        if *erp_pct > dec!(10) {
            warnings.push(format!(
                "Equity risk premium ({erp_pct}%) exceeds 10%; verify estimate"
            ));
        }
    }
    if matches!(cost_of_equity(equity), Ok(ke) if ke <= Decimal::ZERO) {
        warnings.push("Cost of equity is zero or negative".into());
    }
    if let Some(CapitalStructureInput::Computed { tax_rate, .. }) = structure {
        if *tax_rate < Decimal::ZERO || *tax_rate > Decimal::ONE {
            warnings.push(format!(
                "Tax rate ({tax_rate}) is outside 0..1; it is applied as a decimal fraction"
            ));
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> RateDerivationInput {
        RateDerivationInput {
            cost_of_equity: CostOfEquityInput::Capm {
                rf_pct: dec!(7),
                beta: dec!(1.0),
                erp_pct: dec!(6),
            },
            capital_structure: CapitalStructureInput::Computed {
                kd_pct: dec!(8),
                tax_rate: dec!(0.30),
                equity_value: dec!(1000),
                debt_value: dec!(500),
            },
        }
    }

    #[test]
    fn test_derive_rates() {
        let out = derive_rates(&sample_input()).unwrap();
        assert_eq!(out.result.cost_of_equity_pct, dec!(13));
        assert_eq!(out.result.cost_of_equity, dec!(0.13));
        // 2/3 * 0.13 + 1/3 * 0.056 = 0.105333..
        assert!((out.result.cost_of_capital.wacc - dec!(0.1053333333)).abs() < dec!(0.0000001));
        assert_eq!(out.methodology, "Cost of equity via CAPM; WACC from market-value weights");
    }

    #[test]
    fn test_trace_includes_weights() {
        let out = derive_rates(&sample_input()).unwrap();
        let labels: Vec<String> = out.result.trace().into_iter().map(|e| e.label).collect();
        assert!(labels.contains(&"Equity weight (We)".to_string()));
        assert!(labels.contains(&"Debt weight (Wd)".to_string()));
    }

    #[test]
    fn test_high_beta_warning() {
        let mut input = sample_input();
        input.cost_of_equity = CostOfEquityInput::Capm {
            rf_pct: dec!(7),
            beta: dec!(3.5),
            erp_pct: dec!(6),
        };
        let out = derive_rates(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("High beta")));
        assert!(out.warnings.iter().any(|w| w.contains("WACC of")));
    }

    #[test]
    fn test_zero_capital_structure_propagates() {
        let mut input = sample_input();
        input.capital_structure = CapitalStructureInput::Computed {
            kd_pct: dec!(8),
            tax_rate: dec!(0.30),
            equity_value: Decimal::ZERO,
            debt_value: Decimal::ZERO,
        };
        assert!(derive_rates(&input).is_err());
    }
}
