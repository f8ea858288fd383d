use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use intrinsic_value_core::rates::{
    derive_rates, CapitalStructureInput, CostOfEquityInput, RateDerivationInput,
};
use intrinsic_value_core::time_value::pct_to_rate;
use intrinsic_value_core::Rate;

use crate::input;

/// Cost of equity flags: `--ke` directly, or `--rf`, `--beta` and `--erp`
/// for CAPM. All in percent.
#[derive(Args, Debug, Clone)]
pub struct CostOfEquityArgs {
    /// Cost of equity entered directly (e.g. 12 for 12%)
    #[arg(long)]
    pub ke: Option<Decimal>,

    /// Risk-free rate for CAPM, in percent
    #[arg(long)]
    pub rf: Option<Decimal>,

    /// Levered beta for CAPM
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Equity risk premium for CAPM, in percent
    #[arg(long)]
    pub erp: Option<Decimal>,
}

impl CostOfEquityArgs {
    /// `None` when no cost of equity flag was given.
    pub fn resolve_optional(
        &self,
    ) -> Result<Option<CostOfEquityInput>, Box<dyn std::error::Error>> {
        if let Some(ke_pct) = self.ke {
            return Ok(Some(CostOfEquityInput::Direct { ke_pct }));
        }
        match (self.rf, self.beta, self.erp) {
            (None, None, None) => Ok(None),
            (Some(rf_pct), Some(beta), Some(erp_pct)) => Ok(Some(CostOfEquityInput::Capm {
                rf_pct,
                beta,
                erp_pct,
            })),
            _ => Err("CAPM needs all of --rf, --beta and --erp".into()),
        }
    }

    pub fn resolve(&self) -> Result<CostOfEquityInput, Box<dyn std::error::Error>> {
        self.resolve_optional()?
            .ok_or_else(|| "--ke or --rf/--beta/--erp is required (or provide --input)".into())
    }
}

/// Capital structure flags: `--wacc` directly, or cost of debt with market
/// values of equity and debt.
#[derive(Args, Debug, Clone)]
pub struct CapitalStructureArgs {
    /// WACC entered directly (e.g. 10 for 10%)
    #[arg(long)]
    pub wacc: Option<Decimal>,

    /// Pre-tax cost of debt, in percent
    #[arg(long)]
    pub kd: Option<Decimal>,

    /// Corporate tax rate for the debt tax shield, in percent
    #[arg(long)]
    pub corporate_tax: Option<Decimal>,

    /// Market value of equity
    #[arg(long)]
    pub equity_value: Option<Decimal>,

    /// Market value of debt
    #[arg(long)]
    pub debt_value: Option<Decimal>,
}

impl CapitalStructureArgs {
    /// `None` when no capital structure flag was given. `fallback_tax` is
    /// used when `--corporate-tax` is absent.
    pub fn resolve(
        &self,
        fallback_tax: Option<Rate>,
    ) -> Result<Option<CapitalStructureInput>, Box<dyn std::error::Error>> {
        if let Some(wacc_pct) = self.wacc {
            return Ok(Some(CapitalStructureInput::DirectWacc { wacc_pct }));
        }
        match (self.kd, self.equity_value, self.debt_value) {
            (None, None, None) => Ok(None),
            (Some(kd_pct), Some(equity_value), Some(debt_value)) => {
                let tax_rate = self
                    .corporate_tax
                    .map(pct_to_rate)
                    .or(fallback_tax)
                    .ok_or("--corporate-tax is required with --kd")?;
                Ok(Some(CapitalStructureInput::Computed {
                    kd_pct,
                    tax_rate,
                    equity_value,
                    debt_value,
                }))
            }
            _ => Err("Weighted WACC needs all of --kd, --equity-value and --debt-value".into()),
        }
    }
}

/// Arguments for rate derivation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct RatesArgs {
    #[command(flatten)]
    pub equity: CostOfEquityArgs,

    #[command(flatten)]
    pub structure: CapitalStructureArgs,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_rates(args: RatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rate_input: RateDerivationInput =
        match input::read_structured(args.input.as_deref())? {
            Some(data) => data,
            None => RateDerivationInput {
                cost_of_equity: args.equity.resolve()?,
                capital_structure: args
                    .structure
                    .resolve(None)?
                    .ok_or("--wacc or --kd/--equity-value/--debt-value is required")?,
            },
        };

    let result = derive_rates(&rate_input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn structure() -> CapitalStructureArgs {
        CapitalStructureArgs {
            wacc: None,
            kd: Some(dec!(8)),
            corporate_tax: None,
            equity_value: Some(dec!(600)),
            debt_value: Some(dec!(400)),
        }
    }

    #[test]
    fn test_capm_flags() {
        let args = CostOfEquityArgs {
            ke: None,
            rf: Some(dec!(4)),
            beta: Some(dec!(1.1)),
            erp: Some(dec!(5)),
        };
        assert_eq!(
            args.resolve().unwrap(),
            CostOfEquityInput::Capm {
                rf_pct: dec!(4),
                beta: dec!(1.1),
                erp_pct: dec!(5)
            }
        );
    }

    #[test]
    fn test_partial_capm_flags_rejected() {
        let args = CostOfEquityArgs {
            ke: None,
            rf: Some(dec!(4)),
            beta: None,
            erp: Some(dec!(5)),
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn test_corporate_tax_percent_and_fallback() {
        let mut args = structure();
        assert!(args.resolve(None).is_err());

        let from_fallback = args.resolve(Some(dec!(0.25))).unwrap().unwrap();
        assert!(matches!(
            from_fallback,
            CapitalStructureInput::Computed { tax_rate, .. } if tax_rate == dec!(0.25)
        ));

        args.corporate_tax = Some(dec!(30));
        let explicit = args.resolve(Some(dec!(0.25))).unwrap().unwrap();
        assert!(matches!(
            explicit,
            CapitalStructureInput::Computed { tax_rate, .. } if tax_rate == dec!(0.30)
        ));
    }
}
