use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::time_value::{checked_add, checked_div, checked_mul, checked_sub, pct_to_rate};
use crate::types::{Money, Percent, Rate};
use crate::IvResult;

/// How the analyst supplies the cost of capital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CapitalStructureInput {
    /// WACC entered directly, in percent.
    DirectWacc { wacc_pct: Percent },
    /// WACC built from market values of equity and debt.
    Computed {
        /// Pre-tax cost of debt, in percent
        kd_pct: Percent,
        /// Corporate tax rate as a decimal (0.30 = 30%)
        tax_rate: Rate,
        /// Market value of equity
        equity_value: Money,
        /// Market value of debt
        debt_value: Money,
    },
}

impl CapitalStructureInput {
    /// Same structure with the debt tax shield computed at `tax_rate`.
    /// Direct WACC is returned unchanged.
    pub fn with_tax_rate(&self, tax_rate: Rate) -> Self {
        match self {
            CapitalStructureInput::DirectWacc { .. } => self.clone(),
            CapitalStructureInput::Computed {
                kd_pct,
                equity_value,
                debt_value,
                ..
            } => CapitalStructureInput::Computed {
                kd_pct: *kd_pct,
                tax_rate,
                equity_value: *equity_value,
                debt_value: *debt_value,
            },
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, CapitalStructureInput::Computed { .. })
    }
}

/// Output of the cost of capital calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostOfCapital {
    /// Weighted average cost of capital as a decimal
    pub wacc: Rate,
    /// E / (E + D); absent when WACC was entered directly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity_weight: Option<Rate>,
    /// D / (E + D); absent when WACC was entered directly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_weight: Option<Rate>,
    /// Kd * (1 - t); absent when WACC was entered directly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_tax_cost_of_debt: Option<Rate>,
}

/// Calculate the Weighted Average Cost of Capital.
///
/// After-tax cost of debt: Kd_at = Kd * (1 - t)
/// Weights: We = E / (E + D), Wd = D / (E + D)
/// WACC = We * Ke + Wd * Kd_at
///
/// `cost_of_equity` is a decimal rate. A zero `E + D` is an error rather
/// than a silent fallback to Ke.
pub fn cost_of_capital(
    input: &CapitalStructureInput,
    cost_of_equity: Rate,
) -> IvResult<CostOfCapital> {
    match input {
        CapitalStructureInput::DirectWacc { wacc_pct } => Ok(CostOfCapital {
            wacc: pct_to_rate(*wacc_pct),
            equity_weight: None,
            debt_weight: None,
            after_tax_cost_of_debt: None,
        }),
        CapitalStructureInput::Computed {
            kd_pct,
            tax_rate,
            equity_value,
            debt_value,
        } => {
            let total = checked_add("debt_value", *equity_value, *debt_value)?;
            if total.is_zero() {
                return Err(ValuationError::InvalidCapitalStructure {
                    equity_value: *equity_value,
                    debt_value: *debt_value,
                });
            }

            let after_tax_cost_of_debt = checked_mul(
                "kd_pct",
                pct_to_rate(*kd_pct),
                checked_sub("tax_rate", Decimal::ONE, *tax_rate)?,
            )?;
            let equity_weight = checked_div("equity_value", *equity_value, total)?;
            let debt_weight = checked_div("debt_value", *debt_value, total)?;
            let wacc = checked_add(
                "wacc",
                checked_mul("cost_of_equity", equity_weight, cost_of_equity)?,
                checked_mul("kd_pct", debt_weight, after_tax_cost_of_debt)?,
            )?;

            Ok(CostOfCapital {
                wacc,
                equity_weight: Some(equity_weight),
                debt_weight: Some(debt_weight),
                after_tax_cost_of_debt: Some(after_tax_cost_of_debt),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
