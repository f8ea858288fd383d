//! Single entry point: route a tagged valuation request to its model and
//! wrap the outcome as a [`ValuationResult`].
//!
//! Financial companies are valued at the cost of equity with one of the
//! dividend or book-value models. Everything else goes through the FCFF
//! engine. No state is held between calls.

use serde::{Deserialize, Serialize};

use crate::fcff::{calculate_fcff, FcffInput};
use crate::financials::{
    calculate_gordon_growth, calculate_residual_income, calculate_roe_ddm, calculate_two_stage,
    GordonGrowthInput, ResidualIncomeInput, RoeDdmInput, TwoStageInput,
};
use crate::rates::{
    cost_of_capital, cost_of_equity, rate_warnings, CapitalStructureInput, CostOfEquityInput,
    RateDerivationOutput,
};
use crate::time_value::pct_to_rate;
use crate::types::{ModelKind, Money, Percent, TraceEntry, ValuationResult};
use crate::IvResult;

/// Label recorded when the analyst leaves the company name blank.
pub const DEFAULT_COMPANY_LABEL: &str = "Unnamed";

/// Model choice and inputs for a financial company. Rates in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum FinancialModel {
    GordonGrowth {
        d1: Money,
        g_pct: Percent,
    },
    RoeBased {
        eps: Money,
        roe_pct: Percent,
        payout_pct: Percent,
    },
    TwoStage {
        d0: Money,
        g_high_pct: Percent,
        n_years: u32,
        g_stable_pct: Percent,
    },
    ResidualIncome {
        bv0: Money,
        roe_pct: Percent,
        payout_pct: Percent,
        horizon_years: u32,
    },
}

impl FinancialModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            FinancialModel::GordonGrowth { .. } => ModelKind::GordonGrowth,
            FinancialModel::RoeBased { .. } => ModelKind::RoeBased,
            FinancialModel::TwoStage { .. } => ModelKind::TwoStage,
            FinancialModel::ResidualIncome { .. } => ModelKind::ResidualIncome,
        }
    }
}

/// Company type with everything its valuation path needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "company_type", rename_all = "snake_case")]
pub enum Valuation {
    Financial {
        cost_of_equity: CostOfEquityInput,
        /// Optional; when given, WACC is derived and reported alongside Ke.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        capital_structure: Option<CapitalStructureInput>,
        model: FinancialModel,
    },
    NonFinancial {
        fcff: FcffInput,
    },
}

impl Valuation {
    pub fn kind(&self) -> ModelKind {
        match self {
            Valuation::Financial { model, .. } => model.kind(),
            Valuation::NonFinancial { .. } => ModelKind::Fcff,
        }
    }
}

/// One valuation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationRequest {
    #[serde(default)]
    pub company: String,
    #[serde(flatten)]
    pub valuation: Valuation,
}

impl ValuationRequest {
    /// Company label with blanks replaced by [`DEFAULT_COMPANY_LABEL`].
    pub fn company_label(&self) -> &str {
        let trimmed = self.company.trim();
        if trimmed.is_empty() {
            DEFAULT_COMPANY_LABEL
        } else {
            trimmed
        }
    }
}

/// Value a company. Fails without a partial result if any precondition of
/// the selected model is violated.
pub fn value_company(request: &ValuationRequest) -> IvResult<ValuationResult> {
    let company = request.company_label();
    let kind = request.valuation.kind();
    tracing::debug!(company, model = kind.label(), "dispatching valuation");

    match &request.valuation {
        Valuation::Financial {
            cost_of_equity,
            capital_structure,
            model,
        } => value_financial(company, cost_of_equity, capital_structure.as_ref(), model),
        Valuation::NonFinancial { fcff } => {
            let mut warnings = Vec::new();
            if let Some(coe) = &fcff.cost_of_equity {
                warnings.extend(rate_warnings(coe, Some(&fcff.capital_structure)));
            }
            let output = calculate_fcff(fcff)?;
            ValuationResult::from_output(company, ModelKind::Fcff, Vec::new(), warnings, output)
        }
    }
}

fn value_financial(
    company: &str,
    equity: &CostOfEquityInput,
    structure: Option<&CapitalStructureInput>,
    model: &FinancialModel,
) -> IvResult<ValuationResult> {
    let ke_pct = cost_of_equity(equity)?;
    let ke = pct_to_rate(ke_pct);

    let (leading_trace, warnings) = match structure {
        Some(structure) => {
            let rates = RateDerivationOutput {
                cost_of_equity_pct: ke_pct,
                cost_of_equity: ke,
                cost_of_capital: cost_of_capital(structure, ke)?,
            };
            (rates.trace(), rate_warnings(equity, Some(structure)))
        }
        None => (
            vec![TraceEntry::new("Cost of equity (Ke)", ke)],
            rate_warnings(equity, None),
        ),
    };

    let kind = model.kind();
    let result = match model {
        FinancialModel::GordonGrowth { d1, g_pct } => {
            let output = calculate_gordon_growth(&GordonGrowthInput {
                d1: *d1,
                cost_of_equity: ke,
                growth_rate: pct_to_rate(*g_pct),
            })?;
            ValuationResult::from_output(company, kind, leading_trace, warnings, output)?
        }
        FinancialModel::RoeBased {
            eps,
            roe_pct,
            payout_pct,
        } => {
            let output = calculate_roe_ddm(&RoeDdmInput {
                eps: *eps,
                roe: pct_to_rate(*roe_pct),
                payout: pct_to_rate(*payout_pct),
                cost_of_equity: ke,
            })?;
            ValuationResult::from_output(company, kind, leading_trace, warnings, output)?
        }
        FinancialModel::TwoStage {
            d0,
            g_high_pct,
            n_years,
            g_stable_pct,
        } => {
            let output = calculate_two_stage(&TwoStageInput {
                d0: *d0,
                high_growth_rate: pct_to_rate(*g_high_pct),
                high_growth_years: *n_years,
                stable_growth_rate: pct_to_rate(*g_stable_pct),
                cost_of_equity: ke,
            })?;
            ValuationResult::from_output(company, kind, leading_trace, warnings, output)?
        }
        FinancialModel::ResidualIncome {
            bv0,
            roe_pct,
            payout_pct,
            horizon_years,
        } => {
            let output = calculate_residual_income(&ResidualIncomeInput {
                bv0: *bv0,
                roe: pct_to_rate(*roe_pct),
                payout: pct_to_rate(*payout_pct),
                horizon_years: *horizon_years,
                cost_of_equity: ke,
            })?;
            ValuationResult::from_output(company, kind, leading_trace, warnings, output)?
        }
    };

    Ok(result)
}
