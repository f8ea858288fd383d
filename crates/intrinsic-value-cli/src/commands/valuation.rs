use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use intrinsic_value_core::fcff::FcffInput;
use intrinsic_value_core::orchestrator::{
    value_company, FinancialModel, Valuation, ValuationRequest,
};
use intrinsic_value_core::time_value::pct_to_rate;
use intrinsic_value_core::ModelKind;

use super::rates::{CapitalStructureArgs, CostOfEquityArgs};
use super::RunContext;
use crate::input;

/// Flags shared by the financial-company models
#[derive(Args)]
pub struct FinancialArgs {
    /// Company name recorded in the history log
    #[arg(long, default_value = "")]
    pub company: String,

    #[command(flatten)]
    pub equity: CostOfEquityArgs,

    // Optional; WACC is reported alongside Ke when given
    #[command(flatten)]
    pub structure: CapitalStructureArgs,

    /// Path to a JSON/YAML valuation request (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the Gordon Growth model
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct GordonArgs {
    /// Expected dividend next year (D1)
    #[arg(long)]
    pub d1: Option<Decimal>,

    /// Perpetual dividend growth, in percent
    #[arg(long)]
    pub g: Option<Decimal>,

    #[command(flatten)]
    pub common: FinancialArgs,
}

/// Arguments for the ROE-based DDM
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct RoeDdmArgs {
    /// Expected earnings per share
    #[arg(long)]
    pub eps: Option<Decimal>,

    /// Return on equity, in percent
    #[arg(long)]
    pub roe: Option<Decimal>,

    /// Dividend payout ratio, in percent
    #[arg(long)]
    pub payout: Option<Decimal>,

    #[command(flatten)]
    pub common: FinancialArgs,
}

/// Arguments for the two-stage DDM
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct TwoStageArgs {
    /// Last paid dividend (D0)
    #[arg(long)]
    pub d0: Option<Decimal>,

    /// High-stage growth, in percent
    #[arg(long)]
    pub g_high: Option<Decimal>,

    /// Length of the high-growth stage in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Stable growth after the high stage, in percent
    #[arg(long)]
    pub g_stable: Option<Decimal>,

    #[command(flatten)]
    pub common: FinancialArgs,
}

/// Arguments for the residual income model
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ResidualIncomeArgs {
    /// Opening book value per share (BV0)
    #[arg(long)]
    pub bv0: Option<Decimal>,

    /// Return on equity, in percent
    #[arg(long)]
    pub roe: Option<Decimal>,

    /// Dividend payout ratio, in percent
    #[arg(long)]
    pub payout: Option<Decimal>,

    /// Forecast horizon in years
    #[arg(long)]
    pub horizon: Option<u32>,

    #[command(flatten)]
    pub common: FinancialArgs,
}

/// Arguments for the FCFF DCF
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct FcffArgs {
    /// Company name recorded in the history log
    #[arg(long, default_value = "")]
    pub company: String,

    /// Base-year EBIT
    #[arg(long)]
    pub ebit: Option<Decimal>,

    /// Tax rate on operating income, in percent
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Depreciation & amortisation
    #[arg(long, alias = "da")]
    pub depreciation: Option<Decimal>,

    /// Capital expenditure
    #[arg(long)]
    pub capex: Option<Decimal>,

    /// Change in working capital
    #[arg(long, alias = "delta-wc", default_value = "0")]
    pub working_capital_change: Decimal,

    /// Explicit forecast years
    #[arg(long, default_value = "5")]
    pub years: u32,

    /// Return on capital employed, in percent
    #[arg(long)]
    pub roce: Option<Decimal>,

    /// Reinvestment rate, in percent of NOPAT
    #[arg(long)]
    pub reinvestment_rate: Option<Decimal>,

    /// Terminal growth, in percent
    #[arg(long)]
    pub terminal_growth: Option<Decimal>,

    /// Total borrowings
    #[arg(long, default_value = "0")]
    pub borrowings: Decimal,

    /// Cash and equivalents
    #[arg(long, default_value = "0")]
    pub cash: Decimal,

    /// Shares outstanding
    #[arg(long)]
    pub shares: Option<Decimal>,

    #[command(flatten)]
    pub equity: CostOfEquityArgs,

    #[command(flatten)]
    pub structure: CapitalStructureArgs,

    /// Path to a JSON/YAML valuation request (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a full valuation request
#[derive(Args)]
pub struct ValueArgs {
    /// Path to a JSON/YAML valuation request (or pipe JSON on stdin)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_gordon(args: GordonArgs, ctx: &RunContext) -> Result<Value, Box<dyn std::error::Error>> {
    let model = || -> Result<FinancialModel, Box<dyn std::error::Error>> {
        Ok(FinancialModel::GordonGrowth {
            d1: args.d1.ok_or("--d1 is required (or provide --input)")?,
            g_pct: args.g.ok_or("--g is required (or provide --input)")?,
        })
    };
    run_financial(&args.common, ModelKind::GordonGrowth, model, ctx)
}

pub fn run_roe_ddm(args: RoeDdmArgs, ctx: &RunContext) -> Result<Value, Box<dyn std::error::Error>> {
    let model = || -> Result<FinancialModel, Box<dyn std::error::Error>> {
        Ok(FinancialModel::RoeBased {
            eps: args.eps.ok_or("--eps is required (or provide --input)")?,
            roe_pct: args.roe.ok_or("--roe is required (or provide --input)")?,
            payout_pct: args.payout.ok_or("--payout is required (or provide --input)")?,
        })
    };
    run_financial(&args.common, ModelKind::RoeBased, model, ctx)
}

pub fn run_two_stage(
    args: TwoStageArgs,
    ctx: &RunContext,
) -> Result<Value, Box<dyn std::error::Error>> {
    let model = || -> Result<FinancialModel, Box<dyn std::error::Error>> {
        Ok(FinancialModel::TwoStage {
            d0: args.d0.ok_or("--d0 is required (or provide --input)")?,
            g_high_pct: args.g_high.ok_or("--g-high is required (or provide --input)")?,
            n_years: args.years.ok_or("--years is required (or provide --input)")?,
            g_stable_pct: args
                .g_stable
                .ok_or("--g-stable is required (or provide --input)")?,
        })
    };
    run_financial(&args.common, ModelKind::TwoStage, model, ctx)
}

pub fn run_residual_income(
    args: ResidualIncomeArgs,
    ctx: &RunContext,
) -> Result<Value, Box<dyn std::error::Error>> {
    let model = || -> Result<FinancialModel, Box<dyn std::error::Error>> {
        Ok(FinancialModel::ResidualIncome {
            bv0: args.bv0.ok_or("--bv0 is required (or provide --input)")?,
            roe_pct: args.roe.ok_or("--roe is required (or provide --input)")?,
            payout_pct: args.payout.ok_or("--payout is required (or provide --input)")?,
            horizon_years: args.horizon.ok_or("--horizon is required (or provide --input)")?,
        })
    };
    run_financial(&args.common, ModelKind::ResidualIncome, model, ctx)
}

pub fn run_fcff(args: FcffArgs, ctx: &RunContext) -> Result<Value, Box<dyn std::error::Error>> {
    let request = match input::read_structured::<ValuationRequest>(args.input.as_deref())? {
        Some(request) => expect_kind(request, ModelKind::Fcff)?,
        None => {
            let tax_rate_pct = args
                .tax_rate
                .ok_or("--tax-rate is required (or provide --input)")?;
            let capital_structure = args
                .structure
                .resolve(Some(pct_to_rate(tax_rate_pct)))?
                .ok_or("--wacc or --kd/--equity-value/--debt-value is required")?;

            ValuationRequest {
                company: args.company.clone(),
                valuation: Valuation::NonFinancial {
                    fcff: FcffInput {
                        ebit: args.ebit.ok_or("--ebit is required (or provide --input)")?,
                        tax_rate_pct,
                        depreciation_amortization: args
                            .depreciation
                            .ok_or("--depreciation is required (or provide --input)")?,
                        capex: args.capex.ok_or("--capex is required (or provide --input)")?,
                        change_in_working_capital: args.working_capital_change,
                        forecast_years: args.years,
                        roce_pct: args.roce.ok_or("--roce is required (or provide --input)")?,
                        reinvestment_rate_pct: args
                            .reinvestment_rate
                            .ok_or("--reinvestment-rate is required (or provide --input)")?,
                        terminal_growth_pct: args
                            .terminal_growth
                            .ok_or("--terminal-growth is required (or provide --input)")?,
                        cost_of_equity: args.equity.resolve_optional()?,
                        capital_structure,
                        borrowings: args.borrowings,
                        cash: args.cash,
                        shares_outstanding: args
                            .shares
                            .ok_or("--shares is required (or provide --input)")?,
                    },
                },
            }
        }
    };

    let result = value_company(&request)?;
    ctx.record(&result)
}

pub fn run_value(args: ValueArgs, ctx: &RunContext) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ValuationRequest = input::read_structured(args.input.as_deref())?
        .ok_or("--input file or JSON on stdin is required")?;
    let result = value_company(&request)?;
    ctx.record(&result)
}

fn run_financial<F>(
    common: &FinancialArgs,
    kind: ModelKind,
    model: F,
    ctx: &RunContext,
) -> Result<Value, Box<dyn std::error::Error>>
where
    F: FnOnce() -> Result<FinancialModel, Box<dyn std::error::Error>>,
{
    let request = match input::read_structured::<ValuationRequest>(common.input.as_deref())? {
        Some(request) => expect_kind(request, kind)?,
        None => ValuationRequest {
            company: common.company.clone(),
            valuation: Valuation::Financial {
                cost_of_equity: common.equity.resolve()?,
                capital_structure: common.structure.resolve(None)?,
                model: model()?,
            },
        },
    };

    let result = value_company(&request)?;
    ctx.record(&result)
}

/// A request file given to a model subcommand must be for that model.
fn expect_kind(
    request: ValuationRequest,
    kind: ModelKind,
) -> Result<ValuationRequest, Box<dyn std::error::Error>> {
    let found = request.valuation.kind();
    if found != kind {
        return Err(format!(
            "Input describes a {} valuation, not {}; use `ivc value` for any model",
            found.label(),
            kind.label()
        )
        .into());
    }
    Ok(request)
}
