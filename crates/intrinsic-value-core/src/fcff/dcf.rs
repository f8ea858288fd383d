use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ValuationError;
use crate::growth::operating_growth;
use crate::rates::{cost_of_capital, CapitalStructureInput, CostOfCapital, CostOfEquityInput};
use crate::time_value::{
    checked_add, checked_div, checked_mul, checked_sub, checked_sum, ensure_positive_spread, grow,
    pct_to_rate, perpetuity_value, rate_to_pct, validate_discount_rate, validate_periods,
};
use crate::types::{
    with_metadata, ComputationOutput, Money, ModelOutput, Percent, Rate, TraceEntry,
};
use crate::IvResult;

const MODEL: &str = "FCFF DCF";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input parameters for an FCFF valuation of a non-financial company.
/// Rates are in percent, as the analyst enters them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcffInput {
    /// Base-year EBIT
    pub ebit: Money,
    /// Tax rate on operating income, in percent
    pub tax_rate_pct: Percent,
    /// Depreciation & amortisation
    pub depreciation_amortization: Money,
    /// Capital expenditure
    pub capex: Money,
    /// Change in working capital
    pub change_in_working_capital: Money,
    /// Number of explicit forecast years
    pub forecast_years: u32,
    /// Return on capital employed, in percent
    pub roce_pct: Percent,
    /// Share of NOPAT reinvested, in percent
    pub reinvestment_rate_pct: Percent,
    /// Perpetual growth after the forecast, in percent
    pub terminal_growth_pct: Percent,
    /// Cost of equity; required when the capital structure is computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_of_equity: Option<CostOfEquityInput>,
    /// Direct WACC or market-value weights
    pub capital_structure: CapitalStructureInput,
    /// Total borrowings for the equity bridge
    pub borrowings: Money,
    /// Cash and equivalents for the equity bridge
    pub cash: Money,
    /// Shares outstanding for per-share value
    pub shares_outstanding: Decimal,
}

/// Projection for a single forecast year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcffYearProjection {
    pub year: u32,
    pub fcff: Money,
    pub discount_factor: Rate,
    pub pv_fcff: Money,
}

/// Output of the FCFF valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcffOutput {
    /// EBIT * (1 - t)
    pub nopat: Money,
    /// NOPAT + D&A - CapEx - change in WC
    pub base_fcff: Money,
    /// ROCE * reinvestment rate
    pub growth_rate: Rate,
    /// Discount rate and, when computed, capital weights
    pub cost_of_capital: CostOfCapital,
    /// Year-by-year forecast
    pub projections: Vec<FcffYearProjection>,
    /// Sum of present values of explicit-period FCFFs
    pub pv_of_fcff: Money,
    /// FCFF in the first year after the forecast
    pub terminal_fcff: Money,
    /// Gordon terminal value at the end of the forecast
    pub terminal_value: Money,
    /// Present value of terminal value
    pub pv_of_terminal: Money,
    /// Enterprise value = PV(FCFFs) + PV(TV)
    pub enterprise_value: Money,
    /// Borrowings - cash
    pub net_debt: Money,
    /// Enterprise value - net debt
    pub equity_value: Money,
    /// Equity value / shares outstanding
    pub equity_value_per_share: Money,
    /// PV of terminal value as a fraction of enterprise value
    pub terminal_value_pct: Rate,
}

impl ModelOutput for FcffOutput {
    fn intrinsic_value(&self) -> Money {
        self.equity_value_per_share
    }

    fn trace(&self) -> Vec<TraceEntry> {
        let mut trace = vec![
            TraceEntry::new("NOPAT", self.nopat),
            TraceEntry::new("Base FCFF (FCFF0)", self.base_fcff),
            TraceEntry::new("Growth rate (g)", self.growth_rate),
            TraceEntry::new("WACC", self.cost_of_capital.wacc),
        ];
        if let Some(we) = self.cost_of_capital.equity_weight {
            trace.push(TraceEntry::new("Equity weight (We)", we));
        }
        if let Some(wd) = self.cost_of_capital.debt_weight {
            trace.push(TraceEntry::new("Debt weight (Wd)", wd));
        }
        for p in &self.projections {
            trace.push(TraceEntry::new(format!("Year {} FCFF", p.year), p.fcff));
        }
        trace.extend([
            TraceEntry::new("PV of FCFF", self.pv_of_fcff),
            TraceEntry::new("Terminal FCFF", self.terminal_fcff),
            TraceEntry::new("Terminal value", self.terminal_value),
            TraceEntry::new("PV of terminal value", self.pv_of_terminal),
            TraceEntry::new("Enterprise value", self.enterprise_value),
            TraceEntry::new("Net debt", self.net_debt),
            TraceEntry::new("Equity value", self.equity_value),
            TraceEntry::new("Intrinsic value per share", self.equity_value_per_share),
        ]);
        trace
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run an FCFF DCF: base FCFF, geometric forecast at ROCE * reinvestment,
/// Gordon terminal value, and the bridge from enterprise value to value per
/// share.
pub fn calculate_fcff(input: &FcffInput) -> IvResult<ComputationOutput<FcffOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // --- Preconditions that need no rates ---
    validate_fcff_input(input)?;

    let tax_rate = pct_to_rate(input.tax_rate_pct);
    let terminal_growth = pct_to_rate(input.terminal_growth_pct);

    // --- Base FCFF ---
    let nopat = checked_mul(
        "ebit",
        input.ebit,
        checked_sub("tax_rate_pct", Decimal::ONE, tax_rate)?,
    )?;
    let base_fcff = checked_sum(
        "base_fcff",
        [
            nopat,
            input.depreciation_amortization,
            -input.capex,
            -input.change_in_working_capital,
        ],
    )?;

    // --- Growth ---
    let growth_rate = operating_growth(
        pct_to_rate(input.roce_pct),
        pct_to_rate(input.reinvestment_rate_pct),
    )?;

    // --- Discount rate ---
    let cost_of_capital = resolve_wacc(input, tax_rate, &mut warnings)?;
    let wacc = cost_of_capital.wacc;
    validate_discount_rate("wacc", wacc)?;
    ensure_positive_spread(MODEL, wacc, terminal_growth)?;

    // --- Forecast ---
    let projections = build_projections(base_fcff, growth_rate, wacc, input.forecast_years)?;
    let pv_of_fcff = checked_sum("forecast_years", projections.iter().map(|p| p.pv_fcff))?;
    let last = projections.last().ok_or_else(|| {
        ValuationError::InsufficientData("No projection years generated".into())
    })?;

    // --- Terminal value ---
    let terminal_fcff = grow("terminal_growth_pct", last.fcff, terminal_growth)?;
    let terminal_value = perpetuity_value(MODEL, terminal_fcff, wacc, terminal_growth)?;
    let pv_of_terminal = checked_mul("terminal_growth_pct", terminal_value, last.discount_factor)?;

    // --- Enterprise value ---
    let enterprise_value = checked_add("enterprise_value", pv_of_fcff, pv_of_terminal)?;

    let terminal_value_pct = if enterprise_value.is_zero() {
        Decimal::ZERO
    } else {
        checked_div("terminal_growth_pct", pv_of_terminal, enterprise_value)?
    };
    if terminal_value_pct > dec!(0.75) {
        warnings.push(format!(
            "Terminal value represents {:.1}% of enterprise value; consider extending the explicit forecast period",
            rate_to_pct(terminal_value_pct)
        ));
    }

    // --- Equity bridge ---
    let net_debt = checked_sub("cash", input.borrowings, input.cash)?;
    let equity_value = checked_sub("borrowings", enterprise_value, net_debt)?;
    let equity_value_per_share =
        checked_div("shares_outstanding", equity_value, input.shares_outstanding)?;

    if equity_value < Decimal::ZERO {
        warnings.push(format!(
            "Net debt ({net_debt}) exceeds enterprise value; equity value is negative"
        ));
    }
    if base_fcff < Decimal::ZERO {
        warnings.push(format!(
            "Base FCFF is negative ({base_fcff}); growth compounds the shortfall"
        ));
    }
    if growth_rate >= wacc {
        warnings.push(format!(
            "Forecast growth ({:.2}%) is at or above WACC ({:.2}%) during the explicit period",
            rate_to_pct(growth_rate),
            rate_to_pct(wacc)
        ));
    }

    tracing::debug!(
        %enterprise_value,
        %equity_value_per_share,
        %wacc,
        "fcff dcf valued"
    );

    let methodology = format!(
        "FCFF DCF: EBIT={}, tax={:.2}%, g={:.2}%, gT={:.2}%, WACC={:.2}%, years={}",
        input.ebit,
        input.tax_rate_pct,
        rate_to_pct(growth_rate),
        input.terminal_growth_pct,
        rate_to_pct(wacc),
        input.forecast_years
    );

    let output = FcffOutput {
        nopat,
        base_fcff,
        growth_rate,
        cost_of_capital,
        projections,
        pv_of_fcff,
        terminal_fcff,
        terminal_value,
        pv_of_terminal,
        enterprise_value,
        net_debt,
        equity_value,
        equity_value_per_share,
        terminal_value_pct,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(&methodology, input, warnings, elapsed, output))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_fcff_input(input: &FcffInput) -> IvResult<()> {
    if input.shares_outstanding <= Decimal::ZERO {
        return Err(ValuationError::InvalidShareCount {
            shares: input.shares_outstanding,
        });
    }
    validate_periods("forecast_years", input.forecast_years)?;
    if input.capital_structure.is_computed() && input.cost_of_equity.is_none() {
        return Err(ValuationError::InsufficientData(
            "Cost of equity is required to compute WACC from market-value weights".into(),
        ));
    }
    Ok(())
}

/// WACC with the after-tax cost of debt taken at the operating tax rate.
fn resolve_wacc(
    input: &FcffInput,
    tax_rate: Rate,
    warnings: &mut Vec<String>,
) -> IvResult<CostOfCapital> {
    if let CapitalStructureInput::Computed {
        tax_rate: structure_tax,
        ..
    } = &input.capital_structure
    {
        if *structure_tax != tax_rate {
            warnings.push(format!(
                "[WACC] Debt tax shield uses the operating tax rate {tax_rate} instead of {structure_tax}"
            ));
        }
    }

    let ke = match &input.cost_of_equity {
        Some(coe) => coe.rate()?,
        None => Decimal::ZERO,
    };
    cost_of_capital(&input.capital_structure.with_tax_rate(tax_rate), ke)
}

/// fcff_t = fcff_{t-1} * (1 + g); growth compounds on the forecast stream.
fn build_projections(
    base_fcff: Money,
    growth_rate: Rate,
    wacc: Rate,
    n_years: u32,
) -> IvResult<Vec<FcffYearProjection>> {
    let mut projections = Vec::with_capacity(n_years as usize);
    let mut fcff = base_fcff;
    let mut compounding = Decimal::ONE;

    for year in 1..=n_years {
        fcff = grow("reinvestment_rate_pct", fcff, growth_rate)?;
        compounding = grow("wacc", compounding, wacc)?;

        let discount_factor = checked_div("wacc", Decimal::ONE, compounding)?;
        let pv_fcff = checked_div("wacc", fcff, compounding)?;

        projections.push(FcffYearProjection {
            year,
            fcff,
            discount_factor,
            pv_fcff,
        });
    }

    Ok(projections)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
