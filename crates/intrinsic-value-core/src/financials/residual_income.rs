//! Residual Income model.
//!
//! Value = opening book value + PV of earnings in excess of the equity
//! capital charge over a finite horizon. Book value rolls forward by
//! retained earnings each year (clean surplus). There is no perpetuity, so
//! no Ke > g requirement.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::time_value::{
    checked_add, checked_div, checked_mul, checked_sub, grow, rate_to_pct, validate_discount_rate,
    validate_periods,
};
use crate::types::{with_metadata, ComputationOutput, Money, ModelOutput, Rate, TraceEntry};
use crate::IvResult;

/// Input for the residual income model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidualIncomeInput {
    /// Opening book value per share (BV₀).
    pub bv0: Money,
    /// Return on equity, applied to opening book value each year.
    pub roe: Rate,
    /// Dividend payout ratio.
    pub payout: Rate,
    /// Forecast horizon in years.
    pub horizon_years: u32,
    /// Cost of equity (Ke).
    pub cost_of_equity: Rate,
}

/// One year of the residual income forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidualIncomeYear {
    pub year: u32,
    pub opening_book_value: Money,
    pub earnings: Money,
    pub dividends: Money,
    /// Earnings less Ke * opening book value.
    pub residual_income: Money,
    pub pv_residual_income: Money,
    pub closing_book_value: Money,
}

/// Output of the residual income model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidualIncomeOutput {
    pub intrinsic_value: Money,
    pub opening_book_value: Money,
    /// Sum of discounted residual income over the horizon.
    pub pv_residual_income: Money,
    pub year_by_year: Vec<ResidualIncomeYear>,
}

impl ModelOutput for ResidualIncomeOutput {
    fn intrinsic_value(&self) -> Money {
        self.intrinsic_value
    }

    fn trace(&self) -> Vec<TraceEntry> {
        let mut trace = vec![TraceEntry::new("Book value (BV0)", self.opening_book_value)];
        for y in &self.year_by_year {
            trace.push(TraceEntry::new(
                format!("Year {} residual income", y.year),
                y.residual_income,
            ));
            trace.push(TraceEntry::new(
                format!("Year {} PV of residual income", y.year),
                y.pv_residual_income,
            ));
            trace.push(TraceEntry::new(
                format!("Year {} closing book value", y.year),
                y.closing_book_value,
            ));
        }
        trace.push(TraceEntry::new("PV of residual income", self.pv_residual_income));
        trace.push(TraceEntry::new("Intrinsic value per share", self.intrinsic_value));
        trace
    }
}

/// Calculate the residual income intrinsic value.
pub fn calculate_residual_income(
    input: &ResidualIncomeInput,
) -> IvResult<ComputationOutput<ResidualIncomeOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    validate_periods("horizon_years", input.horizon_years)?;
    validate_discount_rate("cost_of_equity", input.cost_of_equity)?;

    if input.bv0 <= Decimal::ZERO {
        warnings.push(format!(
            "Opening book value ({}) is not positive; residual income is a capital charge on negative equity",
            input.bv0
        ));
    }
    if input.roe < input.cost_of_equity {
        warnings.push(format!(
            "ROE ({:.2}%) is below Ke ({:.2}%); value is below book",
            rate_to_pct(input.roe),
            rate_to_pct(input.cost_of_equity)
        ));
    }

    let ke = input.cost_of_equity;
    let mut book_value = input.bv0;
    let mut compounding = Decimal::ONE;
    let mut pv_residual_income = Decimal::ZERO;
    let mut year_by_year = Vec::with_capacity(input.horizon_years as usize);

    for year in 1..=input.horizon_years {
        let earnings = checked_mul("roe", input.roe, book_value)?;
        let dividends = checked_mul("payout", earnings, input.payout)?;
        let capital_charge = checked_mul("cost_of_equity", ke, book_value)?;
        let residual_income = checked_sub("roe", earnings, capital_charge)?;

        compounding = grow("cost_of_equity", compounding, ke)?;
        let pv = checked_div("cost_of_equity", residual_income, compounding)?;
        pv_residual_income = checked_add("horizon_years", pv_residual_income, pv)?;

        // Clean surplus: BV_{t+1} = BV_t + earnings - dividends
        let retained = checked_sub("payout", earnings, dividends)?;
        let closing_book_value = checked_add("horizon_years", book_value, retained)?;

        year_by_year.push(ResidualIncomeYear {
            year,
            opening_book_value: book_value,
            earnings,
            dividends,
            residual_income,
            pv_residual_income: pv,
            closing_book_value,
        });
        book_value = closing_book_value;
    }

    let intrinsic_value = checked_add("bv0", input.bv0, pv_residual_income)?;
    tracing::debug!(%intrinsic_value, horizon = input.horizon_years, "residual income valued");

    let methodology = format!(
        "Residual Income: BV0={}, ROE={:.2}%, payout={:.2}%, horizon={}",
        input.bv0,
        rate_to_pct(input.roe),
        rate_to_pct(input.payout),
        input.horizon_years
    );

    let output = ResidualIncomeOutput {
        intrinsic_value,
        opening_book_value: input.bv0,
        pv_residual_income,
        year_by_year,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(&methodology, input, warnings, elapsed, output))
}
