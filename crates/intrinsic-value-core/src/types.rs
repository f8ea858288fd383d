use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::time_value::checked_mul;
use crate::IvResult;

/// All monetary values, including per-share amounts.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Rates as the analyst enters them (5 = 5%). Divide by 100 before use.
pub type Percent = Decimal;

/// Lower edge of the margin-of-safety band, as a multiple of intrinsic value.
pub const MARGIN_OF_SAFETY_LOW: Decimal = dec!(0.8);

/// Upper edge of the margin-of-safety band, as a multiple of intrinsic value.
pub const MARGIN_OF_SAFETY_HIGH: Decimal = dec!(1.2);

/// Financial companies are valued on dividends or book value; everything
/// else on free cash flow to the firm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyType {
    Financial,
    NonFinancial,
}

impl CompanyType {
    pub fn label(&self) -> &'static str {
        match self {
            CompanyType::Financial => "Financials",
            CompanyType::NonFinancial => "Non-Financials",
        }
    }
}

/// The valuation model that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    GordonGrowth,
    RoeBased,
    TwoStage,
    ResidualIncome,
    Fcff,
}

impl ModelKind {
    pub fn company_type(&self) -> CompanyType {
        match self {
            ModelKind::Fcff => CompanyType::NonFinancial,
            _ => CompanyType::Financial,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::GordonGrowth => "Gordon Growth DDM",
            ModelKind::RoeBased => "ROE-based DDM",
            ModelKind::TwoStage => "Two-stage DDM",
            ModelKind::ResidualIncome => "Residual Income",
            ModelKind::Fcff => "FCFF DCF",
        }
    }

    /// Label used in the history log, e.g. "Financials - Gordon Growth DDM".
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.company_type().label(), self.label())
    }
}

/// A single labelled intermediate quantity in a valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub label: String,
    pub value: Decimal,
}

impl TraceEntry {
    pub fn new(label: impl Into<String>, value: Decimal) -> Self {
        TraceEntry {
            label: label.into(),
            value,
        }
    }
}

/// Fixed +/-20% band around intrinsic value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginOfSafety {
    pub low: Money,
    pub high: Money,
}

/// `[IV * 0.8, IV * 1.2]`. For a negative IV `low` ends up above `high`;
/// the band is not reordered.
pub fn margin_of_safety(intrinsic_value: Money) -> IvResult<MarginOfSafety> {
    Ok(MarginOfSafety {
        low: checked_mul("intrinsic_value", intrinsic_value, MARGIN_OF_SAFETY_LOW)?,
        high: checked_mul("intrinsic_value", intrinsic_value, MARGIN_OF_SAFETY_HIGH)?,
    })
}

/// Implemented by every model output so the orchestrator can wrap it.
pub trait ModelOutput {
    fn intrinsic_value(&self) -> Money;

    /// Intermediate quantities in the order an analyst would check them.
    fn trace(&self) -> Vec<TraceEntry>;
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

impl ComputationMetadata {
    pub fn new(elapsed_us: u64) -> Self {
        ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        }
    }
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata::new(elapsed_us),
    }
}

/// The record handed back to the caller for one valuation request.
///
/// Built once, never updated. The caller displays it and may append it to
/// the history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationResult {
    pub company: String,
    pub model: ModelKind,
    pub model_name: String,
    pub intrinsic_value_per_share: Money,
    pub margin_of_safety_low: Money,
    pub margin_of_safety_high: Money,
    pub methodology: String,
    pub trace: Vec<TraceEntry>,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

impl ValuationResult {
    /// Wrap a model's computation output. `leading_trace` goes ahead of the
    /// model's own trace (e.g. the derived discount rates).
    pub fn from_output<T: ModelOutput + Serialize>(
        company: &str,
        model: ModelKind,
        leading_trace: Vec<TraceEntry>,
        mut leading_warnings: Vec<String>,
        output: ComputationOutput<T>,
    ) -> IvResult<Self> {
        let intrinsic_value = output.result.intrinsic_value();
        let band = margin_of_safety(intrinsic_value)?;

        let mut trace = leading_trace;
        trace.extend(output.result.trace());
        leading_warnings.extend(output.warnings);

        Ok(ValuationResult {
            company: company.to_string(),
            model,
            model_name: model.display_name(),
            intrinsic_value_per_share: intrinsic_value,
            margin_of_safety_low: band.low,
            margin_of_safety_high: band.high,
            methodology: output.methodology,
            trace,
            warnings: leading_warnings,
            metadata: output.metadata,
        })
    }

    /// Look up a trace value by its label.
    pub fn trace_value(&self, label: &str) -> Option<Decimal> {
        self.trace
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.value)
    }
}

/// Round to the 4 decimal places used wherever values are shown or logged.
pub fn format_iv(value: Money) -> Money {
    let mut rounded = value.round_dp(4);
    rounded.rescale(4);
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_of_safety_positive() {
        let band = margin_of_safety(dec!(100)).unwrap();
        assert_eq!(band.low, dec!(80));
        assert_eq!(band.high, dec!(120));
    }

    #[test]
    fn test_margin_of_safety_negative_not_reordered() {
        let band = margin_of_safety(dec!(-50)).unwrap();
        assert_eq!(band.low, dec!(-40));
        assert_eq!(band.high, dec!(-60));
    }

    #[test]
    fn test_margin_of_safety_out_of_range_is_an_error() {
        assert!(margin_of_safety(Decimal::MAX).is_err());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            ModelKind::GordonGrowth.display_name(),
            "Financials - Gordon Growth DDM"
        );
        assert_eq!(ModelKind::Fcff.display_name(), "Non-Financials - FCFF DCF");
    }

    #[test]
    fn test_format_iv_pads_to_four_places() {
        assert_eq!(format_iv(dec!(100)).to_string(), "100.0000");
        assert_eq!(format_iv(dec!(142.857142857)).to_string(), "142.8571");
    }
}
