use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValuationError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error(
        "Invalid growth assumption in {model}: discount rate ({discount_rate}) must exceed growth rate ({growth_rate})"
    )]
    InvalidGrowthAssumption {
        model: String,
        discount_rate: Decimal,
        growth_rate: Decimal,
    },

    #[error(
        "Invalid capital structure: equity value ({equity_value}) plus debt value ({debt_value}) is zero; enter WACC directly or supply non-zero market values"
    )]
    InvalidCapitalStructure {
        equity_value: Decimal,
        debt_value: Decimal,
    },

    #[error("Invalid share count: shares outstanding must be positive, got {shares}")]
    InvalidShareCount { shares: Decimal },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("History log error: {0}")]
    HistoryError(String),
}

impl From<serde_json::Error> for ValuationError {
    fn from(e: serde_json::Error) -> Self {
        ValuationError::SerializationError(e.to_string())
    }
}

impl From<std::io::Error> for ValuationError {
    fn from(e: std::io::Error) -> Self {
        ValuationError::HistoryError(e.to_string())
    }
}

#[cfg(feature = "history")]
impl From<csv::Error> for ValuationError {
    fn from(e: csv::Error) -> Self {
        ValuationError::HistoryError(e.to_string())
    }
}
