pub mod error;
pub mod growth;
pub mod rates;
pub mod time_value;
pub mod types;

#[cfg(feature = "financials")]
pub mod financials;

#[cfg(feature = "fcff")]
pub mod fcff;

#[cfg(all(feature = "financials", feature = "fcff"))]
pub mod orchestrator;

#[cfg(feature = "history")]
pub mod history;

pub use error::ValuationError;
pub use types::*;

/// Standard result type for all intrinsic value computations
pub type IvResult<T> = Result<T, ValuationError>;
