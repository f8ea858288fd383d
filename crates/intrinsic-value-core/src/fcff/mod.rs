//! Free cash flow to the firm valuation for non-financial companies.

pub mod dcf;

pub use dcf::{calculate_fcff, FcffInput, FcffOutput, FcffYearProjection};
