//! Valuation models for financial companies (banks, insurers), where
//! dividends and book value are the natural value drivers.

pub mod gordon;
pub mod residual_income;
pub mod roe_ddm;
pub mod two_stage;

pub use gordon::{calculate_gordon_growth, GordonGrowthInput, GordonGrowthOutput};
pub use residual_income::{
    calculate_residual_income, ResidualIncomeInput, ResidualIncomeOutput, ResidualIncomeYear,
};
pub use roe_ddm::{calculate_roe_ddm, RoeDdmInput, RoeDdmOutput};
pub use two_stage::{calculate_two_stage, DividendYear, TwoStageInput, TwoStageOutput};
