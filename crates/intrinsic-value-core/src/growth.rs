use rust_decimal::Decimal;

use crate::time_value::{checked_mul, checked_sub};
use crate::types::Rate;
use crate::IvResult;

/// Share of earnings kept in the business: `1 - payout`.
pub fn retention_ratio(payout: Rate) -> IvResult<Rate> {
    checked_sub("payout", Decimal::ONE, payout)
}

/// Sustainable growth: g = ROE * (1 - payout).
///
/// No bounds checks. A payout above 1 gives negative retention and hence
/// negative growth, which is unusual but valid.
pub fn sustainable_growth(roe: Rate, payout: Rate) -> IvResult<Rate> {
    checked_mul("roe", roe, retention_ratio(payout)?)
}

/// Operating analogue for non-financial firms: g = ROCE * reinvestment rate.
pub fn operating_growth(roce: Rate, reinvestment_rate: Rate) -> IvResult<Rate> {
    checked_mul("reinvestment_rate_pct", roce, reinvestment_rate)
}
