use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::time_value::{checked_add, checked_mul, pct_to_rate};
use crate::types::{Percent, Rate};
use crate::IvResult;

/// How the analyst supplies the cost of equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CostOfEquityInput {
    /// Ke entered directly, in percent.
    Direct { ke_pct: Percent },
    /// CAPM build-up from the risk-free rate, beta and equity risk premium,
    /// all rates in percent.
    Capm {
        rf_pct: Percent,
        beta: Decimal,
        erp_pct: Percent,
    },
}

impl CostOfEquityInput {
    /// Cost of equity as a decimal rate.
    pub fn rate(&self) -> IvResult<Rate> {
        Ok(pct_to_rate(cost_of_equity(self)?))
    }
}

/// Cost of equity in percent.
///
/// Direct entry is returned unchanged. CAPM: Ke = Rf + Beta * ERP, computed
/// in percentage points (ERP of 6 means 6%).
pub fn cost_of_equity(input: &CostOfEquityInput) -> IvResult<Percent> {
    match input {
        CostOfEquityInput::Direct { ke_pct } => Ok(*ke_pct),
        CostOfEquityInput::Capm {
            rf_pct,
            beta,
            erp_pct,
        } => checked_add("rf_pct", *rf_pct, checked_mul("beta", *beta, *erp_pct)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direct_passthrough() {
        let input = CostOfEquityInput::Direct { ke_pct: dec!(12) };
        assert_eq!(cost_of_equity(&input).unwrap(), dec!(12));
        assert_eq!(input.rate().unwrap(), dec!(0.12));
    }

    #[test]
    fn test_capm_percentage_points() {
        // 7 + 1.0 * 6 = 13%
        let input = CostOfEquityInput::Capm {
            rf_pct: dec!(7),
            beta: dec!(1.0),
            erp_pct: dec!(6),
        };
        assert_eq!(cost_of_equity(&input).unwrap(), dec!(13));
        assert_eq!(input.rate().unwrap(), dec!(0.13));
    }

    #[test]
    fn test_capm_high_beta() {
        let input = CostOfEquityInput::Capm {
            rf_pct: dec!(4.2),
            beta: dec!(1.5),
            erp_pct: dec!(5.5),
        };
        assert_eq!(cost_of_equity(&input).unwrap(), dec!(12.45));
    }

    #[test]
    fn test_deserialize_tagged() {
        let input: CostOfEquityInput =
            serde_json::from_str(r#"{"mode":"capm","rf_pct":"7","beta":"1.2","erp_pct":"6"}"#)
                .unwrap();
        assert_eq!(cost_of_equity(&input).unwrap(), dec!(14.2));
    }

    #[test]
    fn test_capm_out_of_range_is_an_error() {
        let input = CostOfEquityInput::Capm {
            rf_pct: dec!(4),
            beta: Decimal::MAX,
            erp_pct: dec!(6),
        };
        assert!(cost_of_equity(&input).is_err());
    }
}
