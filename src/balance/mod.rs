//! Outstanding balance under the Price and SAC amortization systems
//!
//! Both systems reduce to "level amount times a remaining-term factor":
//! - **Price**: the level amount is the installment and the factor is the
//!   annuity factor over the remaining term, so the balance is itself an
//!   annuity at the same rate.
//! - **SAC**: the level amount is the amortization quota `PV / n` and the
//!   factor is the remaining period count, i.e. `PV - k * A`.

mod sac;
mod trajectory;

pub use sac::{sac_installment, SacPrincipal, DEFAULT_SAC_REFINEMENT_STEPS};
pub use trajectory::{
    amortization_schedule, balance_trajectory, AmortizationRow, BalancePoint, BalanceTrajectory,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::annuity::present_value;
use crate::error::{ensure_finite, LoanError, LoanResult};

/// Amortization convention of the loan
///
/// Deserializes through [`FromStr`], so JSON accepts the same case-insensitive
/// names as the CLI and CSV input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum AmortizationScheme {
    /// Constant installment (French/annuity system)
    Price,
    /// Constant amortization, declining installments
    #[serde(rename = "SAC")]
    Sac,
}

impl Default for AmortizationScheme {
    fn default() -> Self {
        AmortizationScheme::Price
    }
}

impl fmt::Display for AmortizationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmortizationScheme::Price => write!(f, "Price"),
            AmortizationScheme::Sac => write!(f, "SAC"),
        }
    }
}

impl FromStr for AmortizationScheme {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(AmortizationScheme::Price),
            "sac" => Ok(AmortizationScheme::Sac),
            other => Err(LoanError::invalid_input(
                "scheme",
                format!("unknown amortization scheme '{}' (expected Price or SAC)", other),
            )),
        }
    }
}

impl TryFrom<String> for AmortizationScheme {
    type Error = LoanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Balance still owed with `remaining_periods` payments to go
///
/// `level_amount` is the installment under Price and the amortization quota
/// under SAC. Zero remaining periods always yields a zero balance.
pub fn outstanding_balance(
    level_amount: f64,
    rate: f64,
    remaining_periods: u32,
    scheme: AmortizationScheme,
) -> LoanResult<f64> {
    if !level_amount.is_finite() {
        return Err(LoanError::invalid_input("level_amount", "must be finite"));
    }

    let balance = match scheme {
        AmortizationScheme::Price => present_value(level_amount, rate, remaining_periods),
        AmortizationScheme::Sac => level_amount * remaining_periods as f64,
    };

    ensure_finite(balance, "outstanding balance")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_remaining_is_zero_for_both_schemes() {
        for scheme in [AmortizationScheme::Price, AmortizationScheme::Sac] {
            assert_eq!(outstanding_balance(1000.0, 0.02, 0, scheme).unwrap(), 0.0);
            assert_eq!(outstanding_balance(1000.0, 0.0, 0, scheme).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_price_balance_at_full_term_is_present_value() {
        let balance = outstanding_balance(750.0, 0.018, 36, AmortizationScheme::Price).unwrap();
        assert_eq!(balance, present_value(750.0, 0.018, 36));
    }

    #[test]
    fn test_price_balance_falls_as_payments_are_made() {
        let mut previous = f64::INFINITY;
        for remaining in (0..=60).rev() {
            let balance = outstanding_balance(1000.0, 0.015, remaining, AmortizationScheme::Price).unwrap();
            assert!(balance < previous, "balance at {} remaining should drop", remaining);
            previous = balance;
        }
    }

    #[test]
    fn test_sac_balance_is_quota_times_remaining() {
        // 12,000 over 24 periods amortizes 500 per period
        let balance = outstanding_balance(500.0, 0.02, 10, AmortizationScheme::Sac).unwrap();
        assert_relative_eq!(balance, 5000.0);
    }

    #[test]
    fn test_non_finite_inputs() {
        assert!(outstanding_balance(f64::NAN, 0.01, 12, AmortizationScheme::Price)
            .unwrap_err()
            .is_input_error());
        let err = outstanding_balance(100.0, -1.0, 12, AmortizationScheme::Price).unwrap_err();
        assert!(matches!(err, LoanError::NumericOverflow { .. }));
    }

    #[test]
    fn test_scheme_parsing() {
        assert_eq!("price".parse::<AmortizationScheme>().unwrap(), AmortizationScheme::Price);
        assert_eq!(" SAC ".parse::<AmortizationScheme>().unwrap(), AmortizationScheme::Sac);
        assert!("german".parse::<AmortizationScheme>().is_err());
        assert_eq!(AmortizationScheme::Sac.to_string(), "SAC");
        assert_eq!(serde_json::to_string(&AmortizationScheme::Sac).unwrap(), "\"SAC\"");
        assert_eq!(
            serde_json::from_str::<AmortizationScheme>("\"sac\"").unwrap(),
            AmortizationScheme::Sac
        );
    }

    #[test]
    fn test_scheme_json_matches_cli_spellings() {
        for name in ["\"Price\"", "\"price\"", "\"PRICE\""] {
            assert_eq!(serde_json::from_str::<AmortizationScheme>(name).unwrap(), AmortizationScheme::Price);
        }
        for name in ["\"SAC\"", "\"Sac\"", "\" sac \""] {
            assert_eq!(serde_json::from_str::<AmortizationScheme>(name).unwrap(), AmortizationScheme::Sac);
        }
        assert!(serde_json::from_str::<AmortizationScheme>("\"german\"").is_err());

        // Serialized names still parse back
        let json = serde_json::to_string(&AmortizationScheme::Price).unwrap();
        assert_eq!(serde_json::from_str::<AmortizationScheme>(&json).unwrap(), AmortizationScheme::Price);
    }
}
