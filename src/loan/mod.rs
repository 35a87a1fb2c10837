//! Loan terms as observed by the borrower

mod loader;

pub use loader::{load_terms, load_terms_from_reader, LoanRecord};

use serde::{Deserialize, Serialize};

use crate::balance::AmortizationScheme;
use crate::error::{LoanError, LoanResult};

/// How far into the schedule the loan is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodProgress {
    /// Installments already paid
    Elapsed(u32),
    /// Installments still to pay
    Remaining(u32),
}

impl PeriodProgress {
    fn count(&self) -> u32 {
        match self {
            PeriodProgress::Elapsed(k) | PeriodProgress::Remaining(k) => *k,
        }
    }
}

/// The four scalar inputs of an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Installment per period (the first installment under SAC)
    pub installment: f64,

    /// Total number of installments
    pub total_periods: u32,

    pub progress: PeriodProgress,

    pub scheme: AmortizationScheme,
}

impl LoanTerms {
    pub fn new(
        installment: f64,
        total_periods: u32,
        progress: PeriodProgress,
        scheme: AmortizationScheme,
    ) -> Self {
        Self { installment, total_periods, progress, scheme }
    }

    /// Price loan described by installments already paid
    pub fn price_elapsed(installment: f64, total_periods: u32, elapsed: u32) -> Self {
        Self::new(installment, total_periods, PeriodProgress::Elapsed(elapsed), AmortizationScheme::Price)
    }

    /// Price loan described by installments still due
    pub fn price_remaining(installment: f64, total_periods: u32, remaining: u32) -> Self {
        Self::new(installment, total_periods, PeriodProgress::Remaining(remaining), AmortizationScheme::Price)
    }

    /// Check the terms before any numeric work
    pub fn validate(&self) -> LoanResult<()> {
        if !self.installment.is_finite() || self.installment <= 0.0 {
            return Err(LoanError::invalid_input(
                "installment",
                format!("must be a positive amount, got {}", self.installment),
            ));
        }

        if self.total_periods == 0 {
            return Err(LoanError::invalid_input("total_periods", "must be at least 1"));
        }

        let count = self.progress.count();
        if count > self.total_periods {
            let field = match self.progress {
                PeriodProgress::Elapsed(_) => "elapsed_periods",
                PeriodProgress::Remaining(_) => "remaining_periods",
            };
            return Err(LoanError::invalid_input(
                field,
                format!("{} exceeds the total of {} periods", count, self.total_periods),
            ));
        }

        Ok(())
    }

    /// Installments already paid
    pub fn elapsed_periods(&self) -> u32 {
        match self.progress {
            PeriodProgress::Elapsed(k) => k,
            PeriodProgress::Remaining(k) => self.total_periods.saturating_sub(k),
        }
    }

    /// Installments still to pay
    pub fn remaining_periods(&self) -> u32 {
        match self.progress {
            PeriodProgress::Elapsed(k) => self.total_periods.saturating_sub(k),
            PeriodProgress::Remaining(k) => k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_conversions() {
        let terms = LoanTerms::price_elapsed(1000.0, 60, 12);
        assert_eq!(terms.elapsed_periods(), 12);
        assert_eq!(terms.remaining_periods(), 48);

        let terms = LoanTerms::price_remaining(1000.0, 60, 48);
        assert_eq!(terms.elapsed_periods(), 12);
        assert_eq!(terms.remaining_periods(), 48);
    }

    #[test]
    fn test_validation_accepts_boundaries() {
        assert!(LoanTerms::price_elapsed(1.0, 1, 0).validate().is_ok());
        assert!(LoanTerms::price_elapsed(1.0, 24, 24).validate().is_ok());
        assert!(LoanTerms::price_remaining(1.0, 24, 0).validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_terms() {
        let cases = [
            (LoanTerms::price_elapsed(0.0, 24, 1), "installment"),
            (LoanTerms::price_elapsed(-10.0, 24, 1), "installment"),
            (LoanTerms::price_elapsed(f64::NAN, 24, 1), "installment"),
            (LoanTerms::price_elapsed(100.0, 0, 0), "total_periods"),
            (LoanTerms::price_elapsed(100.0, 24, 25), "elapsed_periods"),
            (LoanTerms::price_remaining(100.0, 24, 30), "remaining_periods"),
        ];

        for (terms, expected_field) in cases {
            match terms.validate() {
                Err(LoanError::InvalidInput { field, .. }) => assert_eq!(field, expected_field),
                other => panic!("expected InvalidInput for {:?}, got {:?}", terms, other),
            }
        }
    }

    #[test]
    fn test_terms_json() {
        let json = r#"{"installment":500.0,"total_periods":24,"progress":{"remaining":12},"scheme":"SAC"}"#;
        let terms: LoanTerms = serde_json::from_str(json).unwrap();
        assert_eq!(terms.progress, PeriodProgress::Remaining(12));
        assert_eq!(terms.scheme, AmortizationScheme::Sac);
    }
}
