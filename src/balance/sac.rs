//! SAC principal back-solve
//!
//! Under SAC only the first installment is observable up front, and it mixes
//! the amortization quota with interest on the full principal:
//! `first = PV / n + PV * rate`. The principal is recovered by a fixed number
//! of rescaling steps starting from the Price present value. The step count is
//! fixed rather than tolerance-driven, so the result is an approximation of the
//! exact inverse.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::annuity::present_value;
use crate::error::{ensure_finite, LoanError, LoanResult};

/// Rescaling steps applied by default
pub const DEFAULT_SAC_REFINEMENT_STEPS: u32 = 5;

/// Principal and amortization quota implied by a first SAC installment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SacPrincipal {
    /// Estimated principal at disbursement
    pub principal: f64,

    /// Constant amortization per period (`principal / periods`)
    pub amortization: f64,

    /// First installment reproduced by the estimate
    pub first_installment: f64,

    /// Rescaling steps applied
    pub steps: u32,
}

impl SacPrincipal {
    /// Back-solve the principal whose first SAC installment at `rate` over
    /// `periods` equals `first_installment`.
    pub fn back_solve(
        first_installment: f64,
        rate: f64,
        periods: u32,
        steps: u32,
    ) -> LoanResult<Self> {
        if periods == 0 {
            return Err(LoanError::invalid_input("total_periods", "must be at least 1"));
        }
        let n = periods as f64;

        let mut principal = ensure_finite(
            present_value(first_installment, rate, periods),
            "SAC initial principal",
        )?;

        for step in 1..=steps {
            let computed_first = principal / n + principal * rate;
            principal = ensure_finite(
                principal * first_installment / computed_first,
                "SAC principal refinement",
            )?;
            debug!("SAC refinement step {}: principal {:.4}", step, principal);
        }

        let amortization = principal / n;
        Ok(Self {
            principal,
            amortization,
            first_installment: amortization + principal * rate,
            steps,
        })
    }

    /// Balance once `elapsed` installments have been paid
    pub fn balance_after(&self, elapsed: u32) -> f64 {
        self.principal - elapsed as f64 * self.amortization
    }
}

/// SAC installment due in `period` (1-based): the quota plus interest on the
/// balance carried into that period
pub fn sac_installment(amortization: f64, rate: f64, periods: u32, period: u32) -> f64 {
    if period == 0 || period > periods {
        return 0.0;
    }
    let balance_before = amortization * (periods - period + 1) as f64;
    amortization + rate * balance_before
}
