//! Loan evaluation engine
//!
//! One engine serves both amortization schemes:
//! 1. Validate the terms
//! 2. Estimate the principal (present value at the assumed market rate, or a
//!    principal supplied by the caller)
//! 3. Solve the implicit rate against that principal with Newton-Raphson
//! 4. Derive the balance, payoff amount and optionally the trajectory
//!
//! Every evaluation is a pure function of its inputs; nothing is cached.

mod config;

pub use config::{EngineConfig, DEFAULT_ASSUMED_MARKET_RATE};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::annuity::{annualized_rate, present_value};
use crate::balance::{
    balance_trajectory, outstanding_balance, sac_installment, AmortizationScheme, BalanceTrajectory,
    SacPrincipal,
};
use crate::error::{ensure_finite, LoanError, LoanResult};
use crate::loan::LoanTerms;
use crate::solver::{RateSolution, RateSolver};

/// Implicit rate found for a loan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolvedRate {
    /// Rate per period (monthly)
    pub periodic_rate: f64,

    /// `(1 + periodic_rate)^12 - 1`
    pub annualized_rate: f64,

    /// Newton iterations used
    pub iterations: u32,

    /// Step fell below the solver tolerance
    pub converged: bool,
}

impl SolvedRate {
    fn from_solution(solution: &RateSolution) -> LoanResult<Self> {
        Ok(Self {
            periodic_rate: solution.rate,
            annualized_rate: ensure_finite(annualized_rate(solution.rate), "annualized rate")?,
            iterations: solution.iterations,
            converged: solution.converged,
        })
    }
}

/// Result of evaluating one loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanEvaluation {
    pub terms: LoanTerms,

    pub rate: SolvedRate,

    /// Principal at disbursement implied by the installment and rate
    pub principal_estimate: f64,

    /// Balance after the installments already paid
    pub current_balance: f64,

    /// Amount that settles the loan today
    pub payoff_amount: f64,

    /// Installment due next (zero once the loan is paid off)
    pub next_installment: f64,

    pub elapsed_periods: u32,

    pub remaining_periods: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trajectory: Option<BalanceTrajectory>,
}

/// Headline figures with rates in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub monthly_rate_pct: f64,
    pub annual_rate_pct: f64,
    pub principal_estimate: f64,
    pub current_balance: f64,
    pub payoff_amount: f64,
}

impl LoanEvaluation {
    pub fn summary(&self) -> EvaluationSummary {
        EvaluationSummary {
            monthly_rate_pct: self.rate.periodic_rate * 100.0,
            annual_rate_pct: self.rate.annualized_rate * 100.0,
            principal_estimate: self.principal_estimate,
            current_balance: self.current_balance,
            payoff_amount: self.payoff_amount,
        }
    }

    /// Principal already repaid
    pub fn amortized_to_date(&self) -> f64 {
        self.principal_estimate - self.current_balance
    }
}

/// Evaluates loans under a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct LoanEngine {
    config: EngineConfig,
    solver: RateSolver,
}

impl LoanEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            solver: RateSolver::new(config.solver),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate a loan whose original principal is unknown
    ///
    /// The principal is estimated at the assumed market rate and the exact
    /// rate is then re-solved against that estimate.
    pub fn evaluate(&self, terms: &LoanTerms) -> LoanResult<LoanEvaluation> {
        terms.validate()?;

        let estimate = ensure_finite(
            present_value(terms.installment, self.config.assumed_market_rate, terms.total_periods),
            "principal estimate",
        )?;
        debug!(
            "principal estimate {:.2} at assumed rate {:.4}",
            estimate, self.config.assumed_market_rate
        );

        self.evaluate_against(terms, estimate)
    }

    /// Evaluate a loan whose original principal is known
    pub fn evaluate_with_principal(&self, terms: &LoanTerms, principal: f64) -> LoanResult<LoanEvaluation> {
        terms.validate()?;
        if !principal.is_finite() || principal <= 0.0 {
            return Err(LoanError::invalid_input(
                "principal",
                format!("must be a positive amount, got {}", principal),
            ));
        }

        self.evaluate_against(terms, principal)
    }

    fn evaluate_against(&self, terms: &LoanTerms, target_pv: f64) -> LoanResult<LoanEvaluation> {
        let periods = terms.total_periods;
        let elapsed = terms.elapsed_periods();
        let remaining = terms.remaining_periods();

        let solution = self.solver.solve(terms.installment, target_pv, periods)?;
        let rate = solution.into_converged()?;
        let solved = SolvedRate::from_solution(&solution)?;

        let (principal, level_amount, next_installment) = match terms.scheme {
            AmortizationScheme::Price => {
                let next = if remaining > 0 { terms.installment } else { 0.0 };
                (target_pv, terms.installment, next)
            }
            AmortizationScheme::Sac => {
                let sac = SacPrincipal::back_solve(
                    terms.installment,
                    rate,
                    periods,
                    self.config.sac_refinement_steps,
                )?;
                let next = sac_installment(sac.amortization, rate, periods, elapsed + 1);
                (sac.principal, sac.amortization, next)
            }
        };

        let current_balance = outstanding_balance(level_amount, rate, remaining, terms.scheme)?;

        let trajectory = if self.config.include_trajectory {
            Some(balance_trajectory(
                terms.installment,
                rate,
                principal,
                terms.scheme,
                elapsed,
                periods,
            )?)
        } else {
            None
        };

        debug!(
            "{} loan: rate {:.6}, balance {:.2} with {} of {} periods remaining",
            terms.scheme, rate, current_balance, remaining, periods
        );

        Ok(LoanEvaluation {
            terms: *terms,
            rate: solved,
            principal_estimate: principal,
            current_balance,
            payoff_amount: current_balance,
            next_installment: ensure_finite(next_installment, "next installment")?,
            elapsed_periods: elapsed,
            remaining_periods: remaining,
            trajectory,
        })
    }

    /// Balance trajectory for an already evaluated loan
    pub fn trajectory_for(&self, evaluation: &LoanEvaluation) -> LoanResult<BalanceTrajectory> {
        balance_trajectory(
            evaluation.terms.installment,
            evaluation.rate.periodic_rate,
            evaluation.principal_estimate,
            evaluation.terms.scheme,
            evaluation.elapsed_periods,
            evaluation.terms.total_periods,
        )
    }
}

/// Evaluate with the default configuration
pub fn evaluate(terms: &LoanTerms) -> LoanResult<LoanEvaluation> {
    LoanEngine::default().evaluate(terms)
}
