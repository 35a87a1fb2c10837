//! Newton-Raphson iteration on the annuity equation

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::SolverConfig;
use crate::annuity::{present_value, present_value_derivative};
use crate::error::{ensure_finite, LoanError, LoanResult};

/// Outcome of a solver run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSolution {
    /// Periodic rate after the last update
    pub rate: f64,

    /// Newton updates performed
    pub iterations: u32,

    /// False when the budget ran out before the step fell under tolerance
    pub converged: bool,

    /// Size of the last update (infinite if no update was made)
    pub last_step: f64,
}

impl RateSolution {
    /// Accept only converged solutions
    pub fn into_converged(self) -> LoanResult<f64> {
        if self.converged {
            Ok(self.rate)
        } else {
            Err(LoanError::NonConvergence {
                iterations: self.iterations,
                last_step: self.last_step,
            })
        }
    }
}

/// Finds the periodic rate at which `periods` payments of `installment` are
/// worth `target_pv`
#[derive(Debug, Clone, Default)]
pub struct RateSolver {
    config: SolverConfig,
}

impl RateSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run the iteration.
    ///
    /// A zero derivative is a `NonConvergence` error and any non-finite
    /// intermediate is `NumericOverflow`. Running out of iterations is not an
    /// error here: the last rate comes back with `converged == false`.
    /// The resulting rate is not bounded.
    pub fn solve(&self, installment: f64, target_pv: f64, periods: u32) -> LoanResult<RateSolution> {
        let mut rate = self.config.initial_guess;
        let mut last_step = f64::INFINITY;

        for iteration in 1..=self.config.max_iterations {
            let pv = ensure_finite(present_value(installment, rate, periods), "present value")?;
            let derivative = present_value_derivative(installment, rate, periods);

            if derivative == 0.0 {
                warn!(
                    "zero derivative at rate {:.6e} after {} iterations (installment {}, periods {})",
                    rate, iteration, installment, periods
                );
                return Err(LoanError::NonConvergence { iterations: iteration, last_step });
            }
            let derivative = ensure_finite(derivative, "present value derivative")?;

            let next_rate = ensure_finite(rate - (pv - target_pv) / derivative, "Newton step")?;
            last_step = (next_rate - rate).abs();

            if last_step < self.config.tolerance {
                debug!("rate {:.8} converged in {} iterations", next_rate, iteration);
                return Ok(RateSolution {
                    rate: next_rate,
                    iterations: iteration,
                    converged: true,
                    last_step,
                });
            }

            rate = next_rate;
        }

        warn!(
            "rate solver exhausted {} iterations, last rate {:.8}, last step {:.3e}",
            self.config.max_iterations, rate, last_step
        );
        Ok(RateSolution {
            rate,
            iterations: self.config.max_iterations,
            converged: false,
            last_step,
        })
    }
}

/// Solve for the periodic rate with default settings
///
/// Unlike [`RateSolver::solve`], an exhausted budget is reported as
/// `NonConvergence`.
pub fn solve_rate(installment: f64, target_pv: f64, periods: u32) -> LoanResult<f64> {
    RateSolver::default()
        .solve(installment, target_pv, periods)?
        .into_converged()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_recovers_rate_round_trip() {
        for rate in [0.0005, 0.001, 0.01, 0.02, 0.035, 0.049] {
            for periods in [1, 2, 12, 60, 360] {
                let pv = present_value(1000.0, rate, periods);
                let solved = solve_rate(1000.0, pv, periods).unwrap();
                assert_abs_diff_eq!(solved, rate, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_payroll_loan_scenario() {
        // 24 installments of 500 at 1.5% are worth about 10,015.20
        let target = present_value(500.0, 0.015, 24);
        assert_abs_diff_eq!(target, 10015.20, epsilon = 0.01);

        let solution = RateSolver::default().solve(500.0, target, 24).unwrap();
        assert!(solution.converged);
        assert!(solution.iterations <= 10);
        assert_abs_diff_eq!(solution.rate, 0.015, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_interest_loan() {
        let rate = solve_rate(100.0, 1200.0, 12).unwrap();
        assert_abs_diff_eq!(rate, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_negative_rate_is_not_rejected() {
        // Paying back less than was lent implies a negative rate
        let rate = solve_rate(100.0, 1300.0, 12).unwrap();
        assert!(rate < 0.0);
        assert_abs_diff_eq!(present_value(100.0, rate, 12), 1300.0, epsilon = 1e-3);
    }

    #[test]
    fn test_zero_installment_has_zero_derivative() {
        let err = solve_rate(0.0, 1000.0, 12).unwrap_err();
        assert!(matches!(err, LoanError::NonConvergence { iterations: 1, .. }));
    }

    #[test]
    fn test_negative_installment_does_not_converge() {
        let target = present_value(500.0, 0.015, 24);
        let err = solve_rate(-500.0, target, 24).unwrap_err();
        assert!(matches!(err, LoanError::NonConvergence { .. }));
    }

    #[test]
    fn test_exhausted_budget_is_observable() {
        let target = present_value(500.0, 0.015, 24);
        let solver = RateSolver::new(SolverConfig {
            max_iterations: 1,
            ..SolverConfig::default()
        });

        let solution = solver.solve(500.0, target, 24).unwrap();
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 1);
        assert!(solution.last_step > 1e-6);

        let err = solution.into_converged().unwrap_err();
        assert!(matches!(err, LoanError::NonConvergence { iterations: 1, .. }));
    }

    #[test]
    fn test_zero_budget_returns_initial_guess() {
        let solver = RateSolver::new(SolverConfig {
            max_iterations: 0,
            ..SolverConfig::default()
        });
        let solution = solver.solve(500.0, 10_000.0, 24).unwrap();
        assert_eq!(solution.rate, solver.config().initial_guess);
        assert!(!solution.converged);
    }

    #[test]
    fn test_overflow_is_detected() {
        // Starting at -100% makes (1 + rate)^-n infinite
        let solver = RateSolver::new(SolverConfig {
            initial_guess: -1.0,
            ..SolverConfig::default()
        });
        let err = solver.solve(500.0, 10_000.0, 24).unwrap_err();
        assert!(matches!(err, LoanError::NumericOverflow { .. }));
    }
}
