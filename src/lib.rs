//! Installment Rate - implicit rate and balance engine for installment loans
//!
//! This library provides:
//! - Ordinary annuity present value and its rate derivative
//! - Newton-Raphson solver for the implicit periodic rate
//! - Outstanding balance under Price (constant installment) and SAC
//!   (constant amortization)
//! - Balance trajectories and amortization tables
//! - Single-loan engine and parallel batch evaluation

pub mod error;
pub mod annuity;
pub mod solver;
pub mod balance;
pub mod loan;
pub mod engine;
pub mod batch;

// Re-export commonly used types
pub use error::{LoanError, LoanResult};
pub use annuity::present_value;
pub use solver::{solve_rate, RateSolution, RateSolver, SolverConfig};
pub use balance::{
    amortization_schedule, balance_trajectory, outstanding_balance, AmortizationScheme, BalanceTrajectory,
};
pub use loan::{LoanTerms, PeriodProgress};
pub use engine::{EngineConfig, LoanEngine, LoanEvaluation, SolvedRate};
pub use batch::BatchRunner;
