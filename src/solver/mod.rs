//! Implicit rate solver
//!
//! Inverts the annuity present-value equation for the periodic rate using
//! Newton-Raphson with the closed-form derivative.

mod newton;

pub use newton::{solve_rate, RateSolution, RateSolver};

use serde::{Deserialize, Serialize};

/// Starting rate: 1% per period
pub const DEFAULT_INITIAL_GUESS: f64 = 0.01;

/// Iteration budget before giving up
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Stop once successive rates differ by less than this
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Newton-Raphson settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_initial_guess")]
    pub initial_guess: f64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_initial_guess() -> f64 { DEFAULT_INITIAL_GUESS }
fn default_max_iterations() -> u32 { DEFAULT_MAX_ITERATIONS }
fn default_tolerance() -> f64 { DEFAULT_TOLERANCE }

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            initial_guess: DEFAULT_INITIAL_GUESS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}
