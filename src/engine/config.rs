//! Engine configuration
//!
//! Defaults can be overridden from a JSON file and then from environment
//! variables:
//!   LOAN_ASSUMED_RATE, LOAN_INITIAL_GUESS, LOAN_MAX_ITERATIONS,
//!   LOAN_TOLERANCE, LOAN_SAC_STEPS, LOAN_ASSUMED_ANNUAL_RATE

use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error;
use std::path::Path;

use crate::annuity::periodic_rate_from_annual;
use crate::balance::DEFAULT_SAC_REFINEMENT_STEPS;
use crate::solver::SolverConfig;

/// Typical monthly rate for payroll-deductible loans (1.5%)
pub const DEFAULT_ASSUMED_MARKET_RATE: f64 = 0.015;

/// Configuration for a [`LoanEngine`](super::LoanEngine)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Monthly rate used to estimate the principal when it is not known
    #[serde(default = "default_assumed_market_rate")]
    pub assumed_market_rate: f64,

    #[serde(default)]
    pub solver: SolverConfig,

    /// Fixed number of SAC principal rescaling steps
    #[serde(default = "default_sac_steps")]
    pub sac_refinement_steps: u32,

    /// Attach the balance trajectory to every evaluation
    #[serde(default)]
    pub include_trajectory: bool,
}

fn default_assumed_market_rate() -> f64 { DEFAULT_ASSUMED_MARKET_RATE }
fn default_sac_steps() -> u32 { DEFAULT_SAC_REFINEMENT_STEPS }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            assumed_market_rate: DEFAULT_ASSUMED_MARKET_RATE,
            solver: SolverConfig::default(),
            sac_refinement_steps: DEFAULT_SAC_REFINEMENT_STEPS,
            include_trajectory: false,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Set the assumed market rate from an annual effective rate
    pub fn with_assumed_annual_rate(mut self, annual_rate: f64) -> Self {
        self.assumed_market_rate = periodic_rate_from_annual(annual_rate);
        self
    }

    /// Replace fields for which a parseable environment variable is set
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rate) = lookup("LOAN_ASSUMED_RATE").and_then(|s| s.parse().ok()) {
            self.assumed_market_rate = rate;
        }
        if let Some(annual) = lookup("LOAN_ASSUMED_ANNUAL_RATE").and_then(|s| s.parse().ok()) {
            self = self.with_assumed_annual_rate(annual);
        }
        if let Some(guess) = lookup("LOAN_INITIAL_GUESS").and_then(|s| s.parse().ok()) {
            self.solver.initial_guess = guess;
        }
        if let Some(max) = lookup("LOAN_MAX_ITERATIONS").and_then(|s| s.parse().ok()) {
            self.solver.max_iterations = max;
        }
        if let Some(tolerance) = lookup("LOAN_TOLERANCE").and_then(|s| s.parse().ok()) {
            self.solver.tolerance = tolerance;
        }
        if let Some(steps) = lookup("LOAN_SAC_STEPS").and_then(|s| s.parse().ok()) {
            self.sac_refinement_steps = steps;
        }
        self
    }
}
