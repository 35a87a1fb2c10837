//! Batch evaluation of many loans
//!
//! Evaluations share no state, so the batch is spread across threads with
//! rayon. A failing loan yields an error entry and never aborts the batch.

use log::info;
use rayon::prelude::*;
use serde::Serialize;

use crate::engine::{EngineConfig, LoanEngine, LoanEvaluation};
use crate::error::LoanError;
use crate::loan::LoanRecord;

/// Outcome for one loan of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub loan_id: String,
    pub result: Result<LoanEvaluation, LoanError>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Flat CSV row for a batch outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRow {
    pub loan_id: String,
    pub scheme: String,
    pub periodic_rate: Option<f64>,
    pub annualized_rate: Option<f64>,
    pub principal_estimate: Option<f64>,
    pub current_balance: Option<f64>,
    pub remaining_periods: Option<u32>,
    pub error: Option<String>,
}

impl From<&BatchOutcome> for BatchRow {
    fn from(outcome: &BatchOutcome) -> Self {
        match &outcome.result {
            Ok(evaluation) => Self {
                loan_id: outcome.loan_id.clone(),
                scheme: evaluation.terms.scheme.to_string(),
                periodic_rate: Some(evaluation.rate.periodic_rate),
                annualized_rate: Some(evaluation.rate.annualized_rate),
                principal_estimate: Some(evaluation.principal_estimate),
                current_balance: Some(evaluation.current_balance),
                remaining_periods: Some(evaluation.remaining_periods),
                error: None,
            },
            Err(err) => Self {
                loan_id: outcome.loan_id.clone(),
                scheme: String::new(),
                periodic_rate: None,
                annualized_rate: None,
                principal_estimate: None,
                current_balance: None,
                remaining_periods: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Runs one engine configuration over many loans
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    engine: LoanEngine,
}

impl BatchRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: LoanEngine::new(config),
        }
    }

    pub fn engine(&self) -> &LoanEngine {
        &self.engine
    }

    /// Evaluate every record in parallel, preserving input order
    pub fn run(&self, records: &[LoanRecord]) -> Vec<BatchOutcome> {
        let outcomes: Vec<BatchOutcome> = records
            .par_iter()
            .map(|record| BatchOutcome {
                loan_id: record.loan_id.clone(),
                result: self.engine.evaluate(&record.terms),
            })
            .collect();

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!("evaluated {} loans, {} failed", outcomes.len(), failed);
        outcomes
    }

    /// Evaluate the same loan under several configurations
    pub fn run_configs(record: &LoanRecord, configs: &[EngineConfig]) -> Vec<BatchOutcome> {
        configs
            .par_iter()
            .map(|config| BatchOutcome {
                loan_id: record.loan_id.clone(),
                result: LoanEngine::new(*config).evaluate(&record.terms),
            })
            .collect()
    }
}
