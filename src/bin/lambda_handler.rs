//! AWS Lambda handler for loan evaluations
//!
//! Accepts the loan terms as JSON and returns the implicit rate, principal
//! estimate and outstanding balance, optionally with the balance trajectory.
//!
//! Supports Lambda Function URLs for direct HTTP access.

use installment_rate::{
    AmortizationScheme, EngineConfig, LoanEngine, LoanError, LoanEvaluation, LoanTerms, PeriodProgress,
};
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::{Deserialize, Serialize};

/// Input for one evaluation
#[derive(Debug, Deserialize)]
pub struct LoanRequest {
    pub installment: f64,

    pub total_periods: u32,

    /// Installments already paid (give this or `remaining_periods`)
    #[serde(default)]
    pub elapsed_periods: Option<u32>,

    /// Installments still to pay
    #[serde(default)]
    pub remaining_periods: Option<u32>,

    /// "Price" (default) or "SAC"
    #[serde(default)]
    pub scheme: AmortizationScheme,

    /// Original principal, if known
    #[serde(default)]
    pub principal: Option<f64>,

    /// Monthly rate used to estimate an unknown principal
    #[serde(default)]
    pub assumed_market_rate: Option<f64>,

    #[serde(default)]
    pub include_trajectory: bool,
}

/// Output from the evaluation
#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub monthly_rate_pct: f64,
    pub annual_rate_pct: f64,
    pub evaluation: LoanEvaluation,
    pub execution_time_ms: u64,
}

impl LoanRequest {
    fn terms(&self) -> Result<LoanTerms, LoanError> {
        let progress = match (self.elapsed_periods, self.remaining_periods) {
            (Some(k), None) => PeriodProgress::Elapsed(k),
            (None, Some(k)) => PeriodProgress::Remaining(k),
            _ => {
                return Err(LoanError::invalid_input(
                    "elapsed_periods",
                    "give exactly one of elapsed_periods or remaining_periods",
                ))
            }
        };
        Ok(LoanTerms::new(self.installment, self.total_periods, progress, self.scheme))
    }
}

/// HTTP status for an engine failure
fn status_for(err: &LoanError) -> u16 {
    match err {
        LoanError::InvalidInput { .. } => 400,
        LoanError::NonConvergence { .. } | LoanError::NumericOverflow { .. } => 422,
    }
}

fn evaluate_request(request: &LoanRequest) -> Result<LoanEvaluation, LoanError> {
    let terms = request.terms()?;

    let mut config = EngineConfig::from_env();
    if let Some(rate) = request.assumed_market_rate {
        config.assumed_market_rate = rate;
    }
    config.include_trajectory = request.include_trajectory;

    let engine = LoanEngine::new(config);
    match request.principal {
        Some(principal) => engine.evaluate_with_principal(&terms, principal),
        None => engine.evaluate(&terms),
    }
}

fn error_response(status: u16, message: &str) -> Result<Response<Body>, Error> {
    let body = serde_json::json!({ "error": message });
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::Text(body.to_string()))?)
}

fn json_response(body: &LoanResponse) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Body::Text(serde_json::to_string(body)?))?)
}

/// Lambda handler function
async fn handler(event: Request) -> Result<Response<Body>, Error> {
    let start = std::time::Instant::now();

    // Handle CORS preflight
    if event.method().as_str() == "OPTIONS" {
        return Ok(Response::builder()
            .status(200)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "POST, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type")
            .body(Body::Empty)?);
    }

    let body_str = match event.body() {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => "{}".to_string(),
    };

    let request: LoanRequest = match serde_json::from_str(&body_str) {
        Ok(r) => r,
        Err(e) => return error_response(400, &format!("Invalid JSON: {}", e)),
    };

    let evaluation = match evaluate_request(&request) {
        Ok(evaluation) => evaluation,
        Err(e) => {
            log::warn!("evaluation failed: {}", e);
            return error_response(status_for(&e), &e.to_string());
        }
    };

    let summary = evaluation.summary();
    let response = LoanResponse {
        monthly_rate_pct: summary.monthly_rate_pct,
        annual_rate_pct: summary.annual_rate_pct,
        evaluation,
        execution_time_ms: start.elapsed().as_millis() as u64,
    };

    json_response(&response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> LoanRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_minimal_request() {
        let req = request(r#"{"installment": 500.0, "total_periods": 24, "elapsed_periods": 12}"#);
        assert_eq!(req.scheme, AmortizationScheme::Price);

        let evaluation = evaluate_request(&req).unwrap();
        assert_eq!(evaluation.remaining_periods, 12);
        assert!(evaluation.trajectory.is_none());
    }

    #[test]
    fn test_sac_request_with_trajectory() {
        let req = request(
            r#"{"installment": 900.0, "total_periods": 36, "remaining_periods": 10,
                "scheme": "SAC", "include_trajectory": true}"#,
        );
        let evaluation = evaluate_request(&req).unwrap();
        assert_eq!(evaluation.trajectory.unwrap().len(), 11);
    }

    #[test]
    fn test_scheme_name_is_case_insensitive() {
        let req = request(r#"{"installment": 500.0, "total_periods": 24, "elapsed_periods": 0, "scheme": "PRICE"}"#);
        assert_eq!(req.scheme, AmortizationScheme::Price);
        let req = request(r#"{"installment": 900.0, "total_periods": 36, "elapsed_periods": 0, "scheme": "sac"}"#);
        assert_eq!(req.scheme, AmortizationScheme::Sac);
        assert!(evaluate_request(&req).unwrap().rate.converged);
    }

    #[test]
    fn test_progress_must_be_unambiguous() {
        let req = request(r#"{"installment": 500.0, "total_periods": 24}"#);
        let err = evaluate_request(&req).unwrap_err();
        assert_eq!(status_for(&err), 400);

        let req = request(
            r#"{"installment": 500.0, "total_periods": 24, "elapsed_periods": 1, "remaining_periods": 23}"#,
        );
        assert!(evaluate_request(&req).is_err());
    }

    #[test]
    fn test_numeric_failures_map_to_422() {
        let err = LoanError::NonConvergence { iterations: 100, last_step: 1.0 };
        assert_eq!(status_for(&err), 422);
        assert_eq!(status_for(&LoanError::overflow("pv")), 422);
    }
}
