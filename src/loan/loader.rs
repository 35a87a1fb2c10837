//! Load loan terms from CSV
//!
//! Expected columns: `loan_id,installment,total_periods,elapsed_periods,remaining_periods,scheme`.
//! Exactly one of `elapsed_periods` / `remaining_periods` must be filled per row.

use csv::Reader;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

use super::{LoanTerms, PeriodProgress};
use crate::balance::AmortizationScheme;
use crate::error::LoanError;

/// A loan read from a batch file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub loan_id: String,
    pub terms: LoanTerms,
}

/// Raw CSV row
#[derive(Debug, Deserialize)]
struct CsvRow {
    loan_id: String,
    installment: f64,
    total_periods: u32,
    #[serde(default)]
    elapsed_periods: Option<u32>,
    #[serde(default)]
    remaining_periods: Option<u32>,
    scheme: String,
}

impl CsvRow {
    fn to_record(self) -> Result<LoanRecord, LoanError> {
        let progress = match (self.elapsed_periods, self.remaining_periods) {
            (Some(k), None) => PeriodProgress::Elapsed(k),
            (None, Some(k)) => PeriodProgress::Remaining(k),
            (Some(_), Some(_)) => {
                return Err(LoanError::invalid_input(
                    "elapsed_periods",
                    format!("loan {}: give elapsed or remaining periods, not both", self.loan_id),
                ))
            }
            (None, None) => {
                return Err(LoanError::invalid_input(
                    "elapsed_periods",
                    format!("loan {}: elapsed or remaining periods required", self.loan_id),
                ))
            }
        };

        let scheme: AmortizationScheme = self.scheme.parse()?;

        Ok(LoanRecord {
            loan_id: self.loan_id,
            terms: LoanTerms::new(self.installment, self.total_periods, progress, scheme),
        })
    }
}

/// Load all loans from a CSV file
pub fn load_terms<P: AsRef<Path>>(path: P) -> Result<Vec<LoanRecord>, Box<dyn Error>> {
    let reader = std::fs::File::open(path)?;
    load_terms_from_reader(reader)
}

/// Load loans from any reader (e.g., string buffer, stdin)
pub fn load_terms_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<LoanRecord>, Box<dyn Error>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut records = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        records.push(row.to_record()?);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
loan_id,installment,total_periods,elapsed_periods,remaining_periods,scheme
A-1,500.0,24,12,,Price
A-2,1200.0,48,,36,SAC
";

    #[test]
    fn test_load_from_reader() {
        let records = load_terms_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].loan_id, "A-1");
        assert_eq!(records[0].terms.progress, PeriodProgress::Elapsed(12));
        assert_eq!(records[0].terms.scheme, AmortizationScheme::Price);

        assert_eq!(records[1].terms.installment, 1200.0);
        assert_eq!(records[1].terms.progress, PeriodProgress::Remaining(36));
        assert_eq!(records[1].terms.scheme, AmortizationScheme::Sac);
    }

    #[test]
    fn test_row_needs_exactly_one_progress_column() {
        let both = "loan_id,installment,total_periods,elapsed_periods,remaining_periods,scheme\nX,1.0,10,2,8,Price\n";
        assert!(load_terms_from_reader(both.as_bytes()).is_err());

        let neither = "loan_id,installment,total_periods,elapsed_periods,remaining_periods,scheme\nX,1.0,10,,,Price\n";
        assert!(load_terms_from_reader(neither.as_bytes()).is_err());
    }

    #[test]
    fn test_unknown_scheme() {
        let data = "loan_id,installment,total_periods,elapsed_periods,remaining_periods,scheme\nX,1.0,10,2,,Bullet\n";
        let err = load_terms_from_reader(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Bullet") || err.to_string().contains("bullet"));
    }

    #[test]
    fn test_missing_file() {
        assert!(load_terms("does/not/exist.csv").is_err());
    }
}
