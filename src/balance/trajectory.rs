//! Balance trajectories and amortization tables

use serde::{Deserialize, Serialize};
use std::io::Write;

use super::{outstanding_balance, sac_installment, AmortizationScheme};
use crate::annuity::level_installment;
use crate::error::{ensure_finite, LoanError, LoanResult};

/// Balance after `period` installments have been paid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub period: u32,
    pub balance: f64,
}

/// Ordered balance points, one per period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceTrajectory {
    pub scheme: AmortizationScheme,
    pub points: Vec<BalancePoint>,
}

impl BalanceTrajectory {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BalancePoint> {
        self.points.iter()
    }

    pub fn first(&self) -> Option<&BalancePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&BalancePoint> {
        self.points.last()
    }

    /// Write as `period,balance` CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for point in &self.points {
            csv_writer.serialize(point)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Balance at every period from `from_period` to `to_period` inclusive
///
/// `to_period` is the total term. Price uses `installment` and `rate`; SAC
/// derives its quota from `principal / to_period`. Both go through
/// [`outstanding_balance`].
pub fn balance_trajectory(
    installment: f64,
    rate: f64,
    principal: f64,
    scheme: AmortizationScheme,
    from_period: u32,
    to_period: u32,
) -> LoanResult<BalanceTrajectory> {
    if from_period > to_period {
        return Err(LoanError::invalid_input(
            "from_period",
            format!("{} is past the final period {}", from_period, to_period),
        ));
    }

    let level_amount = match scheme {
        AmortizationScheme::Price => installment,
        AmortizationScheme::Sac => {
            if to_period == 0 {
                return Err(LoanError::invalid_input("to_period", "must be at least 1"));
            }
            principal / to_period as f64
        }
    };

    let points = (from_period..=to_period)
        .map(|period| {
            outstanding_balance(level_amount, rate, to_period - period, scheme)
                .map(|balance| BalancePoint { period, balance })
        })
        .collect::<LoanResult<Vec<_>>>()?;

    Ok(BalanceTrajectory { scheme, points })
}

/// One row of an amortization table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub period: u32,
    pub installment: f64,
    pub interest: f64,
    pub amortization: f64,
    pub balance: f64,
}

/// Full amortization table for `principal` over `periods` at `rate`
pub fn amortization_schedule(
    principal: f64,
    rate: f64,
    periods: u32,
    scheme: AmortizationScheme,
) -> LoanResult<Vec<AmortizationRow>> {
    if periods == 0 {
        return Err(LoanError::invalid_input("total_periods", "must be at least 1"));
    }
    if !principal.is_finite() || principal <= 0.0 {
        return Err(LoanError::invalid_input("principal", "must be positive"));
    }
    if !rate.is_finite() {
        return Err(LoanError::invalid_input("rate", "must be finite"));
    }

    let level_amount = match scheme {
        AmortizationScheme::Price => {
            ensure_finite(level_installment(principal, rate, periods), "level installment")?
        }
        AmortizationScheme::Sac => principal / periods as f64,
    };

    let mut rows = Vec::with_capacity(periods as usize);
    let mut balance_before = principal;

    for period in 1..=periods {
        let interest = balance_before * rate;
        let installment = match scheme {
            AmortizationScheme::Price => level_amount,
            AmortizationScheme::Sac => sac_installment(level_amount, rate, periods, period),
        };
        let balance = outstanding_balance(level_amount, rate, periods - period, scheme)?;

        rows.push(AmortizationRow {
            period,
            installment,
            interest,
            amortization: balance_before - balance,
            balance,
        });
        balance_before = balance;
    }

    Ok(rows)
}
