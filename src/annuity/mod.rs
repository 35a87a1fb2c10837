//! Ordinary annuity present value and related rate conversions
//!
//! Payments are made at the end of each period. Exponents are evaluated with
//! `powf` so the same formulas hold for any real period count.

/// Periods per year used when annualizing a monthly rate
pub const PERIODS_PER_YEAR: u32 = 12;

/// Present value of `periods` level payments of `installment` at `rate`
///
/// A zero rate degenerates to the plain sum of the payments.
pub fn present_value(installment: f64, rate: f64, periods: u32) -> f64 {
    let n = periods as f64;
    if rate == 0.0 {
        return installment * n;
    }

    installment * (1.0 - (1.0 + rate).powf(-n)) / rate
}

/// Derivative of [`present_value`] with respect to `rate`
///
/// At `rate == 0` the closed form divides by zero, so the limit
/// `-installment * n * (n + 1) / 2` is returned instead.
pub fn present_value_derivative(installment: f64, rate: f64, periods: u32) -> f64 {
    let n = periods as f64;
    if rate == 0.0 {
        return -installment * n * (n + 1.0) / 2.0;
    }

    let term = (1.0 + rate).powf(-n - 1.0);
    installment * (term * (n * rate + rate + 1.0) - 1.0) / (rate * rate)
}

/// Level installment that amortizes `principal` over `periods` at `rate`
pub fn level_installment(principal: f64, rate: f64, periods: u32) -> f64 {
    let n = periods as f64;
    if periods == 0 {
        return 0.0;
    }
    if rate == 0.0 {
        return principal / n;
    }

    principal * rate / (1.0 - (1.0 + rate).powf(-n))
}

/// Compound a periodic rate to an annual effective rate
pub fn annualized_rate(periodic_rate: f64) -> f64 {
    (1.0 + periodic_rate).powf(PERIODS_PER_YEAR as f64) - 1.0
}

/// Inverse of [`annualized_rate`]
pub fn periodic_rate_from_annual(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / PERIODS_PER_YEAR as f64) - 1.0
}
