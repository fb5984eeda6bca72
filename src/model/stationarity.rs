//! Augmented Dickey-Fuller test used to pick the differencing order.
//!
//! The regression includes a constant and a linear trend; the lag order is
//! `trunc((n - 1)^(1/3))`. The 5% critical value is interpolated from the
//! Banerjee et al. table for the constant-plus-trend case.

use crate::model::linalg::{difference, ols};
use log::debug;

/// Sample sizes and matching 5% critical values for the trend regression.
const CRITICAL_SAMPLE_SIZES: [f64; 6] = [25.0, 50.0, 100.0, 250.0, 500.0, 100_000.0];
const CRITICAL_VALUES_5PCT: [f64; 6] = [-3.60, -3.50, -3.45, -3.43, -3.42, -3.41];
const VARIANCE_EPSILON: f64 = 1e-12;

/// Outcome of one ADF run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfOutcome {
    pub statistic: f64,
    pub critical_value: f64,
    pub lags: usize,
}

impl AdfOutcome {
    /// Unit root rejected at the 5% level.
    pub fn is_stationary(&self) -> bool {
        self.statistic < self.critical_value
    }
}

/// Runs the test. `None` means the series is too short or too flat for the
/// regression to be estimated.
pub fn adf_test(series: &[f64]) -> Option<AdfOutcome> {
    let n = series.len();
    if n < 3 {
        return None;
    }
    let lags = ((n - 1) as f64).cbrt().trunc() as usize;
    let deltas = difference(series, 1);

    let mut design = Vec::new();
    let mut targets = Vec::new();
    for t in lags..deltas.len() {
        let mut row = vec![1.0, t as f64, series[t]];
        row.extend((1..=lags).map(|i| deltas[t - i]));
        design.push(row);
        targets.push(deltas[t]);
    }
    let columns = 3 + lags;
    if targets.len() < columns + 2 {
        return None;
    }

    let fit = ols(&design, &targets)?;
    let standard_error = (fit.residual_variance * fit.inverse_diagonal[2]).sqrt();
    if !standard_error.is_finite() || standard_error < VARIANCE_EPSILON {
        return None;
    }

    Some(AdfOutcome {
        statistic: fit.coefficients[2] / standard_error,
        critical_value: critical_value(targets.len()),
        lags,
    })
}

fn critical_value(sample_size: usize) -> f64 {
    let size = sample_size as f64;
    if size <= CRITICAL_SAMPLE_SIZES[0] {
        return CRITICAL_VALUES_5PCT[0];
    }
    for i in 1..CRITICAL_SAMPLE_SIZES.len() {
        if size <= CRITICAL_SAMPLE_SIZES[i] {
            let (x0, x1) = (CRITICAL_SAMPLE_SIZES[i - 1], CRITICAL_SAMPLE_SIZES[i]);
            let (y0, y1) = (CRITICAL_VALUES_5PCT[i - 1], CRITICAL_VALUES_5PCT[i]);
            return y0 + (y1 - y0) * (size - x0) / (x1 - x0);
        }
    }
    CRITICAL_VALUES_5PCT[CRITICAL_VALUES_5PCT.len() - 1]
}

/// Number of differences (at most `max_d`) needed before the ADF test rejects
/// a unit root. Series the test cannot evaluate are left as they are.
pub fn ndiffs(series: &[f64], max_d: usize) -> usize {
    let mut current = series.to_vec();
    let mut d = 0;
    while d < max_d {
        let variance = {
            let m = crate::model::linalg::mean(&current);
            current.iter().map(|v| (v - m).powi(2)).sum::<f64>()
        };
        if variance < VARIANCE_EPSILON {
            break;
        }
        match adf_test(&current) {
            Some(outcome) if !outcome.is_stationary() => {
                debug!(
                    "ADF statistic {:.3} >= {:.3} at d={}, differencing again",
                    outcome.statistic, outcome.critical_value, d
                );
                current = difference(&current, 1);
                d += 1;
            }
            _ => break,
        }
    }
    d
}
