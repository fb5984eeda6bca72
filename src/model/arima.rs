//! Non-seasonal ARIMA(p, d, q) fitting and forecasting.
//!
//! Coefficients are estimated with the Hannan-Rissanen two step regression
//! (a long autoregression supplies innovation estimates, then the ARMA terms are
//! fitted by least squares). The fit is scored with the conditional sum of
//! squares Gaussian AIC, which is what the stepwise search in
//! [`crate::model::trainer`] minimises.

use crate::model::linalg::{difference, is_invertible, is_stationary, mean, ols, yule_walker};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Two-sided 95% normal quantile.
const Z_95: f64 = 1.959_963_984_540_054;
/// Floor for the innovation variance so perfect fits still get a finite AIC.
const MIN_VARIANCE: f64 = 1e-10;
const LONG_AR_MIN_ORDER: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// Point forecasts with their 95% confidence band, one entry per step.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaModel {
    order: ArimaOrder,
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    sigma2: f64,
    aic: f64,
    /// Undifferenced observations the model was fitted on.
    history: Vec<f64>,
    /// In-sample innovations on the differenced scale.
    residuals: Vec<f64>,
}

impl ArimaModel {
    /// Fits one candidate order. Returns `None` when the order cannot be
    /// estimated from `series` or the estimate is not stationary and invertible.
    pub fn fit(series: &[f64], order: ArimaOrder, with_intercept: bool) -> Option<Self> {
        let ArimaOrder { p, d, q } = order;
        let w = difference(series, d);
        let m = w.len();
        let params = p + q + usize::from(with_intercept) + 1;
        if m <= p || m - p < params {
            return None;
        }

        let intercept = if with_intercept { mean(&w) } else { 0.0 };
        let z: Vec<f64> = w.iter().map(|v| v - intercept).collect();

        let (ar, ma) = if p == 0 && q == 0 {
            (Vec::new(), Vec::new())
        } else {
            hannan_rissanen(&z, p, q)?
        };
        if !is_stationary(&ar) || !is_invertible(&ma) {
            return None;
        }

        let residuals = css_residuals(&z, &ar, &ma);
        let n_eff = m - p;
        let ssr: f64 = residuals[p..].iter().map(|e| e * e).sum();
        let sigma2 = (ssr / n_eff as f64).max(MIN_VARIANCE);
        if !sigma2.is_finite() {
            return None;
        }
        let aic = n_eff as f64 * ((2.0 * PI * sigma2).ln() + 1.0) + 2.0 * params as f64;

        Some(Self {
            order,
            intercept,
            ar,
            ma,
            sigma2,
            aic,
            history: series.to_vec(),
            residuals,
        })
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    pub fn observations(&self) -> usize {
        self.history.len()
    }

    /// Forecasts `steps` values past the end of the fitted history.
    pub fn forecast(&self, steps: usize) -> Forecast {
        let ArimaOrder { d, .. } = self.order;

        let mut levels = vec![self.history.clone()];
        for k in 0..d {
            levels.push(difference(&levels[k], 1));
        }

        let mut z: Vec<f64> = levels[d].iter().map(|v| v - self.intercept).collect();
        let mut innovations = self.residuals.clone();
        let mut point = Vec::with_capacity(steps);
        for _ in 0..steps {
            let next = arma_step(&z, &innovations, &self.ar, &self.ma);
            z.push(next);
            innovations.push(0.0);
            point.push(next + self.intercept);
        }

        for level in levels[..d].iter().rev() {
            let mut last = level.last().copied().unwrap_or_default();
            point = point
                .into_iter()
                .map(|step| {
                    last += step;
                    last
                })
                .collect();
        }

        let psi = self.psi_weights(steps);
        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(steps);
        let mut upper = Vec::with_capacity(steps);
        for (value, weight) in point.iter().zip(&psi) {
            cumulative += weight * weight;
            let half_width = Z_95 * (self.sigma2 * cumulative).sqrt();
            lower.push(value - half_width);
            upper.push(value + half_width);
        }

        Forecast {
            mean: point,
            lower,
            upper,
        }
    }

    /// MA(infinity) weights of the integrated model, used for forecast variance.
    fn psi_weights(&self, count: usize) -> Vec<f64> {
        let mut polynomial = vec![1.0];
        polynomial.extend(self.ar.iter().map(|phi| -phi));
        for _ in 0..self.order.d {
            let mut widened = vec![0.0; polynomial.len() + 1];
            for (i, c) in polynomial.iter().enumerate() {
                widened[i] += c;
                widened[i + 1] -= c;
            }
            polynomial = widened;
        }
        let phi_star: Vec<f64> = polynomial[1..].iter().map(|c| -c).collect();

        let mut psi = vec![0.0; count];
        if count == 0 {
            return psi;
        }
        psi[0] = 1.0;
        for j in 1..count {
            let mut value = self.ma.get(j - 1).copied().unwrap_or_default();
            for (i, phi) in phi_star.iter().enumerate().take(j) {
                value += phi * psi[j - 1 - i];
            }
            psi[j] = value;
        }
        psi
    }
}

fn arma_step(z: &[f64], innovations: &[f64], ar: &[f64], ma: &[f64]) -> f64 {
    let n = z.len();
    let ar_part: f64 = ar
        .iter()
        .enumerate()
        .filter(|(i, _)| *i < n)
        .map(|(i, phi)| phi * z[n - 1 - i])
        .sum();
    let m = innovations.len();
    let ma_part: f64 = ma
        .iter()
        .enumerate()
        .filter(|(j, _)| *j < m)
        .map(|(j, theta)| theta * innovations[m - 1 - j])
        .sum();
    ar_part + ma_part
}

/// Conditional residuals: the first `p` innovations are fixed at zero.
fn css_residuals(z: &[f64], ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let p = ar.len();
    let mut innovations = vec![0.0; z.len()];
    for t in p..z.len() {
        let predicted = arma_step(&z[..t], &innovations[..t], ar, ma);
        innovations[t] = z[t] - predicted;
    }
    innovations
}

fn hannan_rissanen(z: &[f64], p: usize, q: usize) -> Option<(Vec<f64>, Vec<f64>)> {
    let m = z.len();

    let (innovations, start) = if q > 0 {
        let long_order = (p + q).max(LONG_AR_MIN_ORDER).min(m / 3);
        if long_order == 0 {
            return None;
        }
        let long_ar = yule_walker(z, long_order)?;
        let mut innovations = vec![0.0; m];
        for t in long_order..m {
            innovations[t] = z[t] - arma_step(&z[..t], &[], &long_ar, &[]);
        }
        (innovations, (long_order + q).max(p))
    } else {
        (vec![0.0; m], p)
    };

    let mut design = Vec::with_capacity(m.saturating_sub(start));
    let mut targets = Vec::with_capacity(m.saturating_sub(start));
    for t in start..m {
        let mut row = Vec::with_capacity(p + q);
        row.extend((1..=p).map(|i| z[t - i]));
        row.extend((1..=q).map(|j| innovations[t - j]));
        design.push(row);
        targets.push(z[t]);
    }

    let fit = ols(&design, &targets)?;
    let (ar, ma) = fit.coefficients.split_at(p);
    Some((ar.to_vec(), ma.to_vec()))
}
