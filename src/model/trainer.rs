//! Automatic order selection for the per-variable ARIMA models.

use crate::model::arima::{ArimaModel, ArimaOrder};
use crate::model::error::ModelFittingError;
use crate::model::stationarity::ndiffs;
use crate::model::trained::TrainedModel;
use crate::types::history::HistoricalFrame;
use crate::types::variable::Variable;
use log::{debug, info};
use ordered_float::OrderedFloat;
use std::collections::HashSet;

/// The mean model needs two observations to estimate a level and a variance.
const MIN_OBSERVATIONS: usize = 2;
const MAX_STEPWISE_ITERATIONS: usize = 100;

/// Turns historical samples into a [`TrainedModel`] for one variable.
pub trait ModelTrainer: Send + Sync {
    fn train(
        &self,
        history: &HistoricalFrame,
        variable: Variable,
    ) -> Result<TrainedModel, ModelFittingError>;
}

/// Stepwise ARIMA order search.
///
/// `d` is chosen first with repeated ADF tests, then `(p, q)` are explored from
/// `(start_p, start_q)` toward neighbouring orders while the AIC improves,
/// bounded below by zero and above by `max_p` / `max_q`. The search is
/// deterministic for a given input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoArima {
    pub start_p: usize,
    pub start_q: usize,
    pub max_p: usize,
    pub max_q: usize,
    pub max_d: usize,
}

impl Default for AutoArima {
    fn default() -> Self {
        Self {
            start_p: 1,
            start_q: 1,
            max_p: 3,
            max_q: 3,
            max_d: 2,
        }
    }
}

impl AutoArima {
    /// Runs the search on an already cleaned series.
    pub fn fit_series(
        &self,
        series: &[f64],
        variable: Variable,
    ) -> Result<ArimaModel, ModelFittingError> {
        if series.is_empty() {
            return Err(ModelFittingError::NoObservations(variable));
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ModelFittingError::NonFiniteValues(variable));
        }
        if series.len() < MIN_OBSERVATIONS {
            return Err(ModelFittingError::TooFewObservations {
                variable,
                observations: series.len(),
                required: MIN_OBSERVATIONS,
            });
        }

        let d = ndiffs(series, self.max_d);
        let mut search = StepwiseSearch {
            series,
            d,
            with_intercept: d < 2,
            tried: HashSet::new(),
            best: None,
        };

        let initial = [
            (self.start_p.min(self.max_p), self.start_q.min(self.max_q)),
            (0, 0),
            (1.min(self.max_p), 0),
            (0, 1.min(self.max_q)),
        ];
        for (p, q) in initial {
            search.consider(p, q);
        }

        let mut iterations = 0;
        while let Some(current) = search.best.as_ref().map(ArimaModel::order) {
            if iterations >= MAX_STEPWISE_ITERATIONS {
                break;
            }
            let improved = self
                .neighbours(current.p, current.q)
                .into_iter()
                .any(|(p, q)| search.consider(p, q));
            if !improved {
                break;
            }
            iterations += 1;
        }

        let tried = search.tried.len();
        let best = search
            .best
            .ok_or(ModelFittingError::NoConvergence { variable, tried })?;
        info!(
            "Selected {} for {} with AIC {:.3} ({} observations, {} orders tried)",
            best.order(),
            variable,
            best.aic(),
            series.len(),
            tried
        );
        Ok(best)
    }

    fn neighbours(&self, p: usize, q: usize) -> Vec<(usize, usize)> {
        let steps: [(isize, isize); 8] = [
            (-1, 0),
            (1, 0),
            (0, -1),
            (0, 1),
            (-1, -1),
            (1, 1),
            (-1, 1),
            (1, -1),
        ];
        steps
            .iter()
            .filter_map(|(dp, dq)| {
                let p = p.checked_add_signed(*dp)?;
                let q = q.checked_add_signed(*dq)?;
                (p <= self.max_p && q <= self.max_q).then_some((p, q))
            })
            .collect()
    }
}

impl ModelTrainer for AutoArima {
    fn train(
        &self,
        history: &HistoricalFrame,
        variable: Variable,
    ) -> Result<TrainedModel, ModelFittingError> {
        let series = history
            .observations(variable)
            .map_err(|e| ModelFittingError::Column(variable, e))?;
        let arima = self.fit_series(&series, variable)?;
        Ok(TrainedModel::new(variable, arima))
    }
}

struct StepwiseSearch<'a> {
    series: &'a [f64],
    d: usize,
    with_intercept: bool,
    tried: HashSet<(usize, usize)>,
    best: Option<ArimaModel>,
}

impl StepwiseSearch<'_> {
    /// Fits `(p, d, q)` once; true when it becomes the new best.
    fn consider(&mut self, p: usize, q: usize) -> bool {
        if !self.tried.insert((p, q)) {
            return false;
        }
        let order = ArimaOrder::new(p, self.d, q);
        let Some(candidate) = ArimaModel::fit(self.series, order, self.with_intercept) else {
            debug!("{order} could not be fitted");
            return false;
        };
        debug!("{order} AIC {:.3}", candidate.aic());

        let better = match &self.best {
            Some(best) => OrderedFloat(candidate.aic()) < OrderedFloat(best.aic()),
            None => true,
        };
        if better {
            self.best = Some(candidate);
        }
        better
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ar1_series(len: usize, phi: f64, level: f64) -> Vec<f64> {
        let mut state: u64 = 99;
        let mut data = vec![level; len];
        for t in 1..len {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let shock = ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5;
            data[t] = level + phi * (data[t - 1] - level) + shock;
        }
        data
    }

    #[test]
    fn tiny_series_falls_back_to_mean_model() {
        let model = AutoArima::default()
            .fit_series(&[15.0, 16.0, 14.0], Variable::Temperature)
            .unwrap();
        assert_eq!(model.order(), ArimaOrder::new(0, 0, 0));
    }

    #[test]
    fn autoregressive_series_gets_ar_terms() {
        let data = ar1_series(300, 0.7, 18.0);
        let model = AutoArima::default()
            .fit_series(&data, Variable::Temperature)
            .unwrap();
        let order = model.order();
        assert_eq!(order.d, 0);
        assert!(order.p + order.q >= 1, "{order}");
        assert!(order.p <= 3 && order.q <= 3);
    }

    #[test]
    fn search_is_deterministic() {
        let data = ar1_series(200, 0.5, 60.0);
        let first = AutoArima::default().fit_series(&data, Variable::Humidity).unwrap();
        let second = AutoArima::default().fit_series(&data, Variable::Humidity).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn degenerate_inputs_fail() {
        let trainer = AutoArima::default();
        assert!(matches!(
            trainer.fit_series(&[], Variable::Humidity),
            Err(ModelFittingError::NoObservations(Variable::Humidity))
        ));
        assert!(matches!(
            trainer.fit_series(&[0.6], Variable::Humidity),
            Err(ModelFittingError::TooFewObservations { observations: 1, .. })
        ));
        assert!(matches!(
            trainer.fit_series(&[1.0, f64::INFINITY, 2.0], Variable::Temperature),
            Err(ModelFittingError::NonFiniteValues(Variable::Temperature))
        ));
    }

    #[test]
    fn trains_from_frame_ignoring_other_columns_gaps() {
        let frame = HistoricalFrame::from_samples(
            vec![Some(15.0), Some(16.0), Some(14.0)],
            vec![Some(0.6), None, Some(0.62)],
        )
        .unwrap();
        let trainer = AutoArima::default();
        let temp = trainer.train(&frame, Variable::Temperature).unwrap();
        let hum = trainer.train(&frame, Variable::Humidity).unwrap();
        assert_eq!(temp.variable(), Variable::Temperature);
        assert_eq!(temp.arima().observations(), 3);
        assert_eq!(hum.arima().observations(), 2);
    }

    #[test]
    fn all_missing_column_fails() {
        let frame =
            HistoricalFrame::from_samples(vec![Some(15.0), Some(16.0)], vec![None, None]).unwrap();
        assert!(matches!(
            AutoArima::default().train(&frame, Variable::Humidity),
            Err(ModelFittingError::NoObservations(Variable::Humidity))
        ));
    }

    #[test]
    fn neighbours_respect_bounds() {
        let trainer = AutoArima::default();
        let around_origin = trainer.neighbours(0, 0);
        assert_eq!(around_origin, vec![(1, 0), (0, 1), (1, 1)]);
        assert!(trainer.neighbours(3, 3).iter().all(|(p, q)| *p <= 3 && *q <= 3));
    }
}
