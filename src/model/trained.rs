use crate::model::arima::{ArimaModel, ArimaOrder, Forecast};
use crate::types::variable::Variable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bumped whenever the serialized layout of [`TrainedModel`] changes, so old
/// cache files are reported as a load error instead of being misread.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// A fitted model for one [`Variable`], as stored in the model cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    format_version: u32,
    variable: Variable,
    trained_at: DateTime<Utc>,
    arima: ArimaModel,
}

impl TrainedModel {
    pub fn new(variable: Variable, arima: ArimaModel) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            variable,
            trained_at: Utc::now(),
            arima,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_format_version(mut self, format_version: u32) -> Self {
        self.format_version = format_version;
        self
    }

    pub fn variable(&self) -> Variable {
        self.variable
    }

    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn order(&self) -> ArimaOrder {
        self.arima.order()
    }

    pub fn arima(&self) -> &ArimaModel {
        &self.arima
    }

    /// `steps` point forecasts with 95% confidence bounds.
    pub fn forecast(&self, steps: usize) -> Forecast {
        self.arima.forecast(steps)
    }
}
