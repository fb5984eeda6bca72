//! Historical samples for the forecast location, held as a polars frame.

use crate::types::variable::Variable;
use polars::prelude::*;

/// Time ordered historical samples with nullable `TEMP` and `HUM` columns.
///
/// Rows follow the order of the source document; gaps are kept as nulls and only
/// dropped per variable when a model is trained.
#[derive(Debug, Clone)]
pub struct HistoricalFrame {
    frame: DataFrame,
}

impl HistoricalFrame {
    /// Builds a frame from two equally long columns of optional samples.
    pub fn from_samples(
        temperature: Vec<Option<f64>>,
        humidity: Vec<Option<f64>>,
    ) -> PolarsResult<Self> {
        let frame = df!(
            Variable::Temperature.column() => temperature,
            Variable::Humidity.column() => humidity
        )?;
        Ok(Self { frame })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of sample rows, including rows with gaps.
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// The non-missing values of one variable, in time order. NaN counts as missing.
    pub fn observations(&self, variable: Variable) -> PolarsResult<Vec<f64>> {
        let column = self.frame.column(variable.column())?.f64()?;
        Ok(column
            .into_iter()
            .flatten()
            .filter(|value| !value.is_nan())
            .collect())
    }
}
