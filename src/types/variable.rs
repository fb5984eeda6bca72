//! Defines the two weather variables the crate forecasts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A forecast variable. Each one gets its own trained model and its own
/// pair of files in the model cache.
///
/// # Examples
///
/// ```
/// use weathercast::Variable;
///
/// assert_eq!(Variable::Temperature.column(), "TEMP");
/// assert_eq!(Variable::Humidity.to_string(), "HUM");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// Air temperature, stored under the `TEMP` column.
    Temperature,
    /// Relative humidity, stored under the `HUM` column.
    Humidity,
}

impl Variable {
    /// Both variables, in the order the historical pipeline processes them.
    pub const ALL: [Variable; 2] = [Variable::Temperature, Variable::Humidity];

    /// The column name in the historical document, also used to derive file names.
    pub fn column(&self) -> &'static str {
        match self {
            Variable::Temperature => "TEMP",
            Variable::Humidity => "HUM",
        }
    }

    pub(crate) fn model_file_stem(&self) -> String {
        format!("model_{}", self.column())
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}
