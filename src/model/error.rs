use crate::types::variable::Variable;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelFittingError {
    #[error("No observations left for {0} after dropping missing values")]
    NoObservations(Variable),

    #[error("Only {observations} observations for {variable}, at least {required} are needed")]
    TooFewObservations {
        variable: Variable,
        observations: usize,
        required: usize,
    },

    #[error("Historical {0} values contain infinite numbers")]
    NonFiniteValues(Variable),

    #[error("No ARIMA candidate converged for {variable} ({tried} orders tried)")]
    NoConvergence { variable: Variable, tried: usize },

    #[error("Failed to read the {0} column from the historical frame")]
    Column(Variable, #[source] PolarsError),
}
