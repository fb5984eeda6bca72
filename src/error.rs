use crate::cache::error::ModelCacheError;
use crate::model::error::ModelFittingError;
use crate::sources::error::ConnectionError;
use crate::types::period::InvalidPeriodError;
use std::convert::Infallible;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    InvalidPeriod(#[from] InvalidPeriodError),

    #[error(transparent)]
    ModelFitting(#[from] ModelFittingError),

    #[error("Failed to load cached model")]
    ModelLoad(#[source] ModelCacheError),

    #[error("Failed to update model cache")]
    ModelStore(#[source] ModelCacheError),

    #[error("Live forecast has {available} hourly records, {required} are required")]
    InsufficientData { required: usize, available: usize },

    #[error("Hourly record has out of range timestamp {0}")]
    InvalidTimestamp(i64),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Failed to create model directory '{0}'")]
    ModelDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine model directory")]
    ModelDirResolution(#[source] std::io::Error),
}

/// Lets an already validated [`crate::Period`] be passed where any period input is accepted.
impl From<Infallible> for ForecastError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
