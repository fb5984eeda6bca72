//! Hourly temperature and humidity forecasts for San Francisco.
//!
//! Two strategies produce the same [`ForecastPoint`] shape:
//!
//! * [`Strategy::Model`] forecasts from ARIMA models trained on historical
//!   samples kept in MongoDB Atlas. Trained models are cached on disk and
//!   reused until they are explicitly retrained or invalidated.
//! * [`Strategy::Api`] windows the hourly forecast of a Dark Sky compatible
//!   weather API.
//!
//! Use [`DefaultForecaster::from_config`] for the production setup, or
//! [`Forecaster::new`] to plug in your own sources, trainer and cache.

mod cache;
mod config;
mod error;
mod forecaster;
mod model;
mod pipelines;
mod sources;
mod types;
mod utils;

pub use error::ForecastError;
pub use forecaster::*;

pub use config::{
    AtlasConfig, ForecastConfig, WeatherApiConfig, DEFAULT_TIMEOUT, SF_LATITUDE, SF_LONGITUDE,
};

pub use cache::model_cache::{DiskModelCache, ModelCache};
pub use model::arima::{ArimaModel, ArimaOrder, Forecast};
pub use model::stationarity::{adf_test, ndiffs, AdfOutcome};
pub use model::trained::{TrainedModel, MODEL_FORMAT_VERSION};
pub use model::trainer::{AutoArima, ModelTrainer};
pub use pipelines::historical::{forecast_start, model_forecast_points, FORECAST_LEAD};
pub use pipelines::live::{api_forecast_points, SKIPPED_RECORDS};
pub use sources::historical::{AtlasSource, HistoricalSource};
pub use sources::live::{HourlyRecord, LiveSource, WeatherApiSource};

pub use types::forecast_point::{
    hour_label, ForecastBounds, ForecastPoint, ForecastResult, HOUR_LABEL_FORMAT,
};
pub use types::history::HistoricalFrame;
pub use types::period::{Period, MAX_PERIOD_HOURS};
pub use types::variable::Variable;

pub use cache::error::ModelCacheError;
pub use model::error::ModelFittingError;
pub use sources::error::ConnectionError;
pub use types::period::InvalidPeriodError;
