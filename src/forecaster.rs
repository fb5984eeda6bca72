//! Entry point tying the data sources, the model trainer and the model cache
//! together behind the two forecasting strategies.

use crate::cache::model_cache::{DiskModelCache, ModelCache};
use crate::config::ForecastConfig;
use crate::error::ForecastError;
use crate::model::trained::TrainedModel;
use crate::model::trainer::{AutoArima, ModelTrainer};
use crate::pipelines::historical::model_forecast_points;
use crate::pipelines::live::api_forecast_points;
use crate::sources::historical::{AtlasSource, HistoricalSource};
use crate::sources::live::{LiveSource, WeatherApiSource};
use crate::types::forecast_point::ForecastResult;
use crate::types::history::HistoricalFrame;
use crate::types::period::Period;
use crate::types::variable::Variable;
use crate::utils::{ensure_model_dir_exists, get_model_dir};
use bon::bon;
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task;

/// Which source a forecast is produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Locally trained ARIMA models, fitted on the historical samples.
    Model,
    /// The external weather API's own hourly forecast.
    Api,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Model => write!(f, "model"),
            Strategy::Api => write!(f, "api"),
        }
    }
}

/// Produces hourly temperature and humidity forecasts.
///
/// Models are trained on demand: the first model forecast fetches the
/// historical samples, trains one model per variable and stores it in the
/// cache. Later calls reuse the cached models until they are explicitly
/// replaced with [`Forecaster::retrain`] or removed with
/// [`Forecaster::invalidate`].
///
/// # Examples
///
/// ```rust,no_run
/// # use weathercast::{DefaultForecaster, ForecastConfig, ForecastError, Strategy};
/// # async fn run() -> Result<(), ForecastError> {
/// let forecaster = DefaultForecaster::from_config()
///     .config(ForecastConfig::from_env())
///     .call()
///     .await?;
/// let points = forecaster.forecast(Strategy::Model, "24").await?;
/// assert_eq!(points.len(), 24);
/// # Ok(())
/// # }
/// ```
pub struct Forecaster<H, L, T, C> {
    history: H,
    live: L,
    trainer: Arc<T>,
    cache: C,
    include_intervals: bool,
}

/// The production wiring: Atlas history, weather API, stepwise ARIMA, disk cache.
pub type DefaultForecaster = Forecaster<AtlasSource, WeatherApiSource, AutoArima, DiskModelCache>;

impl<H, L, T, C> Forecaster<H, L, T, C>
where
    H: HistoricalSource,
    L: LiveSource,
    T: ModelTrainer + 'static,
    C: ModelCache,
{
    pub fn new(history: H, live: L, trainer: T, cache: C) -> Self {
        Self {
            history,
            live,
            trainer: Arc::new(trainer),
            cache,
            include_intervals: false,
        }
    }

    /// Attach 95% confidence bounds to model forecasts.
    pub fn with_intervals(mut self, include_intervals: bool) -> Self {
        self.include_intervals = include_intervals;
        self
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Forecasts `period` hours with the given strategy.
    pub async fn forecast<P>(
        &self,
        strategy: Strategy,
        period: P,
    ) -> Result<ForecastResult, ForecastError>
    where
        P: TryInto<Period>,
        ForecastError: From<P::Error>,
    {
        match strategy {
            Strategy::Model => self.model_forecast(period).await,
            Strategy::Api => self.api_forecast(period).await,
        }
    }

    /// Forecasts `period` hours from the cached models, training any that are missing.
    ///
    /// The period is validated before any remote call. The first forecast hour
    /// is three hours from now, truncated to the minute.
    ///
    /// # Errors
    ///
    /// * [`ForecastError::InvalidPeriod`] if `period` is not a positive integer.
    /// * [`ForecastError::Connection`] if history is needed and cannot be fetched.
    /// * [`ForecastError::ModelFitting`] if training fails.
    /// * [`ForecastError::ModelLoad`] / [`ForecastError::ModelStore`] on cache failures.
    pub async fn model_forecast<P>(&self, period: P) -> Result<ForecastResult, ForecastError>
    where
        P: TryInto<Period>,
        ForecastError: From<P::Error>,
    {
        let period = period.try_into()?;
        let mut history = None;
        let temperature = self
            .load_or_train(Variable::Temperature, &mut history)
            .await?;
        let humidity = self.load_or_train(Variable::Humidity, &mut history).await?;

        Ok(model_forecast_points(
            &temperature,
            &humidity,
            period,
            Utc::now(),
            self.include_intervals,
        ))
    }

    /// Forecasts `period` hours from the live weather API.
    ///
    /// # Errors
    ///
    /// * [`ForecastError::InvalidPeriod`] if `period` is not a positive integer.
    /// * [`ForecastError::Connection`] if the API cannot be reached or answers unexpectedly.
    /// * [`ForecastError::InsufficientData`] if the API returns too few hourly records.
    pub async fn api_forecast<P>(&self, period: P) -> Result<ForecastResult, ForecastError>
    where
        P: TryInto<Period>,
        ForecastError: From<P::Error>,
    {
        let period = period.try_into()?;
        let records = self.live.fetch_hourly().await?;
        api_forecast_points(&records, period)
    }

    /// Trains a fresh model for `variable` from newly fetched history and
    /// replaces the cached one.
    pub async fn retrain(&self, variable: Variable) -> Result<TrainedModel, ForecastError> {
        let history = Arc::new(self.history.fetch_history().await?);
        self.train_and_store(variable, history).await?;
        self.cache
            .get(variable)
            .await
            .map_err(ForecastError::ModelLoad)
    }

    /// Removes the cached model for `variable`; the next model forecast retrains it.
    pub async fn invalidate(&self, variable: Variable) -> Result<(), ForecastError> {
        self.cache
            .invalidate(variable)
            .await
            .map_err(ForecastError::ModelStore)
    }

    /// Loads the cached model, or trains and stores one first. History is
    /// fetched at most once per forecast and shared between variables.
    async fn load_or_train(
        &self,
        variable: Variable,
        history: &mut Option<Arc<HistoricalFrame>>,
    ) -> Result<TrainedModel, ForecastError> {
        if !self.cache.exists(variable).await {
            info!("No cached {} model, training a new one", variable);
            let frame = match history {
                Some(frame) => Arc::clone(frame),
                None => {
                    let frame = Arc::new(self.history.fetch_history().await?);
                    *history = Some(Arc::clone(&frame));
                    frame
                }
            };
            self.train_and_store(variable, frame).await?;
        }
        self.cache
            .get(variable)
            .await
            .map_err(ForecastError::ModelLoad)
    }

    async fn train_and_store(
        &self,
        variable: Variable,
        history: Arc<HistoricalFrame>,
    ) -> Result<(), ForecastError> {
        let trainer = Arc::clone(&self.trainer);
        let model = task::spawn_blocking(move || trainer.train(&history, variable)).await??;
        self.cache
            .put(&model)
            .await
            .map_err(ForecastError::ModelStore)
    }
}

#[bon]
impl Forecaster<AtlasSource, WeatherApiSource, AutoArima, DiskModelCache> {
    /// Builds the production forecaster from `config`.
    ///
    /// * `.config(ForecastConfig)`: **Required.** Credentials, endpoints and defaults.
    /// * `.model_dir(PathBuf)`: Optional. Overrides `config.model_dir`; falls back to
    ///   `<system cache dir>/weathercast_models`.
    /// * `.include_intervals(bool)`: Optional. Attach confidence bounds to model forecasts.
    ///   Defaults to `false`.
    /// * `.trainer(AutoArima)`: Optional. Custom search bounds.
    ///
    /// Credentials are not checked here; a missing credential only fails the
    /// strategy that needs it.
    #[builder]
    pub async fn from_config(
        config: ForecastConfig,
        model_dir: Option<PathBuf>,
        include_intervals: Option<bool>,
        trainer: Option<AutoArima>,
    ) -> Result<Self, ForecastError> {
        let model_dir = match model_dir.or_else(|| config.model_dir.clone()) {
            Some(dir) => dir,
            None => get_model_dir().map_err(ForecastError::ModelDirResolution)?,
        };
        ensure_model_dir_exists(&model_dir)
            .await
            .map_err(|e| ForecastError::ModelDirCreation(model_dir.clone(), e))?;

        let timeout = config.timeout();
        let history = AtlasSource::new(config.atlas, timeout)?;
        let live = WeatherApiSource::new(config.weather, timeout)?;
        info!("Using model directory {:?}", model_dir);

        Ok(Self::new(
            history,
            live,
            trainer.unwrap_or_default(),
            DiskModelCache::new(model_dir),
        )
        .with_intervals(include_intervals.unwrap_or(false)))
    }
}
