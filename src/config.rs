//! Environment driven configuration for both data sources and the model cache.
//!
//! Credentials are kept as `Option`s here and validated by the sources when
//! they are used, so a missing store password does not prevent API forecasts.

use log::warn;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const SF_LATITUDE: f64 = 37.774929;
pub const SF_LONGITUDE: f64 = -122.4194183;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_WEATHER_API_URL: &str = "https://api.pirateweather.net/forecast";
const DEFAULT_DATA_SOURCE: &str = "meteorologia";
const DEFAULT_DATABASE: &str = "PrediccionesBD";
const DEFAULT_COLLECTION: &str = "DatosTiempo";
const DEFAULT_LOCATION_KEY: &str = "SF";

/// Connection settings for the MongoDB Atlas Data API holding the historical samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasConfig {
    pub user: Option<String>,
    pub password: Option<String>,
    /// Base URL of the Data API app, e.g. `https://data.mongodb-api.com/app/<id>/endpoint/data/v1`.
    pub endpoint: Option<String>,
    pub data_source: String,
    pub database: String,
    pub collection: String,
    /// Value of the `index` field identifying the location's document.
    pub location_key: String,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            user: None,
            password: None,
            endpoint: None,
            data_source: DEFAULT_DATA_SOURCE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            location_key: DEFAULT_LOCATION_KEY.to_string(),
        }
    }
}

/// Settings for the Dark Sky compatible hourly forecast API.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherApiConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_WEATHER_API_URL.to_string(),
            latitude: SF_LATITUDE,
            longitude: SF_LONGITUDE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastConfig {
    pub atlas: AtlasConfig,
    pub weather: WeatherApiConfig,
    /// Where trained models are cached; `None` means the system cache directory.
    pub model_dir: Option<PathBuf>,
    /// Applied to every remote request; `None` means [`DEFAULT_TIMEOUT`].
    pub request_timeout: Option<Duration>,
}

impl ForecastConfig {
    /// Reads `USER_ATLAS`, `PSW_ATLAS` and `WEATHER_KEY`, plus the optional
    /// `ATLAS_DATA_API_URL`, `ATLAS_DATA_SOURCE`, `ATLAS_DATABASE`,
    /// `ATLAS_COLLECTION`, `WEATHER_API_URL`, `WEATHERCAST_MODEL_DIR` and
    /// `WEATHERCAST_TIMEOUT_SECS` overrides.
    pub fn from_env() -> Self {
        let atlas_defaults = AtlasConfig::default();
        let weather_defaults = WeatherApiConfig::default();
        Self {
            atlas: AtlasConfig {
                user: env::var("USER_ATLAS").ok(),
                password: env::var("PSW_ATLAS").ok(),
                endpoint: env::var("ATLAS_DATA_API_URL").ok(),
                data_source: env::var("ATLAS_DATA_SOURCE").unwrap_or(atlas_defaults.data_source),
                database: env::var("ATLAS_DATABASE").unwrap_or(atlas_defaults.database),
                collection: env::var("ATLAS_COLLECTION").unwrap_or(atlas_defaults.collection),
                location_key: atlas_defaults.location_key,
            },
            weather: WeatherApiConfig {
                api_key: env::var("WEATHER_KEY").ok(),
                endpoint: env::var("WEATHER_API_URL").unwrap_or(weather_defaults.endpoint),
                ..weather_defaults
            },
            model_dir: env::var("WEATHERCAST_MODEL_DIR").ok().map(PathBuf::from),
            request_timeout: env::var("WEATHERCAST_TIMEOUT_SECS")
                .ok()
                .and_then(|secs| parse_timeout(&secs)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.request_timeout.unwrap_or(DEFAULT_TIMEOUT)
    }
}

/// Whole seconds; anything else is logged and falls back to [`DEFAULT_TIMEOUT`].
fn parse_timeout(secs: &str) -> Option<Duration> {
    match secs.trim().parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(e) => {
            warn!(
                "Ignoring WEATHERCAST_TIMEOUT_SECS '{}' ({}), using {:?}",
                secs, e, DEFAULT_TIMEOUT
            );
            None
        }
    }
}

/// Returns the value when it is present and not blank.
pub(crate) fn required<'a>(
    value: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, crate::sources::error::ConnectionError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(crate::sources::error::ConnectionError::MissingCredential(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::error::ConnectionError;

    #[test]
    fn defaults_point_at_san_francisco() {
        let config = ForecastConfig::default();
        assert_eq!(config.weather.latitude, SF_LATITUDE);
        assert_eq!(config.weather.longitude, SF_LONGITUDE);
        assert_eq!(config.atlas.location_key, "SF");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn unparsable_timeout_falls_back_to_default() {
        assert_eq!(parse_timeout(" 5 "), Some(Duration::from_secs(5)));
        assert_eq!(parse_timeout("5s"), None);
        assert_eq!(parse_timeout("-1"), None);
        let config = ForecastConfig {
            request_timeout: parse_timeout("soon"),
            ..ForecastConfig::default()
        };
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn blank_credentials_are_missing() {
        assert!(matches!(
            required(&None, "USER_ATLAS"),
            Err(ConnectionError::MissingCredential("USER_ATLAS"))
        ));
        assert!(matches!(
            required(&Some("  ".to_string()), "PSW_ATLAS"),
            Err(ConnectionError::MissingCredential("PSW_ATLAS"))
        ));
        assert_eq!(required(&Some("user".to_string()), "USER_ATLAS").unwrap(), "user");
    }
}
