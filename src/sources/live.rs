//! Hourly forecasts from a Dark Sky compatible weather API.

use crate::config::{required, WeatherApiConfig};
use crate::sources::error::ConnectionError;
use crate::sources::send_checked;
use log::info;
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// One hour of the provider's forecast.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HourlyRecord {
    /// Unix timestamp in seconds.
    pub time: i64,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity as a fraction in `[0, 1]`.
    pub humidity: f64,
}

/// Supplies the provider's hourly forecast records, earliest first.
pub trait LiveSource: Send + Sync {
    fn fetch_hourly(
        &self,
    ) -> impl Future<Output = Result<Vec<HourlyRecord>, ConnectionError>> + Send;
}

#[derive(Debug, Clone)]
pub struct WeatherApiSource {
    config: WeatherApiConfig,
    client: Client,
}

impl WeatherApiSource {
    pub fn new(config: WeatherApiConfig, timeout: Duration) -> Result<Self, ConnectionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConnectionError::ClientBuild)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &WeatherApiConfig {
        &self.config
    }

    fn location_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{},{}",
            self.config.endpoint.trim_end_matches('/'),
            key,
            self.config.latitude,
            self.config.longitude
        )
    }
}

impl LiveSource for WeatherApiSource {
    async fn fetch_hourly(&self) -> Result<Vec<HourlyRecord>, ConnectionError> {
        let key = required(&self.config.api_key, "WEATHER_KEY")?;
        let url = self.location_url(key);
        // The key is part of the path; keep it out of logs and errors.
        let shown_url = self.location_url("<key>");
        info!("Requesting hourly forecast from {}", shown_url);

        let request = self
            .client
            .get(&url)
            .query(&[("extend", "hourly"), ("units", "si")]);
        let response = send_checked(request, &shown_url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ConnectionError::NetworkRequest(shown_url.clone(), e))?;

        let records = parse_forecast(&bytes, &shown_url)?;
        info!("Received {} hourly records", records.len());
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: HourlyBlock,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    data: Vec<HourlyRecord>,
}

fn parse_forecast(body: &[u8], url: &str) -> Result<Vec<HourlyRecord>, ConnectionError> {
    let response: ForecastResponse =
        serde_json::from_slice(body).map_err(|e| ConnectionError::InvalidResponse {
            url: url.to_string(),
            source: e,
        })?;

    for (position, record) in response.hourly.data.iter().enumerate() {
        if !(0.0..=1.0).contains(&record.humidity) {
            return Err(ConnectionError::SchemaViolation {
                url: url.to_string(),
                message: format!(
                    "hourly record {} has humidity {} outside [0, 1]",
                    position, record.humidity
                ),
            });
        }
        if !record.temperature.is_finite() {
            return Err(ConnectionError::SchemaViolation {
                url: url.to_string(),
                message: format!("hourly record {} has no finite temperature", position),
            });
        }
    }
    Ok(response.hourly.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://weather.example/forecast/<key>/1,2";

    #[test]
    fn parses_hourly_block_and_ignores_extra_fields() {
        let body = br#"{
            "latitude": 37.77, "longitude": -122.41,
            "currently": {"time": 1700000000, "temperature": 14.0},
            "hourly": {"summary": "Clear", "data": [
                {"time": 1700000000, "summary": "Clear", "temperature": 14.2, "humidity": 0.81, "windSpeed": 3.1},
                {"time": 1700003600, "temperature": 13.9, "humidity": 0.83}
            ]}
        }"#;
        let records = parse_forecast(body, URL).unwrap();
        assert_eq!(
            records,
            vec![
                HourlyRecord { time: 1_700_000_000, temperature: 14.2, humidity: 0.81 },
                HourlyRecord { time: 1_700_003_600, temperature: 13.9, humidity: 0.83 },
            ]
        );
    }

    #[test]
    fn humidity_outside_unit_interval_is_rejected() {
        let body = br#"{"hourly": {"data": [{"time": 1, "temperature": 10.0, "humidity": 81}]}}"#;
        assert!(matches!(
            parse_forecast(body, URL),
            Err(ConnectionError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn missing_fields_are_rejected() {
        let body = br#"{"hourly": {"data": [{"time": 1, "temperature": 10.0}]}}"#;
        assert!(matches!(
            parse_forecast(body, URL),
            Err(ConnectionError::InvalidResponse { .. })
        ));
        assert!(matches!(
            parse_forecast(br#"{"daily": {}}"#, URL),
            Err(ConnectionError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn url_embeds_key_and_location() {
        let source = WeatherApiSource::new(
            WeatherApiConfig {
                endpoint: "https://weather.example/forecast/".to_string(),
                ..WeatherApiConfig::default()
            },
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            source.location_url("abc"),
            "https://weather.example/forecast/abc/37.774929,-122.4194183"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let source = WeatherApiSource::new(
            WeatherApiConfig {
                endpoint: "http://127.0.0.1:9".to_string(),
                ..WeatherApiConfig::default()
            },
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(matches!(
            source.fetch_hourly().await,
            Err(ConnectionError::MissingCredential("WEATHER_KEY"))
        ));
    }
}
