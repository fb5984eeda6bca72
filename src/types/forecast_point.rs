//! The uniform output shape shared by both forecasting strategies.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Format of the `hour` label on every [`ForecastPoint`], e.g. `"07-03 14:00"`.
pub const HOUR_LABEL_FORMAT: &str = "%d-%m %H:%M";

/// Renders a UTC timestamp as a forecast hour label (`dd-mm HH:MM`).
pub fn hour_label(at: DateTime<Utc>) -> String {
    at.format(HOUR_LABEL_FORMAT).to_string()
}

/// Lower and upper 95% confidence bounds for one forecast hour.
///
/// Only the model strategy can produce these; they are attached when the
/// forecaster is built with intervals enabled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastBounds {
    pub temp_lower: f64,
    pub temp_upper: f64,
    pub hum_lower: f64,
    pub hum_upper: f64,
}

/// A single forecast hour.
///
/// Serializes to `{"hour": "dd-mm HH:MM", "temp": <number>, "hum": <number>}`,
/// plus a `bounds` object when confidence bounds were requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// Human readable hour label in UTC, see [`HOUR_LABEL_FORMAT`].
    pub hour: String,
    /// Temperature in degrees Celsius.
    pub temp: f64,
    /// Relative humidity in percent as reported by the strategy.
    pub hum: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<ForecastBounds>,
}

/// Ordered forecast, one point per requested hour, earliest first.
pub type ForecastResult = Vec<ForecastPoint>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn label_is_day_month_hour_minute() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 14, 5, 59).unwrap();
        assert_eq!(hour_label(at), "07-03 14:05");
    }

    #[test]
    fn serializes_without_bounds_by_default() {
        let point = ForecastPoint {
            hour: "01-02 03:00".to_string(),
            temp: 15.5,
            hum: 60.0,
            bounds: None,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"hour": "01-02 03:00", "temp": 15.5, "hum": 60.0})
        );
    }
}
