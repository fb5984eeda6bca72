//! Turns a pair of trained models into hourly forecast points.

use crate::model::trained::TrainedModel;
use crate::types::forecast_point::{hour_label, ForecastBounds, ForecastPoint, ForecastResult};
use crate::types::period::Period;
use chrono::{DateTime, TimeDelta, Timelike, Utc};

/// Offset between the request time and the first forecast hour.
pub const FORECAST_LEAD: TimeDelta = TimeDelta::hours(3);

/// First forecast hour for a request made at `now`: three hours later, with
/// seconds and sub-seconds cleared.
pub fn forecast_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let shifted = now + FORECAST_LEAD;
    shifted
        - TimeDelta::seconds(i64::from(shifted.second()))
        - TimeDelta::nanoseconds(i64::from(shifted.nanosecond()))
}

/// Forecasts `period` consecutive hours starting at [`forecast_start`].
///
/// The 95% bounds of both models are attached when `include_bounds` is set.
pub fn model_forecast_points(
    temperature: &TrainedModel,
    humidity: &TrainedModel,
    period: Period,
    now: DateTime<Utc>,
    include_bounds: bool,
) -> ForecastResult {
    let steps = period.hours();
    let temp = temperature.forecast(steps);
    let hum = humidity.forecast(steps);
    let start = forecast_start(now);

    (0..steps)
        .map(|step| {
            let at = start + TimeDelta::hours(step as i64);
            ForecastPoint {
                hour: hour_label(at),
                temp: temp.mean[step],
                hum: hum.mean[step],
                bounds: include_bounds.then(|| ForecastBounds {
                    temp_lower: temp.lower[step],
                    temp_upper: temp.upper[step],
                    hum_lower: hum.lower[step],
                    hum_upper: hum.upper[step],
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::arima::{ArimaModel, ArimaOrder};
    use crate::types::variable::Variable;
    use chrono::TimeZone;

    fn mean_model(variable: Variable, series: &[f64]) -> TrainedModel {
        let arima = ArimaModel::fit(series, ArimaOrder::new(0, 0, 0), true).unwrap();
        TrainedModel::new(variable, arima)
    }

    #[test]
    fn start_is_three_hours_ahead_on_the_minute() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 45).unwrap() + TimeDelta::milliseconds(250);
        assert_eq!(
            forecast_start(now),
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn produces_hourly_points_for_the_period() {
        let temp = mean_model(Variable::Temperature, &[15.0, 16.0, 14.0]);
        let hum = mean_model(Variable::Humidity, &[60.0, 62.0, 61.0]);
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 45).unwrap();

        let points =
            model_forecast_points(&temp, &hum, Period::new(3).unwrap(), now, false);
        let hours: Vec<_> = points.iter().map(|p| p.hour.as_str()).collect();
        assert_eq!(hours, ["01-01 12:30", "01-01 13:30", "01-01 14:30"]);
        for point in &points {
            assert!((point.temp - 15.0).abs() < 1e-9);
            assert!((point.hum - 61.0).abs() < 1e-9);
            assert!(point.bounds.is_none());
        }
    }

    #[test]
    fn labels_roll_over_midnight() {
        let temp = mean_model(Variable::Temperature, &[15.0, 16.0, 14.0]);
        let hum = mean_model(Variable::Humidity, &[60.0, 62.0, 61.0]);
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 22, 0, 0).unwrap();

        let points =
            model_forecast_points(&temp, &hum, Period::new(2).unwrap(), now, false);
        assert_eq!(points[0].hour, "01-01 01:00");
        assert_eq!(points[1].hour, "01-01 02:00");
    }

    #[test]
    fn longest_period_produces_every_hour() {
        let temp = mean_model(Variable::Temperature, &[15.0, 16.0, 14.0]);
        let hum = mean_model(Variable::Humidity, &[60.0, 62.0, 61.0]);
        let period = Period::new(crate::types::period::MAX_PERIOD_HOURS).unwrap();
        let points = model_forecast_points(&temp, &hum, period, Utc::now(), true);
        assert_eq!(points.len(), 8760);
        assert!(points.iter().all(|p| p.temp.is_finite() && p.bounds.is_some()));
    }

    #[test]
    fn bounds_surround_the_point_forecast() {
        let temp = mean_model(Variable::Temperature, &[15.0, 16.0, 14.0]);
        let hum = mean_model(Variable::Humidity, &[60.0, 62.0, 61.0]);
        let points =
            model_forecast_points(&temp, &hum, Period::new(4).unwrap(), Utc::now(), true);
        for point in points {
            let bounds = point.bounds.unwrap();
            assert!(bounds.temp_lower < point.temp && point.temp < bounds.temp_upper);
            assert!(bounds.hum_lower < point.hum && point.hum < bounds.hum_upper);
        }
    }
}
