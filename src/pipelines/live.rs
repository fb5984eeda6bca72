//! Reshapes the provider's hourly records into forecast points.

use crate::error::ForecastError;
use crate::sources::live::HourlyRecord;
use crate::types::forecast_point::{hour_label, ForecastPoint, ForecastResult};
use crate::types::period::Period;
use chrono::DateTime;

/// Leading records dropped from every provider response before the forecast
/// window starts.
pub const SKIPPED_RECORDS: usize = 4;

/// Takes the `period` records following the first [`SKIPPED_RECORDS`].
///
/// Humidity is converted from a fraction to percent.
pub fn api_forecast_points(
    records: &[HourlyRecord],
    period: Period,
) -> Result<ForecastResult, ForecastError> {
    let required = SKIPPED_RECORDS
        .checked_add(period.hours())
        .filter(|required| *required <= records.len())
        .ok_or(ForecastError::InsufficientData {
            required: SKIPPED_RECORDS.saturating_add(period.hours()),
            available: records.len(),
        })?;

    records[SKIPPED_RECORDS..required]
        .iter()
        .map(|record| {
            let at = DateTime::from_timestamp(record.time, 0)
                .ok_or(ForecastError::InvalidTimestamp(record.time))?;
            Ok(ForecastPoint {
                hour: hour_label(at),
                temp: record.temperature,
                hum: record.humidity * 100.0,
                bounds: None,
            })
        })
        .collect()
}
