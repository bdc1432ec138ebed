use chrono::{DateTime, NaiveDate, Utc};
use common::errors::AppError;
use common::models::{ForecastWindow, WeatherSnapshot};

/// Days ahead the upstream forecast covers
pub const FORECAST_HORIZON_DAYS: i64 = 5;

/// Which upstream query can serve a target date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateQuery {
    Current,
    Forecast { days_ahead: i64 },
}

/// Whole calendar days (UTC) from `now` to `target`
pub fn days_between(now: DateTime<Utc>, target: NaiveDate) -> i64 {
    (target - now.date_naive()).num_days()
}

/// Decide how a target date is served relative to `now`.
///
/// Today maps to current weather, 1..=5 days ahead to the forecast, anything
/// earlier or later is rejected.
pub fn plan(target: NaiveDate, now: DateTime<Utc>) -> Result<DateQuery, AppError> {
    match days_between(now, target) {
        diff if diff < 0 => Err(AppError::PastDateRejected(target.to_string())),
        0 => Ok(DateQuery::Current),
        diff if diff <= FORECAST_HORIZON_DAYS => Ok(DateQuery::Forecast { days_ahead: diff }),
        _ => Err(AppError::DateOutOfRange(target.to_string())),
    }
}

/// First forecast slot falling on `date` (UTC)
pub fn slot_for_date(forecast: &ForecastWindow, date: NaiveDate) -> Option<&WeatherSnapshot> {
    forecast
        .list
        .iter()
        .find(|slot| slot.timestamp.date_naive() == date)
}
