use chrono::{Days, NaiveDate};
use common::models::{AlternativeDate, AlternativeDates, ForecastWindow, Improvement};
use tracing::debug;

use crate::resolver::slot_for_date;
use crate::scoring;

/// Upper bound on returned candidates
pub const MAX_ALTERNATIVES: usize = 5;

pub const DEFAULT_DAYS_RANGE: u32 = 7;

/// Rank the days `original_date + 1 ..= original_date + days_range` by suitability.
///
/// Days the forecast does not cover are skipped. Equal scores keep calendar order.
pub fn rank(
    forecast: &ForecastWindow,
    event_type: &str,
    original_date: NaiveDate,
    days_range: u32,
) -> AlternativeDates {
    let mut alternatives: Vec<AlternativeDate> = (1..=days_range)
        .filter_map(|offset| original_date.checked_add_days(Days::new(u64::from(offset))))
        .filter_map(|date| {
            let Some(slot) = slot_for_date(forecast, date) else {
                debug!(%date, "No forecast slot for candidate date");
                return None;
            };
            let suitability = scoring::score(slot, event_type);
            Some(AlternativeDate {
                date,
                weather: slot.clone(),
                improvement: Improvement::from_score(suitability.score),
                suitability,
            })
        })
        .collect();

    // Stable: ties stay in calendar order
    alternatives.sort_by(|a, b| b.suitability.score.cmp(&a.suitability.score));
    alternatives.truncate(MAX_ALTERNATIVES);

    AlternativeDates {
        original_date,
        best_alternative: alternatives.first().cloned(),
        alternatives,
    }
}
