use chrono::{DateTime, NaiveDate, Utc};
use common::errors::AppError;
use common::models::{
    AlternativeDates, CacheStats, Event, EventWeatherAnalysis, ForecastWindow, SuitabilityResult,
    WeatherSnapshot,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::alternatives;
use crate::api_client::WeatherProvider;
use crate::cache::{CacheKey, CachedWeather, WeatherCache};
use crate::clock::Clock;
use crate::resolver::{self, DateQuery};
use crate::scoring;

/// Weather suitability operations over a cached provider.
///
/// Concurrent misses for the same key each reach the provider and each store
/// their result; there is no in-flight deduplication.
pub struct WeatherService<P> {
    provider: P,
    cache: Arc<WeatherCache>,
    clock: Arc<dyn Clock>,
}

impl<P: WeatherProvider> WeatherService<P> {
    pub fn new(provider: P, cache: Arc<WeatherCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            cache,
            clock,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_current_weather(&self, location: &str) -> Result<WeatherSnapshot, AppError> {
        let key = CacheKey::current(location);
        if let Some(CachedWeather::Current(cached)) = self.cache.get(&key).await {
            info!(location = %location, "Cache hit for current weather");
            return Ok(cached);
        }

        let weather = self.provider.fetch_current(location).await?;
        self.cache
            .set(key, CachedWeather::Current(weather.clone()))
            .await;

        info!(location = %location, "Fetched current weather");
        Ok(weather)
    }

    #[instrument(skip(self))]
    pub async fn get_forecast(&self, location: &str) -> Result<ForecastWindow, AppError> {
        let key = CacheKey::forecast(location);
        if let Some(CachedWeather::Forecast(cached)) = self.cache.get(&key).await {
            info!(location = %location, "Cache hit for forecast");
            return Ok(cached);
        }

        let forecast = self.provider.fetch_forecast(location).await?;
        self.cache
            .set(key, CachedWeather::Forecast(forecast.clone()))
            .await;

        info!(location = %location, slots = forecast.list.len(), "Fetched forecast");
        Ok(forecast)
    }

    pub async fn get_weather_for_location_and_date(
        &self,
        location: &str,
        date: NaiveDate,
    ) -> Result<WeatherSnapshot, AppError> {
        self.resolve(location, date, self.clock.now()).await
    }

    /// Weather for `location` on `target`, as seen from `now`
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        location: &str,
        target: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<WeatherSnapshot, AppError> {
        match resolver::plan(target, now)? {
            DateQuery::Current => self.get_current_weather(location).await,
            DateQuery::Forecast { days_ahead } => {
                debug!(days_ahead, "Resolving date from forecast");
                let forecast = self.get_forecast(location).await?;
                resolver::slot_for_date(&forecast, target)
                    .cloned()
                    .ok_or_else(|| AppError::ForecastUnavailable(target.to_string()))
            }
        }
    }

    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn analyze_event_weather(
        &self,
        event: &Event,
    ) -> Result<EventWeatherAnalysis, AppError> {
        let weather = self
            .get_weather_for_location_and_date(&event.location, event.date)
            .await
            .inspect_err(|e| error!(error = %e, "Error analyzing weather for event"))?;
        let suitability = scoring::score(&weather, &event.event_type);

        Ok(EventWeatherAnalysis {
            event_id: event.id,
            weather,
            suitability,
            analyzed_at: self.clock.now(),
        })
    }

    pub async fn get_event_suitability(
        &self,
        event: &Event,
    ) -> Result<SuitabilityResult, AppError> {
        Ok(self.analyze_event_weather(event).await?.suitability)
    }

    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn get_alternative_dates(
        &self,
        event: &Event,
        days_range: u32,
    ) -> Result<AlternativeDates, AppError> {
        let forecast = self
            .get_forecast(&event.location)
            .await
            .inspect_err(|e| error!(error = %e, "Error getting alternative dates"))?;

        let ranked = alternatives::rank(&forecast, &event.event_type, event.date, days_range);
        info!(candidates = ranked.alternatives.len(), "Ranked alternative dates");
        Ok(ranked)
    }

    pub async fn get_cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("Weather cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone};
    use common::models::Rating;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn snapshot(at: DateTime<Utc>, temperature: f64, condition: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            location: "London".to_string(),
            country: "GB".to_string(),
            temperature,
            feels_like: temperature,
            humidity: 70,
            pressure: 1011,
            wind_speed: 12.0,
            wind_direction: 240,
            condition: condition.to_string(),
            description: condition.to_lowercase(),
            precipitation: 0.0,
            visibility: Some(10.0),
            timestamp: at,
        }
    }

    #[derive(Default)]
    struct FakeProvider {
        current_calls: AtomicUsize,
        forecast_calls: AtomicUsize,
        fail_with_not_found: bool,
        skip_day: Option<NaiveDate>,
    }

    impl WeatherProvider for FakeProvider {
        async fn fetch_current(&self, location: &str) -> Result<WeatherSnapshot, AppError> {
            self.current_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_with_not_found {
                return Err(AppError::location_not_found(location));
            }
            Ok(snapshot(start(), 22.0, "Clear"))
        }

        async fn fetch_forecast(&self, location: &str) -> Result<ForecastWindow, AppError> {
            self.forecast_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_with_not_found {
                return Err(AppError::location_not_found(location));
            }
            // Five days of 3-hour slots from midnight tomorrow, each day one degree warmer
            let midnight = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
            let list = (0..40)
                .map(|i| {
                    let at = midnight + Duration::hours(3 * i);
                    snapshot(at, 15.0 + (i / 8) as f64, "Clear")
                })
                .filter(|s| Some(s.timestamp.date_naive()) != self.skip_day)
                .collect();
            Ok(ForecastWindow {
                location: location.to_string(),
                country: "GB".to_string(),
                fetched_at: start(),
                list,
            })
        }
    }

    fn service(provider: FakeProvider) -> (Arc<ManualClock>, WeatherService<FakeProvider>) {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = Arc::new(WeatherCache::new(clock.clone()));
        (clock.clone(), WeatherService::new(provider, cache, clock))
    }

    fn event(date: NaiveDate, event_type: &str) -> Event {
        Event {
            id: Uuid::new_v4(),
            name: "Summer party".to_string(),
            location: "London".to_string(),
            date,
            event_type: event_type.to_string(),
            description: String::new(),
            duration: 4,
            participants: 20,
            requirements: Default::default(),
            created_at: start(),
            updated_at: start(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[tokio::test]
    async fn current_weather_is_cached_for_an_hour() {
        let (clock, service) = service(FakeProvider::default());

        service.get_current_weather("London").await.unwrap();
        service.get_current_weather("London").await.unwrap();
        assert_eq!(service.provider.current_calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::hours(1));
        service.get_current_weather("London").await.unwrap();
        assert_eq!(service.provider.current_calls.load(Ordering::SeqCst), 2);

        let stats = service.get_cache_stats().await;
        assert_eq!((stats.hits, stats.misses), (1, 2));
        assert_eq!(stats.keys, vec!["current_London"]);
    }

    #[tokio::test]
    async fn provider_errors_are_not_cached() {
        let (_clock, service) = service(FakeProvider {
            fail_with_not_found: true,
            ..Default::default()
        });

        for _ in 0..2 {
            let err = service.get_forecast("Atlantis").await.unwrap_err();
            assert!(matches!(err, AppError::LocationNotFound(_)));
        }
        assert_eq!(service.provider.forecast_calls.load(Ordering::SeqCst), 2);
        assert_eq!(service.get_cache_stats().await.cache_size, 0);
    }

    #[tokio::test]
    async fn resolves_today_from_current_weather() {
        let (_clock, service) = service(FakeProvider::default());

        let weather = service.resolve("London", day(1), start()).await.unwrap();

        assert_eq!(weather.timestamp, start());
        assert_eq!(service.provider.current_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.provider.forecast_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolves_future_day_from_forecast_slot() {
        let (_clock, service) = service(FakeProvider::default());

        let weather = service.resolve("London", day(4), start()).await.unwrap();

        assert_eq!(weather.timestamp.date_naive(), day(4));
        assert_eq!(weather.temperature, 17.0);
    }

    #[tokio::test]
    async fn missing_slot_is_forecast_unavailable() {
        let (_clock, service) = service(FakeProvider {
            skip_day: Some(day(3)),
            ..Default::default()
        });

        let err = service.resolve("London", day(3), start()).await.unwrap_err();
        assert!(matches!(err, AppError::ForecastUnavailable(_)));
    }

    #[tokio::test]
    async fn out_of_range_dates_never_reach_the_provider() {
        let (_clock, service) = service(FakeProvider::default());

        let err = service.resolve("London", day(7), start()).await.unwrap_err();
        assert!(matches!(err, AppError::DateOutOfRange(_)));
        let yesterday = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
        let err = service.resolve("London", yesterday, start()).await.unwrap_err();
        assert!(matches!(err, AppError::PastDateRejected(_)));

        assert_eq!(service.provider.current_calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.provider.forecast_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn analysis_uses_injected_clock() {
        let (clock, service) = service(FakeProvider::default());
        clock.advance(Duration::minutes(5));

        let analysis = service
            .analyze_event_weather(&event(day(1), "wedding"))
            .await
            .unwrap();

        assert_eq!(analysis.analyzed_at, start() + Duration::minutes(5));
        assert_eq!(analysis.suitability.score, 100);
        assert_eq!(analysis.suitability.rating, Rating::Excellent);

        let suitability = service
            .get_event_suitability(&event(day(1), "wedding"))
            .await
            .unwrap();
        assert_eq!(suitability, analysis.suitability);
    }

    #[tokio::test]
    async fn alternatives_come_from_one_forecast_fetch() {
        let (_clock, service) = service(FakeProvider::default());

        let ranked = service
            .get_alternative_dates(&event(day(1), "hiking"), 7)
            .await
            .unwrap();

        // Slots cover June 2..=6; hiking prefers 10..=25°C so every day is ideal
        assert_eq!(ranked.alternatives.len(), 5);
        assert_eq!(ranked.best_alternative.as_ref().map(|a| a.date), Some(day(2)));
        assert_eq!(service.provider.forecast_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn alternatives_propagate_provider_failure() {
        let (_clock, service) = service(FakeProvider {
            fail_with_not_found: true,
            ..Default::default()
        });

        let err = service
            .get_alternative_dates(&event(day(1), "hiking"), 7)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LocationNotFound(_)));
    }

    #[tokio::test]
    async fn clear_cache_forces_refetch() {
        let (_clock, service) = service(FakeProvider::default());
        service.get_forecast("London").await.unwrap();

        service.clear_cache().await;
        let stats = service.get_cache_stats().await;
        assert_eq!((stats.hits, stats.misses, stats.cache_size), (0, 0, 0));

        service.get_forecast("London").await.unwrap();
        assert_eq!(service.provider.forecast_calls.load(Ordering::SeqCst), 2);
    }
}
