use chrono::{DateTime, Utc};
use common::errors::AppError;
use common::http_client::HttpClient;
use common::models::{ForecastWindow, WeatherSnapshot};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::clock::Clock;
use crate::config::Config;

/// Upstream source of current weather and 5-day/3-hour forecasts.
///
/// Implementations make one outbound call per invocation and never cache.
pub trait WeatherProvider: Send + Sync {
    fn fetch_current(
        &self,
        location: &str,
    ) -> impl Future<Output = Result<WeatherSnapshot, AppError>> + Send;

    fn fetch_forecast(
        &self,
        location: &str,
    ) -> impl Future<Output = Result<ForecastWindow, AppError>> + Send;
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct WindReadings {
    speed: f64,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ConditionReading {
    main: String,
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct RainReadings {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct CountryInfo {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    name: String,
    #[serde(default)]
    sys: CountryInfo,
    main: MainReadings,
    wind: WindReadings,
    #[serde(default)]
    weather: Vec<ConditionReading>,
    rain: Option<RainReadings>,
    visibility: Option<f64>,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct ForecastCity {
    name: String,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt: i64,
    main: MainReadings,
    wind: WindReadings,
    #[serde(default)]
    weather: Vec<ConditionReading>,
    rain: Option<RainReadings>,
    visibility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    city: ForecastCity,
    list: Vec<ForecastItem>,
}

/// Client for the OpenWeather 2.5 `weather` and `forecast` endpoints
pub struct OpenWeatherClient {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
    clock: Arc<dyn Clock>,
    rate_limiter: Arc<Semaphore>,
    last_request_time: Arc<tokio::sync::Mutex<Option<Instant>>>,
    min_request_interval: Duration,
}

impl OpenWeatherClient {
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let rate_limit_per_minute = config.rate_limit_per_minute.max(1);
        let min_request_interval = Duration::from_millis(60_000 / rate_limit_per_minute as u64);
        Ok(Self {
            http_client: HttpClient::new(config.http_timeout_seconds, config.http_max_retries)?,
            base_url: config.openweather_url.trim_end_matches('/').to_string(),
            api_key: config.openweather_api_key.clone(),
            clock,
            rate_limiter: Arc::new(Semaphore::new(rate_limit_per_minute as usize)),
            last_request_time: Arc::new(tokio::sync::Mutex::new(None)),
            min_request_interval,
        })
    }

    fn endpoint(&self, path: &str, location: &str) -> String {
        format!(
            "{}/{}?q={}&appid={}&units=metric",
            self.base_url,
            path,
            urlencoding::encode(location),
            urlencoding::encode(&self.api_key)
        )
    }

    async fn get<T>(&self, path: &str, location: &str) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| AppError::internal(format!("Rate limiter error: {}", e)))?;

        self.debounce().await;

        self.http_client
            .get_json(&self.endpoint(path, location))
            .await
            .map_err(|e| classify_error(e, location))
    }

    async fn debounce(&self) {
        let mut last_request = self.last_request_time.lock().await;
        if let Some(last) = *last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_request_interval {
                let wait_time = self.min_request_interval - elapsed;
                warn!(wait_ms = wait_time.as_millis(), "Debouncing request");
                tokio::time::sleep(wait_time).await;
            }
        }
        *last_request = Some(Instant::now());
    }
}

impl WeatherProvider for OpenWeatherClient {
    #[instrument(skip(self), fields(location = %location))]
    async fn fetch_current(&self, location: &str) -> Result<WeatherSnapshot, AppError> {
        info!("Fetching current weather from provider");

        let response: CurrentWeatherResponse = self.get("weather", location).await?;
        let country = response.sys.country.unwrap_or_default();
        let precipitation = response.rain.and_then(|r| r.one_hour).unwrap_or(0.0);

        to_snapshot(
            response.name,
            country,
            response.dt,
            response.main,
            response.wind,
            response.weather,
            precipitation,
            response.visibility,
        )
    }

    #[instrument(skip(self), fields(location = %location))]
    async fn fetch_forecast(&self, location: &str) -> Result<ForecastWindow, AppError> {
        info!("Fetching forecast from provider");

        let response: ForecastResponse = self.get("forecast", location).await?;
        let country = response.city.country.unwrap_or_default();

        let mut list = response
            .list
            .into_iter()
            .map(|item| {
                let precipitation = item.rain.and_then(|r| r.three_hours).unwrap_or(0.0);
                to_snapshot(
                    response.city.name.clone(),
                    country.clone(),
                    item.dt,
                    item.main,
                    item.wind,
                    item.weather,
                    precipitation,
                    item.visibility,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        list.sort_by_key(|slot| slot.timestamp);

        info!(slots = list.len(), "Forecast received");

        Ok(ForecastWindow {
            location: response.city.name,
            country,
            fetched_at: self.clock.now(),
            list,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn to_snapshot(
    location: String,
    country: String,
    dt: i64,
    main: MainReadings,
    wind: WindReadings,
    weather: Vec<ConditionReading>,
    precipitation: f64,
    visibility_m: Option<f64>,
) -> Result<WeatherSnapshot, AppError> {
    let timestamp = DateTime::<Utc>::from_timestamp(dt, 0)
        .ok_or_else(|| AppError::upstream(format!("Invalid timestamp {} from provider", dt)))?;
    let (condition, description) = weather
        .into_iter()
        .next()
        .map(|w| (w.main, w.description))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()));

    Ok(WeatherSnapshot {
        location,
        country,
        temperature: main.temp.round(),
        feels_like: main.feels_like.round(),
        humidity: main.humidity.round().max(0.0) as u32,
        pressure: main.pressure.round().max(0.0) as u32,
        wind_speed: ms_to_kmh(wind.speed),
        wind_direction: wind.deg.unwrap_or(0.0).round().max(0.0) as u32,
        condition,
        description,
        precipitation: precipitation.max(0.0),
        visibility: visibility_m.map(|m| m / 1000.0),
        timestamp,
    })
}

/// m/s to whole km/h
fn ms_to_kmh(speed: f64) -> f64 {
    (speed * 3.6).round().max(0.0)
}

fn classify_error(err: AppError, location: &str) -> AppError {
    match err {
        AppError::HttpError { status: 404, .. } => AppError::location_not_found(location),
        AppError::HttpError { status: 429, message } => AppError::rate_limited(message),
        e @ (AppError::UpstreamUnavailable(_)
        | AppError::UpstreamRateLimited(_)
        | AppError::LocationNotFound(_)) => e,
        other => {
            warn!(location = %location, error = %other, "Weather provider request failed");
            AppError::upstream(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_wind_to_rounded_kmh() {
        assert_eq!(ms_to_kmh(0.0), 0.0);
        assert_eq!(ms_to_kmh(5.0), 18.0);
        assert_eq!(ms_to_kmh(4.12), 15.0);
    }

    #[test]
    fn http_404_means_unknown_location() {
        let err = classify_error(AppError::http(404, "city not found"), "Nowhere");
        assert!(matches!(err, AppError::LocationNotFound(ref l) if l == "Nowhere"));
    }

    #[test]
    fn transport_failures_become_upstream_unavailable() {
        let err = classify_error(AppError::http(502, "bad gateway"), "Paris");
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));

        let err = classify_error(AppError::timeout("slow"), "Paris");
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));

        let err = classify_error(AppError::http(429, "too many"), "Paris");
        assert!(matches!(err, AppError::UpstreamRateLimited(_)));
    }

    #[test]
    fn snapshot_defaults_missing_rain_and_condition() {
        let snapshot = to_snapshot(
            "Oslo".to_string(),
            "NO".to_string(),
            1_717_243_200,
            MainReadings {
                temp: 11.6,
                feels_like: 10.4,
                humidity: 80.0,
                pressure: 1009.0,
            },
            WindReadings {
                speed: 2.0,
                deg: None,
            },
            Vec::new(),
            0.0,
            None,
        )
        .unwrap();

        assert_eq!(snapshot.temperature, 12.0);
        assert_eq!(snapshot.feels_like, 10.0);
        assert_eq!(snapshot.wind_speed, 7.0);
        assert_eq!(snapshot.wind_direction, 0);
        assert_eq!(snapshot.condition, "Unknown");
        assert_eq!(snapshot.precipitation, 0.0);
        assert_eq!(snapshot.visibility, None);
        assert_eq!(snapshot.timestamp.to_rfc3339(), "2024-06-01T12:00:00+00:00");
    }
}
