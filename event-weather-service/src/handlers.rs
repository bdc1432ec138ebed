use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::Json,
};
use axum_extra::extract::Query;
use chrono::{DateTime, NaiveDate, Utc};
use common::errors::AppError;
use common::models::{
    AlternativeDates, CacheStats, CreateEventRequest, Event, EventCreatedResponse,
    EventListResponse, EventWeatherAnalysis, ForecastWindow, SuitabilityResult,
    UpdateEventRequest, WeatherSnapshot,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::alternatives::DEFAULT_DAYS_RANGE;
use crate::api_client::OpenWeatherClient;
use crate::clock::Clock;
use crate::events::{EventFilter, EventStore};
use crate::rate_limit::ClientRateLimiter;
use crate::service::WeatherService;

/// Largest alternative-date window accepted from clients
pub const MAX_DAYS_RANGE: u32 = 30;

#[derive(Clone)]
pub struct AppState {
    pub weather: Arc<WeatherService<OpenWeatherClient>>,
    pub events: Arc<EventStore>,
    pub clock: Arc<dyn Clock>,
    pub client_limiter: ClientRateLimiter,
    pub started_at: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health check")
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let now = state.clock.now();
    let uptime = (now - state.started_at).num_milliseconds().max(0) as f64 / 1000.0;

    Json(serde_json::json!({
        "status": "ok",
        "service": "event-weather-service",
        "timestamp": now,
        "uptime": uptime,
    }))
}

/// JSON 404 for paths no route matches
pub async fn route_not_found(uri: Uri) -> (StatusCode, Json<serde_json::Value>) {
    warn!(path = %uri.path(), "Route not found");
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Route not found",
            "path": uri.path(),
        })),
    )
}

#[utoipa::path(
    get,
    path = "/api/weather/{location}/current",
    params(
        ("location" = String, Path, description = "Location name")
    ),
    responses(
        (status = 200, description = "Current weather", body = WeatherSnapshot),
        (status = 404, description = "Unknown location"),
        (status = 503, description = "Weather provider unavailable")
    ),
    tag = "weather"
)]
pub async fn get_current_weather(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> Result<Json<WeatherSnapshot>, AppError> {
    info!(location = %location, "Current weather request received");

    let weather = state.weather.get_current_weather(&location).await?;

    Ok(Json(weather))
}

#[utoipa::path(
    get,
    path = "/api/weather/{location}/forecast",
    params(
        ("location" = String, Path, description = "Location name")
    ),
    responses(
        (status = 200, description = "5-day forecast in 3-hour slots", body = ForecastWindow),
        (status = 404, description = "Unknown location"),
        (status = 503, description = "Weather provider unavailable")
    ),
    tag = "weather"
)]
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> Result<Json<ForecastWindow>, AppError> {
    info!(location = %location, "Forecast request received");

    let forecast = state.weather.get_forecast(&location).await?;

    Ok(Json(forecast))
}

#[utoipa::path(
    get,
    path = "/api/weather/{location}/{date}",
    params(
        ("location" = String, Path, description = "Location name"),
        ("date" = String, Path, description = "Target date, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Weather for the date", body = WeatherSnapshot),
        (status = 400, description = "Invalid, past or out-of-range date"),
        (status = 404, description = "Unknown location or no forecast slot for the date")
    ),
    tag = "weather"
)]
pub async fn get_weather_for_date(
    State(state): State<AppState>,
    Path((location, date)): Path<(String, String)>,
) -> Result<Json<WeatherSnapshot>, AppError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::validation("Invalid date format. Use YYYY-MM-DD"))?;
    info!(location = %location, %date, "Dated weather request received");

    let weather = state
        .weather
        .get_weather_for_location_and_date(&location, date)
        .await?;

    Ok(Json(weather))
}

#[utoipa::path(
    get,
    path = "/api/weather/cache/status",
    responses(
        (status = 200, description = "Cache counters and live keys", body = CacheStats)
    ),
    tag = "weather"
)]
pub async fn cache_status(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.weather.get_cache_stats().await)
}

#[utoipa::path(
    delete,
    path = "/api/weather/cache/clear",
    responses(
        (status = 200, description = "Cache flushed and counters reset")
    ),
    tag = "weather"
)]
pub async fn clear_cache(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.weather.clear_cache().await;
    Json(serde_json::json!({ "message": "Weather cache cleared successfully" }))
}

#[utoipa::path(
    post,
    path = "/api/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created, with weather analysis when available", body = EventCreatedResponse),
        (status = 400, description = "Validation failed")
    ),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventCreatedResponse>), AppError> {
    let event = state.events.create(request, state.clock.now()).await?;

    let (weather_analysis, weather_error) = match state.weather.analyze_event_weather(&event).await
    {
        Ok(analysis) => (Some(analysis), None),
        Err(e) => {
            warn!(event_id = %event.id, error = %e, "Weather analysis unavailable for new event");
            (None, Some(e.to_string()))
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(EventCreatedResponse {
            event,
            weather_analysis,
            weather_error,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/events",
    params(
        ("event_type" = Option<String>, Query, description = "Case-insensitive substring filter"),
        ("location" = Option<String>, Query, description = "Case-insensitive substring filter"),
        ("page" = Option<usize>, Query, description = "1-based page, default 1"),
        ("limit" = Option<usize>, Query, description = "Page size, default 10")
    ),
    responses(
        (status = 200, description = "Filtered page of events", body = EventListResponse)
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Json<EventListResponse> {
    Json(state.events.list(&filter).await)
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "The event", body = Event),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, AppError> {
    Ok(Json(state.events.get(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = Event),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<UpdateEventRequest>,
) -> Result<Json<Event>, AppError> {
    Ok(Json(state.events.update(id, update, state.clock.now()).await?))
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event deleted"),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.events.delete(id).await?;
    Ok(Json(serde_json::json!({ "message": "Event deleted successfully" })))
}

#[utoipa::path(
    post,
    path = "/api/events/{id}/weather-check",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Weather and suitability for the event date", body = EventWeatherAnalysis),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn weather_check(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventWeatherAnalysis>, AppError> {
    let event = state.events.get(id).await?;
    Ok(Json(state.weather.analyze_event_weather(&event).await?))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}/suitability",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Suitability score for the event date", body = SuitabilityResult),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn event_suitability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuitabilityResult>, AppError> {
    let event = state.events.get(id).await?;
    Ok(Json(state.weather.get_event_suitability(&event).await?))
}

#[derive(Deserialize)]
pub struct AlternativesQuery {
    pub days: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/events/{id}/alternatives",
    params(
        ("id" = Uuid, Path, description = "Event id"),
        ("days" = Option<u32>, Query, description = "Days after the event date to consider (1-30, default 7)")
    ),
    responses(
        (status = 200, description = "Up to five better dates, best first", body = AlternativeDates),
        (status = 400, description = "Invalid days range"),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn alternative_dates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AlternativesQuery>,
) -> Result<Json<AlternativeDates>, AppError> {
    let days = query.days.unwrap_or(DEFAULT_DAYS_RANGE);
    if !(1..=MAX_DAYS_RANGE).contains(&days) {
        return Err(AppError::validation(format!(
            "days must be between 1 and {}",
            MAX_DAYS_RANGE
        )));
    }

    let event = state.events.get(id).await?;
    Ok(Json(state.weather.get_alternative_dates(&event, days).await?))
}
