use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use common::models::{
    AlternativeDate, AlternativeDates, CacheStats, CreateEventRequest, Event, EventCreatedResponse,
    EventListResponse, EventWeatherAnalysis, FactorLabel, ForecastWindow, Improvement, Pagination,
    Rating, SuitabilityFactors, SuitabilityResult, UpdateEventRequest, WeatherSnapshot,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::get_current_weather,
        handlers::get_forecast,
        handlers::get_weather_for_date,
        handlers::cache_status,
        handlers::clear_cache,
        handlers::create_event,
        handlers::list_events,
        handlers::get_event,
        handlers::update_event,
        handlers::delete_event,
        handlers::weather_check,
        handlers::event_suitability,
        handlers::alternative_dates,
    ),
    components(schemas(
        WeatherSnapshot,
        ForecastWindow,
        CacheStats,
        SuitabilityResult,
        SuitabilityFactors,
        FactorLabel,
        Rating,
        EventWeatherAnalysis,
        AlternativeDates,
        AlternativeDate,
        Improvement,
        Event,
        CreateEventRequest,
        UpdateEventRequest,
        EventCreatedResponse,
        EventListResponse,
        Pagination,
    )),
    tags(
        (name = "weather", description = "Weather data and cache endpoints"),
        (name = "events", description = "Events and their weather suitability"),
    ),
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
