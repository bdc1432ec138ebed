pub mod alternatives;
pub mod api_client;
pub mod cache;
pub mod clock;
pub mod config;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod rate_limit;
pub mod resolver;
pub mod scoring;
pub mod service;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: handlers::AppState) -> Router {
    let api = Router::new()
        .route("/api/weather/cache/status", get(handlers::cache_status))
        .route("/api/weather/cache/clear", delete(handlers::clear_cache))
        .route(
            "/api/weather/{location}/current",
            get(handlers::get_current_weather),
        )
        .route("/api/weather/{location}/forecast", get(handlers::get_forecast))
        .route(
            "/api/weather/{location}/{date}",
            get(handlers::get_weather_for_date),
        )
        .route(
            "/api/events",
            post(handlers::create_event).get(handlers::list_events),
        )
        .route(
            "/api/events/{id}",
            get(handlers::get_event)
                .put(handlers::update_event)
                .delete(handlers::delete_event),
        )
        .route(
            "/api/events/{id}/weather-check",
            post(handlers::weather_check),
        )
        .route(
            "/api/events/{id}/suitability",
            get(handlers::event_suitability),
        )
        .route(
            "/api/events/{id}/alternatives",
            get(handlers::alternative_dates),
        )
        .route_layer(middleware::from_fn_with_state(
            state.client_limiter.clone(),
            rate_limit::limit_clients,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .merge(openapi::swagger_ui())
        .fallback(handlers::route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
