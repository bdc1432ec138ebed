use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Structured error types shared by the service crates
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Weather provider unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Weather provider rate limit exceeded: {0}")]
    UpstreamRateLimited(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Cannot get weather data for past date {0}")]
    PastDateRejected(String),

    #[error("Date {0} is beyond the forecast horizon")]
    DateOutOfRange(String),

    #[error("No forecast available for {0}")]
    ForecastUnavailable(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl AppError {
    pub fn location_not_found(location: impl Into<String>) -> Self {
        Self::LocationNotFound(location.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(message.into())
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::UpstreamRateLimited(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::TooManyRequests(message.into())
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::HttpError {
            status,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::TimeoutError(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::LocationNotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::UpstreamRateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::PastDateRejected(_) => StatusCode::BAD_REQUEST,
            AppError::DateOutOfRange(_) => StatusCode::BAD_REQUEST,
            AppError::ForecastUnavailable(_) => StatusCode::NOT_FOUND,
            AppError::TimeoutError(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::HttpError { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::NetworkError(_) => StatusCode::BAD_GATEWAY,
            AppError::ParseError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_errors_map_to_client_facing_statuses() {
        assert_eq!(
            AppError::location_not_found("Atlantis").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::upstream("connection refused").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::rate_limited("429").status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::PastDateRejected("2020-01-01".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DateOutOfRange("2030-01-01".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ForecastUnavailable("2030-01-01".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn unknown_http_status_falls_back_to_bad_gateway() {
        assert_eq!(AppError::http(1000, "bogus").status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::http(418, "teapot").status_code().as_u16(), 418);
    }
}
