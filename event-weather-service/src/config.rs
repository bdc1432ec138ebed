use crate::rate_limit::{CLIENT_REQUEST_LIMIT, CLIENT_WINDOW_SECONDS};
use common::tracing::LogFormat;
use std::env;
use std::path::PathBuf;

pub struct Config {
    pub port: u16,
    pub openweather_url: String,
    pub openweather_api_key: String,
    pub rate_limit_per_minute: u32,
    pub client_rate_limit: u32,
    pub client_rate_window_seconds: u64,
    pub http_timeout_seconds: u64,
    pub http_max_retries: u32,
    pub events_file: PathBuf,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            openweather_url: env::var("OPENWEATHER_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org/data/2.5".to_string()),
            openweather_api_key: env::var("OPENWEATHER_API_KEY").unwrap_or_default(),
            rate_limit_per_minute: env::var("RATE_LIMIT_PER_MINUTE")
                .ok()
                .and_then(|r| r.parse().ok())
                .unwrap_or(60),
            client_rate_limit: env::var("CLIENT_RATE_LIMIT")
                .ok()
                .and_then(|r| r.parse().ok())
                .unwrap_or(CLIENT_REQUEST_LIMIT),
            client_rate_window_seconds: env::var("CLIENT_RATE_WINDOW_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(CLIENT_WINDOW_SECONDS),
            http_timeout_seconds: env::var("HTTP_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            // Retrying is opt-in; the weather core itself never retries
            http_max_retries: env::var("HTTP_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            events_file: env::var("EVENTS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/events.json")),
            log_format: env::var("LOG_FORMAT")
                .ok()
                .and_then(|f| f.parse().ok())
                .unwrap_or_default(),
        }
    }
}
