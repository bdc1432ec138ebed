use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One point-in-time (or one forecast slot's) weather observation, in metric units
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct WeatherSnapshot {
    pub location: String,
    pub country: String,
    /// Degrees Celsius
    pub temperature: f64,
    pub feels_like: f64,
    /// Percent
    pub humidity: u32,
    /// hPa
    pub pressure: u32,
    /// km/h
    pub wind_speed: f64,
    /// Degrees
    pub wind_direction: u32,
    pub condition: String,
    pub description: String,
    /// Millimetres over the observation window, 0 when the provider reports none
    #[serde(default)]
    pub precipitation: f64,
    /// Kilometres
    pub visibility: Option<f64>,
    /// Observation time, or the slot time for forecast entries
    pub timestamp: DateTime<Utc>,
}

/// Multi-day forecast for a location, one snapshot per 3-hour slot in ascending time order
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ForecastWindow {
    pub location: String,
    pub country: String,
    pub fetched_at: DateTime<Utc>,
    pub list: Vec<WeatherSnapshot>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum Rating {
    Excellent,
    Good,
    Okay,
    Poor,
}

impl Rating {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => Rating::Excellent,
            60..=79 => Rating::Good,
            40..=59 => Rating::Okay,
            _ => Rating::Poor,
        }
    }
}

/// Qualitative label for a single scoring factor
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum FactorLabel {
    Excellent,
    Good,
    Moderate,
    Poor,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct SuitabilityFactors {
    pub temperature: FactorLabel,
    pub precipitation: FactorLabel,
    pub wind: FactorLabel,
    pub condition: FactorLabel,
}

/// Weather suitability of a snapshot for an event category
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct SuitabilityResult {
    /// 0..=100
    pub score: u32,
    pub rating: Rating,
    pub factors: SuitabilityFactors,
    pub recommendations: Vec<String>,
}

/// Full weather analysis for a stored event
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct EventWeatherAnalysis {
    pub event_id: Uuid,
    pub weather: WeatherSnapshot,
    pub suitability: SuitabilityResult,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum Improvement {
    Better,
    Moderate,
    Poor,
}

impl Improvement {
    pub fn from_score(score: u32) -> Self {
        if score > 70 {
            Improvement::Better
        } else if score > 50 {
            Improvement::Moderate
        } else {
            Improvement::Poor
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct AlternativeDate {
    pub date: NaiveDate,
    pub weather: WeatherSnapshot,
    pub suitability: SuitabilityResult,
    pub improvement: Improvement,
}

/// Ranked candidate dates following an event's original date
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct AlternativeDates {
    pub original_date: NaiveDate,
    pub alternatives: Vec<AlternativeDate>,
    pub best_alternative: Option<AlternativeDate>,
}

/// Weather cache counters and live keys
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub cache_size: usize,
    pub keys: Vec<String>,
}

/// A planned event
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub date: NaiveDate,
    pub event_type: String,
    #[serde(default)]
    pub description: String,
    /// Hours
    pub duration: u32,
    pub participants: u32,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub requirements: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event creation request
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct CreateEventRequest {
    pub name: String,
    pub location: String,
    pub date: NaiveDate,
    pub event_type: String,
    pub description: Option<String>,
    pub duration: Option<u32>,
    pub participants: Option<u32>,
    #[schema(value_type = Option<Object>)]
    pub requirements: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Partial event update; absent fields are left unchanged
#[derive(Debug, Serialize, Deserialize, Clone, Default, ToSchema)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    pub event_type: Option<String>,
    pub description: Option<String>,
    pub duration: Option<u32>,
    pub participants: Option<u32>,
    #[schema(value_type = Option<Object>)]
    pub requirements: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Event creation response; a weather failure does not undo the creation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventCreatedResponse {
    pub event: Event,
    pub weather_analysis: Option<EventWeatherAnalysis>,
    pub weather_error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_events: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventListResponse {
    pub events: Vec<Event>,
    pub pagination: Pagination,
}
