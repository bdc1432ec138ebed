//! Weather suitability scoring per event category.
//!
//! Each of the four factors (temperature, precipitation, wind, condition)
//! contributes a fraction of its category weight; the contributions are summed
//! and rounded to an integer score in `0..=100`.

use common::models::{FactorLabel, Rating, SuitabilityFactors, SuitabilityResult, WeatherSnapshot};

/// Share of each factor in the final score; sums to 100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactorWeights {
    pub temperature: u32,
    pub precipitation: u32,
    pub wind: u32,
    pub condition: u32,
}

impl FactorWeights {
    pub fn total(&self) -> u32 {
        self.temperature + self.precipitation + self.wind + self.condition
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventTypeProfile {
    pub name: &'static str,
    pub temp_min: f64,
    pub temp_max: f64,
    pub max_precipitation: f64,
    pub max_wind_speed: f64,
    pub good_conditions: &'static [&'static str],
    pub okay_conditions: &'static [&'static str],
    pub weights: FactorWeights,
}

pub const OUTDOOR_SPORTS: EventTypeProfile = EventTypeProfile {
    name: "outdoor sports",
    temp_min: 15.0,
    temp_max: 30.0,
    max_precipitation: 20.0,
    max_wind_speed: 20.0,
    good_conditions: &["clear", "sunny", "partly cloudy"],
    okay_conditions: &["cloudy", "overcast"],
    weights: FactorWeights {
        temperature: 30,
        precipitation: 25,
        wind: 20,
        condition: 25,
    },
};

pub const WEDDING: EventTypeProfile = EventTypeProfile {
    name: "wedding",
    temp_min: 18.0,
    temp_max: 28.0,
    max_precipitation: 10.0,
    max_wind_speed: 15.0,
    good_conditions: &["clear", "sunny", "partly cloudy"],
    okay_conditions: &["cloudy"],
    weights: FactorWeights {
        temperature: 30,
        precipitation: 30,
        wind: 25,
        condition: 15,
    },
};

pub const HIKING: EventTypeProfile = EventTypeProfile {
    name: "hiking",
    temp_min: 10.0,
    temp_max: 25.0,
    max_precipitation: 30.0,
    max_wind_speed: 25.0,
    good_conditions: &["clear", "sunny", "partly cloudy", "cloudy"],
    okay_conditions: &["overcast", "mist"],
    weights: FactorWeights {
        temperature: 25,
        precipitation: 30,
        wind: 20,
        condition: 25,
    },
};

pub const CORPORATE: EventTypeProfile = EventTypeProfile {
    name: "corporate",
    temp_min: 16.0,
    temp_max: 26.0,
    max_precipitation: 15.0,
    max_wind_speed: 18.0,
    good_conditions: &["clear", "sunny", "partly cloudy"],
    okay_conditions: &["cloudy"],
    weights: FactorWeights {
        temperature: 25,
        precipitation: 35,
        wind: 20,
        condition: 20,
    },
};

pub static PROFILES: [EventTypeProfile; 4] = [OUTDOOR_SPORTS, WEDDING, HIKING, CORPORATE];

/// Profile used for any category without a dedicated entry
pub const FALLBACK_PROFILE: &EventTypeProfile = &OUTDOOR_SPORTS;

/// Case-insensitive profile lookup, falling back to outdoor sports
pub fn profile_for(event_type: &str) -> &'static EventTypeProfile {
    let wanted = event_type.trim().to_lowercase();
    PROFILES
        .iter()
        .find(|profile| profile.name == wanted)
        .unwrap_or(FALLBACK_PROFILE)
}

/// Score a snapshot for an event category. Pure and deterministic.
pub fn score(weather: &WeatherSnapshot, event_type: &str) -> SuitabilityResult {
    score_with_profile(weather, profile_for(event_type), event_type)
}

pub fn score_with_profile(
    weather: &WeatherSnapshot,
    profile: &EventTypeProfile,
    event_type: &str,
) -> SuitabilityResult {
    let weights = profile.weights;
    let mut total = 0.0;
    let mut recommendations = Vec::new();

    let temp = weather.temperature;
    let temperature = if temp >= profile.temp_min && temp <= profile.temp_max {
        total += f64::from(weights.temperature);
        FactorLabel::Excellent
    } else if temp >= profile.temp_min - 5.0 && temp <= profile.temp_max + 5.0 {
        total += f64::from(weights.temperature) * 0.7;
        FactorLabel::Good
    } else {
        total += f64::from(weights.temperature) * 0.3;
        recommendations.push(format!(
            "Temperature ({}°C) is not ideal for {}",
            temp, event_type
        ));
        FactorLabel::Poor
    };

    let precip = weather.precipitation.max(0.0);
    let precipitation = if precip <= profile.max_precipitation {
        total += f64::from(weights.precipitation);
        FactorLabel::Excellent
    } else if precip <= profile.max_precipitation * 2.0 {
        total += f64::from(weights.precipitation) * 0.5;
        recommendations.push("Light rain expected - consider indoor backup".to_string());
        FactorLabel::Moderate
    } else {
        recommendations.push("Heavy rain expected - strongly consider rescheduling".to_string());
        FactorLabel::Poor
    };

    let wind_speed = weather.wind_speed.max(0.0);
    let wind = if wind_speed <= profile.max_wind_speed {
        total += f64::from(weights.wind);
        FactorLabel::Excellent
    } else if wind_speed <= profile.max_wind_speed * 1.5 {
        total += f64::from(weights.wind) * 0.7;
        FactorLabel::Moderate
    } else {
        total += f64::from(weights.wind) * 0.3;
        recommendations.push(format!(
            "High winds ({} km/h) may affect the event",
            wind_speed
        ));
        FactorLabel::Poor
    };

    let label = weather.condition.to_lowercase();
    let condition = if profile.good_conditions.iter().any(|c| label.contains(c)) {
        total += f64::from(weights.condition);
        FactorLabel::Excellent
    } else if profile.okay_conditions.iter().any(|c| label.contains(c)) {
        total += f64::from(weights.condition) * 0.7;
        FactorLabel::Good
    } else {
        total += f64::from(weights.condition) * 0.3;
        FactorLabel::Poor
    };

    let score = total.round().clamp(0.0, 100.0) as u32;

    SuitabilityResult {
        score,
        rating: Rating::from_score(score),
        factors: SuitabilityFactors {
            temperature,
            precipitation,
            wind,
            condition,
        },
        recommendations,
    }
}
