use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Open-Meteo Geocoding API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GeocodingResponse {
    // Open-Meteo omits the field entirely when nothing matched.
    #[serde(default)]
    pub results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodingResult {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub timezone: Option<String>,
}

// ============================================================================
// Open-Meteo Forecast API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SunTimesResponse {
    pub timezone: Option<String>,
    pub daily: Option<SunDaily>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SunDaily {
    #[serde(default)]
    pub sunrise: Vec<String>,
    #[serde(default)]
    pub sunset: Vec<String>,
    #[serde(default)]
    pub daylight_duration: Vec<f64>,
}

// ============================================================================
// Domain Records
// ============================================================================

/// A resolved place, produced by the geocoding lookup.
#[derive(Debug, Clone)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Canonical place name as the geocoder spells it.
    pub name: String,
    /// IANA timezone id, when the geocoder supplies one.
    pub timezone: Option<String>,
}

/// Sunrise/sunset data normalized across provider response shapes.
#[derive(Debug, Clone)]
pub struct AstronomyRecord {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    /// Always >= 0; polar days and nights collapse toward the extremes.
    pub day_length_secs: i64,
    /// Timezone id as reported by the astronomy payload, if any.
    pub timezone: Option<String>,
}

/// Final output of the astronomy tool. Either every field is populated
/// or the call failed earlier; there is no partial result.
#[derive(Debug, Clone, Serialize)]
pub struct SunReport {
    pub city: String,
    pub sunrise: String,
    pub sunset: String,
    pub day_length: String,
    pub moon_phase: String,
}
