/// User agent string for HTTP requests
pub const USER_AGENT: &str = "sunrise-agent-server/0.1.0";

/// Open-Meteo geocoding API base URL
pub const GEOCODING_API_BASE: &str = "https://geocoding-api.open-meteo.com/v1";

/// Open-Meteo forecast API base URL
pub const OPEN_METEO_API_BASE: &str = "https://api.open-meteo.com/v1";

/// Synodic lunar period in seconds (~29.53 days)
pub const LUNAR_PERIOD_SECS: i64 = 2_551_443;

/// Reference new moon, 1970-01-07T20:35:00Z, as a unix timestamp
pub const LUNAR_EPOCH_UNIX: i64 = 592_500;
