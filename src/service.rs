use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;

use crate::constants::{GEOCODING_API_BASE, OPEN_METEO_API_BASE, USER_AGENT};
use crate::error::SunError;
use crate::formatters;
use crate::models::{AstronomyRecord, Coordinates, GeocodingResponse, SunReport, SunTimesResponse};
use crate::moon::MoonPhase;

/// Which response shape the astronomy upstream is asked for.
///
/// Upstream deployments differ in what they return alongside sunrise and
/// sunset; each variant normalizes to the same [`AstronomyRecord`], so
/// callers never see the difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SunTimesShape {
    /// Times in the location's local civil time, timezone id in the payload
    LocalWithTimezone,
    /// Times in UTC, day length from the separate daylight_duration field
    UtcWithDaylight,
    /// Times in UTC, day length computed locally as sunset - sunrise
    UtcComputed,
}

/// Astronomy tool service: resolves a city, fetches sun times, and
/// derives the moon phase.
#[derive(Clone)]
pub struct SunService {
    client: Arc<Client>,
    shape: SunTimesShape,
}

impl SunService {
    /// Creates a new service instance with a shared HTTP client.
    ///
    /// `timeout` bounds every upstream call; there is no retry, so a
    /// failed call fails the stage on the first attempt.
    pub fn new(timeout: Duration, shape: SunTimesShape) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            shape,
        })
    }

    /// Makes an HTTP GET request and deserializes the JSON response
    async fn make_request<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.client.get(url).query(query).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("request failed with status: {}", response.status());
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Resolves a free-text city name to coordinates via the geocoding API.
    ///
    /// Only the first-ranked match is used. An empty result set is a
    /// [`SunError::LocationNotFound`], distinct from transport failures.
    pub async fn resolve_city(&self, city: &str) -> Result<Coordinates, SunError> {
        tracing::info!("Resolving location for city: {}", city);

        let url = format!("{}/search", GEOCODING_API_BASE);
        let geo = self
            .make_request::<GeocodingResponse>(&url, &[("name", city), ("count", "1")])
            .await
            .map_err(|e| SunError::Upstream(format!("geocoding lookup failed: {}", e)))?;

        first_match(city, geo)
    }

    /// Fetches sunrise/sunset for the given coordinates, normalized
    /// across the configured upstream response shape.
    pub async fn fetch_sun_times(&self, coords: &Coordinates) -> Result<AstronomyRecord, SunError> {
        tracing::info!(
            "Fetching sun times for {} ({}, {})",
            coords.name,
            coords.latitude,
            coords.longitude
        );

        let tz_param = match self.shape {
            SunTimesShape::LocalWithTimezone => {
                coords.timezone.clone().unwrap_or_else(|| "auto".to_string())
            }
            SunTimesShape::UtcWithDaylight | SunTimesShape::UtcComputed => "UTC".to_string(),
        };
        let daily_fields = match self.shape {
            SunTimesShape::UtcWithDaylight => "sunrise,sunset,daylight_duration",
            _ => "sunrise,sunset",
        };

        let url = format!("{}/forecast", OPEN_METEO_API_BASE);
        let payload = self
            .make_request::<SunTimesResponse>(
                &url,
                &[
                    ("latitude", coords.latitude.to_string().as_str()),
                    ("longitude", coords.longitude.to_string().as_str()),
                    ("daily", daily_fields),
                    ("timezone", tz_param.as_str()),
                ],
            )
            .await
            .map_err(|e| SunError::Upstream(format!("astronomy lookup failed: {}", e)))?;

        normalize_sun_times(self.shape, payload)
    }

    /// Runs the full tool pipeline: resolve, fetch, moon phase, format.
    /// Fails fast on the first failing stage; one attempt per upstream call.
    pub async fn sun_report(&self, city: &str) -> Result<SunReport, SunError> {
        let coords = self.resolve_city(city).await?;
        let record = self.fetch_sun_times(&coords).await?;
        let phase = MoonPhase::at(Utc::now());

        Ok(formatters::build_report(&coords, &record, phase))
    }
}

/// Picks the first-ranked geocoding match, or reports the city as unknown.
fn first_match(city: &str, geo: GeocodingResponse) -> Result<Coordinates, SunError> {
    let hit = geo
        .results
        .into_iter()
        .next()
        .ok_or_else(|| SunError::LocationNotFound(city.to_string()))?;

    Ok(Coordinates {
        latitude: hit.latitude,
        longitude: hit.longitude,
        name: hit.name,
        timezone: hit.timezone,
    })
}

/// Normalizes an upstream payload into an [`AstronomyRecord`].
///
/// Missing sunrise/sunset fields are an upstream failure. A missing
/// timezone is not: the record carries `None` and the formatter falls
/// back further down the line.
fn normalize_sun_times(
    shape: SunTimesShape,
    payload: SunTimesResponse,
) -> Result<AstronomyRecord, SunError> {
    let daily = payload
        .daily
        .ok_or_else(|| SunError::Upstream("astronomy payload missing daily block".to_string()))?;

    let sunrise_raw = daily
        .sunrise
        .first()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SunError::Upstream("astronomy payload missing sunrise".to_string()))?;
    let sunset_raw = daily
        .sunset
        .first()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SunError::Upstream("astronomy payload missing sunset".to_string()))?;

    let sunrise_naive = parse_naive(sunrise_raw)?;
    let sunset_naive = parse_naive(sunset_raw)?;

    let (sunrise, sunset, timezone) = match shape {
        SunTimesShape::LocalWithTimezone => {
            let tz_id = payload.timezone.clone();
            let tz: Tz = tz_id
                .as_deref()
                .and_then(|id| id.parse().ok())
                .unwrap_or(chrono_tz::UTC);
            (
                to_utc_in(tz, sunrise_naive),
                to_utc_in(tz, sunset_naive),
                tz_id,
            )
        }
        SunTimesShape::UtcWithDaylight | SunTimesShape::UtcComputed => (
            Utc.from_utc_datetime(&sunrise_naive),
            Utc.from_utc_datetime(&sunset_naive),
            None,
        ),
    };

    let day_length_secs = match shape {
        SunTimesShape::UtcWithDaylight => daily
            .daylight_duration
            .first()
            .map(|secs| *secs as i64)
            .ok_or_else(|| {
                SunError::Upstream("astronomy payload missing daylight_duration".to_string())
            })?,
        // Derived locally; clamped at zero for polar edge cases where
        // the upstream reports sunset at or before sunrise.
        _ => (sunset - sunrise).num_seconds().max(0),
    };

    Ok(AstronomyRecord {
        sunrise,
        sunset,
        day_length_secs,
        timezone,
    })
}

/// Parses an Open-Meteo ISO-8601 time, which comes with or without seconds.
fn parse_naive(raw: &str) -> Result<NaiveDateTime, SunError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map_err(|e| SunError::Upstream(format!("unparseable time '{}': {}", raw, e)))
}

/// Interprets a naive local time in `tz`, taking the earlier instant for
/// ambiguous times and falling back to UTC for nonexistent ones.
fn to_utc_in(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn geocoding(json: &str) -> GeocodingResponse {
        serde_json::from_str(json).unwrap()
    }

    fn sun_times(json: &str) -> SunTimesResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_geocoding_results_are_location_not_found() {
        for body in [r#"{}"#, r#"{"results":[]}"#, r#"{"generationtime_ms":0.4}"#] {
            let err = first_match("Xyzzyville", geocoding(body)).unwrap_err();
            assert!(
                matches!(err, SunError::LocationNotFound(ref city) if city == "Xyzzyville"),
                "body {body}: {err}"
            );
        }
    }

    #[test]
    fn first_ranked_match_wins() {
        let geo = geocoding(
            r#"{"results":[
                {"latitude":-1.28,"longitude":36.82,"name":"Nairobi","timezone":"Africa/Nairobi"},
                {"latitude":0.0,"longitude":0.0,"name":"Nairobi West"}
            ]}"#,
        );
        let coords = first_match("nairobi", geo).unwrap();
        assert_eq!(coords.name, "Nairobi");
        assert_eq!(coords.timezone.as_deref(), Some("Africa/Nairobi"));
    }

    #[test]
    fn resolver_tolerates_missing_timezone() {
        let geo = geocoding(r#"{"results":[{"latitude":1.0,"longitude":2.0,"name":"Somewhere"}]}"#);
        assert!(first_match("somewhere", geo).unwrap().timezone.is_none());
    }

    #[test]
    fn local_shape_converts_to_utc_and_keeps_timezone() {
        let payload = sun_times(
            r#"{"timezone":"Africa/Nairobi",
                "daily":{"sunrise":["2025-03-10T06:23"],"sunset":["2025-03-10T18:45"]}}"#,
        );
        let record = normalize_sun_times(SunTimesShape::LocalWithTimezone, payload).unwrap();
        // 06:23 Nairobi (UTC+3) is 03:23 UTC
        assert_eq!(record.sunrise.hour(), 3);
        assert_eq!(record.sunrise.minute(), 23);
        assert_eq!(record.timezone.as_deref(), Some("Africa/Nairobi"));
        assert_eq!(record.day_length_secs, 44_520);
    }

    #[test]
    fn daylight_shape_trusts_the_upstream_duration() {
        let payload = sun_times(
            r#"{"daily":{"sunrise":["2025-03-10T03:23"],"sunset":["2025-03-10T15:45"],
                "daylight_duration":[44520.72]}}"#,
        );
        let record = normalize_sun_times(SunTimesShape::UtcWithDaylight, payload).unwrap();
        assert_eq!(record.day_length_secs, 44_520);
        assert!(record.timezone.is_none());
    }

    #[test]
    fn daylight_shape_requires_the_duration_field() {
        let payload = sun_times(
            r#"{"daily":{"sunrise":["2025-03-10T03:23"],"sunset":["2025-03-10T15:45"]}}"#,
        );
        let err = normalize_sun_times(SunTimesShape::UtcWithDaylight, payload).unwrap_err();
        assert!(matches!(err, SunError::Upstream(_)));
    }

    #[test]
    fn computed_shape_derives_day_length_from_the_diff() {
        let payload = sun_times(
            r#"{"daily":{"sunrise":["2025-03-10T06:23:10"],"sunset":["2025-03-10T18:45:20"]}}"#,
        );
        let record = normalize_sun_times(SunTimesShape::UtcComputed, payload).unwrap();
        assert_eq!(record.day_length_secs, 44_530);
        // seconds truncate away in the rendered form
        assert_eq!(
            crate::formatters::format_day_length(record.day_length_secs),
            "12 hours 22 minutes"
        );
    }

    #[test]
    fn polar_inversion_clamps_day_length_at_zero() {
        let payload = sun_times(
            r#"{"daily":{"sunrise":["2025-12-21T12:00"],"sunset":["2025-12-21T11:00"]}}"#,
        );
        let record = normalize_sun_times(SunTimesShape::UtcComputed, payload).unwrap();
        assert_eq!(record.day_length_secs, 0);
    }

    #[test]
    fn missing_sun_fields_are_an_upstream_error() {
        for body in [
            r#"{}"#,
            r#"{"daily":{}}"#,
            r#"{"daily":{"sunrise":[""],"sunset":["2025-03-10T18:45"]}}"#,
            r#"{"daily":{"sunrise":["2025-03-10T06:23"],"sunset":[]}}"#,
        ] {
            let err = normalize_sun_times(SunTimesShape::UtcComputed, sun_times(body)).unwrap_err();
            assert!(matches!(err, SunError::Upstream(_)), "body {body}");
        }
    }
}
