use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::models::{AstronomyRecord, Coordinates, SunReport};
use crate::moon::MoonPhase;

/// Renders an instant as "h:mm AM/PM" in the given IANA timezone.
///
/// Deterministic for a given (instant, timezone) pair; the process
/// locale and timezone play no part. An unknown timezone id falls back
/// to UTC rather than failing.
pub fn format_local_time(instant: DateTime<Utc>, tz_id: &str) -> String {
    let tz: Tz = tz_id.parse().unwrap_or(chrono_tz::UTC);
    instant.with_timezone(&tz).format("%-I:%M %p").to_string()
}

/// Renders a duration in seconds as "<H> hours <M> minutes".
/// Leftover seconds are truncated, not rounded.
pub fn format_day_length(secs: i64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    format!("{} hours {} minutes", hours, minutes)
}

/// Assembles the tool result, rendering instants in the provider's
/// timezone when it reported one, else the resolver's, else UTC. A
/// missing timezone never fails the request.
pub fn build_report(coords: &Coordinates, record: &AstronomyRecord, phase: MoonPhase) -> SunReport {
    let tz_id = record
        .timezone
        .as_deref()
        .or(coords.timezone.as_deref())
        .unwrap_or("UTC");

    SunReport {
        city: coords.name.clone(),
        sunrise: format_local_time(record.sunrise, tz_id),
        sunset: format_local_time(record.sunset, tz_id),
        day_length: format_day_length(record.day_length_secs),
        moon_phase: phase.to_string(),
    }
}

/// Formats a sun report into the readable summary the sunrise agent replies with
pub fn format_report(report: &SunReport) -> String {
    format!(
        "In {} today, sunrise is at {} and sunset at {} local time. \
         Day length is {}. The moon phase is {}.",
        report.city, report.sunrise, report.sunset, report.day_length, report.moon_phase
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_length_truncates_to_whole_minutes() {
        // 06:23 to 18:45 on the same day
        let secs = (18 * 3600 + 45 * 60) - (6 * 3600 + 23 * 60);
        assert_eq!(format_day_length(secs), "12 hours 22 minutes");
        // 59 leftover seconds are dropped, never rounded up
        assert_eq!(format_day_length(secs + 59), "12 hours 22 minutes");
    }

    #[test]
    fn local_time_renders_in_target_timezone() {
        // 03:23 UTC is 6:23 AM in Nairobi (UTC+3, no DST)
        let instant = Utc.with_ymd_and_hms(2025, 3, 10, 3, 23, 0).unwrap();
        assert_eq!(format_local_time(instant, "Africa/Nairobi"), "6:23 AM");
        assert_eq!(format_local_time(instant, "UTC"), "3:23 AM");
    }

    #[test]
    fn unknown_timezone_falls_back_to_utc() {
        let instant = Utc.with_ymd_and_hms(2025, 3, 10, 15, 45, 0).unwrap();
        assert_eq!(format_local_time(instant, "Not/AZone"), "3:45 PM");
    }

    #[test]
    fn report_prefers_provider_timezone_over_resolver() {
        let coords = Coordinates {
            latitude: -1.28,
            longitude: 36.82,
            name: "Nairobi".to_string(),
            timezone: Some("Europe/Berlin".to_string()),
        };
        let record = AstronomyRecord {
            sunrise: Utc.with_ymd_and_hms(2025, 3, 10, 3, 23, 0).unwrap(),
            sunset: Utc.with_ymd_and_hms(2025, 3, 10, 15, 45, 0).unwrap(),
            day_length_secs: 44_520,
            timezone: Some("Africa/Nairobi".to_string()),
        };
        let report = build_report(&coords, &record, MoonPhase::WaxingCrescent);
        assert_eq!(report.city, "Nairobi");
        assert_eq!(report.sunrise, "6:23 AM");
        assert_eq!(report.sunset, "6:45 PM");
        assert_eq!(report.day_length, "12 hours 22 minutes");
        assert_eq!(report.moon_phase, "Waxing Crescent");
    }
}
