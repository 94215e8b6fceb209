//! Pace queries and display formatting.
//!
//! Pace is elapsed time per unit distance (seconds per km or per mile).
//! It is undefined, reported as `None`, when there is no distance.

use crate::{Split, UnitSystem};

/// Seconds per `unit_meters`, `None` when `distance_meters` is not positive.
pub fn pace_seconds_per(
    duration_seconds: f64,
    distance_meters: f64,
    unit_meters: f64,
) -> Option<f64> {
    if distance_meters.is_nan() || distance_meters <= 0.0 || !duration_seconds.is_finite() {
        return None;
    }
    Some(duration_seconds / (distance_meters / unit_meters))
}

/// Average pace over a whole session or run.
///
/// # Example
/// ```
/// use run_tracker::{average_pace, UnitSystem};
///
/// assert_eq!(average_pace(5000.0, 1500.0, UnitSystem::Metric), Some(300.0));
/// assert_eq!(average_pace(0.0, 1500.0, UnitSystem::Metric), None);
/// ```
pub fn average_pace(distance_meters: f64, duration_seconds: f64, units: UnitSystem) -> Option<f64> {
    pace_seconds_per(duration_seconds, distance_meters, units.split_length_meters())
}

/// Pace of a single split.
pub fn split_pace(split: &Split, units: UnitSystem) -> Option<f64> {
    pace_seconds_per(split.duration_seconds, split.distance_meters, units.split_length_meters())
}

/// `H:MM:SS` from one hour up, `M:SS` below.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// `5:03/km`, or `--:--/km` when the pace is undefined.
pub fn format_pace(pace_seconds: Option<f64>, units: UnitSystem) -> String {
    match pace_seconds {
        Some(p) if p.is_finite() => format!("{}/{}", format_duration(p), units.label()),
        _ => format!("--:--/{}", units.label()),
    }
}

/// `12.34 km` / `7.67 mi`.
pub fn format_distance(meters: f64, units: UnitSystem) -> String {
    format!("{:.2} {}", meters / units.split_length_meters(), units.label())
}
