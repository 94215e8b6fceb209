//! # Run Tracker
//!
//! GPS run recording and strength-training journal core for a mobile
//! fitness app.
//!
//! This library provides:
//! - Live track segmentation: distance accumulation from GPS fixes, accuracy
//!   and jitter filtering, fixed-distance split detection
//! - Pace queries over live sessions and stored runs
//! - A strength-training journal (exercises, sets, daily workouts) with
//!   volume analysis
//! - CSV and GPX export of completed tracks
//! - Repository traits for the app's storage layer
//!
//! ## Features
//!
//! - **`persistence`** - Enable the SQLite-backed run and workout store
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use run_tracker::{GpsFix, TrackSegmenter, UnitSystem};
//!
//! let t0 = Utc.with_ymd_and_hms(2025, 9, 26, 7, 0, 0).unwrap();
//! let mut segmenter = TrackSegmenter::default();
//! segmenter.start(UnitSystem::Metric.split_length_meters()).unwrap();
//!
//! segmenter.ingest(GpsFix::new(t0, 0.0, 0.0, 5.0));
//! segmenter.ingest(GpsFix::new(t0 + Duration::seconds(100), 0.009, 0.0, 5.0));
//! segmenter.ingest(GpsFix::new(t0 + Duration::seconds(200), 0.018, 0.0, 5.0));
//!
//! let run = segmenter.stop(t0 + Duration::seconds(200)).unwrap();
//! assert_eq!(run.splits.len(), 2);
//! println!("{:.0} m in {:.0} s", run.distance_meters, run.duration_seconds);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, RecorderError, Result};

// Geographic utilities (distance, bounds, simplification)
pub mod geo_utils;

// Live track segmentation (distance, splits, jitter filtering)
pub mod recorder;
pub use recorder::{
    BatchSummary, IngestOutcome, RecordingResult, RejectReason, SessionSnapshot, TrackSegmenter,
};

// Pace and display formatting
pub mod pace;
pub use pace::{average_pace, format_distance, format_duration, format_pace, split_pace};

// Stored run records
pub mod run;
pub use run::{RunFeeling, RunRecord, RunType};

// Strength-training journal
pub mod workouts;
pub use workouts::{Exercise, ExerciseCatalog, SetRecord, Workout, WorkoutItem};

// Aggregations for the analysis screen
pub mod analysis;
pub use analysis::{
    daily_aggregates, run_totals, top_exercises, DayAggregate, ExerciseVolume, RunTotals,
};

// CSV / GPX export
pub mod export;

// Repository traits and the in-memory store
pub mod store;
pub use store::{InMemoryStore, RunRepository, WorkoutRepository};

// Process-wide recorder (single active session)
pub mod engine;
pub use engine::{with_recorder, RecorderEngine, RECORDER};

// SQLite store
#[cfg(feature = "persistence")]
pub mod persistence;
#[cfg(feature = "persistence")]
pub use persistence::SqliteStore;

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android
#[cfg(target_os = "android")]
pub fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("RunTracker"),
    );
}

#[cfg(not(target_os = "android"))]
pub fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// A single location sample from the device.
///
/// # Example
/// ```
/// use chrono::Utc;
/// use run_tracker::GpsFix;
///
/// let fix = GpsFix::new(Utc::now(), 52.52, 13.405, 8.0).with_altitude(34.0);
/// assert!(fix.has_usable_accuracy(50.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude in meters, when the device reports one
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius in meters (negative = invalid)
    pub horizontal_accuracy: f64,
}

impl GpsFix {
    pub fn new(
        timestamp: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
        horizontal_accuracy: f64,
    ) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            altitude: None,
            horizontal_accuracy,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }

    /// Accuracy must lie in `[0, max_accuracy]`; NaN never passes.
    pub fn has_usable_accuracy(&self, max_accuracy: f64) -> bool {
        self.horizontal_accuracy >= 0.0 && self.horizontal_accuracy <= max_accuracy
    }
}

/// A completed fixed-distance segment of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Split {
    /// 1-based position within the run
    pub index: u32,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

impl Split {
    /// Seconds per km or mile; `None` for a zero-length split.
    pub fn pace(&self, units: UnitSystem) -> Option<f64> {
        split_pace(self, units)
    }
}

/// Distance unit used for splits and pace display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

/// Meters per statute mile.
pub const METERS_PER_MILE: f64 = 1609.344;

/// Meters per kilometer.
pub const METERS_PER_KM: f64 = 1000.0;

impl UnitSystem {
    /// Length of one split (one km or one mile) in meters.
    pub fn split_length_meters(self) -> f64 {
        match self {
            UnitSystem::Metric => METERS_PER_KM,
            UnitSystem::Imperial => METERS_PER_MILE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UnitSystem::Metric => "km",
            UnitSystem::Imperial => "mi",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "km" => Some(UnitSystem::Metric),
            "mi" => Some(UnitSystem::Imperial),
            _ => None,
        }
    }

    pub fn is_metric(self) -> bool {
        self == UnitSystem::Metric
    }
}

/// Fix filtering thresholds for the track segmenter.
///
/// The split length is not part of the configuration; it is chosen per
/// session and passed to `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecorderConfig {
    /// Fixes with a horizontal accuracy above this are dropped.
    /// Default: 50.0 meters
    pub max_horizontal_accuracy: f64,

    /// Movement at or below this between consecutive fixes is treated as
    /// jitter and not counted toward distance.
    /// Default: 0.5 meters
    pub min_movement_meters: f64,

    /// A trailing partial split is only kept on stop if it is longer than this.
    /// Default: 1.0 meters
    pub min_final_split_meters: f64,

    /// Whether jitter fixes are still appended to the track.
    /// Default: true
    pub keep_jitter_fixes: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_horizontal_accuracy: 50.0,
            min_movement_meters: 0.5,
            min_final_split_meters: 1.0,
            keep_jitter_fixes: true,
        }
    }
}

impl RecorderConfig {
    /// Parse a JSON object of overrides; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.max_horizontal_accuracy.is_finite() && self.max_horizontal_accuracy >= 0.0) {
            return Err(RecorderError::config(
                "max horizontal accuracy must be a non-negative number",
            ));
        }
        if !(self.min_movement_meters.is_finite() && self.min_movement_meters >= 0.0) {
            return Err(RecorderError::config(
                "jitter threshold must be a non-negative number",
            ));
        }
        if !(self.min_final_split_meters.is_finite() && self.min_final_split_meters >= 0.0) {
            return Err(RecorderError::config(
                "final split threshold must be a non-negative number",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_gps_point_validation() {
        assert!(GpsPoint::new(51.5074, -0.1278).is_valid());
        assert!(!GpsPoint::new(91.0, 0.0).is_valid());
        assert!(!GpsPoint::new(0.0, 181.0).is_valid());
        assert!(!GpsPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_fix_accuracy_window() {
        let t = Utc.with_ymd_and_hms(2025, 9, 26, 7, 0, 0).unwrap();
        assert!(GpsFix::new(t, 0.0, 0.0, 0.0).has_usable_accuracy(50.0));
        assert!(GpsFix::new(t, 0.0, 0.0, 50.0).has_usable_accuracy(50.0));
        assert!(!GpsFix::new(t, 0.0, 0.0, 50.1).has_usable_accuracy(50.0));
        assert!(!GpsFix::new(t, 0.0, 0.0, -1.0).has_usable_accuracy(50.0));
        assert!(!GpsFix::new(t, 0.0, 0.0, f64::NAN).has_usable_accuracy(50.0));
    }

    #[test]
    fn test_unit_split_lengths() {
        assert_eq!(UnitSystem::Metric.split_length_meters(), 1000.0);
        assert_eq!(UnitSystem::Imperial.split_length_meters(), 1609.344);
    }

    #[test]
    fn test_config_from_json() {
        let config = RecorderConfig::from_json(r#"{"max_horizontal_accuracy": 20.0}"#).unwrap();
        assert_eq!(config.max_horizontal_accuracy, 20.0);
        assert_eq!(config.min_movement_meters, 0.5);
        assert!(config.keep_jitter_fixes);

        let err = RecorderConfig::from_json(r#"{"min_movement_meters": -1.0}"#).unwrap_err();
        assert!(matches!(err, RecorderError::InvalidConfig { .. }));

        // Unknown keys are refused rather than dropped.
        let err = RecorderConfig::from_json(r#"{"split_distance_meters": 400.0}"#).unwrap_err();
        assert!(matches!(err, RecorderError::Serialization { .. }));

        let err = RecorderConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, RecorderError::Serialization { .. }));
    }
}
