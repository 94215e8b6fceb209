//! FFI bindings for mobile platforms (iOS/Android).
//!
//! UniFFI exports over the global recorder. The location delegate pushes
//! fixes as flat `f64` buffers, the display timer calls `recorder_tick`, and
//! the UI polls `recorder_snapshot`. Timestamps cross the boundary as Unix
//! milliseconds.

use chrono::{DateTime, TimeZone, Utc};
use log::{info, warn};

use crate::export::{track_to_csv, track_to_gpx};
use crate::{
    format_distance, format_duration, format_pace, init_logging, with_recorder, RecordingResult,
    SessionSnapshot, Split, UnitSystem,
};

// ============================================================================
// FFI Types
// ============================================================================

/// A completed split with its pace precomputed for display.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSplit {
    pub index: u32,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub pace_seconds: Option<f64>,
}

impl FfiSplit {
    fn new(split: &Split, units: UnitSystem) -> Self {
        Self {
            index: split.index,
            distance_meters: split.distance_meters,
            duration_seconds: split.duration_seconds,
            pace_seconds: split.pace(units),
        }
    }
}

/// Live session state for the recording screen.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSessionSnapshot {
    pub recording: bool,
    pub distance_meters: f64,
    pub elapsed_seconds: f64,
    pub current_split_meters: f64,
    pub split_count: u32,
    pub fix_count: u32,
    pub rejected_fixes: u32,
    pub avg_pace_seconds: Option<f64>,
    pub last_split: Option<FfiSplit>,
}

impl FfiSessionSnapshot {
    fn new(snap: SessionSnapshot, units: UnitSystem) -> Self {
        Self {
            recording: snap.recording,
            distance_meters: snap.distance_meters,
            elapsed_seconds: snap.elapsed_seconds,
            current_split_meters: snap.current_split_meters,
            split_count: snap.split_count,
            fix_count: snap.fix_count,
            rejected_fixes: snap.rejected_fixes,
            avg_pace_seconds: snap.average_pace(units),
            last_split: snap.last_split.as_ref().map(|s| FfiSplit::new(s, units)),
        }
    }
}

/// Result of a stopped session. The track is flattened to
/// `[timestamp_ms, lat, lng, altitude, accuracy]` per fix, NaN for no altitude.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecordingResult {
    pub started_at_ms: Option<i64>,
    pub ended_at_ms: i64,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub avg_pace_seconds: Option<f64>,
    pub splits: Vec<FfiSplit>,
    pub track_flat: Vec<f64>,
    pub rejected_fixes: u32,
}

impl FfiRecordingResult {
    fn new(result: &RecordingResult, units: UnitSystem) -> Self {
        let track_flat = result
            .track
            .iter()
            .flat_map(|f| {
                [
                    f.timestamp.timestamp_millis() as f64,
                    f.latitude,
                    f.longitude,
                    f.altitude.unwrap_or(f64::NAN),
                    f.horizontal_accuracy,
                ]
            })
            .collect();
        Self {
            started_at_ms: result.started_at.map(|t| t.timestamp_millis()),
            ended_at_ms: result.ended_at.timestamp_millis(),
            distance_meters: result.distance_meters,
            duration_seconds: result.duration_seconds,
            avg_pace_seconds: result.average_pace(units),
            splits: result.splits.iter().map(|s| FfiSplit::new(s, units)).collect(),
            track_flat,
            rejected_fixes: result.rejected_fixes,
        }
    }
}

fn units_for(metric: bool) -> UnitSystem {
    if metric {
        UnitSystem::Metric
    } else {
        UnitSystem::Imperial
    }
}

fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

// ============================================================================
// Recording Session
// ============================================================================

/// Start a session with km (`metric`) or mile splits.
/// Returns false if a session is already recording.
#[uniffi::export]
pub fn recorder_start(metric: bool) -> bool {
    init_logging();
    match with_recorder(|e| e.start(units_for(metric))) {
        Ok(()) => {
            info!("[RunTrackerRust] Recording started (metric={})", metric);
            true
        }
        Err(e) => {
            warn!("[RunTrackerRust] recorder_start refused: {}", e);
            false
        }
    }
}

/// Push fixes as a flat buffer, five values per fix. Returns the number of
/// fixes accepted.
#[uniffi::export]
pub fn recorder_ingest_flat(fixes: Vec<f64>) -> u32 {
    with_recorder(|e| e.ingest_flat(&fixes)).accepted
}

/// Display-timer tick. Returns elapsed seconds since the first accepted fix.
#[uniffi::export]
pub fn recorder_tick(now_ms: i64) -> f64 {
    match from_millis(now_ms) {
        Some(now) => with_recorder(|e| e.tick(now)),
        None => with_recorder(|e| e.snapshot().elapsed_seconds),
    }
}

#[uniffi::export]
pub fn recorder_snapshot() -> FfiSessionSnapshot {
    with_recorder(|e| FfiSessionSnapshot::new(e.snapshot(), e.units()))
}

#[uniffi::export]
pub fn recorder_snapshot_json() -> String {
    with_recorder(|e| e.snapshot_json())
}

#[uniffi::export]
pub fn recorder_is_recording() -> bool {
    with_recorder(|e| e.is_recording())
}

/// Stop the session. Returns None if nothing was recording.
#[uniffi::export]
pub fn recorder_stop(now_ms: i64) -> Option<FfiRecordingResult> {
    let now = from_millis(now_ms)?;
    with_recorder(|e| {
        let units = e.units();
        match e.stop(now) {
            Ok(result) => {
                info!(
                    "[RunTrackerRust] Recording stopped: {:.0}m, {} splits",
                    result.distance_meters,
                    result.splits.len()
                );
                Some(FfiRecordingResult::new(&result, units))
            }
            Err(err) => {
                warn!("[RunTrackerRust] recorder_stop refused: {}", err);
                None
            }
        }
    })
}

// ============================================================================
// Export of the Last Recording
// ============================================================================

/// CSV of the last stopped track. None if nothing was recorded or the
/// export failed.
#[uniffi::export]
pub fn recorder_last_track_csv() -> Option<String> {
    with_recorder(|e| {
        let result = e.last_result()?;
        track_to_csv(&result.track)
            .map_err(|err| warn!("[RunTrackerRust] CSV export failed: {}", err))
            .ok()
    })
}

#[uniffi::export]
pub fn recorder_last_track_gpx(name: String) -> Option<String> {
    with_recorder(|e| {
        let result = e.last_result()?;
        track_to_gpx(&result.track, &name)
            .map_err(|err| warn!("[RunTrackerRust] GPX export failed: {}", err))
            .ok()
    })
}

// ============================================================================
// Display Formatting
// ============================================================================

#[uniffi::export]
pub fn ffi_format_pace(pace_seconds: Option<f64>, metric: bool) -> String {
    format_pace(pace_seconds, units_for(metric))
}

#[uniffi::export]
pub fn ffi_format_duration(seconds: f64) -> String {
    format_duration(seconds)
}

#[uniffi::export]
pub fn ffi_format_distance(meters: f64, metric: bool) -> String {
    format_distance(meters, units_for(metric))
}
