//! # Recorder Engine
//!
//! Process-wide owner of the single active recording session.
//!
//! The location callback, the once-per-second display timer and the UI all
//! reach the session through [`with_recorder`], which holds one mutex for the
//! duration of a `start`/`ingest`/`tick`/`stop` call. Readers get an owned
//! [`SessionSnapshot`] copied under that lock, never a half-updated view.

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use log::{info, warn};
use once_cell::sync::Lazy;

use crate::{
    BatchSummary, GpsFix, IngestOutcome, RecorderConfig, RecorderError, RecordingResult, Result,
    SessionSnapshot, TrackSegmenter, UnitSystem,
};

/// Values per fix in a flat buffer: `[timestamp_ms, lat, lng, altitude, accuracy]`.
/// A NaN altitude means "not reported".
pub const FLAT_FIX_STRIDE: usize = 5;

/// Stateful wrapper around the segmenter used by the app shell.
#[derive(Debug)]
pub struct RecorderEngine {
    segmenter: TrackSegmenter,
    units: UnitSystem,
    last_result: Option<RecordingResult>,
}

impl RecorderEngine {
    pub fn new() -> Self {
        Self::with_config(RecorderConfig::default())
    }

    pub fn with_config(config: RecorderConfig) -> Self {
        Self {
            segmenter: TrackSegmenter::new(config),
            units: UnitSystem::default(),
            last_result: None,
        }
    }

    /// Start recording with splits every km or mile.
    pub fn start(&mut self, units: UnitSystem) -> Result<()> {
        self.segmenter.start_with_units(units)?;
        self.units = units;
        self.last_result = None;
        Ok(())
    }

    pub fn ingest(&mut self, fix: GpsFix) -> IngestOutcome {
        self.segmenter.ingest(fix)
    }

    pub fn ingest_batch(&mut self, fixes: Vec<GpsFix>) -> BatchSummary {
        self.segmenter.ingest_batch(fixes)
    }

    /// Ingest fixes from a flat buffer (see [`FLAT_FIX_STRIDE`]).
    ///
    /// Trailing values that do not form a whole fix, and fixes whose
    /// timestamp cannot be represented, are counted as rejected.
    pub fn ingest_flat(&mut self, flat: &[f64]) -> BatchSummary {
        let chunks = flat.chunks_exact(FLAT_FIX_STRIDE);
        let mut rejected = u32::from(!chunks.remainder().is_empty());

        let fixes: Vec<GpsFix> = chunks
            .filter_map(|c| {
                let fix = fix_from_flat(c);
                if fix.is_none() {
                    rejected += 1;
                }
                fix
            })
            .collect();

        if rejected > 0 {
            warn!("[RecorderEngine] {} malformed flat fixes skipped", rejected);
        }
        let mut summary = self.segmenter.ingest_batch(fixes);
        summary.rejected += rejected;
        summary
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> f64 {
        self.segmenter.tick(now)
    }

    /// Stop recording. The result is also kept for [`Self::last_result`].
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<RecordingResult> {
        let result = self.segmenter.stop(now)?;
        self.last_result = Some(result.clone());
        Ok(result)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.segmenter.snapshot()
    }

    /// Snapshot as JSON for the UI layer.
    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn units(&self) -> UnitSystem {
        self.units
    }

    pub fn is_recording(&self) -> bool {
        self.segmenter.is_recording()
    }

    pub fn last_result(&self) -> Option<&RecordingResult> {
        self.last_result.as_ref()
    }

    /// Replace the segmenter configuration. Refused while recording.
    pub fn set_config(&mut self, config: RecorderConfig) -> Result<()> {
        config.validate()?;
        if self.segmenter.is_recording() {
            warn!("[RecorderEngine] Config change refused while recording");
            return Err(RecorderError::config(
                "configuration cannot change while a session is recording",
            ));
        }
        self.segmenter = TrackSegmenter::new(config);
        info!("[RecorderEngine] Config updated");
        Ok(())
    }
}

impl Default for RecorderEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn fix_from_flat(c: &[f64]) -> Option<GpsFix> {
    if !c[0].is_finite() {
        return None;
    }
    let timestamp = Utc.timestamp_millis_opt(c[0] as i64).single()?;
    let mut fix = GpsFix::new(timestamp, c[1], c[2], c[4]);
    if c[3].is_finite() {
        fix = fix.with_altitude(c[3]);
    }
    Some(fix)
}

// ============================================================================
// Global Singleton
// ============================================================================

/// Global recorder instance.
///
/// Exactly one recording session exists per process; FFI calls and the
/// display timer share it through this mutex.
pub static RECORDER: Lazy<Mutex<RecorderEngine>> = Lazy::new(|| Mutex::new(RecorderEngine::new()));

/// Get a lock on the global recorder.
///
/// A poisoned lock is recovered: session state is only ever replaced by
/// whole-call mutations, so the inner value is still consistent.
pub fn with_recorder<F, R>(f: F) -> R
where
    F: FnOnce(&mut RecorderEngine) -> R,
{
    let mut engine = RECORDER.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut engine)
}

// ============================================================================
// Tests
// ============================================================================
