//! # Track Segmenter
//!
//! Turns a stream of raw GPS fixes into validated distance/time accounting
//! and fixed-distance splits.
//!
//! ## Algorithm
//!
//! For every fix, in arrival order:
//! 1. Drop it if the horizontal accuracy is outside `[0, max_horizontal_accuracy]`
//!    (or the coordinates are invalid, or it is older than the last accepted fix).
//! 2. The first accepted fix anchors the session and the first split.
//! 3. Otherwise measure the haversine distance from the previous accepted fix.
//!    Movement above `min_movement_meters` is added to the total and to the
//!    in-progress split; smaller movement is jitter and only grows the track.
//! 4. While the in-progress split holds at least one split length, emit a
//!    split and carry the remainder.
//!
//! ## Known approximation
//!
//! When one fix crosses several split boundaries (a long gap between fixes),
//! every split emitted for that fix gets the same elapsed reading, taken
//! before the split-start reset. Durations are not interpolated along the jump.

use chrono::{DateTime, Utc};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::geo_utils::fix_distance;
use crate::pace::average_pace;
use crate::{GpsFix, RecorderConfig, RecorderError, Result, Split, UnitSystem, METERS_PER_KM};

// ============================================================================
// Types
// ============================================================================

/// Why a fix was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Horizontal accuracy negative, NaN or above the configured maximum
    AccuracyOutOfRange { accuracy: f64 },
    /// Latitude/longitude not finite or out of range
    InvalidCoordinates,
    /// Timestamp earlier than the last accepted fix
    OutOfOrder,
}

/// What happened to a single ingested fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngestOutcome {
    /// No session is running; the fix was ignored
    NotRecording,
    /// The fix failed validation; no state changed besides the reject counter
    Rejected(RejectReason),
    /// First accepted fix of the session
    Anchored,
    /// Movement counted toward distance, possibly completing splits
    Counted { meters: f64, splits_emitted: u32 },
    /// Movement at or below the jitter threshold
    Jitter { meters: f64 },
}

impl IngestOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            IngestOutcome::Anchored | IngestOutcome::Counted { .. } | IngestOutcome::Jitter { .. }
        )
    }
}

/// Totals for one `ingest_batch` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub accepted: u32,
    pub rejected: u32,
    pub splits_emitted: u32,
}

/// Consistent point-in-time view of a session for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub recording: bool,
    pub distance_meters: f64,
    /// Time between the first and the latest accepted fix
    pub duration_seconds: f64,
    /// Wall-clock time since the first accepted fix, updated by `tick`
    pub elapsed_seconds: f64,
    pub current_split_meters: f64,
    pub split_count: u32,
    pub fix_count: u32,
    pub rejected_fixes: u32,
    pub jitter_fixes: u32,
    pub last_split: Option<Split>,
}

impl SessionSnapshot {
    /// Average pace in seconds per km/mile, `None` before any distance.
    pub fn average_pace(&self, units: UnitSystem) -> Option<f64> {
        average_pace(self.distance_meters, self.duration_seconds, units)
    }
}

/// Everything a finished session produced. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingResult {
    /// Timestamp of the first accepted fix
    pub started_at: Option<DateTime<Utc>>,
    /// Stop timestamp, never earlier than the last accepted fix
    pub ended_at: DateTime<Utc>,
    pub track: Vec<GpsFix>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub splits: Vec<Split>,
    pub split_distance_meters: f64,
    pub rejected_fixes: u32,
}

impl RecordingResult {
    /// True when no fix was ever accepted.
    pub fn is_degenerate(&self) -> bool {
        self.track.is_empty()
    }

    pub fn average_pace(&self, units: UnitSystem) -> Option<f64> {
        average_pace(self.distance_meters, self.duration_seconds, units)
    }
}

// ============================================================================
// Track Segmenter
// ============================================================================

/// Single-session GPS track segmenter.
///
/// Owns all session state; mutation happens only through `start`, `ingest`,
/// `ingest_batch`, `tick` and `stop`. Use [`crate::engine`] for shared access.
#[derive(Debug, Clone)]
pub struct TrackSegmenter {
    config: RecorderConfig,
    recording: bool,
    split_distance_meters: f64,

    track: Vec<GpsFix>,
    splits: Vec<Split>,

    distance_meters: f64,
    split_accumulator: f64,
    split_started_at: Option<DateTime<Utc>>,
    session_started_at: Option<DateTime<Utc>>,
    last_timestamp: Option<DateTime<Utc>>,

    elapsed_seconds: f64,
    rejected_fixes: u32,
    jitter_fixes: u32,
}

impl TrackSegmenter {
    /// Create a segmenter with custom configuration.
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            recording: false,
            split_distance_meters: METERS_PER_KM,
            track: Vec::new(),
            splits: Vec::new(),
            distance_meters: 0.0,
            split_accumulator: 0.0,
            split_started_at: None,
            session_started_at: None,
            last_timestamp: None,
            elapsed_seconds: 0.0,
            rejected_fixes: 0,
            jitter_fixes: 0,
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Split length of the current (or last) session.
    pub fn split_distance_meters(&self) -> f64 {
        self.split_distance_meters
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Start a new session with the given split length.
    ///
    /// Fails with [`RecorderError::AlreadyStarted`] if a session is running;
    /// the running session is left untouched.
    pub fn start(&mut self, split_distance_meters: f64) -> Result<()> {
        if self.recording {
            return Err(RecorderError::AlreadyStarted);
        }
        if !(split_distance_meters.is_finite() && split_distance_meters > 0.0) {
            return Err(RecorderError::config(format!(
                "split distance must be a positive number, got {}",
                split_distance_meters
            )));
        }

        *self = Self::new(self.config.clone());
        self.split_distance_meters = split_distance_meters;
        self.recording = true;

        info!(
            "[TrackSegmenter] Started session (split {:.1}m)",
            split_distance_meters
        );
        Ok(())
    }

    /// Start a new session splitting every km or mile.
    pub fn start_with_units(&mut self, units: UnitSystem) -> Result<()> {
        self.start(units.split_length_meters())
    }

    /// Process one fix.
    pub fn ingest(&mut self, fix: GpsFix) -> IngestOutcome {
        if !self.recording {
            return IngestOutcome::NotRecording;
        }

        if let Err(reason) = self.validate(&fix) {
            self.rejected_fixes += 1;
            trace!("[TrackSegmenter] Rejected fix at {}: {:?}", fix.timestamp, reason);
            return IngestOutcome::Rejected(reason);
        }

        let Some(previous) = self.track.last().copied() else {
            self.split_started_at = Some(fix.timestamp);
            self.session_started_at = Some(fix.timestamp);
            self.last_timestamp = Some(fix.timestamp);
            self.track.push(fix);
            debug!("[TrackSegmenter] Anchored at {}", fix.timestamp);
            return IngestOutcome::Anchored;
        };

        let meters = fix_distance(&previous, &fix);

        if meters <= self.config.min_movement_meters {
            self.jitter_fixes += 1;
            if self.config.keep_jitter_fixes {
                self.last_timestamp = Some(fix.timestamp);
                self.track.push(fix);
            }
            return IngestOutcome::Jitter { meters };
        }

        self.distance_meters += meters;
        self.split_accumulator += meters;
        self.last_timestamp = Some(fix.timestamp);
        self.track.push(fix);

        let splits_emitted = self.emit_completed_splits(fix.timestamp);
        IngestOutcome::Counted {
            meters,
            splits_emitted,
        }
    }

    /// Process a batch of fixes in arrival order.
    pub fn ingest_batch<I>(&mut self, fixes: I) -> BatchSummary
    where
        I: IntoIterator<Item = GpsFix>,
    {
        let mut summary = BatchSummary::default();
        for fix in fixes {
            match self.ingest(fix) {
                IngestOutcome::NotRecording => break,
                IngestOutcome::Rejected(_) => summary.rejected += 1,
                IngestOutcome::Counted { splits_emitted, .. } => {
                    summary.accepted += 1;
                    summary.splits_emitted += splits_emitted;
                }
                IngestOutcome::Jitter { .. } if !self.config.keep_jitter_fixes => {}
                IngestOutcome::Anchored | IngestOutcome::Jitter { .. } => summary.accepted += 1,
            }
        }
        summary
    }

    /// Refresh the display clock. Only reads the session anchor; split
    /// bookkeeping is never touched.
    pub fn tick(&mut self, now: DateTime<Utc>) -> f64 {
        if self.recording {
            if let Some(started) = self.session_started_at {
                self.elapsed_seconds = seconds_between(started, now).max(self.duration_seconds());
            }
        }
        self.elapsed_seconds
    }

    /// Stop the session and hand back everything it recorded.
    ///
    /// A trailing partial split longer than `min_final_split_meters` is kept.
    /// Stopping a session that never accepted a fix returns an empty result.
    pub fn stop(&mut self, final_timestamp: DateTime<Utc>) -> Result<RecordingResult> {
        if !self.recording {
            return Err(RecorderError::NotRecording);
        }
        self.recording = false;

        let ended_at = match self.last_timestamp {
            Some(last) if last > final_timestamp => last,
            _ => final_timestamp,
        };

        if self.split_accumulator > self.config.min_final_split_meters {
            if let Some(split_start) = self.split_started_at {
                let split = Split {
                    index: self.splits.len() as u32 + 1,
                    distance_meters: self.split_accumulator,
                    duration_seconds: seconds_between(split_start, ended_at),
                };
                debug!(
                    "[TrackSegmenter] Final partial split {}: {:.1}m in {:.1}s",
                    split.index, split.distance_meters, split.duration_seconds
                );
                self.splits.push(split);
                self.split_accumulator = 0.0;
            }
        }

        let duration_seconds = self
            .session_started_at
            .map(|start| seconds_between(start, ended_at))
            .unwrap_or(0.0);
        self.last_timestamp = self.last_timestamp.map(|_| ended_at);
        self.elapsed_seconds = duration_seconds;

        let result = RecordingResult {
            started_at: self.session_started_at,
            ended_at,
            track: self.track.clone(),
            distance_meters: self.distance_meters,
            duration_seconds,
            splits: self.splits.clone(),
            split_distance_meters: self.split_distance_meters,
            rejected_fixes: self.rejected_fixes,
        };

        info!(
            "[TrackSegmenter] Stopped: {:.0}m in {:.0}s, {} splits, {} fixes ({} rejected)",
            result.distance_meters,
            result.duration_seconds,
            result.splits.len(),
            result.track.len(),
            result.rejected_fixes
        );
        Ok(result)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    pub fn duration_seconds(&self) -> f64 {
        match (self.session_started_at, self.last_timestamp) {
            (Some(start), Some(last)) => seconds_between(start, last),
            _ => 0.0,
        }
    }

    pub fn current_split_meters(&self) -> f64 {
        self.split_accumulator
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn track(&self) -> &[GpsFix] {
        &self.track
    }

    pub fn rejected_fixes(&self) -> u32 {
        self.rejected_fixes
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            recording: self.recording,
            distance_meters: self.distance_meters,
            duration_seconds: self.duration_seconds(),
            elapsed_seconds: self.elapsed_seconds,
            current_split_meters: self.split_accumulator,
            split_count: self.splits.len() as u32,
            fix_count: self.track.len() as u32,
            rejected_fixes: self.rejected_fixes,
            jitter_fixes: self.jitter_fixes,
            last_split: self.splits.last().copied(),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn validate(&self, fix: &GpsFix) -> std::result::Result<(), RejectReason> {
        if !fix.has_usable_accuracy(self.config.max_horizontal_accuracy) {
            return Err(RejectReason::AccuracyOutOfRange {
                accuracy: fix.horizontal_accuracy,
            });
        }
        if !fix.point().is_valid() {
            return Err(RejectReason::InvalidCoordinates);
        }
        if matches!(self.last_timestamp, Some(last) if fix.timestamp < last) {
            return Err(RejectReason::OutOfOrder);
        }
        Ok(())
    }

    /// Emit every split the accumulator now covers. All splits emitted here
    /// share one elapsed reading taken before the split-start reset.
    fn emit_completed_splits(&mut self, at: DateTime<Utc>) -> u32 {
        let split_length = self.split_distance_meters;
        if self.split_accumulator < split_length {
            return 0;
        }
        let Some(split_start) = self.split_started_at else {
            return 0;
        };

        let elapsed = seconds_between(split_start, at);
        let mut emitted = 0;
        while self.split_accumulator >= split_length {
            let split = Split {
                index: self.splits.len() as u32 + 1,
                distance_meters: split_length,
                duration_seconds: elapsed,
            };
            debug!(
                "[TrackSegmenter] Split {}: {:.1}m in {:.1}s",
                split.index, split.distance_meters, split.duration_seconds
            );
            self.splits.push(split);
            self.split_accumulator -= split_length;
            emitted += 1;
        }
        self.split_started_at = Some(at);
        emitted
    }
}

impl Default for TrackSegmenter {
    fn default() -> Self {
        Self::new(RecorderConfig::default())
    }
}

/// Non-negative seconds from `from` to `to`, millisecond resolution.
pub(crate) fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64 / 1000.0).max(0.0)
}

// ============================================================================
// Tests
// ============================================================================
