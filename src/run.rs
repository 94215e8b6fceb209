//! Stored run records.
//!
//! A [`RunRecord`] is the explicit save/load unit for a finished recording:
//! plain values and an identifier, no live references into a database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo_utils::{compute_bounds, simplify_track};
use crate::pace::average_pace;
use crate::{Bounds, GpsFix, GpsPoint, RecordingResult, Split, UnitSystem};

/// Kind of run, chosen by the user after recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    #[default]
    Easy,
    Long,
    Interval,
    Tempo,
    Race,
}

impl RunType {
    pub const ALL: [RunType; 5] = [
        RunType::Easy,
        RunType::Long,
        RunType::Interval,
        RunType::Tempo,
        RunType::Race,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RunType::Easy => "easy",
            RunType::Long => "long",
            RunType::Interval => "interval",
            RunType::Tempo => "tempo",
            RunType::Race => "race",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

/// How the run felt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunFeeling {
    Great,
    #[default]
    Okay,
    Tired,
    Injured,
}

impl RunFeeling {
    pub const ALL: [RunFeeling; 4] = [
        RunFeeling::Great,
        RunFeeling::Okay,
        RunFeeling::Tired,
        RunFeeling::Injured,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RunFeeling::Great => "great",
            RunFeeling::Okay => "okay",
            RunFeeling::Tired => "tired",
            RunFeeling::Injured => "injured",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == value)
    }
}

/// A finished run as stored by the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub units: UnitSystem,
    pub run_type: RunType,
    pub feeling: RunFeeling,
    pub notes: String,
    pub total_distance_meters: f64,
    pub total_duration_seconds: f64,
    pub route: Vec<GpsFix>,
    pub splits: Vec<Split>,
}

impl RunRecord {
    /// Build a record from a finished recording.
    ///
    /// Degenerate recordings (no fixes) start at their stop timestamp.
    pub fn from_recording(
        id: impl Into<String>,
        units: UnitSystem,
        result: RecordingResult,
    ) -> Self {
        Self {
            id: id.into(),
            started_at: result.started_at.unwrap_or(result.ended_at),
            ended_at: Some(result.ended_at),
            units,
            run_type: RunType::default(),
            feeling: RunFeeling::default(),
            notes: String::new(),
            total_distance_meters: result.distance_meters,
            total_duration_seconds: result.duration_seconds,
            route: result.track,
            splits: result.splits,
        }
    }

    /// Identifier derived from the start time, e.g. `run-1758870000000`.
    pub fn generate_id(started_at: DateTime<Utc>) -> String {
        format!("run-{}", started_at.timestamp_millis())
    }

    pub fn with_details(mut self, run_type: RunType, feeling: RunFeeling, notes: &str) -> Self {
        self.run_type = run_type;
        self.feeling = feeling;
        self.notes = notes.trim().to_string();
        self
    }

    pub fn avg_pace_seconds_per_km(&self) -> Option<f64> {
        average_pace(self.total_distance_meters, self.total_duration_seconds, UnitSystem::Metric)
    }

    pub fn avg_pace_seconds_per_mile(&self) -> Option<f64> {
        average_pace(self.total_distance_meters, self.total_duration_seconds, UnitSystem::Imperial)
    }

    /// Average pace in the run's own unit system.
    pub fn avg_pace(&self) -> Option<f64> {
        average_pace(self.total_distance_meters, self.total_duration_seconds, self.units)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        compute_bounds(&self.route)
    }

    /// Simplified polyline for map display; empty below two fixes.
    pub fn map_polyline(&self, tolerance: f64) -> Vec<GpsPoint> {
        if self.route.len() < 2 {
            return Vec::new();
        }
        simplify_track(&self.route, tolerance)
    }

    /// Export file stem, e.g. `Run-2025-09-26-0700`.
    pub fn file_stem(&self) -> String {
        format!("Run-{}", self.started_at.format("%Y-%m-%d-%H%M"))
    }
}
