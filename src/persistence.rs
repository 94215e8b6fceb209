//! # SQLite Store
//!
//! Durable [`RunRepository`] and [`WorkoutRepository`] backed by SQLite.
//!
//! ## Layout
//!
//! - `runs`: one row per run. Scalar columns for listing, the route and the
//!   splits as MessagePack blobs (loaded with the row). Start and end times
//!   are RFC 3339 text with nanosecond digits, so text order is time order.
//! - `workouts`: one row per day, items and sets as a MessagePack blob.
//! - `exercises`: the catalog, keyed by lowercased name.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::RecorderError;
use crate::store::{RunRepository, WorkoutRepository};
use crate::workouts::DAY_KEY_FORMAT;
use crate::{
    Exercise, GpsFix, Result, RunFeeling, RunRecord, RunType, Split, UnitSystem, Workout,
    WorkoutItem,
};

/// Row counts, for settings screens and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub run_count: u32,
    pub workout_count: u32,
    pub exercise_count: u32,
}

/// SQLite-backed store for runs, workouts and the exercise catalog.
pub struct SqliteStore {
    db: Connection,
    db_path: String,
}

impl SqliteStore {
    // ========================================================================
    // Initialization
    // ========================================================================

    /// Open (or create) the database at `db_path`.
    pub fn new(db_path: &str) -> Result<Self> {
        let db = Connection::open(db_path)?;
        Self::init_schema(&db)?;
        info!("[SqliteStore] Opened {}", db_path);
        Ok(Self {
            db,
            db_path: db_path.to_string(),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                started_at TEXT NOT NULL,
                ended_at TEXT,
                units TEXT NOT NULL,
                run_type TEXT NOT NULL,
                feeling TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                distance_meters REAL NOT NULL,
                duration_seconds REAL NOT NULL,
                route BLOB NOT NULL,
                splits BLOB NOT NULL
            );

            CREATE TABLE IF NOT EXISTS workouts (
                day_key TEXT PRIMARY KEY,
                items BLOB NOT NULL
            );

            CREATE TABLE IF NOT EXISTS exercises (
                key TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                primary_group TEXT NOT NULL DEFAULT '',
                notes TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_runs_started ON runs(started_at);
            "#,
        )?;
        Ok(())
    }

    pub fn path(&self) -> &str {
        &self.db_path
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let count = |table: &str| -> Result<u32> {
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            Ok(self.db.query_row(&sql, [], |row| row.get(0))?)
        };
        Ok(StoreStats {
            run_count: count("runs")?,
            workout_count: count("workouts")?,
            exercise_count: count("exercises")?,
        })
    }

    /// Remove everything.
    pub fn clear(&mut self) -> Result<()> {
        self.db
            .execute_batch("DELETE FROM runs; DELETE FROM workouts; DELETE FROM exercises;")?;
        info!("[SqliteStore] Cleared all data");
        Ok(())
    }
}

// ============================================================================
// Row Conversion
// ============================================================================

struct RunRow {
    id: String,
    started_at: String,
    ended_at: Option<String>,
    units: String,
    run_type: String,
    feeling: String,
    notes: String,
    distance_meters: f64,
    duration_seconds: f64,
    route: Vec<u8>,
    splits: Vec<u8>,
}

const RUN_COLUMNS: &str = "id, started_at, ended_at, units, run_type, feeling, notes, \
                           distance_meters, duration_seconds, route, splits";

impl RunRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            started_at: row.get(1)?,
            ended_at: row.get(2)?,
            units: row.get(3)?,
            run_type: row.get(4)?,
            feeling: row.get(5)?,
            notes: row.get(6)?,
            distance_meters: row.get(7)?,
            duration_seconds: row.get(8)?,
            route: row.get(9)?,
            splits: row.get(10)?,
        })
    }

    fn into_record(self) -> Result<RunRecord> {
        let units = UnitSystem::from_label(&self.units)
            .ok_or_else(|| corrupt("units", &self.units))?;
        let run_type =
            RunType::parse(&self.run_type).ok_or_else(|| corrupt("run_type", &self.run_type))?;
        let feeling =
            RunFeeling::parse(&self.feeling).ok_or_else(|| corrupt("feeling", &self.feeling))?;
        let route: Vec<GpsFix> = rmp_serde::from_slice(&self.route)?;
        let splits: Vec<Split> = rmp_serde::from_slice(&self.splits)?;

        Ok(RunRecord {
            started_at: parse_timestamp(&self.started_at)?,
            ended_at: self.ended_at.as_deref().map(parse_timestamp).transpose()?,
            id: self.id,
            units,
            run_type,
            feeling,
            notes: self.notes,
            total_distance_meters: self.distance_meters,
            total_duration_seconds: self.duration_seconds,
            route,
            splits,
        })
    }
}

fn corrupt(column: &str, value: &str) -> RecorderError {
    RecorderError::Serialization {
        message: format!("unexpected {} value '{}'", column, value),
    }
}

/// Fixed-width UTC text, e.g. `2025-09-26T07:00:00.000000000Z`.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| corrupt("timestamp", text))
}

fn workout_from_parts(day_key: String, items_blob: &[u8]) -> Result<Workout> {
    let date = NaiveDate::parse_from_str(&day_key, DAY_KEY_FORMAT)
        .map_err(|_| corrupt("day_key", &day_key))?;
    let items: Vec<WorkoutItem> = rmp_serde::from_slice(items_blob)?;
    Ok(Workout {
        day_key,
        date,
        items,
    })
}

// ============================================================================
// Repositories
// ============================================================================

impl RunRepository for SqliteStore {
    fn save_run(&mut self, run: &RunRecord) -> Result<()> {
        let route = rmp_serde::to_vec(&run.route)?;
        let splits = rmp_serde::to_vec(&run.splits)?;
        self.db.execute(
            "INSERT OR REPLACE INTO runs (id, started_at, ended_at, units, run_type, feeling, \
             notes, distance_meters, duration_seconds, route, splits) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                run.id,
                format_timestamp(&run.started_at),
                run.ended_at.as_ref().map(format_timestamp),
                run.units.label(),
                run.run_type.as_str(),
                run.feeling.as_str(),
                run.notes,
                run.total_distance_meters,
                run.total_duration_seconds,
                route,
                splits,
            ],
        )?;
        debug!(
            "[SqliteStore] Saved run {} ({} fixes, {} splits)",
            run.id,
            run.route.len(),
            run.splits.len()
        );
        Ok(())
    }

    fn load_run(&self, id: &str) -> Result<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?", RUN_COLUMNS);
        let row = self
            .db
            .query_row(&sql, params![id], RunRow::from_row)
            .optional()?;
        row.map(RunRow::into_record).transpose()
    }

    fn list_runs(&self) -> Result<Vec<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY started_at DESC", RUN_COLUMNS);
        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt
            .query_map([], RunRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(RunRow::into_record).collect()
    }

    fn delete_run(&mut self, id: &str) -> Result<bool> {
        let removed = self.db.execute("DELETE FROM runs WHERE id = ?", params![id])?;
        Ok(removed > 0)
    }
}

impl WorkoutRepository for SqliteStore {
    fn save_workout(&mut self, workout: &Workout) -> Result<()> {
        let items = rmp_serde::to_vec(&workout.items)?;
        self.db.execute(
            "INSERT OR REPLACE INTO workouts (day_key, items) VALUES (?, ?)",
            params![workout.day_key, items],
        )?;
        Ok(())
    }

    fn load_workout(&self, day_key: &str) -> Result<Option<Workout>> {
        let row = self
            .db
            .query_row(
                "SELECT day_key, items FROM workouts WHERE day_key = ?",
                params![day_key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)),
            )
            .optional()?;
        row.map(|(key, blob)| workout_from_parts(key, &blob))
            .transpose()
    }

    fn list_workouts(&self) -> Result<Vec<Workout>> {
        // Day keys are ISO dates, so text order is date order.
        let mut stmt = self
            .db
            .prepare("SELECT day_key, items FROM workouts ORDER BY day_key DESC")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|(key, blob)| workout_from_parts(key, &blob))
            .collect()
    }

    fn delete_workout(&mut self, day_key: &str) -> Result<bool> {
        let removed = self
            .db
            .execute("DELETE FROM workouts WHERE day_key = ?", params![day_key])?;
        Ok(removed > 0)
    }

    fn save_exercise(&mut self, exercise: &Exercise) -> Result<()> {
        self.db.execute(
            "INSERT OR REPLACE INTO exercises (key, name, primary_group, notes) \
             VALUES (?, ?, ?, ?)",
            params![exercise.key(), exercise.name, exercise.primary_group, exercise.notes],
        )?;
        Ok(())
    }

    fn list_exercises(&self) -> Result<Vec<Exercise>> {
        let mut stmt = self
            .db
            .prepare("SELECT name, primary_group, notes FROM exercises ORDER BY key")?;
        let exercises = stmt
            .query_map([], |row| {
                Ok(Exercise {
                    name: row.get(0)?,
                    primary_group: row.get(1)?,
                    notes: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(exercises)
    }
}

// ============================================================================
// Tests
// ============================================================================
