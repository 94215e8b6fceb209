//! Repository boundary between the app and its storage.
//!
//! The segmenter never touches storage; the caller turns a
//! [`RecordingResult`](crate::RecordingResult) into a [`RunRecord`] and saves
//! it here. [`InMemoryStore`] backs tests and previews; the SQLite store lives
//! in [`crate::persistence`] behind the `persistence` feature.

use std::collections::HashMap;

use crate::{Exercise, OptionExt, Result, RunRecord, Workout};

/// Storage for finished runs.
pub trait RunRepository {
    /// Insert or replace a run by id.
    fn save_run(&mut self, run: &RunRecord) -> Result<()>;
    fn load_run(&self, id: &str) -> Result<Option<RunRecord>>;
    /// All runs, newest first.
    fn list_runs(&self) -> Result<Vec<RunRecord>>;
    /// Returns whether a run was removed.
    fn delete_run(&mut self, id: &str) -> Result<bool>;

    /// Like `load_run`, but a missing run is an error.
    fn require_run(&self, id: &str) -> Result<RunRecord> {
        self.load_run(id)?.ok_or_not_found("Run", id)
    }
}

/// Storage for the training journal.
pub trait WorkoutRepository {
    /// Insert or replace the workout for its day.
    fn save_workout(&mut self, workout: &Workout) -> Result<()>;
    fn load_workout(&self, day_key: &str) -> Result<Option<Workout>>;
    /// All workouts, newest day first.
    fn list_workouts(&self) -> Result<Vec<Workout>>;
    fn delete_workout(&mut self, day_key: &str) -> Result<bool>;

    fn save_exercise(&mut self, exercise: &Exercise) -> Result<()>;
    /// All exercises sorted by name.
    fn list_exercises(&self) -> Result<Vec<Exercise>>;
}

/// Volatile store keeping everything in hash maps.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    runs: HashMap<String, RunRecord>,
    workouts: HashMap<String, Workout>,
    exercises: HashMap<String, Exercise>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunRepository for InMemoryStore {
    fn save_run(&mut self, run: &RunRecord) -> Result<()> {
        self.runs.insert(run.id.clone(), run.clone());
        Ok(())
    }

    fn load_run(&self, id: &str) -> Result<Option<RunRecord>> {
        Ok(self.runs.get(id).cloned())
    }

    fn list_runs(&self) -> Result<Vec<RunRecord>> {
        let mut runs: Vec<RunRecord> = self.runs.values().cloned().collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(runs)
    }

    fn delete_run(&mut self, id: &str) -> Result<bool> {
        Ok(self.runs.remove(id).is_some())
    }
}

impl WorkoutRepository for InMemoryStore {
    fn save_workout(&mut self, workout: &Workout) -> Result<()> {
        self.workouts.insert(workout.day_key.clone(), workout.clone());
        Ok(())
    }

    fn load_workout(&self, day_key: &str) -> Result<Option<Workout>> {
        Ok(self.workouts.get(day_key).cloned())
    }

    fn list_workouts(&self) -> Result<Vec<Workout>> {
        let mut workouts: Vec<Workout> = self.workouts.values().cloned().collect();
        workouts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(workouts)
    }

    fn delete_workout(&mut self, day_key: &str) -> Result<bool> {
        Ok(self.workouts.remove(day_key).is_some())
    }

    fn save_exercise(&mut self, exercise: &Exercise) -> Result<()> {
        self.exercises.insert(exercise.key(), exercise.clone());
        Ok(())
    }

    fn list_exercises(&self) -> Result<Vec<Exercise>> {
        let mut exercises: Vec<Exercise> = self.exercises.values().cloned().collect();
        exercises.sort_by_key(|e| e.key());
        Ok(exercises)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RecorderError, RecordingResult, UnitSystem};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn run(id: &str, hour: u32) -> RunRecord {
        let t = Utc.with_ymd_and_hms(2025, 9, 26, hour, 0, 0).unwrap();
        RunRecord::from_recording(
            id,
            UnitSystem::Metric,
            RecordingResult {
                started_at: Some(t),
                ended_at: t,
                track: Vec::new(),
                distance_meters: 0.0,
                duration_seconds: 0.0,
                splits: Vec::new(),
                split_distance_meters: 1000.0,
                rejected_fixes: 0,
            },
        )
    }

    #[test]
    fn test_runs_round_trip_and_order() {
        let mut store = InMemoryStore::new();
        store.save_run(&run("a", 6)).unwrap();
        store.save_run(&run("b", 8)).unwrap();

        let ids: Vec<String> = store.list_runs().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(store.load_run("a").unwrap().unwrap().id, "a");

        assert!(store.delete_run("a").unwrap());
        assert!(!store.delete_run("a").unwrap());
        assert!(matches!(store.require_run("a"), Err(RecorderError::NotFound { .. })));
    }

    #[test]
    fn test_workouts_keyed_by_day() {
        let mut store = InMemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2025, 9, 13).unwrap();
        let mut w = Workout::for_day(day);
        store.save_workout(&w).unwrap();

        w.add_exercise(&Exercise::new("Squat", "Legs").unwrap());
        store.save_workout(&w).unwrap();

        let all = store.list_workouts().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].items.len(), 1);
        assert!(store.load_workout("2025-09-13").unwrap().is_some());
        assert!(store.delete_workout("2025-09-13").unwrap());
    }

    #[test]
    fn test_exercises_sorted() {
        let mut store = InMemoryStore::new();
        store.save_exercise(&Exercise::new("squat", "").unwrap()).unwrap();
        store.save_exercise(&Exercise::new("Bench", "").unwrap()).unwrap();
        let names: Vec<String> = store
            .list_exercises()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Bench", "squat"]);
    }
}
