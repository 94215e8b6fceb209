//! Strength-training journal: exercises, sets and one workout per day.
//!
//! Workouts refer to exercises by name (case-insensitive key), so a workout
//! can be stored and loaded without the catalog.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{RecorderError, Result};

/// Reps accepted for one set.
pub const REPS_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

/// Day key format used for workouts (`2025-09-13`).
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

// ============================================================================
// Exercises
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    /// Trimmed display name; unique in the catalog, compared case-insensitively
    pub name: String,
    pub primary_group: String,
    pub notes: String,
}

impl Exercise {
    pub fn new(name: &str, primary_group: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RecorderError::validation("exercise name must not be empty"));
        }
        Ok(Self {
            name: name.to_string(),
            primary_group: primary_group.trim().to_string(),
            notes: String::new(),
        })
    }

    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Exercise catalog keyed by lowercase name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExerciseCatalog {
    exercises: BTreeMap<String, Exercise>,
}

impl ExerciseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_exercises(exercises: impl IntoIterator<Item = Exercise>) -> Self {
        let mut catalog = Self::new();
        for exercise in exercises {
            catalog.exercises.entry(exercise.key()).or_insert(exercise);
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Exercise> {
        self.exercises.get(&name.trim().to_lowercase())
    }

    /// Return the existing exercise with this name, or add a new one.
    pub fn get_or_create(&mut self, name: &str, primary_group: &str) -> Result<&Exercise> {
        let exercise = Exercise::new(name, primary_group)?;
        Ok(&*self.exercises.entry(exercise.key()).or_insert(exercise))
    }

    /// Case-insensitive substring search, sorted by name. A blank query
    /// returns the whole catalog.
    pub fn search(&self, query: &str) -> Vec<&Exercise> {
        let q = query.trim().to_lowercase();
        self.exercises
            .iter()
            .filter(|(key, _)| q.is_empty() || key.contains(&q))
            .map(|(_, e)| e)
            .collect()
    }

    pub fn remove(&mut self, name: &str) -> Option<Exercise> {
        self.exercises.remove(&name.trim().to_lowercase())
    }
}

// ============================================================================
// Sets and workouts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    pub reps: u32,
    pub weight_kg: f64,
    pub created_at: DateTime<Utc>,
}

impl SetRecord {
    /// Validates reps; negative weights are clamped to zero.
    pub fn new(reps: u32, weight_kg: f64, created_at: DateTime<Utc>) -> Result<Self> {
        validate_set(reps, weight_kg)?;
        Ok(Self {
            reps,
            weight_kg: weight_kg.max(0.0),
            created_at,
        })
    }

    pub fn volume(&self) -> f64 {
        self.weight_kg * self.reps as f64
    }
}

fn validate_set(reps: u32, weight_kg: f64) -> Result<()> {
    if !REPS_RANGE.contains(&reps) {
        return Err(RecorderError::validation(format!(
            "reps must be between {} and {}, got {}",
            REPS_RANGE.start(),
            REPS_RANGE.end(),
            reps
        )));
    }
    if !weight_kg.is_finite() {
        return Err(RecorderError::validation("weight must be a finite number"));
    }
    Ok(())
}

/// One exercise performed within a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutItem {
    pub exercise: String,
    pub sets: Vec<SetRecord>,
}

impl WorkoutItem {
    pub fn new(exercise: &str) -> Self {
        Self {
            exercise: exercise.trim().to_string(),
            sets: Vec::new(),
        }
    }

    pub fn total_reps(&self) -> u32 {
        self.sets.iter().map(|s| s.reps).sum()
    }

    pub fn volume(&self) -> f64 {
        self.sets.iter().map(SetRecord::volume).sum()
    }

    /// Most recent set by creation time; the last one wins ties.
    pub fn latest_set(&self) -> Option<&SetRecord> {
        self.sets
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.created_at.cmp(&b.created_at).then(ia.cmp(ib)))
            .map(|(_, s)| s)
    }

    fn is_exercise(&self, name: &str) -> bool {
        self.exercise.to_lowercase() == name.trim().to_lowercase()
    }
}

/// All training logged on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub day_key: String,
    pub date: NaiveDate,
    pub items: Vec<WorkoutItem>,
}

impl Workout {
    pub fn for_day(date: NaiveDate) -> Self {
        Self {
            day_key: day_key(date),
            date,
            items: Vec::new(),
        }
    }

    /// Workout for the current local day.
    pub fn today() -> Self {
        Self::for_day(Local::now().date_naive())
    }

    /// Append an item for `exercise`, returning its index.
    pub fn add_exercise(&mut self, exercise: &Exercise) -> usize {
        self.items.push(WorkoutItem::new(&exercise.name));
        self.items.len() - 1
    }

    pub fn add_set(&mut self, item: usize, set: SetRecord) -> Result<()> {
        self.item_mut(item)?.sets.push(set);
        Ok(())
    }

    pub fn edit_set(&mut self, item: usize, set: usize, reps: u32, weight_kg: f64) -> Result<()> {
        validate_set(reps, weight_kg)?;
        let record = self.set_mut(item, set)?;
        record.reps = reps;
        record.weight_kg = weight_kg.max(0.0);
        Ok(())
    }

    pub fn remove_set(&mut self, item: usize, set: usize) -> Result<SetRecord> {
        self.set_mut(item, set)?;
        Ok(self.items[item].sets.remove(set))
    }

    pub fn remove_item(&mut self, item: usize) -> Result<WorkoutItem> {
        self.item_mut(item)?;
        Ok(self.items.remove(item))
    }

    pub fn total_reps(&self) -> u32 {
        self.items.iter().map(WorkoutItem::total_reps).sum()
    }

    pub fn volume(&self) -> f64 {
        self.items.iter().map(WorkoutItem::volume).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.iter().all(|i| i.sets.is_empty())
    }

    fn item_mut(&mut self, item: usize) -> Result<&mut WorkoutItem> {
        let key = self.day_key.clone();
        self.items.get_mut(item).ok_or_else(|| RecorderError::NotFound {
            entity: "WorkoutItem".to_string(),
            id: format!("{}#{}", key, item),
        })
    }

    fn set_mut(&mut self, item: usize, set: usize) -> Result<&mut SetRecord> {
        let key = self.day_key.clone();
        self.item_mut(item)?
            .sets
            .get_mut(set)
            .ok_or_else(|| RecorderError::NotFound {
                entity: "SetRecord".to_string(),
                id: format!("{}#{}.{}", key, item, set),
            })
    }
}

/// Reps and weight of the most recent set logged for `exercise`, searching
/// workouts newest day first. Used to prefill the add-set form.
pub fn last_set_suggestion(workouts: &[Workout], exercise: &str) -> Option<(u32, f64)> {
    let mut by_day: Vec<&Workout> = workouts.iter().collect();
    by_day.sort_by(|a, b| b.date.cmp(&a.date));

    by_day.into_iter().find_map(|w| {
        w.items
            .iter()
            .filter(|item| item.is_exercise(exercise))
            .filter_map(WorkoutItem::latest_set)
            .max_by_key(|s| s.created_at)
            .map(|s| (s.reps, s.weight_kg))
    })
}
