//! Aggregations behind the analysis screen.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::pace::average_pace;
use crate::workouts::day_key;
use crate::{RunRecord, UnitSystem, Workout};

/// Training volume and reps for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAggregate {
    pub day_key: String,
    pub date: NaiveDate,
    /// Sum of weight x reps in kg
    pub volume: f64,
    pub reps: u32,
}

/// Total volume for one exercise across all workouts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseVolume {
    pub name: String,
    pub volume: f64,
}

/// Per-day totals sorted oldest first. Workouts sharing a day are merged.
pub fn daily_aggregates(workouts: &[Workout]) -> Vec<DayAggregate> {
    let mut by_day: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    for w in workouts {
        let entry = by_day.entry(w.date).or_insert((0.0, 0));
        entry.0 += w.volume();
        entry.1 += w.total_reps();
    }

    by_day
        .into_iter()
        .map(|(date, (volume, reps))| DayAggregate {
            day_key: day_key(date),
            date,
            volume,
            reps,
        })
        .collect()
}

/// The `limit` exercises with the most total volume, largest first.
/// Ties are ordered by name.
pub fn top_exercises(workouts: &[Workout], limit: usize) -> Vec<ExerciseVolume> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for item in workouts.iter().flat_map(|w| w.items.iter()) {
        *totals.entry(item.exercise.as_str()).or_insert(0.0) += item.volume();
    }

    let mut ranked: Vec<ExerciseVolume> = totals
        .into_iter()
        .map(|(name, volume)| ExerciseVolume {
            name: name.to_string(),
            volume,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.volume
            .partial_cmp(&a.volume)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked.truncate(limit);
    ranked
}

/// First and last training day, for chart axes.
pub fn date_domain(workouts: &[Workout]) -> Option<(NaiveDate, NaiveDate)> {
    let first = workouts.iter().map(|w| w.date).min()?;
    let last = workouts.iter().map(|w| w.date).max()?;
    Some((first, last))
}

/// Summary over a list of runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunTotals {
    pub run_count: u32,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub avg_pace_seconds: Option<f64>,
    pub longest_run_meters: f64,
}

pub fn run_totals(runs: &[RunRecord], units: UnitSystem) -> RunTotals {
    let distance_meters: f64 = runs.iter().map(|r| r.total_distance_meters).sum();
    let duration_seconds: f64 = runs.iter().map(|r| r.total_duration_seconds).sum();
    RunTotals {
        run_count: runs.len() as u32,
        distance_meters,
        duration_seconds,
        avg_pace_seconds: average_pace(distance_meters, duration_seconds, units),
        longest_run_meters: runs
            .iter()
            .map(|r| r.total_distance_meters)
            .fold(0.0, f64::max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Exercise, RecordingResult, SetRecord};
    use chrono::{TimeZone, Utc};

    fn workout(d: u32, entries: &[(&str, u32, f64)]) -> Workout {
        let mut w = Workout::for_day(NaiveDate::from_ymd_opt(2025, 9, d).unwrap());
        let created = Utc.with_ymd_and_hms(2025, 9, d, 9, 0, 0).unwrap();
        for (name, reps, weight) in entries {
            let i = w.add_exercise(&Exercise::new(name, "").unwrap());
            w.add_set(i, SetRecord::new(*reps, *weight, created).unwrap())
                .unwrap();
        }
        w
    }

    #[test]
    fn test_daily_aggregates_sorted_and_merged() {
        let workouts = vec![
            workout(14, &[("Squat", 5, 100.0)]),
            workout(13, &[("Bench", 10, 50.0), ("Row", 10, 40.0)]),
            workout(14, &[("Curl", 12, 10.0)]),
        ];
        let days = daily_aggregates(&workouts);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day_key, "2025-09-13");
        assert_eq!(days[0].volume, 900.0);
        assert_eq!(days[0].reps, 20);
        assert_eq!(days[1].volume, 620.0);
        assert_eq!(days[1].reps, 17);
    }

    #[test]
    fn test_top_exercises() {
        let workouts = vec![
            workout(13, &[("Bench", 10, 50.0), ("Row", 10, 40.0)]),
            workout(14, &[("Bench", 5, 60.0), ("Squat", 5, 100.0)]),
        ];
        let top = top_exercises(&workouts, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Bench");
        assert_eq!(top[0].volume, 800.0);
        assert_eq!(top[1].name, "Squat");
    }

    #[test]
    fn test_date_domain() {
        assert!(date_domain(&[]).is_none());
        let workouts = vec![workout(20, &[]), workout(3, &[]), workout(11, &[])];
        let (first, last) = date_domain(&workouts).unwrap();
        assert_eq!(first.to_string(), "2025-09-03");
        assert_eq!(last.to_string(), "2025-09-20");
    }

    #[test]
    fn test_run_totals() {
        let t0 = Utc.with_ymd_and_hms(2025, 9, 26, 7, 0, 0).unwrap();
        let make = |id: &str, meters: f64, secs: f64| {
            RunRecord::from_recording(
                id,
                UnitSystem::Metric,
                RecordingResult {
                    started_at: Some(t0),
                    ended_at: t0,
                    track: Vec::new(),
                    distance_meters: meters,
                    duration_seconds: secs,
                    splits: Vec::new(),
                    split_distance_meters: 1000.0,
                    rejected_fixes: 0,
                },
            )
        };
        let runs = vec![make("a", 5000.0, 1500.0), make("b", 10000.0, 3300.0)];
        let totals = run_totals(&runs, UnitSystem::Metric);
        assert_eq!(totals.run_count, 2);
        assert_eq!(totals.distance_meters, 15000.0);
        assert_eq!(totals.avg_pace_seconds, Some(320.0));
        assert_eq!(totals.longest_run_meters, 10000.0);

        assert!(run_totals(&[], UnitSystem::Metric).avg_pace_seconds.is_none());
    }
}
