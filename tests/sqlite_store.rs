//! SQLite store integration tests against an on-disk database.
//!
//! Run with: `cargo test --features persistence --test sqlite_store`

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use tempfile::TempDir;

use run_tracker::{
    daily_aggregates, Exercise, ExerciseCatalog, GpsFix, RunFeeling, RunRecord, RunRepository,
    RunType, SetRecord, SqliteStore, TrackSegmenter, UnitSystem, Workout, WorkoutRepository,
};

/// Helper: open a store in a fresh temp dir, returning the dir to keep it alive.
fn open_store() -> (SqliteStore, TempDir) {
    let tmp_dir = TempDir::new().expect("failed to create temp dir");
    let db_path = tmp_dir.path().join("tracker.db");
    let store = SqliteStore::new(db_path.to_str().unwrap()).expect("failed to open store");
    (store, tmp_dir)
}

fn recorded_run(day: u32) -> RunRecord {
    let t0 = Utc.with_ymd_and_hms(2025, 9, day, 6, 30, 0).unwrap();
    let mut s = TrackSegmenter::default();
    s.start_with_units(UnitSystem::Metric).unwrap();
    for i in 0..=25 {
        s.ingest(GpsFix::new(
            t0 + Duration::seconds(i * 20),
            40.0 + i as f64 * 0.0008,
            -3.7,
            5.0,
        ));
    }
    let result = s.stop(t0 + Duration::seconds(500)).unwrap();
    RunRecord::from_recording(RunRecord::generate_id(t0), UnitSystem::Metric, result)
        .with_details(RunType::Long, RunFeeling::Great, "")
}

#[test]
fn test_runs_survive_reopen() {
    let tmp_dir = TempDir::new().unwrap();
    let db_path = tmp_dir.path().join("tracker.db");
    let path = db_path.to_str().unwrap();

    let runs = vec![recorded_run(10), recorded_run(12), recorded_run(11)];
    {
        let mut store = SqliteStore::new(path).unwrap();
        for run in &runs {
            store.save_run(run).unwrap();
        }
    }

    let store = SqliteStore::new(path).unwrap();
    let listed = store.list_runs().unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0], runs[1]);
    assert_eq!(listed[1], runs[2]);
    assert_eq!(listed[2], runs[0]);
    assert!(listed[0].splits.len() >= 2);
}

#[test]
fn test_save_run_replaces_by_id() {
    let (mut store, _tmp) = open_store();
    let run = recorded_run(10);
    store.save_run(&run).unwrap();

    let edited = run.clone().with_details(RunType::Race, RunFeeling::Injured, "calf");
    store.save_run(&edited).unwrap();

    let loaded = store.require_run(&run.id).unwrap();
    assert_eq!(loaded.run_type, RunType::Race);
    assert_eq!(loaded.notes, "calf");
    assert_eq!(store.stats().unwrap().run_count, 1);
}

#[test]
fn test_journal_round_trip() {
    let (mut store, _tmp) = open_store();
    let created = Utc.with_ymd_and_hms(2025, 9, 13, 18, 0, 0).unwrap();

    let mut catalog = ExerciseCatalog::new();
    let bench = catalog.get_or_create("Bench Press", "Chest").unwrap().clone();
    let row = catalog.get_or_create("Row", "Back").unwrap().clone();

    let mut days = Vec::new();
    for (offset, weight) in [(0, 60.0), (2, 62.5), (4, 65.0)] {
        let date = NaiveDate::from_ymd_opt(2025, 9, 13).unwrap() + Duration::days(offset);
        let mut w = Workout::for_day(date);
        let b = w.add_exercise(&bench);
        w.add_set(b, SetRecord::new(8, weight, created).unwrap()).unwrap();
        let r = w.add_exercise(&row);
        w.add_set(r, SetRecord::new(10, 40.0, created).unwrap()).unwrap();
        store.save_workout(&w).unwrap();
        days.push(w);
    }
    store.save_exercise(&bench).unwrap();
    store.save_exercise(&row).unwrap();

    let listed = store.list_workouts().unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].day_key, "2025-09-17");
    assert_eq!(listed[2], days[0]);

    let aggregates = daily_aggregates(&listed);
    assert_eq!(aggregates.len(), 3);
    assert_eq!(aggregates.iter().map(|a| a.reps).sum::<u32>(), 54);

    let names: Vec<String> = store
        .list_exercises()
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["Bench Press", "Row"]);

    assert!(store.delete_workout("2025-09-15").unwrap());
    assert!(store.load_workout("2025-09-15").unwrap().is_none());
}

#[test]
fn test_exercise_key_is_case_insensitive() {
    let (mut store, _tmp) = open_store();
    store.save_exercise(&Exercise::new("squat", "Legs").unwrap()).unwrap();
    store.save_exercise(&Exercise::new("Squat", "Legs").unwrap()).unwrap();
    let all = store.list_exercises().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Squat");
}
