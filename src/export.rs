//! CSV and GPX export.
//!
//! All formatters are read-only over completed data. Timestamps are written
//! as ISO-8601 UTC with second precision; a missing altitude is written as 0.

use chrono::{DateTime, SecondsFormat, Utc};
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use time::OffsetDateTime;

use crate::{GpsFix, RecorderError, Result, RunRecord, Workout};

/// Header row of the track CSV.
pub const TRACK_CSV_HEADER: [&str; 4] = ["timestamp", "lat", "lon", "alt_m"];

/// Header row of the workout CSV.
pub const WORKOUT_CSV_HEADER: [&str; 6] =
    ["date", "exercise", "set_index", "reps", "weight_kg", "volume_kg"];

const GPX_CREATOR: &str = "RunTracker";

fn iso8601(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| RecorderError::Serialization {
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| RecorderError::Serialization {
        message: e.to_string(),
    })
}

/// One `timestamp,lat,lon,alt_m` row per fix after the header.
pub fn track_to_csv(track: &[GpsFix]) -> Result<String> {
    let mut writer = csv_writer();
    writer.write_record(TRACK_CSV_HEADER)?;
    for fix in track {
        writer.write_record([
            iso8601(&fix.timestamp),
            fix.latitude.to_string(),
            fix.longitude.to_string(),
            fix.altitude.unwrap_or(0.0).to_string(),
        ])?;
    }
    finish_csv(writer)
}

fn gpx_time(ts: &DateTime<Utc>) -> Result<gpx::Time> {
    let odt = OffsetDateTime::from_unix_timestamp(ts.timestamp()).map_err(|e| {
        RecorderError::Serialization {
            message: e.to_string(),
        }
    })?;
    Ok(gpx::Time::from(odt))
}

/// GPX 1.1 document with one track holding a single segment.
pub fn track_to_gpx(track: &[GpsFix], name: &str) -> Result<String> {
    let mut segment = TrackSegment::new();
    for fix in track {
        let mut point = Waypoint::new(geo::Point::new(fix.longitude, fix.latitude));
        point.elevation = Some(fix.altitude.unwrap_or(0.0));
        point.time = Some(gpx_time(&fix.timestamp)?);
        segment.points.push(point);
    }

    let mut trk = Track::new();
    trk.name = Some(name.to_string());
    trk.segments.push(segment);

    let doc = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(GPX_CREATOR.to_string()),
        tracks: vec![trk],
        ..Default::default()
    };

    let mut out = Vec::new();
    gpx::write(&doc, &mut out)?;
    String::from_utf8(out).map_err(|e| RecorderError::Serialization {
        message: e.to_string(),
    })
}

/// GPX for a stored run, named after its start time.
pub fn run_to_gpx(run: &RunRecord) -> Result<String> {
    let name = format!("Run {}", run.started_at.format("%Y-%m-%d-%H%M"));
    track_to_gpx(&run.route, &name)
}

/// One row per set, workouts oldest day first.
pub fn workouts_to_csv(workouts: &[Workout]) -> Result<String> {
    let mut sorted: Vec<&Workout> = workouts.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date));

    let mut writer = csv_writer();
    writer.write_record(WORKOUT_CSV_HEADER)?;
    for w in sorted {
        for item in &w.items {
            for (idx, set) in item.sets.iter().enumerate() {
                writer.write_record([
                    w.day_key.clone(),
                    item.exercise.clone(),
                    (idx + 1).to_string(),
                    set.reps.to_string(),
                    clean_number(set.weight_kg),
                    clean_number(set.volume()),
                ])?;
            }
        }
    }
    finish_csv(writer)
}

/// Whole numbers without decimals, everything else with one decimal.
fn clean_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.1}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Exercise, SetRecord, UnitSystem};
    use chrono::{NaiveDate, TimeZone};

    fn track() -> Vec<GpsFix> {
        let t0 = Utc.with_ymd_and_hms(2025, 9, 26, 7, 0, 0).unwrap();
        vec![
            GpsFix::new(t0, 52.52, 13.405, 5.0).with_altitude(34.5),
            GpsFix::new(t0 + chrono::Duration::seconds(5), 52.5201, 13.405, 5.0),
        ]
    }

    fn workout_with(day: u32, exercise: &str, sets: &[(u32, f64)]) -> Workout {
        let created = Utc.with_ymd_and_hms(2025, 9, 13, 9, 0, 0).unwrap();
        let mut w = Workout::for_day(NaiveDate::from_ymd_opt(2025, 9, day).unwrap());
        let i = w.add_exercise(&Exercise::new(exercise, "").unwrap());
        for &(reps, weight) in sets {
            w.add_set(i, SetRecord::new(reps, weight, created).unwrap()).unwrap();
        }
        w
    }

    #[test]
    fn test_track_csv() {
        let csv = track_to_csv(&track()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,lat,lon,alt_m");
        assert_eq!(lines[1], "2025-09-26T07:00:00Z,52.52,13.405,34.5");
        assert_eq!(lines[2], "2025-09-26T07:00:05Z,52.5201,13.405,0");
    }

    #[test]
    fn test_empty_track_csv_is_header_only() {
        assert_eq!(track_to_csv(&[]).unwrap(), "timestamp,lat,lon,alt_m\n");
    }

    #[test]
    fn test_gpx_structure() {
        let xml = track_to_gpx(&track(), "Morning <run>").unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("version=\"1.1\""));
        assert!(xml.contains("creator=\"RunTracker\""));
        assert!(xml.contains("Morning &lt;run&gt;"));
        assert_eq!(xml.matches("<trkseg>").count(), 1);

        let doc = gpx::read(xml.as_bytes()).unwrap();
        assert_eq!(doc.version, GpxVersion::Gpx11);
        assert_eq!(doc.tracks.len(), 1);
        assert_eq!(doc.tracks[0].name.as_deref(), Some("Morning <run>"));
        assert_eq!(doc.tracks[0].segments.len(), 1);

        let points = &doc.tracks[0].segments[0].points;
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].point().y(), 52.52);
        assert_eq!(points[0].point().x(), 13.405);
        assert_eq!(points[0].elevation, Some(34.5));
        assert_eq!(points[1].elevation, Some(0.0));
        let time = points[1].time.as_ref().unwrap().format().unwrap();
        assert_eq!(time, "2025-09-26T07:00:05Z");
    }

    #[test]
    fn test_run_gpx_name() {
        let t0 = Utc.with_ymd_and_hms(2025, 9, 26, 7, 0, 0).unwrap();
        let run = RunRecord::from_recording(
            "run-1",
            UnitSystem::Metric,
            crate::RecordingResult {
                started_at: Some(t0),
                ended_at: t0,
                track: track(),
                distance_meters: 11.0,
                duration_seconds: 5.0,
                splits: Vec::new(),
                split_distance_meters: 1000.0,
                rejected_fixes: 0,
            },
        );
        let doc = gpx::read(run_to_gpx(&run).unwrap().as_bytes()).unwrap();
        assert_eq!(doc.tracks[0].name.as_deref(), Some("Run 2025-09-26-0700"));
    }

    #[test]
    fn test_workout_csv() {
        let later = workout_with(14, "Squat", &[(5, 100.0)]);
        let earlier = workout_with(13, "Press, \"strict\"", &[(8, 42.5), (3, 45.0)]);

        let csv = workouts_to_csv(&[later, earlier]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,exercise,set_index,reps,weight_kg,volume_kg");
        assert_eq!(lines[1], "2025-09-13,\"Press, \"\"strict\"\"\",1,8,42.5,340");
        assert_eq!(lines[2], "2025-09-13,\"Press, \"\"strict\"\"\",2,3,45,135");
        assert_eq!(lines[3], "2025-09-14,Squat,1,5,100,500");
    }

    #[test]
    fn test_workout_csv_quotes_line_breaks() {
        let csv = workouts_to_csv(&[workout_with(13, "Bench\rPress", &[(5, 100.0)])]).unwrap();
        assert!(csv.contains("\"Bench\rPress\""));

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1], "Bench\rPress");
    }
}
