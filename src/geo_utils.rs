//! Geographic utilities: great-circle distance, track length, bounds and
//! line simplification.
//!
//! Distances are haversine distances on a spherical Earth (mean radius
//! 6,371,008.8 m, as used by `geo`). For the short hops between consecutive
//! GPS fixes this is well within GPS noise.

use geo::{algorithm::simplify::Simplify, Coord, Distance, Haversine, LineString, Point};

use crate::{Bounds, GpsFix, GpsPoint};

/// Great-circle distance between two points in meters.
///
/// # Example
/// ```
/// use run_tracker::{geo_utils::haversine_distance, GpsPoint};
///
/// let a = GpsPoint::new(0.0, 0.0);
/// let b = GpsPoint::new(0.009, 0.0);
/// let d = haversine_distance(&a, &b);
/// assert!((d - 1000.75).abs() < 1.0);
/// ```
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Distance between two fixes in meters.
pub fn fix_distance(a: &GpsFix, b: &GpsFix) -> f64 {
    haversine_distance(&a.point(), &b.point())
}

/// Total length of a polyline in meters.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Bounding box of a track, `None` when empty.
pub fn compute_bounds(fixes: &[GpsFix]) -> Option<Bounds> {
    if fixes.is_empty() {
        return None;
    }
    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for f in fixes {
        min_lat = min_lat.min(f.latitude);
        max_lat = max_lat.max(f.latitude);
        min_lng = min_lng.min(f.longitude);
        max_lng = max_lng.max(f.longitude);
    }

    Some(Bounds {
        min_lat,
        max_lat,
        min_lng,
        max_lng,
    })
}

/// Douglas-Peucker simplification of a track for map polylines.
///
/// `tolerance` is in degrees (0.0001 is roughly 11 m).
pub fn simplify_track(fixes: &[GpsFix], tolerance: f64) -> Vec<GpsPoint> {
    if fixes.len() < 3 {
        return fixes.iter().map(GpsFix::point).collect();
    }

    let coords: Vec<Coord<f64>> = fixes
        .iter()
        .map(|f| Coord {
            x: f.longitude,
            y: f.latitude,
        })
        .collect();

    LineString::new(coords)
        .simplify(&tolerance)
        .coords()
        .map(|c| GpsPoint::new(c.y, c.x))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn fix(lat: f64, lng: f64) -> GpsFix {
        let t = Utc.with_ymd_and_hms(2025, 9, 26, 7, 0, 0).unwrap();
        GpsFix::new(t, lat, lng, 5.0)
    }

    #[test]
    fn test_haversine_one_km_north() {
        let d = haversine_distance(&GpsPoint::new(0.0, 0.0), &GpsPoint::new(0.009, 0.0));
        assert!(d > 995.0 && d < 1005.0, "got {}", d);
    }

    #[test]
    fn test_haversine_zero() {
        let p = GpsPoint::new(51.5074, -0.1278);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_polyline_length_is_sum_of_hops() {
        let points = vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.009, 0.0),
            GpsPoint::new(0.018, 0.0),
        ];
        let total = polyline_length(&points);
        let hops = haversine_distance(&points[0], &points[1])
            + haversine_distance(&points[1], &points[2]);
        assert!((total - hops).abs() < 1e-9);
        assert_eq!(polyline_length(&points[..1]), 0.0);
    }

    #[test]
    fn test_bounds() {
        assert!(compute_bounds(&[]).is_none());
        let b = compute_bounds(&[fix(1.0, 2.0), fix(-1.0, 4.0)]).unwrap();
        assert_eq!(b.min_lat, -1.0);
        assert_eq!(b.max_lat, 1.0);
        assert_eq!(b.min_lng, 2.0);
        assert_eq!(b.max_lng, 4.0);
        assert_eq!(b.center(), GpsPoint::new(0.0, 3.0));
    }

    #[test]
    fn test_simplify_drops_collinear_points() {
        let fixes: Vec<GpsFix> = (0..20).map(|i| fix(i as f64 * 0.001, 0.0)).collect();
        let simplified = simplify_track(&fixes, 0.0001);
        assert_eq!(simplified.len(), 2);
        assert_eq!(simplified[0], GpsPoint::new(0.0, 0.0));
    }
}
