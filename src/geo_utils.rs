//! Geographic helpers for mobility statistics.
//!
//! Distances here are planar in degree space, not great-circle metres:
//! radius of gyration is reported in the same units as the input coordinates.

use geo::{Centroid, Coord, MultiPoint, Point};

use crate::LonLat;

/// Mean longitude/latitude of `points`. `None` for an empty slice.
pub fn centroid(points: &[LonLat]) -> Option<LonLat> {
    if points.is_empty() {
        return None;
    }
    let multi: MultiPoint<f64> = points
        .iter()
        .map(|p| Point::from(Coord { x: p.lon, y: p.lat }))
        .collect();
    multi.centroid().map(|c| LonLat::new(c.x(), c.y()))
}

/// Planar Euclidean distance between two coordinates, in degrees.
pub fn euclidean_distance(a: &LonLat, b: &LonLat) -> f64 {
    let dlon = a.lon - b.lon;
    let dlat = a.lat - b.lat;
    (dlon * dlon + dlat * dlat).sqrt()
}

/// Root-mean-square distance of `points` from `center`. 0.0 for an empty slice.
pub fn rms_distance(points: &[LonLat], center: &LonLat) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = points
        .iter()
        .map(|p| {
            let d = euclidean_distance(p, center);
            d * d
        })
        .sum();
    (sum_sq / points.len() as f64).sqrt()
}

/// Radius of gyration: RMS distance of `points` from their centroid.
pub fn radius_of_gyration(points: &[LonLat]) -> Option<f64> {
    centroid(points).map(|center| rms_distance(points, &center))
}
