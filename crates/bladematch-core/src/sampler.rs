//! Spanwise station selection along a leading-edge polyline.

use crate::error::{GeometryError, Result};
use crate::geom::P3;
use itertools::Itertools;

/// Cumulative arc length, starting at 0 for the first point.
pub fn leading_edge_arc_length(points: &[P3]) -> Vec<f64> {
    let mut acc = 0.0;
    let mut out = Vec::with_capacity(points.len());
    if !points.is_empty() {
        out.push(0.0);
    }
    for (a, b) in points.iter().tuple_windows() {
        acc += (b - a).norm();
        out.push(acc);
    }
    out
}

/// Index of the last station before the straight line from the first to the
/// last leading-edge point at `span_percentage` is passed.
///
/// This is a greedy scan, not a global nearest search: it stops as soon as
/// the distance to the target stops decreasing.
pub fn sample_by_leading_edge_arc_length(points: &[P3], span_percentage: f64) -> Result<usize> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(GeometryError::EmptyLeadingEdge),
    };
    let target = first + (last - first) * (span_percentage * 0.01);

    let mut prev = (first - target).norm();
    let mut i = 1;
    while i < points.len() {
        let d = (points[i] - target).norm();
        if d >= prev {
            break;
        }
        prev = d;
        i += 1;
    }
    Ok(i - 1)
}

/// Stations spaced at least `min_separation_percent` of the total leading-edge
/// arc length apart (straight-line distance from the last kept station).
/// Always contains the first and last index, strictly increasing.
pub fn select_stations(points: &[P3], min_separation_percent: f64) -> Result<Vec<usize>> {
    let Some(first) = points.first() else {
        return Err(GeometryError::EmptyLeadingEdge);
    };
    let total = leading_edge_arc_length(points).last().copied().unwrap_or(0.0);
    let limit = min_separation_percent * 0.01 * total;

    let mut stations = vec![0];
    let mut last = *first;
    for (i, p) in points.iter().enumerate().skip(1) {
        if (p - last).norm() > limit {
            last = *p;
            stations.push(i);
        }
    }
    let final_index = points.len() - 1;
    if stations.last() != Some(&final_index) {
        stations.push(final_index);
    }
    Ok(stations)
}

/// Roughly `count` stations, evenly spread by leading-edge distance.
pub fn select_station_count(points: &[P3], count: usize) -> Result<Vec<usize>> {
    if points.is_empty() {
        return Err(GeometryError::EmptyLeadingEdge);
    }
    if count <= 1 {
        return Ok(vec![0]);
    }
    select_stations(points, 100.0 / (count - 1) as f64)
}
