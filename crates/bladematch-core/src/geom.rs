use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

pub type P3 = Point3<f64>;
pub type V3 = Vector3<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox3 {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BBox3 {
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|k| self.min[k] > self.max[k])
    }

    pub fn include_point(&mut self, point: &P3) {
        for k in 0..3 {
            self.min[k] = self.min[k].min(point[k]);
            self.max[k] = self.max[k].max(point[k]);
        }
    }
}

pub fn midpoint(a: &P3, b: &P3) -> P3 {
    nalgebra::center(a, b)
}

/// Unsigned angle in radians. Zero-length inputs give 0.
pub fn angle_between(a: &V3, b: &V3) -> f64 {
    let denom = a.norm() * b.norm();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Point where the line `origin + t * dir` crosses the plane through
/// `plane_point` with normal `normal`.
pub fn ray_plane_intersection(origin: &P3, dir: &V3, plane_point: &P3, normal: &V3) -> Option<P3> {
    let n_len = normal.norm();
    if n_len <= f64::EPSILON {
        return None;
    }
    let n_hat = normal / n_len;
    let denom = dir.dot(&n_hat);
    if denom.abs() <= 1e-12 {
        return None;
    }
    let t = (plane_point.coords.dot(&n_hat) - origin.coords.dot(&n_hat)) / denom;
    Some(origin + dir * t)
}

/// Degree-2 B-spline with clamped knots and three control points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticSpline {
    pub ctrl: [P3; 3],
}

impl QuadraticSpline {
    pub fn new(p0: P3, p1: P3, p2: P3) -> Self {
        Self { ctrl: [p0, p1, p2] }
    }

    pub fn eval(&self, t: f64) -> P3 {
        let s = 1.0 - t;
        let [p0, p1, p2] = &self.ctrl;
        P3::from(p0.coords * (s * s) + p1.coords * (2.0 * s * t) + p2.coords * (t * t))
    }

    /// `count` points at uniform parameter steps over [0, 1], endpoints included.
    pub fn sample(&self, count: usize) -> Vec<P3> {
        match count {
            0 => Vec::new(),
            1 => vec![self.ctrl[0]],
            _ => (0..count)
                .map(|k| self.eval(k as f64 / (count - 1) as f64))
                .collect(),
        }
    }
}
