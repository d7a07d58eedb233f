//! Leading/trailing edge rounding.
//!
//! A run of near-edge points on both sides is replaced by two quadratic
//! splines meeting at an apex. The cut is placed where the blade first gets
//! wider than `min_width`; the apex is pulled inward along the mean line until
//! both tangents meet it at no less than `min_angle`, which keeps very thin or
//! pointed edges from producing needle-shaped or self-intersecting fillets.

use crate::error::{GeometryError, Result};
use crate::geom::{angle_between, midpoint, ray_plane_intersection, QuadraticSpline, P3, V3};
use crate::model::Section;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Leading,
    Trailing,
}

impl Edge {
    fn name(self) -> &'static str {
        match self {
            Edge::Leading => "leading",
            Edge::Trailing => "trailing",
        }
    }

    // Leading-edge walks skip the edge point itself, trailing-edge walks start on it.
    fn start(self) -> usize {
        match self {
            Edge::Leading => 1,
            Edge::Trailing => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilletParams {
    pub new_points: usize,
    pub min_width: f64,
    /// Radians.
    pub min_angle: f64,
}

impl FilletParams {
    pub fn leading_edge_default() -> Self {
        Self {
            new_points: 80,
            min_width: 0.8,
            min_angle: 15f64.to_radians(),
        }
    }

    pub fn trailing_edge_default() -> Self {
        Self {
            new_points: 80,
            min_width: 0.5,
            min_angle: 6f64.to_radians(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilletReport {
    pub edge: Edge,
    /// Distance of the cut from the edge, in points.
    pub cut_index: usize,
    /// 0 when the original edge point is the apex.
    pub apex_depth: usize,
    pub apex: P3,
    /// Smaller of the two tangent/apex angles, radians.
    pub min_tangent_angle: f64,
}

pub fn round_leading_edge(section: &Section, params: &FilletParams) -> Result<Section> {
    round_edge_with_report(section, Edge::Leading, params).map(|(s, _)| s)
}

pub fn round_trailing_edge(section: &Section, params: &FilletParams) -> Result<Section> {
    round_edge_with_report(section, Edge::Trailing, params).map(|(s, _)| s)
}

/// Leading edge: each side grows by `new_points - 1`. Trailing edge: each side
/// grows by `new_points`.
pub fn round_edge_with_report(
    section: &Section,
    edge: Edge,
    params: &FilletParams,
) -> Result<(Section, FilletReport)> {
    // Work edge-first: for the trailing edge both runs are reversed.
    let (suction, pressure) = match edge {
        Edge::Leading => (section.suction.clone(), section.pressure.clone()),
        Edge::Trailing => (
            section.suction.iter().rev().copied().collect(),
            section.pressure.iter().rev().copied().collect(),
        ),
    };
    let n = suction.len().min(pressure.len());
    let not_found = GeometryError::FilletCutNotFound {
        edge: edge.name(),
        min_width: params.min_width,
    };

    let mut cut = edge.start();
    if cut + 1 >= n {
        return Err(not_found);
    }
    while (suction[cut] - pressure[cut]).norm() < params.min_width {
        cut += 1;
        if cut + 1 >= n {
            return Err(not_found);
        }
    }

    let cuts = [suction[cut], pressure[cut]];
    let tangents: [V3; 2] = [suction[cut] - suction[cut + 1], pressure[cut] - pressure[cut + 1]];
    let centre = midpoint(&cuts[0], &cuts[1]);
    let min_angle_to = |apex: &P3| -> f64 {
        angle_between(&tangents[0], &(apex - cuts[0]))
            .min(angle_between(&tangents[1], &(apex - cuts[1])))
    };

    let mut apex = suction[0];
    let mut apex_depth = 0;
    if min_angle_to(&apex) < params.min_angle {
        let mut j = edge.start();
        loop {
            apex = midpoint(&suction[j], &pressure[j]);
            if min_angle_to(&apex) >= params.min_angle || j >= cut {
                break;
            }
            j += 1;
        }
        apex_depth = j + 1 - edge.start();
        if min_angle_to(&apex) < params.min_angle {
            log::warn!(
                "{} edge apex reached the cut without meeting the angle constraint",
                edge.name()
            );
        }
    }

    let normal = apex - centre;
    let count = params.new_points + cut + (edge == Edge::Trailing) as usize;
    let rebuild = |run: &[P3], k: usize| -> Vec<P3> {
        let shoulder = ray_plane_intersection(&cuts[k], &tangents[k], &apex, &normal)
            .unwrap_or_else(|| midpoint(&cuts[k], &apex));
        let curve = QuadraticSpline::new(cuts[k], shoulder, apex);
        let mut out: Vec<P3> = curve.sample(count).into_iter().rev().collect();
        out.extend_from_slice(&run[cut + 1..]);
        if edge == Edge::Trailing {
            out.reverse();
        }
        out
    };
    let new_suction = rebuild(&suction, 0);
    let new_pressure = rebuild(&pressure, 1);

    let report = FilletReport {
        edge,
        cut_index: cut,
        apex_depth,
        apex,
        min_tangent_angle: min_angle_to(&apex),
    };
    Ok((Section::new(new_suction, new_pressure)?, report))
}
