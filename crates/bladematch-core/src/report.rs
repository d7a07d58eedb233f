use crate::geom::BBox3;
use crate::model::{GeomTurboHeader, Side, SurfacePointCloud};
use crate::sampler::leading_edge_arc_length;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub code: String,
    pub message: String,
}

impl Warning {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometrySummary {
    pub section_count: usize,
    pub points_per_section: usize,
    pub axis_order: String,
    pub header: GeomTurboHeader,
    pub extents: Option<BBox3>,
    pub leading_edge_length: f64,
    pub open_sections: Vec<usize>,
}

impl GeometrySummary {
    /// `closure_tol` is the distance under which pressure and suction edge
    /// points count as coincident.
    pub fn of(cloud: &SurfacePointCloud, closure_tol: f64) -> Self {
        let extents = cloud.extents();
        let le = cloud.leading_edge(Side::Pressure);
        let open_sections = cloud
            .sections()
            .enumerate()
            .filter(|(_, s)| !s.is_closed(closure_tol))
            .map(|(i, _)| i)
            .collect();
        Self {
            section_count: cloud.section_count(),
            points_per_section: cloud.points_per_section(),
            axis_order: cloud.axis_order().to_string(),
            header: cloud.header().clone(),
            extents: if extents.is_empty() { None } else { Some(extents) },
            leading_edge_length: leading_edge_arc_length(&le).last().copied().unwrap_or(0.0),
            open_sections,
        }
    }
}
