use crate::error::{GeometryError, Result};
use crate::geom::{BBox3, P3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Pressure,
    Suction,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Pressure, Side::Suction];

    pub fn index(self) -> usize {
        match self {
            Side::Pressure => 0,
            Side::Suction => 1,
        }
    }

    /// Block keyword used by the geometry file.
    pub fn keyword(self) -> &'static str {
        match self {
            Side::Pressure => "pressure",
            Side::Suction => "suction",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "pressure" => Some(Side::Pressure),
            "suction" => Some(Side::Suction),
            _ => None,
        }
    }
}

/// Order in which the two side blocks are written to a geometry file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SideOrder {
    PressureFirst,
    #[default]
    SuctionFirst,
}

impl SideOrder {
    pub fn sides(self) -> [Side; 2] {
        match self {
            SideOrder::PressureFirst => [Side::Pressure, Side::Suction],
            SideOrder::SuctionFirst => [Side::Suction, Side::Pressure],
        }
    }
}

/// Coordinate permutation, e.g. `"zyx"`: output component `k` is input
/// component `perm[k]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisOrder {
    perm: [usize; 3],
}

impl AxisOrder {
    pub const IDENTITY: AxisOrder = AxisOrder { perm: [0, 1, 2] };
    pub const ZXY: AxisOrder = AxisOrder { perm: [2, 0, 1] };

    pub fn from_perm(perm: [usize; 3]) -> Result<Self> {
        let mut seen = [false; 3];
        for &p in &perm {
            if p > 2 || seen[p] {
                return Err(GeometryError::InvalidAxisOrder(format!("{perm:?}")));
            }
            seen[p] = true;
        }
        Ok(Self { perm })
    }

    pub fn perm(&self) -> [usize; 3] {
        self.perm
    }

    pub fn is_identity(&self) -> bool {
        self.perm == [0, 1, 2]
    }

    pub fn apply(&self, p: &P3) -> P3 {
        P3::new(p[self.perm[0]], p[self.perm[1]], p[self.perm[2]])
    }

    pub fn inverse(&self) -> Self {
        let mut inv = [0usize; 3];
        for (k, &p) in self.perm.iter().enumerate() {
            inv[p] = k;
        }
        Self { perm: inv }
    }
}

impl Default for AxisOrder {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl FromStr for AxisOrder {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.trim().to_ascii_lowercase().chars().collect();
        if chars.len() != 3 {
            return Err(GeometryError::InvalidAxisOrder(s.to_string()));
        }
        let mut perm = [0usize; 3];
        for (k, c) in chars.iter().enumerate() {
            perm[k] = match c {
                'x' => 0,
                'y' => 1,
                'z' => 2,
                _ => return Err(GeometryError::InvalidAxisOrder(s.to_string())),
            };
        }
        Self::from_perm(perm).map_err(|_| GeometryError::InvalidAxisOrder(s.to_string()))
    }
}

impl fmt::Display for AxisOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in self.perm {
            let c = match p {
                0 => 'x',
                1 => 'y',
                _ => 'z',
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeomTurboHeader {
    pub number_of_blades: u32,
    pub expansion_factor_hub: f64,
    pub expansion_factor_shroud: f64,
    pub tangential_definition: i32,
}

impl Default for GeomTurboHeader {
    fn default() -> Self {
        Self {
            number_of_blades: 1,
            expansion_factor_hub: 0.01,
            expansion_factor_shroud: 0.01,
            tangential_definition: 0,
        }
    }
}

/// One spanwise station. Both runs go from the leading edge to the trailing
/// edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub suction: Vec<P3>,
    pub pressure: Vec<P3>,
}

impl Section {
    pub fn new(suction: Vec<P3>, pressure: Vec<P3>) -> Result<Self> {
        if suction.len() != pressure.len() {
            return Err(GeometryError::ShapeMismatch(format!(
                "suction run has {} points, pressure run has {}",
                suction.len(),
                pressure.len()
            )));
        }
        Ok(Self { suction, pressure })
    }

    /// Splits a closed contour into two runs. The first half is the suction
    /// side, the second half reversed is the pressure side. An odd point count
    /// duplicates the middle point, which has not been validated against real
    /// meshing runs.
    pub fn from_contour(points: &[P3]) -> Self {
        let mut pts = points.to_vec();
        if pts.len() % 2 == 1 {
            log::warn!(
                "splitting a contour with an odd point count ({}); duplicating the middle point",
                pts.len()
            );
            let middle = pts.len() / 2;
            pts.insert(middle, pts[middle]);
            let pressure: Vec<P3> = pts.split_off(pts.len() / 2).into_iter().rev().collect();
            return Self {
                suction: pts,
                pressure,
            };
        }
        let pressure_fwd = pts.split_off(pts.len() / 2);
        if let (Some(last), Some(first)) = (pts.last_mut(), pressure_fwd.first()) {
            *last = *first;
        }
        Self {
            suction: pts,
            pressure: pressure_fwd.into_iter().rev().collect(),
        }
    }

    pub fn points_per_side(&self) -> usize {
        self.suction.len()
    }

    pub fn run(&self, side: Side) -> &[P3] {
        match side {
            Side::Pressure => &self.pressure,
            Side::Suction => &self.suction,
        }
    }

    pub fn leading_edge(&self) -> Option<P3> {
        self.suction.first().copied()
    }

    pub fn trailing_edge(&self) -> Option<P3> {
        self.suction.last().copied()
    }

    /// Suction run followed by pressure run, the ordering of the exchange file.
    pub fn contour(&self) -> Vec<P3> {
        self.suction.iter().chain(self.pressure.iter()).copied().collect()
    }

    pub fn is_closed(&self, tol: f64) -> bool {
        let ends = |run: &[P3]| (run.first().copied(), run.last().copied());
        match (ends(&self.suction), ends(&self.pressure)) {
            ((Some(sl), Some(st)), (Some(pl), Some(pt))) => {
                (sl - pl).norm() <= tol && (st - pt).norm() <= tol
            }
            _ => false,
        }
    }
}

/// Pressure/suction point cloud read from a sectioned geometry file.
/// Indexed `[side][section][point]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfacePointCloud {
    sides: [Vec<Vec<P3>>; 2],
    scale_factor: f64,
    axis_order: AxisOrder,
    header: GeomTurboHeader,
}

impl SurfacePointCloud {
    pub fn new(pressure: Vec<Vec<P3>>, suction: Vec<Vec<P3>>) -> Result<Self> {
        let shape = |side: &[Vec<P3>], name: &str| -> Result<(usize, usize)> {
            let points = side.first().map(|s| s.len()).unwrap_or(0);
            if let Some((i, s)) = side.iter().enumerate().find(|(_, s)| s.len() != points) {
                return Err(GeometryError::ShapeMismatch(format!(
                    "{name} section {i} has {} points, expected {points}",
                    s.len()
                )));
            }
            Ok((side.len(), points))
        };
        let p = shape(&pressure, "pressure")?;
        let s = shape(&suction, "suction")?;
        if p != s {
            return Err(GeometryError::ShapeMismatch(format!(
                "pressure side is {}x{}, suction side is {}x{}",
                p.0, p.1, s.0, s.1
            )));
        }
        Ok(Self {
            sides: [pressure, suction],
            scale_factor: 1.0,
            axis_order: AxisOrder::IDENTITY,
            header: GeomTurboHeader::default(),
        })
    }

    pub fn from_sections(sections: Vec<Section>) -> Result<Self> {
        let mut pressure = Vec::with_capacity(sections.len());
        let mut suction = Vec::with_capacity(sections.len());
        for section in sections {
            pressure.push(section.pressure);
            suction.push(section.suction);
        }
        Self::new(pressure, suction)
    }

    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_header(mut self, header: GeomTurboHeader) -> Self {
        self.header = header;
        self
    }

    /// Permutes every point and records the order, so writers can restore
    /// the file layout.
    pub fn with_axis_order(mut self, order: AxisOrder) -> Self {
        if !order.is_identity() {
            for side in &mut self.sides {
                for section in side.iter_mut() {
                    for p in section.iter_mut() {
                        *p = order.apply(p);
                    }
                }
            }
        }
        self.axis_order = order;
        self
    }

    pub fn side(&self, side: Side) -> &[Vec<P3>] {
        &self.sides[side.index()]
    }

    pub fn section_count(&self) -> usize {
        self.sides[0].len()
    }

    pub fn points_per_section(&self) -> usize {
        self.sides[0].first().map(|s| s.len()).unwrap_or(0)
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn axis_order(&self) -> AxisOrder {
        self.axis_order
    }

    pub fn header(&self) -> &GeomTurboHeader {
        &self.header
    }

    pub fn section(&self, index: usize) -> Result<Section> {
        let count = self.section_count();
        if index >= count {
            return Err(GeometryError::SectionOutOfRange { index, count });
        }
        Ok(Section {
            suction: self.sides[Side::Suction.index()][index].clone(),
            pressure: self.sides[Side::Pressure.index()][index].clone(),
        })
    }

    pub fn sections(&self) -> impl Iterator<Item = Section> + '_ {
        (0..self.section_count()).map(move |i| Section {
            suction: self.sides[Side::Suction.index()][i].clone(),
            pressure: self.sides[Side::Pressure.index()][i].clone(),
        })
    }

    /// First point of every section on `side`, root to tip.
    pub fn leading_edge(&self, side: Side) -> Vec<P3> {
        self.sides[side.index()]
            .iter()
            .filter_map(|s| s.first().copied())
            .collect()
    }

    pub fn trailing_edge(&self, side: Side) -> Vec<P3> {
        self.sides[side.index()]
            .iter()
            .filter_map(|s| s.last().copied())
            .collect()
    }

    pub fn extents(&self) -> BBox3 {
        let mut bbox = BBox3::empty();
        for p in self.sides.iter().flatten().flatten() {
            bbox.include_point(p);
        }
        bbox
    }
}

/// Legacy unsectioned export: free curves plus surfaces stored as point
/// grids (`grid[row][col]`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnsectionedGeometry {
    pub curves: Vec<Vec<P3>>,
    pub surfaces: Vec<Vec<Vec<P3>>>,
}

impl UnsectionedGeometry {
    /// The first two surfaces are the blade's pressure and suction sides.
    pub fn rotor_points(&self) -> Option<(&[Vec<P3>], &[Vec<P3>])> {
        match self.surfaces.as_slice() {
            [pressure, suction, ..] => Some((pressure.as_slice(), suction.as_slice())),
            _ => None,
        }
    }
}
