use bladematch_core::geom::P3;
use bladematch_core::model::{
    AxisOrder, GeomTurboHeader, Side, SideOrder, SurfacePointCloud, UnsectionedGeometry,
};
use bladematch_core::{GeometryError, Result};
use std::fmt::Write;
use std::path::Path;

const SECTIONAL: &str = "SECTIONAL";
const XYZ: &str = "XYZ";
const SURFACE_MARKER: &str = "SISLS";

#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub axis_order: AxisOrder,
    /// Recorded on the cloud; coordinates stay in file units.
    pub scale_factor: f64,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            axis_order: AxisOrder::IDENTITY,
            scale_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    pub side_order: SideOrder,
}

pub fn decode(path: &Path, opts: &DecodeOptions) -> Result<SurfacePointCloud> {
    let text = std::fs::read_to_string(path).map_err(|e| GeometryError::io(path, e))?;
    decode_str(&text, opts)
}

/// Reads a sectioned geometry file. Section and point counts come from the
/// lines following the first `SECTIONAL` and `XYZ` markers.
pub fn decode_str(text: &str, opts: &DecodeOptions) -> Result<SurfacePointCloud> {
    let reader = SectionedReader::new(text);
    let section_count = reader.count_after(SECTIONAL)?;
    let point_count = reader.count_after(XYZ)?;
    if section_count == 0 || point_count == 0 {
        return Err(malformed(
            reader.lines.len(),
            format!("declares {section_count} sections x {point_count} points; both must be positive"),
        ));
    }
    let first_block = reader.first_side_block().ok_or_else(|| {
        malformed(reader.lines.len(), "no `pressure`/`suction` block found".to_string())
    })?;
    let header = parse_header(&reader.lines[..first_block]);

    let values = reader.collect_coordinates(first_block, section_count, point_count)?;

    let per_side = section_count * point_count * 3;
    let total: usize = values.iter().map(Vec::len).sum();
    if total != 2 * per_side {
        return Err(malformed(
            reader.lines.len(),
            format!(
                "expected {} coordinates (2 sides x {section_count} sections x {point_count} points x 3), found {total}",
                2 * per_side
            ),
        ));
    }
    if let Some(side) = Side::ALL.iter().find(|s| values[s.index()].len() != per_side) {
        return Err(malformed(
            reader.lines.len(),
            format!(
                "{} block holds {} coordinates, expected {per_side}",
                side.keyword(),
                values[side.index()].len()
            ),
        ));
    }

    let [pressure, suction] = values.map(|v| reshape(&v, point_count));
    log::debug!("decoded {section_count} sections x {point_count} points per side");
    Ok(SurfacePointCloud::new(pressure, suction)?
        .with_header(header)
        .with_scale_factor(opts.scale_factor)
        .with_axis_order(opts.axis_order))
}

pub fn encode(cloud: &SurfacePointCloud, path: &Path, opts: &EncodeOptions) -> Result<()> {
    let text = encode_string(cloud, opts)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| GeometryError::io(parent, e))?;
        }
    }
    std::fs::write(path, text).map_err(|e| GeometryError::io(path, e))
}

/// Points are written in file axis order, i.e. the cloud's axis order is
/// undone, so that decoding with the same order reproduces the cloud.
pub fn encode_string(cloud: &SurfacePointCloud, opts: &EncodeOptions) -> Result<String> {
    let to_file = cloud.axis_order().inverse();
    let header = cloud.header();
    let mut out = String::new();

    writeln!(out, "GEOMETRY TURBO VERSION 5")?;
    writeln!(out, "number_of_blades {}", header.number_of_blades)?;
    writeln!(out, "blade_expansion_factor_hub  {}", header.expansion_factor_hub)?;
    writeln!(out, "blade_expansion_factor_shroud {}", header.expansion_factor_shroud)?;
    writeln!(out, "blade_tangential_definition\t  {}", header.tangential_definition)?;

    for side in opts.side_order.sides() {
        writeln!(out, "{}", side.keyword())?;
        writeln!(out, "{SECTIONAL}")?;
        writeln!(out, "{}", cloud.section_count())?;
        for (i, section) in cloud.side(side).iter().enumerate() {
            writeln!(out, "# section {}", i + 1)?;
            writeln!(out, "{XYZ}")?;
            writeln!(out, "{}", section.len())?;
            for p in section {
                let q = to_file.apply(p);
                writeln!(out, "{} {} {}", q.x, q.y, q.z)?;
            }
        }
    }
    Ok(out)
}

pub fn decode_unsectioned(path: &Path) -> Result<UnsectionedGeometry> {
    let text = std::fs::read_to_string(path).map_err(|e| GeometryError::io(path, e))?;
    Ok(decode_unsectioned_str(&text))
}

/// Best-effort reader for the legacy unsectioned export. Surfaces are the
/// last point runs in the file, one per `SISLS` marker; the line before each
/// marker carries the grid shape in its third and fourth tokens.
pub fn decode_unsectioned_str(text: &str) -> UnsectionedGeometry {
    let lines: Vec<Vec<&str>> = text.lines().map(|l| l.split_whitespace().collect()).collect();

    let mut shapes: Vec<(usize, usize)> = Vec::new();
    for (i, tokens) in lines.iter().enumerate() {
        let is_marker = tokens.first().is_some_and(|t| t.starts_with(SURFACE_MARKER));
        if !is_marker || i == 0 {
            continue;
        }
        let prev = &lines[i - 1];
        let dims: Option<Vec<usize>> = prev
            .get(2..4)
            .map(|d| d.iter().filter_map(|t| t.parse().ok()).collect());
        match dims.as_deref() {
            Some(&[rows, cols]) => shapes.push((rows, cols)),
            _ => log::warn!("surface marker on line {} has no readable grid shape", i + 1),
        }
    }

    let mut runs: Vec<Vec<P3>> = Vec::new();
    let mut current: Vec<P3> = Vec::new();
    for tokens in &lines {
        if tokens.is_empty() {
            continue;
        }
        let parsed: std::result::Result<Vec<f64>, _> = tokens.iter().map(|t| t.parse::<f64>()).collect();
        // Lines that are not purely numeric are skipped without ending a run.
        let Ok(values) = parsed else { continue };
        if values.len() == 3 {
            current.push(P3::new(values[0], values[1], values[2]));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs.retain(|r| r.len() != 1);

    let split = runs.len().saturating_sub(shapes.len());
    let surface_runs = runs.split_off(split);
    let mut surfaces = Vec::with_capacity(surface_runs.len());
    for (run, &(_, cols)) in surface_runs.iter().zip(shapes.iter()) {
        if cols == 0 || run.len() % cols != 0 {
            log::warn!(
                "dropping surface with {} points: not divisible into {cols} columns",
                run.len()
            );
            continue;
        }
        let rows = run.len() / cols;
        let grid: Vec<Vec<P3>> = (0..rows)
            .map(|r| (0..cols).map(|c| run[c * rows + r]).collect())
            .collect();
        surfaces.push(grid);
    }

    UnsectionedGeometry {
        curves: runs,
        surfaces,
    }
}

fn malformed(line: usize, reason: String) -> GeometryError {
    GeometryError::MalformedGeometryFile { line, reason }
}

fn reshape(values: &[f64], point_count: usize) -> Vec<Vec<P3>> {
    let points: Vec<P3> = values
        .chunks_exact(3)
        .map(|c| P3::new(c[0], c[1], c[2]))
        .collect();
    points.chunks(point_count).map(|c| c.to_vec()).collect()
}

fn parse_header(lines: &[Vec<&str>]) -> GeomTurboHeader {
    let mut header = GeomTurboHeader::default();
    for tokens in lines {
        let (Some(key), Some(value)) = (tokens.first(), tokens.last()) else {
            continue;
        };
        match *key {
            "number_of_blades" => {
                if let Ok(v) = value.parse() {
                    header.number_of_blades = v;
                }
            }
            "blade_expansion_factor_hub" => {
                if let Ok(v) = value.parse() {
                    header.expansion_factor_hub = v;
                }
            }
            "blade_expansion_factor_shroud" => {
                if let Ok(v) = value.parse() {
                    header.expansion_factor_shroud = v;
                }
            }
            "blade_tangential_definition" => {
                if let Ok(v) = value.parse() {
                    header.tangential_definition = v;
                }
            }
            _ => log::debug!("ignoring header line `{}`", tokens.join(" ")),
        }
    }
    header
}

struct SectionedReader<'a> {
    lines: Vec<Vec<&'a str>>,
}

impl<'a> SectionedReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().map(|l| l.split_whitespace().collect()).collect(),
        }
    }

    fn count_after(&self, marker: &str) -> Result<usize> {
        let idx = self
            .lines
            .iter()
            .position(|t| t.as_slice() == [marker])
            .ok_or_else(|| malformed(self.lines.len(), format!("no `{marker}` marker")))?;
        self.count_at(idx + 1, marker)
    }

    fn count_at(&self, idx: usize, marker: &str) -> Result<usize> {
        match self.lines.get(idx).map(Vec::as_slice) {
            Some([count]) => count.parse().map_err(|_| {
                malformed(idx + 1, format!("`{count}` after `{marker}` is not a count"))
            }),
            _ => Err(malformed(idx + 1, format!("expected a count after `{marker}`"))),
        }
    }

    fn first_side_block(&self) -> Option<usize> {
        self.lines
            .iter()
            .position(|t| matches!(t.as_slice(), [w] if Side::from_keyword(w).is_some()))
    }

    /// Strips block and section markers and returns the numbers per side, in
    /// file order.
    fn collect_coordinates(
        &self,
        start: usize,
        section_count: usize,
        point_count: usize,
    ) -> Result<[Vec<f64>; 2]> {
        let mut values: [Vec<f64>; 2] = [Vec::new(), Vec::new()];
        let mut current: Option<Side> = None;
        let mut idx = start;
        while idx < self.lines.len() {
            let tokens = self.lines[idx].as_slice();
            match tokens {
                [] => {}
                [word] if Side::from_keyword(word).is_some() => {
                    current = Side::from_keyword(word);
                    if self.lines.get(idx + 1).map(Vec::as_slice) != Some(&[SECTIONAL][..]) {
                        return Err(malformed(idx + 2, format!("expected `{SECTIONAL}` after `{word}`")));
                    }
                    let n = self.count_at(idx + 2, SECTIONAL)?;
                    if n != section_count {
                        return Err(malformed(
                            idx + 3,
                            format!("`{word}` block declares {n} sections, expected {section_count}"),
                        ));
                    }
                    idx += 2;
                }
                [word] if *word == XYZ => {
                    let n = self.count_at(idx + 1, XYZ)?;
                    if n != point_count {
                        return Err(malformed(
                            idx + 2,
                            format!("section declares {n} points, expected {point_count}"),
                        ));
                    }
                    idx += 1;
                }
                [first, ..] if first.starts_with('#') => {}
                // Autogrid wraps blocks in NI_BEGIN/NI_END keyword lines.
                [first, ..] if first.starts_with("NI_") => current = None,
                _ => {
                    let side = current.ok_or_else(|| {
                        malformed(idx + 1, "coordinates outside a side block".to_string())
                    })?;
                    if tokens.len() != 3 {
                        return Err(malformed(
                            idx + 1,
                            format!("expected 3 coordinates, found {} tokens", tokens.len()),
                        ));
                    }
                    for tok in tokens {
                        let v: f64 = tok
                            .parse()
                            .map_err(|_| malformed(idx + 1, format!("`{tok}` is not a number")))?;
                        values[side.index()].push(v);
                    }
                }
            }
            idx += 1;
        }
        Ok(values)
    }
}
