use crate::error::Result;
use bladematch_core::exchange::{self, ExchangeAxes};
use bladematch_core::fillet::{round_leading_edge, round_trailing_edge, FilletParams};
use bladematch_core::geom::P3;
use bladematch_core::model::{AxisOrder, GeomTurboHeader, Section, SurfacePointCloud};

#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub axes: ExchangeAxes,
    /// Scale the contours were written with.
    pub scale: f64,
    pub le_fillet: Option<FilletParams>,
    pub te_fillet: Option<FilletParams>,
    pub header: GeomTurboHeader,
    /// Axis order of the written geometry file.
    pub output_axes: AxisOrder,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            axes: ExchangeAxes::default(),
            scale: 1e-3,
            le_fillet: None,
            te_fillet: None,
            header: GeomTurboHeader::default(),
            output_axes: AxisOrder::IDENTITY,
        }
    }
}

/// Rounds the requested edges of one section, leading edge first.
pub fn fillet_section(
    section: &Section,
    le: Option<&FilletParams>,
    te: Option<&FilletParams>,
) -> Result<Section> {
    let mut section = section.clone();
    if let Some(params) = le {
        section = round_leading_edge(&section, params)?;
    }
    if let Some(params) = te {
        section = round_trailing_edge(&section, params)?;
    }
    Ok(section)
}

pub fn fillet_cloud(
    cloud: &SurfacePointCloud,
    le: Option<&FilletParams>,
    te: Option<&FilletParams>,
) -> Result<SurfacePointCloud> {
    let sections = cloud
        .sections()
        .map(|s| fillet_section(&s, le, te))
        .collect::<Result<Vec<_>>>()?;
    Ok(SurfacePointCloud::from_sections(sections)?
        .with_header(cloud.header().clone())
        .with_scale_factor(cloud.scale_factor()))
}

/// Builds a surface from closed contours already in the native frame.
pub fn synthesize_surface(contours: &[Vec<P3>], opts: &SynthesisOptions) -> Result<SurfacePointCloud> {
    let mut sections = Vec::with_capacity(contours.len());
    for contour in contours {
        let points: Vec<P3> = contour.iter().map(|p| opts.output_axes.apply(p)).collect();
        let section = Section::from_contour(&points);
        sections.push(fillet_section(&section, opts.le_fillet.as_ref(), opts.te_fillet.as_ref())?);
    }
    log::info!("synthesized {} sections", sections.len());
    Ok(SurfacePointCloud::from_sections(sections)?.with_header(opts.header.clone()))
}

/// Same as [`synthesize_surface`] for an exchange file holding one block per
/// section.
pub fn synthesize_from_exchange(text: &str, opts: &SynthesisOptions) -> Result<SurfacePointCloud> {
    let contours = exchange::read_sections(text, opts.scale, &opts.axes)?;
    synthesize_surface(&contours, opts)
}
