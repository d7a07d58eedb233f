use anyhow::{bail, Context, Result};
use bladematch_algo::assembler::{concatenate_workspace, BladeAssembler, BladeCase};
use bladematch_algo::driver::SectionMatchDriver;
use bladematch_algo::optimizer::ProcessOptimizer;
use bladematch_algo::options::CaseOptions;
use bladematch_algo::presets::InitTemplate;
use bladematch_algo::prompt::{FixedPrompt, Prompt, StdinPrompt};
use bladematch_algo::report::{RunReport, StationSummary};
use bladematch_algo::residual::RefineThresholds;
use bladematch_algo::synthesis::{fillet_cloud, synthesize_from_exchange, SynthesisOptions};
use bladematch_algo::workspace::WorkspaceHandle;
use bladematch_core::exchange::{self, ExchangeAxes};
use bladematch_core::fillet::FilletParams;
use bladematch_core::model::{AxisOrder, GeomTurboHeader, Side, SurfacePointCloud};
use bladematch_core::report::{GeometrySummary, Warning};
use bladematch_core::sampler::sample_by_leading_edge_arc_length;
use bladematch_import_geomturbo::{DecodeOptions, EncodeOptions};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "bladematch")]
#[command(about = "Match geomTurbo blade point clouds to parametric blade configs, and back.")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Summarize a geomTurbo file.
    Inspect {
        input: PathBuf,
        #[arg(long, default_value = "xyz")]
        xyz: String,
        /// Read the legacy unsectioned layout.
        #[arg(long)]
        unsectioned: bool,
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Write one section as a prescribed-point file.
    ExportSection {
        input: PathBuf,
        #[arg(long, conflicts_with = "span")]
        section: Option<usize>,
        /// Spanwise position in percent, measured along the leading edge.
        #[arg(long)]
        span: Option<f64>,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 1e-3)]
        scale: f64,
        #[arg(long, default_value = "xyz")]
        xyz: String,
        #[arg(long, default_value = "zxy")]
        axes: String,
    },
    /// Fit one section, starting from a config.
    MatchSection {
        input: PathBuf,
        config: PathBuf,
        #[arg(short, long, default_value = "section_match_output")]
        output: PathBuf,
        #[arg(short, long, default_value_t = 0)]
        section: usize,
        /// JSON file with case options.
        #[arg(long)]
        options: Option<PathBuf>,
        #[arg(long)]
        optimizer: PathBuf,
        #[arg(last = true)]
        optimizer_args: Vec<String>,
    },
    /// Fit a whole blade section by section and concatenate the result.
    MatchBlade {
        input: PathBuf,
        #[arg(default_value_t = 10)]
        n_sections: usize,
        #[arg(short, long, default_value = "CASE")]
        output: PathBuf,
        #[arg(long)]
        options: Option<PathBuf>,
        /// Run without prompting.
        #[arg(short = 'p', long)]
        on_hpc: bool,
        /// `compressor`, `turbine` or a .cfg file.
        #[arg(long)]
        template: Option<String>,
        #[arg(long)]
        optimizer: PathBuf,
        #[arg(last = true)]
        optimizer_args: Vec<String>,
    },
    /// Re-fit the stations of a case whose residuals are over threshold.
    Refine {
        case: PathBuf,
        input: PathBuf,
        #[arg(long, default_value_t = 0.1)]
        mean: f64,
        #[arg(long, default_value_t = 0.4)]
        max: f64,
        #[arg(long)]
        options: Option<PathBuf>,
        /// Commit refined stations without asking.
        #[arg(long)]
        yes: bool,
        #[arg(long)]
        optimizer: PathBuf,
        #[arg(last = true)]
        optimizer_args: Vec<String>,
    },
    /// Merge the station configs of a case into one 3D config.
    Concatenate { case: PathBuf },
    /// Build a geomTurbo file from evaluated section contours.
    MakeGeomturbo {
        contours: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        le_fillet: bool,
        #[arg(long)]
        te_fillet: bool,
        #[arg(long, default_value = "xyz")]
        xyz: String,
        #[arg(long, default_value_t = 1)]
        blades: u32,
        #[arg(long, default_value_t = 1e-3)]
        scale: f64,
        #[arg(long, default_value = "zxy")]
        axes: String,
    },
    /// Round the edges of every section of a geomTurbo file.
    Fillet {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        le: bool,
        #[arg(long)]
        te: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect {
            input,
            xyz,
            unsectioned,
            report,
        } => inspect(&input, &xyz, unsectioned, report.as_deref()),
        Command::ExportSection {
            input,
            section,
            span,
            output,
            scale,
            xyz,
            axes,
        } => export_section(&input, section, span, &output, scale, &xyz, &axes),
        Command::MatchSection {
            input,
            config,
            output,
            section,
            options,
            optimizer,
            optimizer_args,
        } => match_section(
            &input,
            &config,
            &output,
            section,
            options.as_deref(),
            ProcessOptimizer::new(optimizer).with_args(optimizer_args),
        ),
        Command::MatchBlade {
            input,
            n_sections,
            output,
            options,
            on_hpc,
            template,
            optimizer,
            optimizer_args,
        } => match_blade(
            &input,
            n_sections,
            &output,
            options.as_deref(),
            on_hpc,
            template.as_deref(),
            ProcessOptimizer::new(optimizer).with_args(optimizer_args),
        ),
        Command::Refine {
            case,
            input,
            mean,
            max,
            options,
            yes,
            optimizer,
            optimizer_args,
        } => refine(
            &case,
            &input,
            RefineThresholds {
                mean_dev_rel: mean,
                max_dev_rel: max,
            },
            options.as_deref(),
            yes,
            ProcessOptimizer::new(optimizer).with_args(optimizer_args),
        ),
        Command::Concatenate { case } => {
            let ws = WorkspaceHandle::open(&case)?;
            let out = concatenate_workspace(&ws)?;
            println!("{}", out.display());
            Ok(())
        }
        Command::MakeGeomturbo {
            contours,
            output,
            le_fillet,
            te_fillet,
            xyz,
            blades,
            scale,
            axes,
        } => make_geomturbo(
            &contours,
            &output,
            le_fillet,
            te_fillet,
            &xyz,
            blades,
            scale,
            &axes,
        ),
        Command::Fillet { input, output, le, te } => fillet(&input, &output, le, te),
    }
}

fn inspect(input: &Path, xyz: &str, unsectioned: bool, report: Option<&Path>) -> Result<()> {
    ensure_input_file(input)?;
    let json = if unsectioned {
        let geom = bladematch_import_geomturbo::decode_unsectioned(input)?;
        let surfaces: Vec<[usize; 2]> = geom
            .surfaces
            .iter()
            .map(|s| [s.len(), s.first().map(|r| r.len()).unwrap_or(0)])
            .collect();
        let curves: Vec<usize> = geom.curves.iter().map(|c| c.len()).collect();
        serde_json::to_string_pretty(&serde_json::json!({
            "curves": curves,
            "surfaces": surfaces,
            "has_rotor": geom.rotor_points().is_some(),
        }))
        .context("serialize summary")?
    } else {
        let cloud = read_geometry(input, xyz, 1.0)?;
        let summary = GeometrySummary::of(&cloud, 1e-6);
        serde_json::to_string_pretty(&summary).context("serialize summary")?
    };
    emit(&json, report)
}

fn export_section(
    input: &Path,
    section: Option<usize>,
    span: Option<f64>,
    output: &Path,
    scale: f64,
    xyz: &str,
    axes: &str,
) -> Result<()> {
    ensure_input_file(input)?;
    let cloud = read_geometry(input, xyz, scale)?;
    let axes: ExchangeAxes = axes.parse()?;
    let index = match (section, span) {
        (Some(i), _) => i,
        (None, Some(pct)) => {
            sample_by_leading_edge_arc_length(&cloud.leading_edge(Side::Pressure), pct)?
        }
        (None, None) => bail!("pass --section or --span"),
    };
    let points = cloud.section(index)?.contour();
    let text = exchange::section_to_string(&points, scale, &axes)?;
    create_parent(output);
    std::fs::write(output, text).with_context(|| format!("write section: {output:?}"))?;
    log::info!("section {index} written to {output:?}");
    Ok(())
}

fn match_section(
    input: &Path,
    config: &Path,
    output: &Path,
    section: usize,
    options: Option<&Path>,
    mut optimizer: ProcessOptimizer,
) -> Result<()> {
    ensure_input_file(input)?;
    ensure_input_file(config)?;
    let (opts, warnings) = load_options(options)?;
    let cloud = read_geometry(input, &opts.xyz.to_string(), opts.scale_factor)?;
    let ws = WorkspaceHandle::acquire(output, opts.overwrite)?;
    let name = config
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("section");

    let fit = SectionMatchDriver::new(&ws, &opts, &mut optimizer).match_section(
        config,
        &cloud,
        section,
        &opts.transfer_policy(),
        name,
    )?;

    let mut report = RunReport::new(ws.name());
    report.stations.push(StationSummary {
        station: 0,
        section_index: section,
        status: fit.status,
        last_residual: fit.residuals.last().copied(),
        modded: false,
    });
    if !fit.residuals.is_converged(&opts.thresholds()) {
        report.refinement_flags.push(0);
    }
    report.warnings = warnings;
    emit(&serde_json::to_string_pretty(&report).context("serialize report")?, None)
}

fn match_blade(
    input: &Path,
    n_sections: usize,
    output: &Path,
    options: Option<&Path>,
    on_hpc: bool,
    template: Option<&str>,
    optimizer: ProcessOptimizer,
) -> Result<()> {
    ensure_input_file(input)?;
    if n_sections < 2 {
        bail!("a blade needs at least 2 sections, got {n_sections}");
    }
    let (mut opts, warnings) = load_options(options)?;
    if on_hpc {
        opts.enforce_batch();
    }
    let template: Option<InitTemplate> = template.map(str::parse::<InitTemplate>).transpose()?;
    let cloud = read_geometry(input, &opts.xyz.to_string(), opts.scale_factor)?;
    let ws = WorkspaceHandle::acquire(output, opts.overwrite)?;
    let thresholds = opts.thresholds();

    let prompt = make_prompt(opts.prompts_user(false));
    let mut case = BladeCase::new(cloud, ws, opts);
    case.warnings = warnings;
    let mut assembler = BladeAssembler::new(case, Box::new(optimizer), prompt);
    assembler.initialise(template)?;
    assembler.match_blade(n_sections)?;

    let report = RunReport::of_case(assembler.case(), &thresholds);
    emit(&serde_json::to_string_pretty(&report).context("serialize report")?, None)
}

fn refine(
    case_dir: &Path,
    input: &Path,
    thresholds: RefineThresholds,
    options: Option<&Path>,
    yes: bool,
    optimizer: ProcessOptimizer,
) -> Result<()> {
    ensure_input_file(input)?;
    let (opts, warnings) = load_options(options)?;
    let cloud = read_geometry(input, &opts.xyz.to_string(), opts.scale_factor)?;
    let ws = WorkspaceHandle::open(case_dir)?;

    let prompt = make_prompt(opts.prompts_user(yes));
    let mut case = BladeCase::new(cloud, ws, opts);
    case.warnings = warnings;
    let mut assembler = BladeAssembler::resume(case, Box::new(optimizer), prompt)?;
    assembler.refine(&thresholds)?;

    let report = RunReport::of_case(assembler.case(), &thresholds);
    emit(&serde_json::to_string_pretty(&report).context("serialize report")?, None)
}

#[allow(clippy::too_many_arguments)]
fn make_geomturbo(
    contours: &Path,
    output: &Path,
    le_fillet: bool,
    te_fillet: bool,
    xyz: &str,
    blades: u32,
    scale: f64,
    axes: &str,
) -> Result<()> {
    ensure_input_file(contours)?;
    let text = std::fs::read_to_string(contours)
        .with_context(|| format!("read contours: {contours:?}"))?;
    let opts = SynthesisOptions {
        axes: axes.parse()?,
        scale,
        le_fillet: le_fillet.then(FilletParams::leading_edge_default),
        te_fillet: te_fillet.then(FilletParams::trailing_edge_default),
        header: GeomTurboHeader {
            number_of_blades: blades,
            ..GeomTurboHeader::default()
        },
        output_axes: xyz.parse::<AxisOrder>()?,
    };
    let cloud = synthesize_from_exchange(&text, &opts)?;
    write_geometry(&cloud, output)
}

fn fillet(input: &Path, output: &Path, le: bool, te: bool) -> Result<()> {
    ensure_input_file(input)?;
    if !le && !te {
        bail!("nothing to do: pass --le and/or --te");
    }
    let cloud = read_geometry(input, "xyz", 1.0)?;
    let le_params = FilletParams::leading_edge_default();
    let te_params = FilletParams::trailing_edge_default();
    let rounded = fillet_cloud(
        &cloud,
        le.then_some(&le_params),
        te.then_some(&te_params),
    )?;
    write_geometry(&rounded, output)
}

fn read_geometry(input: &Path, xyz: &str, scale_factor: f64) -> Result<SurfacePointCloud> {
    let opts = DecodeOptions {
        axis_order: xyz.parse()?,
        scale_factor,
    };
    bladematch_import_geomturbo::decode(input, &opts)
        .with_context(|| format!("read geometry: {input:?}"))
}

fn write_geometry(cloud: &SurfacePointCloud, output: &Path) -> Result<()> {
    bladematch_import_geomturbo::encode(cloud, output, &EncodeOptions::default())
        .with_context(|| format!("write geometry: {output:?}"))?;
    log::info!(
        "wrote {} sections x {} points to {output:?}",
        cloud.section_count(),
        cloud.points_per_section()
    );
    Ok(())
}

fn load_options(path: Option<&Path>) -> Result<(CaseOptions, Vec<Warning>)> {
    match path {
        Some(path) => {
            ensure_input_file(path)?;
            CaseOptions::from_json_file(path).with_context(|| format!("read options: {path:?}"))
        }
        None => Ok((CaseOptions::default(), Vec::new())),
    }
}

/// Batch runs take the compressor preset and commit every refinement.
fn make_prompt(interactive: bool) -> Box<dyn Prompt> {
    if interactive {
        Box::new(StdinPrompt)
    } else {
        Box::new(FixedPrompt::new(InitTemplate::Compressor, true))
    }
}

fn emit(json: &str, report: Option<&Path>) -> Result<()> {
    if let Some(path) = report {
        create_parent(path);
        std::fs::write(path, json).with_context(|| format!("write report: {path:?}"))?;
    } else {
        println!("{json}");
    }
    Ok(())
}

fn create_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
}

fn ensure_input_file(input: &Path) -> Result<()> {
    match std::fs::metadata(input) {
        Ok(meta) => {
            if meta.is_file() {
                Ok(())
            } else {
                bail!("input is not a file: {input:?}");
            }
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            bail!("input not found: {input:?} (cwd: {cwd:?}).");
        }
        Err(err) => Err(err).with_context(|| format!("stat input: {input:?}")),
    }
}
