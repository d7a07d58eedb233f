//! Blade-level matching: sections are fitted root to tip, each station seeded
//! with the fit of the one before it, then merged into a single 3D config.

use crate::config::ParametricBladeConfig;
use crate::driver::SectionMatchDriver;
use crate::error::{MatchError, Result};
use crate::optimizer::{FitStatus, OptimizerClient};
use crate::options::CaseOptions;
use crate::presets::InitTemplate;
use crate::prompt::Prompt;
use crate::residual::{RefineThresholds, ResidualLog};
use crate::workspace::WorkspaceHandle;
use bladematch_core::model::{Side, SurfacePointCloud};
use bladematch_core::report::Warning;
use bladematch_core::sampler::select_station_count;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssemblerState {
    Uninitialized,
    Initializing,
    MatchingSection(usize),
    Concatenating,
    Done,
    Refining,
}

#[derive(Debug, Clone)]
pub struct StationResult {
    /// Index of the matched section in the geometry.
    pub section_index: usize,
    pub config: ParametricBladeConfig,
    pub residuals: ResidualLog,
    pub status: FitStatus,
    /// Selected for refinement.
    pub modded: bool,
}

/// Persisted next to the station configs so a later run can refine them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StationRecord {
    station: usize,
    section_index: usize,
    status: FitStatus,
    modded: bool,
}

/// Everything a blade match owns.
#[derive(Debug)]
pub struct BladeCase {
    pub geometry: SurfacePointCloud,
    pub workspace: WorkspaceHandle,
    pub options: CaseOptions,
    pub stations: Vec<StationResult>,
    pub warnings: Vec<Warning>,
}

impl BladeCase {
    pub fn new(geometry: SurfacePointCloud, workspace: WorkspaceHandle, options: CaseOptions) -> Self {
        Self {
            geometry,
            workspace,
            options,
            stations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Reloads the stations of an earlier run from the workspace.
    pub fn load_stations(&mut self) -> Result<()> {
        let path = self.workspace.manifest();
        let text = std::fs::read_to_string(&path).map_err(|e| MatchError::io(&path, e))?;
        let records: Vec<StationRecord> = serde_json::from_str(&text)?;
        let mut stations = Vec::with_capacity(records.len());
        for record in records {
            if record.station != stations.len() {
                return Err(MatchError::InvalidState(format!(
                    "station manifest lists station {} at position {}",
                    record.station,
                    stations.len()
                )));
            }
            let config_path = self.workspace.station_config(record.station);
            if !config_path.is_file() {
                return Err(MatchError::MissingExpectedArtifact(config_path));
            }
            stations.push(StationResult {
                section_index: record.section_index,
                config: ParametricBladeConfig::read(&config_path)?,
                residuals: ResidualLog::read(&self.workspace.station_log(record.station))?,
                status: record.status,
                modded: record.modded,
            });
        }
        log::info!("loaded {} stations from {:?}", stations.len(), path);
        self.stations = stations;
        Ok(())
    }

    fn save_stations(&self) -> Result<()> {
        let records: Vec<StationRecord> = self
            .stations
            .iter()
            .enumerate()
            .map(|(station, s)| StationRecord {
                station,
                section_index: s.section_index,
                status: s.status,
                modded: s.modded,
            })
            .collect();
        let path = self.workspace.manifest();
        self.workspace.ensure_output_dir()?;
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(&path, json).map_err(|e| MatchError::io(&path, e))
    }
}

/// Indices (into `stations`) whose last residual exceeds a threshold. A
/// station without residuals is always selected.
pub fn flag_for_refinement(stations: &[StationResult], thresholds: &RefineThresholds) -> Vec<usize> {
    stations
        .iter()
        .enumerate()
        .filter(|(_, s)| s.residuals.last().map_or(true, |r| r.exceeds(thresholds)))
        .map(|(i, _)| i)
        .collect()
}

/// Merges the `section_NNN.cfg` files of a workspace into
/// `<case>_3D.cfg`.
pub fn concatenate_workspace(workspace: &WorkspaceHandle) -> Result<PathBuf> {
    let paths = workspace.station_configs()?;
    let configs = paths
        .iter()
        .map(|p| ParametricBladeConfig::read(p))
        .collect::<Result<Vec<_>>>()?;
    let merged = ParametricBladeConfig::concatenate(&configs)?;
    let out = workspace.concatenated_config();
    merged.write(&out)?;
    log::info!("concatenated {} stations into {:?}", configs.len(), out);
    Ok(out)
}

pub struct BladeAssembler {
    case: BladeCase,
    optimizer: Box<dyn OptimizerClient>,
    prompt: Box<dyn Prompt>,
    state: AssemblerState,
}

impl BladeAssembler {
    pub fn new(case: BladeCase, optimizer: Box<dyn OptimizerClient>, prompt: Box<dyn Prompt>) -> Self {
        Self {
            case,
            optimizer,
            prompt,
            state: AssemblerState::Uninitialized,
        }
    }

    /// Continues a finished case: stations are reloaded and the assembler is
    /// ready to refine.
    pub fn resume(
        mut case: BladeCase,
        optimizer: Box<dyn OptimizerClient>,
        prompt: Box<dyn Prompt>,
    ) -> Result<Self> {
        case.load_stations()?;
        let mut assembler = Self::new(case, optimizer, prompt);
        assembler.state = AssemblerState::Done;
        Ok(assembler)
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    pub fn case(&self) -> &BladeCase {
        &self.case
    }

    pub fn into_case(self) -> BladeCase {
        self.case
    }

    fn expect_state(&self, allowed: &[AssemblerState], action: &str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(MatchError::InvalidState(format!(
                "cannot {action} while {:?}",
                self.state
            )))
        }
    }

    /// Writes the seed config. Without a template the user is asked when
    /// interactive, otherwise the compressor preset is used.
    pub fn initialise(&mut self, template: Option<InitTemplate>) -> Result<()> {
        self.expect_state(
            &[AssemblerState::Uninitialized, AssemblerState::Done],
            "initialise",
        )?;
        self.state = AssemblerState::Initializing;

        let template = match template {
            Some(t) => t,
            None if self.case.options.interactive => self.prompt.choose_template()?,
            None => {
                log::info!("no template chosen for initialisation, using the compressor preset");
                InitTemplate::Compressor
            }
        };
        let seed = self.case.workspace.sentinel_config();
        template.load()?.write(&seed)?;
        log::info!("seeded {:?} from {template}", seed);

        if self.case.options.interactive {
            let policy = self.case.options.transfer_policy();
            let mut driver = SectionMatchDriver::new(
                &self.case.workspace,
                &self.case.options,
                self.optimizer.as_mut(),
            );
            let fitted = driver.prefit(&seed, &self.case.geometry, 0, &policy)?;
            fitted.write(&seed)?;
        }
        Ok(())
    }

    /// Picks `count` stations along the pressure-side leading edge and
    /// matches them.
    pub fn match_blade(&mut self, count: usize) -> Result<()> {
        let le = self.case.geometry.leading_edge(Side::Pressure);
        let stations = select_station_count(&le, count)?;
        log::info!("matching {} stations: {stations:?}", stations.len());
        self.match_stations(&stations)
    }

    pub fn match_stations(&mut self, stations: &[usize]) -> Result<()> {
        self.expect_state(&[AssemblerState::Initializing], "match stations")?;
        let count = self.case.geometry.section_count();
        if let Some(&index) = stations.iter().find(|&&i| i >= count) {
            return Err(bladematch_core::GeometryError::SectionOutOfRange { index, count }.into());
        }
        if stations.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MatchError::InvalidState(format!(
                "stations must be strictly increasing: {stations:?}"
            )));
        }
        let seed = self.case.workspace.sentinel_config();
        if !seed.is_file() {
            return Err(MatchError::MissingExpectedArtifact(seed));
        }

        self.case.workspace.ensure_output_dir()?;
        self.case.workspace.clear_stations()?;
        self.case.stations.clear();
        let policy = self.case.options.transfer_policy();
        for (station, &section_index) in stations.iter().enumerate() {
            self.state = AssemblerState::MatchingSection(station);
            let init = match station {
                0 => seed.clone(),
                k => self.case.workspace.station_config(k - 1),
            };
            let mut driver = SectionMatchDriver::new(
                &self.case.workspace,
                &self.case.options,
                self.optimizer.as_mut(),
            )
            .with_prefit(false);
            let fit = driver.match_section(
                &init,
                &self.case.geometry,
                section_index,
                &policy,
                &WorkspaceHandle::station_name(station),
            )?;
            self.case.stations.push(StationResult {
                section_index,
                config: fit.config,
                residuals: fit.residuals,
                status: fit.status,
                modded: false,
            });
            self.case.save_stations()?;
        }

        if let Some(warning) = self.case.workspace.remove_sentinel()? {
            self.case.warnings.push(warning);
        }

        if self.case.options.auto_concatenate {
            self.state = AssemblerState::Concatenating;
            self.concatenate()?;
        } else {
            self.state = AssemblerState::Done;
        }
        Ok(())
    }

    pub fn concatenate(&mut self) -> Result<PathBuf> {
        self.expect_state(
            &[AssemblerState::Concatenating, AssemblerState::Done],
            "concatenate",
        )?;
        self.state = AssemblerState::Concatenating;
        let out = concatenate_workspace(&self.case.workspace)?;
        self.state = AssemblerState::Done;
        Ok(out)
    }

    /// Re-fits every flagged station from its own config into
    /// `new_section_NNN` and asks before committing each one. Returns the
    /// flagged stations.
    pub fn refine(&mut self, thresholds: &RefineThresholds) -> Result<Vec<usize>> {
        self.expect_state(&[AssemblerState::Done], "refine")?;
        self.state = AssemblerState::Refining;

        let flagged = flag_for_refinement(&self.case.stations, thresholds);
        log::info!("{} stations flagged for refinement: {flagged:?}", flagged.len());
        let policy = self.case.options.transfer_policy();
        let mut committed = 0;
        for &station in &flagged {
            self.case.stations[station].modded = true;
            let section_index = self.case.stations[station].section_index;
            let init = self.case.workspace.station_config(station);
            let mut driver = SectionMatchDriver::new(
                &self.case.workspace,
                &self.case.options,
                self.optimizer.as_mut(),
            )
            .with_prefit(false);
            let fit = driver.match_section(
                &init,
                &self.case.geometry,
                section_index,
                &policy,
                &WorkspaceHandle::new_station_name(station),
            )?;

            let summary = match fit.residuals.last() {
                Some(r) => format!("mean {:.3}%, max {:.3}%", r.mean_dev_rel, r.max_dev_rel),
                None => "no residuals".to_string(),
            };
            let question = format!("Commit refined {} ({summary})?", WorkspaceHandle::station_name(station));
            if !self.prompt.confirm(&question)? {
                log::info!("keeping original {}", WorkspaceHandle::station_name(station));
                continue;
            }
            let ws = &self.case.workspace;
            for (from, to) in [
                (ws.new_station_config(station), ws.station_config(station)),
                (ws.new_station_log(station), ws.station_log(station)),
            ] {
                std::fs::rename(&from, &to).map_err(|e| MatchError::io(&from, e))?;
            }
            let result = &mut self.case.stations[station];
            result.config = fit.config;
            result.residuals = fit.residuals;
            result.status = fit.status;
            committed += 1;
        }
        self.case.save_stations()?;

        self.state = AssemblerState::Done;
        if committed > 0 && self.case.options.auto_concatenate {
            self.concatenate()?;
        }
        Ok(flagged)
    }
}
