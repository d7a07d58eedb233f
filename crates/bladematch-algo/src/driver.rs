use crate::config::{ParametricBladeConfig, CONFIG_PATH, PRESCRIBED_BLADE_FILENAME, SCALE_FACTOR};
use crate::error::{MatchError, Result};
use crate::optimizer::{FitOutcome, FitRequest, FitStatus, MatchMode, OptimizerClient, OptimizerSettings};
use crate::options::CaseOptions;
use crate::residual::ResidualLog;
use crate::workspace::WorkspaceHandle;
use bladematch_core::exchange;
use bladematch_core::model::SurfacePointCloud;
use std::path::Path;

/// What is carried from the geometry into the initial config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferPolicy {
    pub position: bool,
    pub angles: bool,
    pub fatten: bool,
    pub fatten_factor: f64,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        CaseOptions::default().transfer_policy()
    }
}

#[derive(Debug, Clone)]
pub struct SectionMatch {
    pub config: ParametricBladeConfig,
    pub residuals: ResidualLog,
    pub status: FitStatus,
    /// Design-variable runs, retries included.
    pub attempts: u32,
}

/// Fits one section of a geometry through an [`OptimizerClient`].
pub struct SectionMatchDriver<'a> {
    workspace: &'a WorkspaceHandle,
    options: &'a CaseOptions,
    optimizer: &'a mut dyn OptimizerClient,
    prefit: bool,
    settings: OptimizerSettings,
}

impl<'a> SectionMatchDriver<'a> {
    pub fn new(
        workspace: &'a WorkspaceHandle,
        options: &'a CaseOptions,
        optimizer: &'a mut dyn OptimizerClient,
    ) -> Self {
        Self {
            workspace,
            options,
            optimizer,
            prefit: options.interactive,
            settings: options.optimizer_settings(),
        }
    }

    /// Whether a manual pre-fit runs before the design-variable optimization.
    /// Defaults to the case's `interactive` option.
    pub fn with_prefit(mut self, prefit: bool) -> Self {
        self.prefit = prefit;
        self
    }

    /// Non-convergence and infeasibility come back as [`FitStatus`]; only
    /// missing optimizer outputs and I/O failures are errors.
    pub fn match_section(
        &mut self,
        init_config: &Path,
        geometry: &SurfacePointCloud,
        section_index: usize,
        policy: &TransferPolicy,
        output_name: &str,
    ) -> Result<SectionMatch> {
        let mut config = self.prepare(init_config, geometry, section_index, policy)?;

        if self.prefit {
            config = self.run(&config, MatchMode::Manual)?.config;
            config.write(&self.workspace.init_config())?;
        }

        let retries = self.options.optim_max_retries_slsqp;
        let mut attempts = 0;
        let outcome = loop {
            let outcome = self.run(&config, MatchMode::DesignVariables)?;
            attempts += 1;
            if outcome.status == FitStatus::Infeasible && attempts <= retries {
                log::warn!(
                    "section {section_index}: infeasible optimization, retrying ({attempts}/{retries})"
                );
                continue;
            }
            break outcome;
        };

        self.workspace.ensure_output_dir()?;
        outcome.config.write(&self.workspace.result_config(output_name))?;
        outcome.residuals.write(&self.workspace.result_log(output_name))?;

        match outcome.residuals.last() {
            Some(r) => log::info!(
                "section {section_index} -> {output_name}: {:?} after {} iterations (mean {:.3}%, max {:.3}%)",
                outcome.status,
                r.iteration,
                r.mean_dev_rel,
                r.max_dev_rel
            ),
            None => log::warn!(
                "section {section_index} -> {output_name}: {:?} with an empty residual log",
                outcome.status
            ),
        }

        Ok(SectionMatch {
            config: outcome.config,
            residuals: outcome.residuals,
            status: outcome.status,
            attempts,
        })
    }

    /// Manual fit only, used to refine a seed config before a blade match.
    pub fn prefit(
        &mut self,
        init_config: &Path,
        geometry: &SurfacePointCloud,
        section_index: usize,
        policy: &TransferPolicy,
    ) -> Result<ParametricBladeConfig> {
        let config = self.prepare(init_config, geometry, section_index, policy)?;
        Ok(self.run(&config, MatchMode::Manual)?.config)
    }

    /// Writes `init.cfg` and the target points `init.txt` for one section.
    fn prepare(
        &self,
        init_config: &Path,
        geometry: &SurfacePointCloud,
        section_index: usize,
        policy: &TransferPolicy,
    ) -> Result<ParametricBladeConfig> {
        let mut config = ParametricBladeConfig::read(init_config)?;
        let section = geometry.section(section_index)?;
        let scale = geometry.scale_factor();
        let axes = self.options.exchange_axes;

        config.set_ndim(2);
        let scaled = config.contains(SCALE_FACTOR) && config.get_f64(SCALE_FACTOR)? == scale;
        if !scaled {
            config.rescale(scale)?;
        }

        if policy.position || policy.angles {
            let (Some(le), Some(te)) = (section.leading_edge(), section.trailing_edge()) else {
                return Err(MatchError::InvalidState(format!(
                    "section {section_index} has no points"
                )));
            };
            let le = axes.to_exchange(&le, scale);
            let te = axes.to_exchange(&te, scale);
            if policy.position {
                config.set_position(&le, &te);
            }
            if policy.angles {
                config.set_stagger(&le, &te);
            }
        }
        if policy.fatten {
            config.fatten(policy.fatten_factor)?;
        }

        let target = self.workspace.target_points();
        let points = exchange::section_to_string(&section.contour(), scale, &axes)?;
        std::fs::write(&target, points).map_err(|e| MatchError::io(&target, e))?;

        let config_path = self.workspace.init_config();
        config.set_str(PRESCRIBED_BLADE_FILENAME, &target.display().to_string());
        config.set_str(CONFIG_PATH, &config_path.display().to_string());
        config.write(&config_path)?;
        log::debug!("prepared section {section_index} in {:?}", self.workspace.root());
        Ok(config)
    }

    /// One optimizer call on a clean scratch directory.
    fn run(&mut self, config: &ParametricBladeConfig, mode: MatchMode) -> Result<FitOutcome> {
        let config_path = self.workspace.init_config();
        let target_path = self.workspace.target_points();
        let scratch = self.workspace.scratch_dir();
        self.workspace.clear_scratch();
        let request = FitRequest {
            config,
            config_path: &config_path,
            target_path: &target_path,
            mode,
            settings: &self.settings,
            scratch_dir: &scratch,
        };
        let outcome = self.optimizer.fit(&request);
        self.workspace.clear_scratch();
        outcome
    }
}
