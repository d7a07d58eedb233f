//! File-based contract with the external parametrization optimizer.
//!
//! The optimizer reads a config referencing a prescribed point file and leaves
//! its best fit and iteration log under fixed names in a scratch directory.
//! [`OptimizerClient`] hides that exchange so the pipeline can run against an
//! in-memory implementation.

use crate::config::ParametricBladeConfig;
use crate::error::{MatchError, Result};
use crate::residual::{RefineThresholds, ResidualLog};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const MATCHED_CONFIG: &str = "matched_parametrization.cfg";
pub const PROGRESS_LOG: &str = "optimization_progress.txt";
pub const DEFAULT_INFEASIBLE_EXIT_CODE: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    /// Interactive pre-fit driven by the user.
    Manual,
    /// Automated design-variable optimization.
    DesignVariables,
}

impl MatchMode {
    pub fn as_arg(self) -> &'static str {
        match self {
            MatchMode::Manual => "manual",
            MatchMode::DesignVariables => "dvs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitStatus {
    Finished,
    NotConverged,
    Infeasible,
    Failed { code: Option<i32> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSettings {
    pub max_iter: u32,
    pub uv_method: String,
    pub dv_method: String,
    pub thresholds: RefineThresholds,
}

#[derive(Debug, Clone, Copy)]
pub struct FitRequest<'a> {
    pub config: &'a ParametricBladeConfig,
    pub config_path: &'a Path,
    pub target_path: &'a Path,
    pub mode: MatchMode,
    pub settings: &'a OptimizerSettings,
    pub scratch_dir: &'a Path,
}

#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub config: ParametricBladeConfig,
    pub residuals: ResidualLog,
    pub status: FitStatus,
}

pub trait OptimizerClient {
    fn fit(&mut self, request: &FitRequest<'_>) -> Result<FitOutcome>;
}

/// Runs the optimizer as a child process:
/// `<program> [args..] <config> --mode M --max-iter N --uv-method U
/// --dv-method D --output <scratch>`.
#[derive(Debug, Clone)]
pub struct ProcessOptimizer {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub infeasible_exit_code: i32,
}

impl ProcessOptimizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            infeasible_exit_code: DEFAULT_INFEASIBLE_EXIT_CODE,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl OptimizerClient for ProcessOptimizer {
    fn fit(&mut self, request: &FitRequest<'_>) -> Result<FitOutcome> {
        std::fs::create_dir_all(request.scratch_dir)
            .map_err(|e| MatchError::io(request.scratch_dir, e))?;
        log::info!(
            "running {} ({} mode) on {:?}",
            self.program.display(),
            request.mode.as_arg(),
            request.config_path
        );
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(request.config_path)
            .args(["--mode", request.mode.as_arg()])
            .args(["--max-iter", request.settings.max_iter.to_string().as_str()])
            .args(["--uv-method", request.settings.uv_method.as_str()])
            .args(["--dv-method", request.settings.dv_method.as_str()])
            .arg("--output")
            .arg(request.scratch_dir)
            .status()
            .map_err(|source| MatchError::OptimizerLaunch {
                program: self.program.display().to_string(),
                source,
            })?;

        let config_path = request.scratch_dir.join(MATCHED_CONFIG);
        let log_path = request.scratch_dir.join(PROGRESS_LOG);
        for path in [&config_path, &log_path] {
            if !path.is_file() {
                return Err(MatchError::MissingExpectedArtifact(path.clone()));
            }
        }
        let config = ParametricBladeConfig::read(&config_path)?;
        let residuals = ResidualLog::read(&log_path)?;

        let fit_status = match status.code() {
            Some(0) if residuals.is_converged(&request.settings.thresholds) => FitStatus::Finished,
            Some(0) => FitStatus::NotConverged,
            Some(code) if code == self.infeasible_exit_code => FitStatus::Infeasible,
            code => {
                log::warn!("optimizer exited with {status}; keeping its outputs");
                FitStatus::Failed { code }
            }
        };
        Ok(FitOutcome {
            config,
            residuals,
            status: fit_status,
        })
    }
}
