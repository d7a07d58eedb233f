use crate::assembler::{flag_for_refinement, BladeCase};
use crate::optimizer::FitStatus;
use crate::residual::{MatchResidual, RefineThresholds};
use bladematch_core::report::Warning;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSummary {
    pub station: usize,
    pub section_index: usize,
    pub status: FitStatus,
    pub last_residual: Option<MatchResidual>,
    pub modded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: String,
    pub case: String,
    pub stations: Vec<StationSummary>,
    /// Stations over the case's convergence thresholds.
    pub refinement_flags: Vec<usize>,
    pub concatenated_config: Option<String>,
    pub warnings: Vec<Warning>,
}

impl RunReport {
    pub fn new(case: impl Into<String>) -> Self {
        Self {
            generated_at: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            case: case.into(),
            stations: Vec::new(),
            refinement_flags: Vec::new(),
            concatenated_config: None,
            warnings: Vec::new(),
        }
    }

    pub fn of_case(case: &BladeCase, thresholds: &RefineThresholds) -> Self {
        let mut report = Self::new(case.workspace.name());
        report.stations = case
            .stations
            .iter()
            .enumerate()
            .map(|(station, s)| StationSummary {
                station,
                section_index: s.section_index,
                status: s.status,
                last_residual: s.residuals.last().copied(),
                modded: s.modded,
            })
            .collect();
        report.refinement_flags = flag_for_refinement(&case.stations, thresholds);
        let concatenated = case.workspace.concatenated_config();
        if concatenated.is_file() {
            report.concatenated_config = Some(concatenated.display().to_string());
        }
        report.warnings = case.warnings.clone();
        report
    }
}
