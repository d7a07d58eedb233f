use crate::error::{MatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::Path;

const HEADER: &str = "iteration\tmean_dev_abs\tmax_dev_abs\tmean_dev_rel\tmax_dev_rel";

/// Fit quality after one optimizer iteration. Relative deviations are
/// percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResidual {
    pub iteration: u32,
    pub mean_dev_abs: f64,
    pub max_dev_abs: f64,
    pub mean_dev_rel: f64,
    pub max_dev_rel: f64,
}

impl MatchResidual {
    pub fn new(
        iteration: u32,
        mean_dev_abs: f64,
        max_dev_abs: f64,
        mean_dev_rel: f64,
        max_dev_rel: f64,
    ) -> Self {
        Self {
            iteration,
            mean_dev_abs,
            max_dev_abs,
            mean_dev_rel,
            max_dev_rel,
        }
    }

    pub fn exceeds(&self, thresholds: &RefineThresholds) -> bool {
        self.mean_dev_rel > thresholds.mean_dev_rel || self.max_dev_rel > thresholds.max_dev_rel
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefineThresholds {
    pub mean_dev_rel: f64,
    pub max_dev_rel: f64,
}

impl Default for RefineThresholds {
    fn default() -> Self {
        Self {
            mean_dev_rel: 0.1,
            max_dev_rel: 0.4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResidualLog {
    entries: Vec<MatchResidual>,
}

impl ResidualLog {
    pub fn new(entries: Vec<MatchResidual>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, residual: MatchResidual) {
        self.entries.push(residual);
    }

    pub fn entries(&self) -> &[MatchResidual] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&MatchResidual> {
        self.entries.last()
    }

    /// An empty log never counts as converged.
    pub fn is_converged(&self, thresholds: &RefineThresholds) -> bool {
        self.last().is_some_and(|r| !r.exceeds(thresholds))
    }

    /// Rows that are not five numbers (headers, notes) are skipped.
    pub fn parse(text: &str) -> Self {
        let mut log = Self::default();
        for line in text.lines() {
            let values: std::result::Result<Vec<f64>, _> =
                line.split_whitespace().map(str::parse::<f64>).collect();
            match values.as_deref() {
                Ok(&[it, mean_abs, max_abs, mean_rel, max_rel]) if it >= 0.0 => {
                    log.push(MatchResidual::new(it as u32, mean_abs, max_abs, mean_rel, max_rel));
                }
                _ => {}
            }
        }
        log
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| MatchError::io(path, e))?;
        Ok(Self::parse(&text))
    }

    pub fn to_text(&self) -> Result<String> {
        let mut out = String::new();
        writeln!(out, "{HEADER}")?;
        for r in &self.entries {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                r.iteration, r.mean_dev_abs, r.max_dev_abs, r.mean_dev_rel, r.max_dev_rel
            )?;
        }
        Ok(out)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let text = self.to_text()?;
        std::fs::write(path, text).map_err(|e| MatchError::io(path, e))
    }
}
