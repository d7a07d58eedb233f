use crate::driver::TransferPolicy;
use crate::error::{MatchError, Result};
use crate::optimizer::OptimizerSettings;
use crate::residual::RefineThresholds;
use bladematch_core::exchange::ExchangeAxes;
use bladematch_core::model::AxisOrder;
use bladematch_core::report::Warning;
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct CaseOptions {
    pub interactive: bool,
    pub overwrite: bool,
    pub auto_concatenate: bool,
    pub on_hpc: bool,
    /// Optimization behaves best with dimensions in metres.
    pub scale_factor: f64,
    pub xyz: AxisOrder,
    pub exchange_axes: ExchangeAxes,
    pub optim_max_iter: u32,
    pub optim_convergence_max_dev_rel: f64,
    pub optim_convergence_mean_dev_rel: f64,
    pub optim_uv_method: String,
    pub optim_dv_method: String,
    pub optim_max_retries_slsqp: u32,
    pub transfer_position: bool,
    pub transfer_angles: bool,
    pub fatten: bool,
    pub fatten_factor: f64,
}

impl Default for CaseOptions {
    fn default() -> Self {
        Self {
            interactive: true,
            overwrite: true,
            auto_concatenate: true,
            on_hpc: false,
            scale_factor: 1e-3,
            xyz: AxisOrder::IDENTITY,
            exchange_axes: ExchangeAxes::default(),
            optim_max_iter: 300,
            optim_convergence_max_dev_rel: 0.4,
            optim_convergence_mean_dev_rel: 0.1,
            optim_uv_method: "SLSQP".to_string(),
            optim_dv_method: "SLSQP".to_string(),
            optim_max_retries_slsqp: 1,
            transfer_position: true,
            transfer_angles: false,
            fatten: false,
            fatten_factor: 1.25,
        }
    }
}

impl CaseOptions {
    pub fn from_json_str(text: &str) -> Result<(Self, Vec<Warning>)> {
        let value: Value = serde_json::from_str(text).map_err(|e| MatchError::InvalidOption {
            key: "<document>".to_string(),
            reason: e.to_string(),
        })?;
        match value {
            Value::Object(map) => Self::from_map(&map),
            _ => Err(MatchError::InvalidOption {
                key: "<document>".to_string(),
                reason: "options must be a JSON object".to_string(),
            }),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<(Self, Vec<Warning>)> {
        let text = std::fs::read_to_string(path).map_err(|e| MatchError::io(path, e))?;
        Self::from_json_str(&text)
    }

    /// Unknown keys are reported and ignored. A known key with a value of the
    /// wrong type is an error.
    pub fn from_map(map: &Map<String, Value>) -> Result<(Self, Vec<Warning>)> {
        let mut opts = Self::default();
        let mut warnings = Vec::new();
        for (key, value) in map {
            let k = key.as_str();
            match k {
                "interactive" => opts.interactive = as_bool(k, value)?,
                "overwrite" => opts.overwrite = as_bool(k, value)?,
                "auto_concatenate" => opts.auto_concatenate = as_bool(k, value)?,
                "on_hpc" => opts.on_hpc = as_bool(k, value)?,
                "scale_factor" => opts.scale_factor = as_positive(k, value)?,
                "xyz" => {
                    opts.xyz = as_str(k, value)?.parse().map_err(|e| invalid(k, e))?;
                }
                "exchange_axes" => {
                    opts.exchange_axes = as_str(k, value)?.parse().map_err(|e| invalid(k, e))?;
                }
                "optim_max_iter" => opts.optim_max_iter = as_u32(k, value)?,
                "optim_convergence_max_dev_rel" => {
                    opts.optim_convergence_max_dev_rel = as_positive(k, value)?;
                }
                "optim_convergence_mean_dev_rel" => {
                    opts.optim_convergence_mean_dev_rel = as_positive(k, value)?;
                }
                "optim_uv_method" => opts.optim_uv_method = as_str(k, value)?.to_string(),
                "optim_dv_method" => opts.optim_dv_method = as_str(k, value)?.to_string(),
                "optim_max_retries_slsqp" => opts.optim_max_retries_slsqp = as_u32(k, value)?,
                "transfer_position" => opts.transfer_position = as_bool(k, value)?,
                "transfer_angles" => opts.transfer_angles = as_bool(k, value)?,
                "fatten" => opts.fatten = as_bool(k, value)?,
                "fatten_factor" => opts.fatten_factor = as_positive(k, value)?,
                _ => {
                    log::warn!("`{key}` is not an option and will be ignored");
                    warnings.push(Warning::new(
                        "unknown_option",
                        format!("`{key}` is not an option and was ignored"),
                    ));
                }
            }
        }
        if opts.on_hpc {
            opts.enforce_batch();
        }
        Ok((opts, warnings))
    }

    /// Batch runs never prompt and always write into existing folders.
    pub fn enforce_batch(&mut self) {
        self.on_hpc = true;
        self.interactive = false;
        self.overwrite = true;
    }

    /// Whether the run may stop to ask the user. `assume_yes` answers every
    /// confirmation up front.
    pub fn prompts_user(&self, assume_yes: bool) -> bool {
        self.interactive && !self.on_hpc && !assume_yes
    }

    pub fn thresholds(&self) -> RefineThresholds {
        RefineThresholds {
            mean_dev_rel: self.optim_convergence_mean_dev_rel,
            max_dev_rel: self.optim_convergence_max_dev_rel,
        }
    }

    pub fn transfer_policy(&self) -> TransferPolicy {
        TransferPolicy {
            position: self.transfer_position,
            angles: self.transfer_angles,
            fatten: self.fatten,
            fatten_factor: self.fatten_factor,
        }
    }

    pub fn optimizer_settings(&self) -> OptimizerSettings {
        OptimizerSettings {
            max_iter: self.optim_max_iter,
            uv_method: self.optim_uv_method.clone(),
            dv_method: self.optim_dv_method.clone(),
            thresholds: self.thresholds(),
        }
    }
}

fn invalid(key: &str, reason: impl ToString) -> MatchError {
    MatchError::InvalidOption {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn as_bool(key: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| invalid(key, format!("expected a boolean, found {value}")))
}

fn as_str<'a>(key: &str, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| invalid(key, format!("expected a string, found {value}")))
}

fn as_u32(key: &str, value: &Value) -> Result<u32> {
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| invalid(key, format!("expected a non-negative integer, found {value}")))
}

fn as_positive(key: &str, value: &Value) -> Result<f64> {
    match value.as_f64() {
        Some(v) if v > 0.0 && v.is_finite() => Ok(v),
        _ => Err(invalid(key, format!("expected a positive number, found {value}"))),
    }
}
