#![allow(dead_code)]

use bladematch_algo::error::{MatchError, Result};
use bladematch_algo::optimizer::{
    FitOutcome, FitRequest, FitStatus, MatchMode, OptimizerClient, MATCHED_CONFIG,
};
use bladematch_algo::residual::{MatchResidual, ResidualLog};
use bladematch_core::geom::P3;
use bladematch_core::model::SurfacePointCloud;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

/// Fresh, empty directory under the system temp dir.
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("bladematch-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// Ten sections stacked along z, nine points per side, 40 mm chord along x.
pub fn synthetic_blade() -> SurfacePointCloud {
    let side = |sign: f64| -> Vec<Vec<P3>> {
        (0..10)
            .map(|s| {
                (0..9)
                    .map(|p| {
                        let x = 40.0 * p as f64 / 8.0;
                        let h = 2.0 * (std::f64::consts::PI * x / 40.0).sin();
                        P3::new(x, sign * h, s as f64)
                    })
                    .collect()
            })
            .collect()
    };
    SurfacePointCloud::new(side(-1.0), side(1.0))
        .unwrap()
        .with_scale_factor(1e-3)
}

pub fn zero_residual() -> MatchResidual {
    MatchResidual::new(0, 0.0, 0.0, 0.0, 0.0)
}

/// Returns the request's config unchanged. Design-variable calls take their
/// status and residual from `script`, in order, then fall back to a finished
/// zero-residual fit. The design-variable call numbered `lost_output_at`
/// (from 0) reports its matched config as missing.
#[derive(Default)]
pub struct StubOptimizer {
    pub script: Vec<(FitStatus, MatchResidual)>,
    pub lost_output_at: Option<usize>,
    pub modes: Rc<RefCell<Vec<MatchMode>>>,
    pub dv_calls: usize,
}

impl StubOptimizer {
    pub fn scripted(script: Vec<(FitStatus, MatchResidual)>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }
}

impl OptimizerClient for StubOptimizer {
    fn fit(&mut self, request: &FitRequest<'_>) -> Result<FitOutcome> {
        assert!(request.target_path.is_file(), "target points were not exported");
        assert!(request.config_path.is_file(), "config was not written");
        self.modes.borrow_mut().push(request.mode);
        let (status, residual) = match request.mode {
            MatchMode::Manual => (FitStatus::Finished, zero_residual()),
            MatchMode::DesignVariables => {
                if self.lost_output_at == Some(self.dv_calls) {
                    self.dv_calls += 1;
                    return Err(MatchError::MissingExpectedArtifact(
                        request.scratch_dir.join(MATCHED_CONFIG),
                    ));
                }
                let entry = self
                    .script
                    .get(self.dv_calls)
                    .copied()
                    .unwrap_or((FitStatus::Finished, zero_residual()));
                self.dv_calls += 1;
                entry
            }
        };
        Ok(FitOutcome {
            config: request.config.clone(),
            residuals: ResidualLog::new(vec![residual]),
            status,
        })
    }
}
