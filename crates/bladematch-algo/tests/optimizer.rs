mod common;

use bladematch_algo::config::ParametricBladeConfig;
use bladematch_algo::optimizer::{
    FitRequest, FitStatus, MatchMode, OptimizerClient, ProcessOptimizer, MATCHED_CONFIG,
};
use bladematch_algo::options::CaseOptions;
use bladematch_algo::workspace::WorkspaceHandle;
use bladematch_algo::MatchError;
use common::temp_dir;

/// Shell stand-in for the optimizer: the last argument is the scratch
/// directory.
const WRITE_OUTPUTS: &str = "for a; do out=$a; done; mkdir -p \"$out\"; \
printf 'NDIM = 2\\nstagger = 12.5\\n' > \"$out/matched_parametrization.cfg\"; \
printf 'iteration mean max mean_rel max_rel\\n0 1 2 0.5 0.9\\n1 0.1 0.2 0.05 0.2\\n' > \"$out/optimization_progress.txt\"";

fn run(name: &str, optimizer: &mut ProcessOptimizer) -> Result<bladematch_algo::optimizer::FitOutcome, MatchError> {
    let ws = WorkspaceHandle::acquire(temp_dir(name), true).unwrap();
    let config = ParametricBladeConfig::parse("NDIM = 2\n").unwrap();
    config.write(&ws.init_config()).unwrap();
    std::fs::write(ws.target_points(), "0\t0\t0\t0\n").unwrap();
    let settings = CaseOptions::default().optimizer_settings();
    let config_path = ws.init_config();
    let target_path = ws.target_points();
    let scratch = ws.scratch_dir();
    optimizer.fit(&FitRequest {
        config: &config,
        config_path: &config_path,
        target_path: &target_path,
        mode: MatchMode::DesignVariables,
        settings: &settings,
        scratch_dir: &scratch,
    })
}

fn shell(script: &str) -> ProcessOptimizer {
    ProcessOptimizer::new("sh").with_args(vec!["-c".to_string(), script.to_string()])
}

#[cfg(unix)]
#[test]
fn reads_outputs_from_the_scratch_directory() {
    let outcome = run("process-ok", &mut shell(WRITE_OUTPUTS)).unwrap();
    assert_eq!(FitStatus::Finished, outcome.status);
    assert_eq!(12.5, outcome.config.get_f64("stagger").unwrap());
    assert_eq!(2, outcome.residuals.len());
    assert_eq!(0.05, outcome.residuals.last().unwrap().mean_dev_rel);
}

#[cfg(unix)]
#[test]
fn exit_codes_map_to_fit_status() {
    let infeasible = format!("{WRITE_OUTPUTS}; exit 4");
    let outcome = run("process-infeasible", &mut shell(&infeasible)).unwrap();
    assert_eq!(FitStatus::Infeasible, outcome.status);

    let crashed = format!("{WRITE_OUTPUTS}; exit 2");
    let outcome = run("process-failed", &mut shell(&crashed)).unwrap();
    assert_eq!(FitStatus::Failed { code: Some(2) }, outcome.status);
}

#[cfg(unix)]
#[test]
fn missing_outputs_are_hard_failures() {
    let err = run("process-missing", &mut shell("exit 0")).unwrap_err();
    match err {
        MatchError::MissingExpectedArtifact(path) => {
            assert!(path.ends_with(MATCHED_CONFIG));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_program_fails_to_launch() {
    let mut optimizer = ProcessOptimizer::new("/nonexistent/bladematch-optimizer");
    let err = run("process-launch", &mut optimizer).unwrap_err();
    assert!(matches!(err, MatchError::OptimizerLaunch { .. }), "{err}");
}
