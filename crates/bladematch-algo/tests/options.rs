use bladematch_algo::options::CaseOptions;
use bladematch_algo::MatchError;
use bladematch_core::model::AxisOrder;

#[test]
fn empty_object_gives_defaults() {
    let (opts, warnings) = CaseOptions::from_json_str("{}").unwrap();
    assert_eq!(CaseOptions::default(), opts);
    assert!(warnings.is_empty());
    assert!(opts.interactive);
    assert_eq!(1e-3, opts.scale_factor);
    assert_eq!(300, opts.optim_max_iter);
    assert_eq!(1, opts.optim_max_retries_slsqp);
    assert_eq!("zxy", opts.exchange_axes.0.to_string());
}

#[test]
fn on_hpc_forces_batch_mode() {
    let (opts, _) =
        CaseOptions::from_json_str(r#"{"on_hpc": true, "interactive": true, "overwrite": false}"#).unwrap();
    assert!(!opts.interactive);
    assert!(opts.overwrite);
}

#[test]
fn batch_runs_never_prompt() {
    let interactive = CaseOptions::default();
    assert!(interactive.prompts_user(false));
    assert!(!interactive.prompts_user(true));

    let (hpc, _) = CaseOptions::from_json_str(r#"{"on_hpc": true}"#).unwrap();
    assert!(!hpc.prompts_user(false));
    let (quiet, _) = CaseOptions::from_json_str(r#"{"interactive": false}"#).unwrap();
    assert!(!quiet.prompts_user(false));
}

#[test]
fn unknown_keys_warn() {
    let (opts, warnings) =
        CaseOptions::from_json_str(r#"{"optimization_max_iter": 10, "fatten": true}"#).unwrap();
    assert!(opts.fatten);
    assert_eq!(300, opts.optim_max_iter);
    assert_eq!(1, warnings.len());
    assert_eq!("unknown_option", warnings[0].code);
}

#[test]
fn wrong_types_are_rejected() {
    for text in [
        r#"{"interactive": "yes"}"#,
        r#"{"optim_max_iter": -3}"#,
        r#"{"scale_factor": 0}"#,
        r#"{"xyz": "xxy"}"#,
    ] {
        let err = CaseOptions::from_json_str(text).unwrap_err();
        assert!(matches!(err, MatchError::InvalidOption { .. }), "{text}: {err}");
    }
    assert!(CaseOptions::from_json_str("[1, 2]").is_err());
}

#[test]
fn derived_settings_follow_options() {
    let (opts, _) = CaseOptions::from_json_str(
        r#"{"xyz": "zyx", "optim_convergence_mean_dev_rel": 0.05, "transfer_angles": true, "optim_dv_method": "COBYLA"}"#,
    )
    .unwrap();
    assert_eq!("zyx".parse::<AxisOrder>().unwrap(), opts.xyz);
    assert_eq!(0.05, opts.thresholds().mean_dev_rel);
    assert!(opts.transfer_policy().angles);
    assert!(opts.transfer_policy().position);
    assert_eq!("COBYLA", opts.optimizer_settings().dv_method);
}
