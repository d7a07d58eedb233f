use bladematch_algo::config::ParametricBladeConfig;
use bladematch_algo::presets::InitTemplate;
use bladematch_algo::MatchError;
use bladematch_core::geom::P3;

const SAMPLE: &str = "\
% blade definition
NDIM = 2
N_BLADES = 36
CASCADE_TYPE = ANNULAR   % trailing comment

x_leading = 0.01
thickness_upper_1 = 0.2
radius_in = 0.1, 0.2
";

#[test]
fn parses_values_and_keeps_key_order() {
    let config = ParametricBladeConfig::parse(SAMPLE).unwrap();
    let keys: Vec<&str> = config.keys().collect();
    assert_eq!(
        vec!["NDIM", "N_BLADES", "CASCADE_TYPE", "x_leading", "thickness_upper_1", "radius_in"],
        keys
    );
    assert_eq!(Some(2), config.ndim());
    assert_eq!(Some("ANNULAR"), config.get_str("CASCADE_TYPE"));
    assert_eq!(vec![0.1, 0.2], config.get_f64s("radius_in").unwrap());
}

#[test]
fn written_text_parses_back_identically() {
    let config = ParametricBladeConfig::parse(SAMPLE).unwrap();
    let text = config.to_string();
    assert!(text.contains("radius_in = 0.1, 0.2\n"));
    assert_eq!(config, ParametricBladeConfig::parse(&text).unwrap());
}

#[test]
fn line_without_equals_is_malformed() {
    let err = ParametricBladeConfig::parse("NDIM = 2\nbroken line\n").unwrap_err();
    assert!(matches!(err, MatchError::MalformedConfig { line: 2, .. }), "{err}");
}

#[test]
fn non_numeric_value_is_reported_with_its_key() {
    let config = ParametricBladeConfig::parse(SAMPLE).unwrap();
    let err = config.get_f64("CASCADE_TYPE").unwrap_err();
    assert!(matches!(err, MatchError::ConfigValue { ref key, .. } if key == "CASCADE_TYPE"));
}

#[test]
fn fatten_scales_thickness_and_radii_only() {
    let mut config = ParametricBladeConfig::parse(SAMPLE).unwrap();
    config.fatten(2.0).unwrap();
    assert_eq!(0.4, config.get_f64("thickness_upper_1").unwrap());
    assert_eq!(vec![0.2, 0.4], config.get_f64s("radius_in").unwrap());
    assert_eq!(0.01, config.get_f64("x_leading").unwrap());
}

#[test]
fn rescale_converts_lengths_and_records_the_scale() {
    let mut config = ParametricBladeConfig::parse("SCALE_FACTOR = 1\nx_leading = 20\n").unwrap();
    config.rescale(0.5).unwrap();
    assert_eq!(10.0, config.get_f64("x_leading").unwrap());
    assert_eq!(0.5, config.get_f64("SCALE_FACTOR").unwrap());
    config.rescale(0.25).unwrap();
    assert_eq!(5.0, config.get_f64("x_leading").unwrap());
}

#[test]
fn position_and_stagger_from_edge_points() {
    let mut config = ParametricBladeConfig::new();
    let le = P3::new(1.0, 1.0, 3.0);
    let te = P3::new(2.0, 2.0, 3.0);
    config.set_position(&le, &te);
    config.set_stagger(&le, &te);
    assert_eq!(1.0, config.get_f64("y_leading").unwrap());
    assert_eq!(2.0, config.get_f64("x_trailing").unwrap());
    assert!((config.get_f64("stagger").unwrap() - 45.0).abs() < 1e-12);
}

#[test]
fn concatenation_shares_upper_case_keys() {
    let a = ParametricBladeConfig::parse("NDIM = 2\nN_BLADES = 36\nx_leading = 1\ntheta_in = 10\n").unwrap();
    let b = ParametricBladeConfig::parse("NDIM = 2\nN_BLADES = 40\nx_leading = 2\ntheta_in = 12\n").unwrap();
    let merged = ParametricBladeConfig::concatenate(&[a, b]).unwrap();
    assert_eq!(Some(3), merged.ndim());
    assert_eq!(Some(2), merged.section_count());
    assert_eq!(Some("36"), merged.get_str("N_BLADES"));
    assert_eq!(vec![1.0, 2.0], merged.get_f64s("x_leading").unwrap());
    assert_eq!(vec![10.0, 12.0], merged.get_f64s("theta_in").unwrap());
}

#[test]
fn concatenation_needs_every_variable_in_every_station() {
    let a = ParametricBladeConfig::parse("x_leading = 1\ntheta_in = 10\n").unwrap();
    let b = ParametricBladeConfig::parse("x_leading = 2\n").unwrap();
    assert!(ParametricBladeConfig::concatenate(&[a, b]).is_err());
    assert!(ParametricBladeConfig::concatenate(&[]).is_err());
}

#[test]
fn presets_are_single_station_configs() {
    for template in [InitTemplate::Compressor, InitTemplate::Turbine] {
        let config = template.load().unwrap();
        assert_eq!(Some(2), config.ndim(), "{template}");
        assert!(config.get_f64("thickness_upper_1").is_ok());
    }
    assert_eq!(InitTemplate::Turbine, "1".parse::<InitTemplate>().unwrap());
    assert_eq!(InitTemplate::Compressor, "Compressor".parse::<InitTemplate>().unwrap());
    assert!(matches!("my.cfg".parse::<InitTemplate>().unwrap(), InitTemplate::File(_)));
    assert!("stator".parse::<InitTemplate>().is_err());
}
