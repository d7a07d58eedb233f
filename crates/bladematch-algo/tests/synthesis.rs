use bladematch_algo::synthesis::{
    fillet_cloud, synthesize_from_exchange, synthesize_surface, SynthesisOptions,
};
use bladematch_core::exchange::{write_section, ExchangeAxes};
use bladematch_core::fillet::FilletParams;
use bladematch_core::geom::P3;
use bladematch_core::model::{GeomTurboHeader, Side, SurfacePointCloud};

/// Closed loop: suction side leading to trailing edge, then pressure side
/// back to the leading edge.
fn loop_contour(n: usize, z: f64) -> Vec<P3> {
    let point = |k: usize, sign: f64| {
        let x = k as f64 / (n - 1) as f64;
        P3::new(x, sign * 0.1 * (std::f64::consts::PI * x).sin(), z)
    };
    let mut contour: Vec<P3> = (0..n).map(|k| point(k, 1.0)).collect();
    contour.extend((0..n).rev().map(|k| point(k, -1.0)));
    contour
}

fn fillet(new_points: usize, min_angle_deg: f64) -> FilletParams {
    FilletParams {
        new_points,
        min_width: 0.05,
        min_angle: min_angle_deg.to_radians(),
    }
}

#[test]
fn contours_become_closed_sections() {
    let contours: Vec<Vec<P3>> = (0..3).map(|s| loop_contour(41, s as f64)).collect();
    let cloud = synthesize_surface(&contours, &SynthesisOptions::default()).unwrap();
    assert_eq!(3, cloud.section_count());
    assert_eq!(41, cloud.points_per_section());
    for section in cloud.sections() {
        assert!(section.is_closed(1e-12));
        assert!(section.suction.iter().all(|p| p.y >= -1e-12));
        assert!(section.pressure.iter().all(|p| p.y <= 1e-12));
    }
    let te = cloud.trailing_edge(Side::Pressure)[2];
    assert!((te - P3::new(1.0, 0.0, 2.0)).norm() < 1e-12);
}

#[test]
fn exchange_contours_are_filleted_at_both_edges() {
    let axes = ExchangeAxes::default();
    let mut text = String::new();
    for s in 0..3 {
        write_section(&mut text, &loop_contour(41, s as f64), 1.0, &axes).unwrap();
    }
    let opts = SynthesisOptions {
        scale: 1.0,
        le_fillet: Some(fillet(10, 15.0)),
        te_fillet: Some(fillet(10, 6.0)),
        header: GeomTurboHeader {
            number_of_blades: 24,
            ..GeomTurboHeader::default()
        },
        ..SynthesisOptions::default()
    };
    let cloud = synthesize_from_exchange(&text, &opts).unwrap();
    assert_eq!(3, cloud.section_count());
    assert_eq!(41 + 9 + 10, cloud.points_per_section());
    assert_eq!(24, cloud.header().number_of_blades);
    for section in cloud.sections() {
        assert!(section.is_closed(1e-9));
    }
}

#[test]
fn output_axes_permute_points() {
    let opts = SynthesisOptions {
        output_axes: "zyx".parse().unwrap(),
        ..SynthesisOptions::default()
    };
    let cloud = synthesize_surface(&[loop_contour(5, 3.0)], &opts).unwrap();
    assert_eq!(P3::new(3.0, 0.0, 0.0), cloud.leading_edge(Side::Suction)[0]);
}

#[test]
fn fillet_cloud_keeps_header_and_shape() {
    let contours: Vec<Vec<P3>> = (0..2).map(|s| loop_contour(41, s as f64)).collect();
    let plain = synthesize_surface(&contours, &SynthesisOptions::default()).unwrap();
    let header = GeomTurboHeader {
        number_of_blades: 7,
        ..GeomTurboHeader::default()
    };
    let plain: SurfacePointCloud = plain.with_header(header.clone());
    let rounded = fillet_cloud(&plain, Some(&fillet(10, 15.0)), None).unwrap();
    assert_eq!(2, rounded.section_count());
    assert_eq!(41 + 9, rounded.points_per_section());
    assert_eq!(&header, rounded.header());
}
