use bladematch_core::geom::P3;
use bladematch_import_geomturbo::decode_unsectioned_str;

fn grid_lines(rows: usize, cols: usize, z: f64) -> String {
    // Column-major: every column is one contiguous block of rows.
    let mut out = String::new();
    for c in 0..cols {
        for r in 0..rows {
            out.push_str(&format!("{r} {c} {z}\n"));
        }
    }
    out
}

#[test]
fn reads_trailing_runs_as_surfaces() {
    let mut text = String::from("some igg header\n0 0 0\n1 1 1\n2 2 2\n5\n");
    text.push_str("surface shape 3 2\nSISLS_pressure\n");
    text.push_str(&grid_lines(3, 2, 0.0));
    text.push_str("4 4\nsurface shape 3 2\nSISLS_suction\n");
    text.push_str(&grid_lines(3, 2, 1.0));

    let geom = decode_unsectioned_str(&text);
    assert_eq!(1, geom.curves.len());
    assert_eq!(3, geom.curves[0].len());
    assert_eq!(2, geom.surfaces.len());

    let (pressure, suction) = geom.rotor_points().unwrap();
    assert_eq!(3, pressure.len());
    assert_eq!(2, pressure[0].len());
    assert_eq!(P3::new(2.0, 1.0, 0.0), pressure[2][1]);
    assert_eq!(P3::new(1.0, 0.0, 1.0), suction[1][0]);
}

#[test]
fn unparsable_lines_are_skipped() {
    let mut text = String::from("shape line 2 1\nSISLS\n");
    text.push_str("0 0 0\nnot a number\n1 0 0\n");
    let geom = decode_unsectioned_str(&text);
    assert_eq!(1, geom.surfaces.len());
    assert_eq!(2, geom.surfaces[0].len());
    assert!(geom.rotor_points().is_none());
}
