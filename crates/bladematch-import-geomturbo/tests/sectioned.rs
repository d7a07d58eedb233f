use bladematch_core::geom::P3;
use bladematch_core::model::{AxisOrder, GeomTurboHeader, Side, SideOrder, SurfacePointCloud};
use bladematch_core::GeometryError;
use bladematch_import_geomturbo::{decode_str, encode_string, DecodeOptions, EncodeOptions};

fn scenario_cloud() -> SurfacePointCloud {
    let side: Vec<Vec<P3>> = (0..5)
        .map(|_| (0..4).map(|i| P3::new(i as f64, 0.0, 0.0)).collect())
        .collect();
    SurfacePointCloud::new(side.clone(), side).unwrap()
}

fn synthetic_cloud(sections: usize, points: usize) -> SurfacePointCloud {
    let side = |sign: f64| -> Vec<Vec<P3>> {
        (0..sections)
            .map(|s| {
                (0..points)
                    .map(|p| {
                        let x = p as f64 / (points - 1) as f64;
                        P3::new(
                            x * 37.123456789,
                            sign * (x * (1.0 - x)).sqrt() * 3.3 + 1e-7 * s as f64,
                            s as f64 * 1.0 / 3.0,
                        )
                    })
                    .collect()
            })
            .collect()
    };
    SurfacePointCloud::new(side(-1.0), side(1.0)).unwrap()
}

#[test]
fn scenario_five_sections_four_points() {
    let cloud = scenario_cloud();
    let text = encode_string(&cloud, &EncodeOptions::default()).unwrap();
    let decoded = decode_str(&text, &DecodeOptions::default()).unwrap();

    assert_eq!(5, decoded.section_count());
    assert_eq!(4, decoded.points_per_section());
    for side in Side::ALL {
        assert_eq!(5, decoded.side(side).len());
        for section in decoded.side(side) {
            assert_eq!(4, section.len());
            for (i, p) in section.iter().enumerate() {
                assert_eq!(P3::new(i as f64, 0.0, 0.0), *p);
            }
        }
    }

    let again = decode_str(
        &encode_string(&decoded, &EncodeOptions::default()).unwrap(),
        &DecodeOptions::default(),
    )
    .unwrap();
    assert_eq!(decoded, again);
}

#[test]
fn round_trip_is_exact_for_awkward_floats() {
    let cloud = synthetic_cloud(7, 13);
    let text = encode_string(&cloud, &EncodeOptions::default()).unwrap();
    let decoded = decode_str(&text, &DecodeOptions::default()).unwrap();
    for side in Side::ALL {
        for (a, b) in cloud.side(side).iter().flatten().zip(decoded.side(side).iter().flatten()) {
            assert!((a - b).norm() <= 1e-6);
            assert_eq!(a, b);
        }
    }
}

#[test]
fn header_offsets_hold_the_counts() {
    let text = encode_string(&synthetic_cloud(3, 6), &EncodeOptions::default()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!("suction", lines[5]);
    assert_eq!("3", lines[7]);
    assert_eq!("6", lines[10]);
    assert!(text.ends_with('\n'));
}

#[test]
fn side_order_does_not_change_decoded_sides() {
    let cloud = synthetic_cloud(3, 5);
    let suction_first = encode_string(&cloud, &EncodeOptions::default()).unwrap();
    let pressure_first = encode_string(
        &cloud,
        &EncodeOptions {
            side_order: SideOrder::PressureFirst,
        },
    )
    .unwrap();
    assert_ne!(suction_first, pressure_first);
    let a = decode_str(&suction_first, &DecodeOptions::default()).unwrap();
    let b = decode_str(&pressure_first, &DecodeOptions::default()).unwrap();
    assert_eq!(a, b);
    assert_eq!(cloud.side(Side::Pressure), a.side(Side::Pressure));
}

#[test]
fn axis_order_survives_round_trip() {
    let order: AxisOrder = "zyx".parse().unwrap();
    let file_cloud = synthetic_cloud(2, 4);
    let text = encode_string(&file_cloud, &EncodeOptions::default()).unwrap();
    let opts = DecodeOptions {
        axis_order: order,
        scale_factor: 1e-3,
    };
    let permuted = decode_str(&text, &opts).unwrap();
    assert_eq!(1e-3, permuted.scale_factor());
    let p = file_cloud.side(Side::Suction)[1][2];
    assert_eq!(P3::new(p.z, p.y, p.x), permuted.side(Side::Suction)[1][2]);

    // The writer restores file order.
    let rewritten = encode_string(&permuted, &EncodeOptions::default()).unwrap();
    assert_eq!(text, rewritten);
    assert_eq!(permuted, decode_str(&rewritten, &opts).unwrap());
}

#[test]
fn header_values_are_read_back() {
    let header = GeomTurboHeader {
        number_of_blades: 36,
        ..GeomTurboHeader::default()
    };
    let cloud = synthetic_cloud(2, 3).with_header(header.clone());
    let text = encode_string(&cloud, &EncodeOptions::default()).unwrap();
    let decoded = decode_str(&text, &DecodeOptions::default()).unwrap();
    assert_eq!(&header, decoded.header());
}

#[test]
fn missing_coordinates_are_malformed() {
    let text = encode_string(&scenario_cloud(), &EncodeOptions::default()).unwrap();
    let mut lines: Vec<&str> = text.lines().collect();
    lines.pop();
    let truncated = lines.join("\n");
    let err = decode_str(&truncated, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, GeometryError::MalformedGeometryFile { .. }), "{err}");
}

#[test]
fn non_numeric_coordinate_is_malformed() {
    let text = encode_string(&scenario_cloud(), &EncodeOptions::default())
        .unwrap()
        .replacen("1 0 0", "1 zero 0", 1);
    let err = decode_str(&text, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, GeometryError::MalformedGeometryFile { .. }));
}

#[test]
fn zero_point_sections_are_malformed() {
    let text = "GEOMETRY TURBO VERSION 5\n\
pressure\nSECTIONAL\n2\n# section 1\nXYZ\n0\n# section 2\nXYZ\n0\n\
suction\nSECTIONAL\n2\n# section 1\nXYZ\n0\n# section 2\nXYZ\n0\n";
    let err = decode_str(text, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, GeometryError::MalformedGeometryFile { .. }), "{err}");
}

#[test]
fn tolerates_tabs_and_keyword_wrappers() {
    let text = "GEOMETRY TURBO VERSION 5\n\
number_of_blades 12\n\
NI_BEGIN nibladegeometry\n\
pressure\nSECTIONAL\n1\n# section 1\nXYZ\n2\n0\t0  0\n1\t1\t1\n\
suction\nSECTIONAL\n1\n# section 1\nXYZ\n2\n0 0 0\n1   -1 1\n\
NI_END nibladegeometry\n";
    let cloud = decode_str(text, &DecodeOptions::default()).unwrap();
    assert_eq!(12, cloud.header().number_of_blades);
    assert_eq!(P3::new(1.0, 1.0, 1.0), cloud.side(Side::Pressure)[0][1]);
    assert_eq!(P3::new(1.0, -1.0, 1.0), cloud.side(Side::Suction)[0][1]);
}
