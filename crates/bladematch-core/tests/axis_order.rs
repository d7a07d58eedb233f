use bladematch_core::geom::P3;
use bladematch_core::model::{AxisOrder, SurfacePointCloud};

fn cloud() -> SurfacePointCloud {
    let side = |offset: f64| -> Vec<Vec<P3>> {
        (0..3)
            .map(|s| {
                (0..4)
                    .map(|p| P3::new(p as f64 + offset, s as f64 * 10.0, 0.5 * p as f64 - offset))
                    .collect()
            })
            .collect()
    };
    SurfacePointCloud::new(side(0.0), side(0.25)).unwrap()
}

#[test]
fn xyz_is_a_no_op() {
    let order: AxisOrder = "xyz".parse().unwrap();
    assert!(order.is_identity());
    let original = cloud();
    let permuted = original.clone().with_axis_order(order);
    assert_eq!(original, permuted);
}

#[test]
fn zyx_twice_restores_points() {
    let order: AxisOrder = "zyx".parse().unwrap();
    let original = cloud();
    let twice = original.clone().with_axis_order(order).with_axis_order(order);
    for (a, b) in original.sections().zip(twice.sections()) {
        assert_eq!(a, b);
    }
    let p = P3::new(1.0, 2.0, 3.0);
    assert_eq!(P3::new(3.0, 2.0, 1.0), order.apply(&p));
}

#[test]
fn inverse_undoes_a_cyclic_order() {
    let order: AxisOrder = "yzx".parse().unwrap();
    let p = P3::new(1.0, 2.0, 3.0);
    assert_eq!(P3::new(2.0, 3.0, 1.0), order.apply(&p));
    assert_eq!(p, order.inverse().apply(&order.apply(&p)));
    assert_eq!("yzx", order.to_string());
}

#[test]
fn rejects_non_permutations() {
    assert!("xxy".parse::<AxisOrder>().is_err());
    assert!("xy".parse::<AxisOrder>().is_err());
    assert!("abc".parse::<AxisOrder>().is_err());
}
