//! Property tests for the spatial index and distance metrics.
//!
//! The k-d tree is checked against a brute-force scan. Coordinates are drawn
//! from a small integer grid so that equidistant neighbors are common and the
//! lowest-index tie-break gets exercised.

use meshcomp_core::{
    chamfer_distance, directed_hausdorff, symmetric_chamfer, symmetric_hausdorff, KdTree,
    PointSet,
};
use proptest::prelude::*;

fn arb_grid_point() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3((-4i32..=4).prop_map(|v| v as f64))
}

fn arb_point() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(-50.0..50.0f64)
}

fn arb_point_set(max: usize) -> impl Strategy<Value = PointSet> {
    prop::collection::vec(prop_oneof![arb_grid_point(), arb_point()], 1..max)
        .prop_map(PointSet::new)
}

fn brute_force_nearest(points: &PointSet, query: &[f64; 3]) -> (usize, f64) {
    let mut best = (usize::MAX, f64::INFINITY);
    for (i, p) in points.iter().enumerate() {
        let (dx, dy, dz) = (query[0] - p[0], query[1] - p[1], query[2] - p[2]);
        let d = dx * dx + dy * dy + dz * dz;
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

proptest! {
    #[test]
    fn kd_tree_matches_brute_force(
        points in prop::collection::vec(arb_grid_point(), 1..300).prop_map(PointSet::new),
        queries in prop::collection::vec(prop_oneof![arb_grid_point(), arb_point()], 1..50),
    ) {
        let tree = KdTree::build(&points).unwrap();
        for query in &queries {
            let neighbor = tree.nearest(query);
            let (index, distance_squared) = brute_force_nearest(&points, query);
            prop_assert_eq!(neighbor.index, index);
            prop_assert_eq!(neighbor.distance_squared, distance_squared);
        }
    }

    #[test]
    fn self_query_has_zero_distance(points in arb_point_set(400)) {
        let tree = KdTree::build(&points).unwrap();
        for neighbor in tree.query_nearest(&points).unwrap() {
            prop_assert_eq!(neighbor.distance_squared, 0.0);
        }
    }

    #[test]
    fn symmetric_metrics_commute(a in arb_point_set(200), b in arb_point_set(200)) {
        prop_assert_eq!(symmetric_chamfer(&a, &b).unwrap(), symmetric_chamfer(&b, &a).unwrap());
        prop_assert_eq!(symmetric_hausdorff(&a, &b).unwrap(), symmetric_hausdorff(&b, &a).unwrap());
    }

    #[test]
    fn identical_sets_have_zero_distance(
        points in arb_point_set(200),
        rotation in 0usize..200,
    ) {
        let mut shuffled = points.as_slice().to_vec();
        let len = shuffled.len();
        shuffled.rotate_left(rotation % len);
        shuffled.reverse();
        let shuffled = PointSet::new(shuffled);

        prop_assert_eq!(symmetric_chamfer(&points, &shuffled).unwrap(), 0.0);
        prop_assert_eq!(symmetric_hausdorff(&points, &shuffled).unwrap(), 0.0);
    }

    #[test]
    fn hausdorff_bounds_every_point(a in arb_point_set(150), b in arb_point_set(150)) {
        let hausdorff = symmetric_hausdorff(&a, &b).unwrap();
        for p in &a {
            let (_, d) = brute_force_nearest(&b, p);
            prop_assert!(d.sqrt() <= hausdorff);
        }
        for p in &b {
            let (_, d) = brute_force_nearest(&a, p);
            prop_assert!(d.sqrt() <= hausdorff);
        }
        prop_assert!(directed_hausdorff(&a, &b).unwrap() <= hausdorff);
    }

    #[test]
    fn chamfer_matches_brute_force(a in arb_point_set(150), b in arb_point_set(150)) {
        let expected: f64 = a.iter().map(|p| brute_force_nearest(&b, p).1).sum::<f64>()
            / a.num_points() as f64;
        let chamfer = chamfer_distance(&a, &b).unwrap();
        prop_assert!((chamfer - expected).abs() <= 1e-9 * expected.max(1.0));
    }
}
