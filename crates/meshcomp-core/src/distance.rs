//! Chamfer and Hausdorff distances between point sets.
//!
//! Chamfer is reported as the mean of *squared* nearest-neighbor distances,
//! Hausdorff as the raw maximum nearest-neighbor distance. Both symmetric
//! variants query two independently built k-d trees, one over each set.

use crate::kd_tree::KdTree;
use crate::point_set::PointSet;
use crate::status::{invalid_input, StatusResult};

/// Squared nearest-neighbor distance from every point of `from` to `to`.
pub fn nearest_distances_squared(from: &PointSet, to: &PointSet) -> StatusResult<Vec<f64>> {
    if from.is_empty() {
        return Err(invalid_input("query point set is empty"));
    }
    let tree = KdTree::build(to)?;
    directed_distances_squared(&tree, from)
}

fn directed_distances_squared(tree: &KdTree, from: &PointSet) -> StatusResult<Vec<f64>> {
    Ok(tree
        .query_nearest(from)?
        .into_iter()
        .map(|n| n.distance_squared)
        .collect())
}

/// One-sided Chamfer distance from `a` to `b`.
pub fn chamfer_distance(a: &PointSet, b: &PointSet) -> StatusResult<f64> {
    let distances = nearest_distances_squared(a, b)?;
    finite("chamfer", mean(&distances))
}

/// Average of both one-sided Chamfer distances.
pub fn symmetric_chamfer(a: &PointSet, b: &PointSet) -> StatusResult<f64> {
    let a_to_b = chamfer_distance(a, b)?;
    let b_to_a = chamfer_distance(b, a)?;
    Ok((a_to_b + b_to_a) / 2.0)
}

/// Directed Hausdorff distance: the worst nearest-neighbor distance from a
/// point of `a` to the set `b`.
pub fn directed_hausdorff(a: &PointSet, b: &PointSet) -> StatusResult<f64> {
    let distances = nearest_distances_squared(a, b)?;
    finite("hausdorff", max(&distances).sqrt())
}

/// Larger of both directed Hausdorff distances.
pub fn symmetric_hausdorff(a: &PointSet, b: &PointSet) -> StatusResult<f64> {
    let a_to_b = directed_hausdorff(a, b)?;
    let b_to_a = directed_hausdorff(b, a)?;
    Ok(a_to_b.max(b_to_a))
}

/// Nearest-neighbor distances in both directions between two point sets.
///
/// Builds one tree per set and keeps the per-point squared distances, so both
/// symmetric metrics come from the same pair of trees.
#[derive(Debug, Clone)]
pub struct BidirectionalDistances {
    a_to_b: Vec<f64>,
    b_to_a: Vec<f64>,
}

impl BidirectionalDistances {
    pub fn compute(a: &PointSet, b: &PointSet) -> StatusResult<Self> {
        let tree_a = KdTree::build(a)?;
        let tree_b = KdTree::build(b)?;
        Ok(Self {
            a_to_b: directed_distances_squared(&tree_b, a)?,
            b_to_a: directed_distances_squared(&tree_a, b)?,
        })
    }

    /// Squared distances from each point of `a` to its nearest point of `b`.
    pub fn a_to_b(&self) -> &[f64] {
        &self.a_to_b
    }

    /// Squared distances from each point of `b` to its nearest point of `a`.
    pub fn b_to_a(&self) -> &[f64] {
        &self.b_to_a
    }

    pub fn symmetric_chamfer(&self) -> StatusResult<f64> {
        finite("chamfer", (mean(&self.a_to_b) + mean(&self.b_to_a)) / 2.0)
    }

    pub fn symmetric_hausdorff(&self) -> StatusResult<f64> {
        finite("hausdorff", max(&self.a_to_b).max(max(&self.b_to_a)).sqrt())
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}

fn finite(metric: &str, value: f64) -> StatusResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid_input(format!("{} distance is not finite", metric)))
    }
}
