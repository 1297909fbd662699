//! Balanced k-d tree over 3D points for exact nearest-neighbor queries.
//!
//! The tree is built once from a [`PointSet`] and is immutable afterwards.
//! Interior nodes split at the median of the widest axis of their cell, leaves
//! hold up to [`LEAF_SIZE`] points. Queries are exact: when several indexed
//! points are at the same distance from a query, the one with the lowest
//! position in the original point set wins, so results do not depend on how
//! the tree happened to be partitioned.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::point_set::{distance_squared, Point3, PointSet};
use crate::status::{invalid_input, StatusResult};

pub const LEAF_SIZE: usize = 8;

/// Result of a nearest-neighbor query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the neighbor in the indexed point set.
    pub index: usize,
    pub distance_squared: f64,
}

impl Neighbor {
    pub fn distance(&self) -> f64 {
        self.distance_squared.sqrt()
    }

    fn is_better_than(&self, other: &Neighbor) -> bool {
        self.distance_squared < other.distance_squared
            || (self.distance_squared == other.distance_squared && self.index < other.index)
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    point: Point3,
    index: usize,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf {
        begin: usize,
        end: usize,
    },
    Split {
        axis: usize,
        value: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
pub struct KdTree {
    entries: Vec<Entry>,
    nodes: Vec<Node>,
    root: usize,
}

impl KdTree {
    /// Builds a tree over `points`.
    ///
    /// Fails with [`crate::Error::InvalidInput`] if `points` is empty or holds
    /// a non-finite coordinate.
    pub fn build(points: &PointSet) -> StatusResult<Self> {
        if points.is_empty() {
            return Err(invalid_input("cannot build a spatial index over an empty point set"));
        }
        if let Some(i) = points.iter().position(|p| !p.iter().all(|c| c.is_finite())) {
            return Err(invalid_input(format!("point {} has a non-finite coordinate", i)));
        }

        let mut entries: Vec<Entry> = points
            .iter()
            .enumerate()
            .map(|(index, point)| Entry { point: *point, index })
            .collect();
        let mut nodes = Vec::with_capacity(2 * entries.len() / LEAF_SIZE + 1);
        let root = build_node(&mut entries, 0, &mut nodes);

        Ok(Self { entries, nodes, root })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: empty trees cannot be built.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of levels from the root to the deepest leaf, counting both.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            match self.nodes[node] {
                Node::Leaf { .. } => max_depth = max_depth.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }
        max_depth
    }

    /// Nearest indexed point to `query`.
    ///
    /// `query` must be finite; [`KdTree::query_nearest`] checks this for
    /// whole batches.
    pub fn nearest(&self, query: &Point3) -> Neighbor {
        let mut best = Neighbor {
            index: usize::MAX,
            distance_squared: f64::INFINITY,
        };
        // (node, lower bound of the squared distance from query to its cell)
        let mut stack: Vec<(usize, f64)> = Vec::with_capacity(64);
        stack.push((self.root, 0.0));

        while let Some((node, min_dist_sq)) = stack.pop() {
            // Equal bounds are still visited so that a lower index at the
            // same distance can replace the current best.
            if min_dist_sq > best.distance_squared {
                continue;
            }
            match self.nodes[node] {
                Node::Leaf { begin, end } => {
                    for entry in &self.entries[begin..end] {
                        let candidate = Neighbor {
                            index: entry.index,
                            distance_squared: distance_squared(query, &entry.point),
                        };
                        if candidate.is_better_than(&best) {
                            best = candidate;
                        }
                    }
                }
                Node::Split { axis, value, left, right } => {
                    let diff = query[axis] - value;
                    let (near, far) = if diff < 0.0 { (left, right) } else { (right, left) };
                    let far_dist_sq = min_dist_sq.max(diff * diff);
                    stack.push((far, far_dist_sq));
                    stack.push((near, min_dist_sq));
                }
            }
        }

        best
    }

    /// Nearest neighbor of every query point, in query order.
    ///
    /// Queries are answered in parallel; the result is identical to calling
    /// [`KdTree::nearest`] sequentially.
    pub fn query_nearest(&self, queries: &PointSet) -> StatusResult<Vec<Neighbor>> {
        if let Some(i) = queries.iter().position(|p| !p.iter().all(|c| c.is_finite())) {
            return Err(invalid_input(format!("query point {} has a non-finite coordinate", i)));
        }
        Ok(queries.as_slice().par_iter().map(|q| self.nearest(q)).collect())
    }
}

/// Builds the subtree over `entries` and returns its node id. `offset` is the
/// position of `entries[0]` in the tree's entry buffer.
fn build_node(entries: &mut [Entry], offset: usize, nodes: &mut Vec<Node>) -> usize {
    let count = entries.len();
    let leaf = Node::Leaf {
        begin: offset,
        end: offset + count,
    };
    if count <= LEAF_SIZE {
        nodes.push(leaf);
        return nodes.len() - 1;
    }

    let Some(axis) = widest_axis(entries) else {
        // All points coincide; nothing to split on.
        nodes.push(leaf);
        return nodes.len() - 1;
    };

    let mid = count / 2;
    entries.select_nth_unstable_by(mid, |a, b| compare_on_axis(a, b, axis));
    let value = entries[mid].point[axis];

    let id = nodes.len();
    nodes.push(leaf);
    let (lower, upper) = entries.split_at_mut(mid);
    let left = build_node(lower, offset, nodes);
    let right = build_node(upper, offset + mid, nodes);
    nodes[id] = Node::Split { axis, value, left, right };
    id
}

fn compare_on_axis(a: &Entry, b: &Entry, axis: usize) -> Ordering {
    a.point[axis]
        .total_cmp(&b.point[axis])
        .then(a.index.cmp(&b.index))
}

/// Axis with the largest extent, or `None` if every point is identical.
fn widest_axis(entries: &[Entry]) -> Option<usize> {
    let mut min = entries[0].point;
    let mut max = entries[0].point;
    for entry in &entries[1..] {
        for c in 0..3 {
            min[c] = min[c].min(entry.point[c]);
            max[c] = max[c].max(entry.point[c]);
        }
    }
    let mut best_axis = 0;
    let mut best_extent = max[0] - min[0];
    for c in 1..3 {
        let extent = max[c] - min[c];
        if extent > best_extent {
            best_axis = c;
            best_extent = extent;
        }
    }
    if best_extent > 0.0 {
        Some(best_axis)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> PointSet {
        let mut points = Vec::new();
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    points.push([x as f64, y as f64, z as f64]);
                }
            }
        }
        PointSet::new(points)
    }

    #[test]
    fn test_empty_point_set_rejected() {
        let err = KdTree::build(&PointSet::default()).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidInput(_)));
    }

    #[test]
    fn test_non_finite_rejected() {
        let points = PointSet::new(vec![[0.0, 0.0, 0.0], [f64::NAN, 1.0, 1.0]]);
        assert!(KdTree::build(&points).is_err());

        let tree = KdTree::build(&grid(2)).unwrap();
        let queries = PointSet::new(vec![[f64::INFINITY, 0.0, 0.0]]);
        assert!(tree.query_nearest(&queries).is_err());
    }

    #[test]
    fn test_self_query_is_exact() {
        let points = grid(6);
        let tree = KdTree::build(&points).unwrap();
        let result = tree.query_nearest(&points).unwrap();
        for (i, neighbor) in result.iter().enumerate() {
            assert_eq!(neighbor.distance_squared, 0.0);
            assert_eq!(neighbor.index, i);
        }
    }

    #[test]
    fn test_tie_breaks_to_lowest_index() {
        // Query at the center of a unit cube: all eight corners are equidistant.
        let points = grid(2);
        let tree = KdTree::build(&points).unwrap();
        let neighbor = tree.nearest(&[0.5, 0.5, 0.5]);
        assert_eq!(neighbor.index, 0);
        assert!((neighbor.distance() - 0.75f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_points() {
        let points = PointSet::new(vec![[1.0, 1.0, 1.0]; 40]);
        let tree = KdTree::build(&points).unwrap();
        assert_eq!(tree.depth(), 1);
        let neighbor = tree.nearest(&[0.0, 1.0, 1.0]);
        assert_eq!(neighbor.index, 0);
        assert_eq!(neighbor.distance_squared, 1.0);
    }

    #[test]
    fn test_tree_is_balanced() {
        let points = grid(10);
        let tree = KdTree::build(&points).unwrap();
        assert_eq!(tree.len(), 1000);
        // 1000 points halve down to leaves of at most 8 in 7 splits.
        assert!(tree.depth() <= 8, "depth {}", tree.depth());
    }
}
