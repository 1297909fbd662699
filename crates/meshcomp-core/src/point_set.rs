//! Point sets sampled from mesh surfaces.

use std::ops::Index;

/// A point in 3D space.
pub type Point3 = [f64; 3];

#[inline]
pub fn distance_squared(a: &Point3, b: &Point3) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

#[inline]
pub fn distance(a: &Point3, b: &Point3) -> f64 {
    distance_squared(a, b).sqrt()
}

/// An ordered, immutable sequence of points.
///
/// Built once (usually by the surface sampler) and then only read. Nothing
/// here enforces non-emptiness; operations that need points check for it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PointSet {
    points: Vec<Point3>,
}

impl PointSet {
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> &Point3 {
        &self.points[index]
    }

    pub fn as_slice(&self) -> &[Point3] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point3> {
        self.points.iter()
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty set.
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let first = *self.points.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.points[1..] {
            for c in 0..3 {
                min[c] = min[c].min(p[c]);
                max[c] = max[c].max(p[c]);
            }
        }
        Some((min, max))
    }

    pub fn into_inner(self) -> Vec<Point3> {
        self.points
    }
}

impl From<Vec<Point3>> for PointSet {
    fn from(points: Vec<Point3>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Point3> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point3>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Index<usize> for PointSet {
    type Output = Point3;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a Point3;
    type IntoIter = std::slice::Iter<'a, Point3>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
