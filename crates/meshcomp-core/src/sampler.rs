//! Area-weighted uniform sampling of mesh surfaces.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::point_set::{Point3, PointSet};
use crate::status::{invalid_input, Error, StatusResult};
use crate::surface_mesh::SurfaceMesh;

/// Creates the generator used for sampling: seeded when `seed` is set,
/// otherwise seeded from OS entropy.
pub fn sampling_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Samples points uniformly over the surface of one mesh.
///
/// Construction computes the area of every face and a cumulative area table;
/// each [`SurfaceSampler::sample`] call then picks faces with probability
/// proportional to their area and a uniform point inside each picked face.
/// Zero-area faces are dropped up front and can never be picked.
#[derive(Debug, Clone)]
pub struct SurfaceSampler {
    triangles: Vec<[Point3; 3]>,
    cumulative_area: Vec<f64>,
}

impl SurfaceSampler {
    pub fn new(mesh: &SurfaceMesh) -> StatusResult<Self> {
        if mesh.num_faces() == 0 {
            return Err(Error::EmptySurface("mesh has no faces".to_string()));
        }

        let mut triangles = Vec::with_capacity(mesh.num_faces());
        let mut cumulative_area = Vec::with_capacity(mesh.num_faces());
        let mut total = 0.0;
        for (i, triangle) in mesh.triangles().enumerate() {
            let triangle = triangle?;
            let area = triangle.area();
            if !area.is_finite() {
                return Err(invalid_input(format!("face {} has a non-finite area", i)));
            }
            if area > 0.0 {
                total += area;
                triangles.push(triangle.corners());
                cumulative_area.push(total);
            }
        }

        if triangles.is_empty() {
            return Err(Error::EmptySurface(format!(
                "all {} faces are degenerate",
                mesh.num_faces()
            )));
        }

        Ok(Self {
            triangles,
            cumulative_area,
        })
    }

    pub fn total_area(&self) -> f64 {
        self.cumulative_area.last().copied().unwrap_or(0.0)
    }

    /// Number of faces with positive area.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Draws exactly `n` points from the surface.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> StatusResult<PointSet> {
        if n == 0 {
            return Err(invalid_input("number of samples must be positive"));
        }
        let total = self.total_area();
        let last = self.triangles.len() - 1;

        let points = (0..n)
            .map(|_| {
                let target = rng.gen::<f64>() * total;
                let face = self
                    .cumulative_area
                    .partition_point(|&c| c <= target)
                    .min(last);
                point_in_triangle(&self.triangles[face], rng.gen(), rng.gen())
            })
            .collect();

        Ok(PointSet::new(points))
    }
}

/// Maps two uniform numbers in `[0, 1)` to a uniformly distributed point of
/// the triangle. The square root keeps the density flat instead of piling up
/// at the first corner.
fn point_in_triangle(corners: &[Point3; 3], u: f64, v: f64) -> Point3 {
    let r = u.sqrt();
    let wa = 1.0 - r;
    let wb = r * (1.0 - v);
    let wc = r * v;
    let [a, b, c] = corners;
    [
        wa * a[0] + wb * b[0] + wc * c[0],
        wa * a[1] + wb * b[1] + wc * c[1],
        wa * a[2] + wb * b[2] + wc * c[2],
    ]
}

/// Samples `n` points from `mesh` using the given generator.
pub fn sample_surface<R: Rng + ?Sized>(
    mesh: &SurfaceMesh,
    n: usize,
    rng: &mut R,
) -> StatusResult<PointSet> {
    SurfaceSampler::new(mesh)?.sample(n, rng)
}

/// Samples `n` points from `mesh`, reproducibly when `seed` is set.
pub fn sample_surface_seeded(
    mesh: &SurfaceMesh,
    n: usize,
    seed: Option<u64>,
) -> StatusResult<PointSet> {
    let mut rng = sampling_rng(seed);
    sample_surface(mesh, n, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> SurfaceMesh {
        // A 1x1 square at z=0 (area 1) and a 3x3 right triangle at z=1 (area 4.5).
        SurfaceMesh::from_parts(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [3.0, 0.0, 1.0],
                [0.0, 3.0, 1.0],
            ],
            vec![[0, 1, 2], [0, 2, 3], [4, 5, 6]],
        )
    }

    #[test]
    fn test_sample_count_and_seed() {
        let mesh = two_triangles();
        let a = sample_surface_seeded(&mesh, 500, Some(7)).unwrap();
        let b = sample_surface_seeded(&mesh, 500, Some(7)).unwrap();
        let c = sample_surface_seeded(&mesh, 500, Some(8)).unwrap();
        assert_eq!(a.num_points(), 500);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_area_weighting() {
        let mesh = two_triangles();
        let sampler = SurfaceSampler::new(&mesh).unwrap();
        assert!((sampler.total_area() - 5.5).abs() < 1e-12);

        let points = sampler.sample(20_000, &mut sampling_rng(Some(1))).unwrap();
        let upper = points.iter().filter(|p| p[2] > 0.5).count() as f64;
        let ratio = upper / points.num_points() as f64;
        // Expected 4.5 / 5.5 ~= 0.818.
        assert!((ratio - 4.5 / 5.5).abs() < 0.02, "ratio {}", ratio);
    }

    #[test]
    fn test_uniform_inside_triangle() {
        // Split the big triangle into the part near the right angle (x + y < 1.5,
        // a quarter of the area) and the rest.
        let mesh = SurfaceMesh::from_parts(
            vec![[0.0, 0.0, 0.0], [3.0, 0.0, 0.0], [0.0, 3.0, 0.0]],
            vec![[0, 1, 2]],
        );
        let points = sample_surface_seeded(&mesh, 20_000, Some(3)).unwrap();
        let near_corner = points.iter().filter(|p| p[0] + p[1] < 1.5).count() as f64;
        let ratio = near_corner / 20_000.0;
        assert!((ratio - 0.25).abs() < 0.02, "ratio {}", ratio);
        for p in &points {
            assert!(p[0] >= -1e-12 && p[1] >= -1e-12 && p[0] + p[1] <= 3.0 + 1e-9);
        }
    }

    #[test]
    fn test_degenerate_faces_are_skipped() {
        let mut mesh = two_triangles();
        // Collinear face.
        let a = mesh.add_vertex([5.0, 5.0, 5.0]);
        let b = mesh.add_vertex([6.0, 6.0, 6.0]);
        let c = mesh.add_vertex([7.0, 7.0, 7.0]);
        mesh.add_face([a, b, c]);
        let sampler = SurfaceSampler::new(&mesh).unwrap();
        assert_eq!(sampler.num_triangles(), 3);
    }

    #[test]
    fn test_errors() {
        let empty = SurfaceMesh::from_parts(vec![[0.0; 3]; 3], vec![]);
        assert!(matches!(
            SurfaceSampler::new(&empty).unwrap_err(),
            Error::EmptySurface(_)
        ));

        let flat = SurfaceMesh::from_parts(vec![[1.0, 1.0, 1.0]; 3], vec![[0, 1, 2]]);
        assert!(matches!(
            sample_surface_seeded(&flat, 10, Some(0)).unwrap_err(),
            Error::EmptySurface(_)
        ));

        let broken = SurfaceMesh::from_parts(vec![[0.0; 3]; 3], vec![[0, 1, 9]]);
        assert!(matches!(
            SurfaceSampler::new(&broken).unwrap_err(),
            Error::InvalidInput(_)
        ));

        let mesh = two_triangles();
        assert!(matches!(
            sample_surface_seeded(&mesh, 0, None).unwrap_err(),
            Error::InvalidInput(_)
        ));
    }
}
