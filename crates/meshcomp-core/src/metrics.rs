//! Distortion metrics for an original / reconstructed mesh pair.

use rand::Rng;
use tracing::warn;

use crate::distance::BidirectionalDistances;
use crate::point_set::PointSet;
use crate::sampler::{sample_surface, sampling_rng};
use crate::status::StatusResult;
use crate::surface_mesh::SurfaceMesh;

/// Number of surface samples per mesh used by the benchmark scripts.
pub const DEFAULT_METRIC_POINTS: usize = 20_000;

/// Chamfer and Hausdorff distance of one mesh pair.
///
/// `None` marks a metric that could not be computed for this pair. Each field
/// is set independently, so one metric may be available while the other is
/// not.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricResult {
    pub chamfer: Option<f64>,
    pub hausdorff: Option<f64>,
}

impl MetricResult {
    pub fn unavailable() -> Self {
        Self {
            chamfer: None,
            hausdorff: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.chamfer.is_some() && self.hausdorff.is_some()
    }

    pub fn is_unavailable(&self) -> bool {
        self.chamfer.is_none() && self.hausdorff.is_none()
    }
}

/// Samples both meshes and computes symmetric Chamfer and Hausdorff distance.
///
/// Failures never escape: a mesh that cannot be sampled or a metric that
/// cannot be computed is logged and reported as unavailable, so one bad pair
/// does not stop a batch.
#[derive(Debug, Clone, Copy)]
pub struct MetricEvaluator {
    num_points: usize,
    seed: Option<u64>,
}

impl Default for MetricEvaluator {
    fn default() -> Self {
        Self {
            num_points: DEFAULT_METRIC_POINTS,
            seed: None,
        }
    }
}

impl MetricEvaluator {
    pub fn new(num_points: usize) -> Self {
        Self {
            num_points,
            seed: None,
        }
    }

    /// Fixes the sampling seed. Each mesh is then sampled from its own
    /// generator seeded with `seed`, so identical meshes yield identical
    /// samples.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn evaluate(&self, original: &SurfaceMesh, reconstructed: &SurfaceMesh) -> MetricResult {
        let original_points = sample_surface(original, self.num_points, &mut sampling_rng(self.seed));
        let reconstructed_points =
            sample_surface(reconstructed, self.num_points, &mut sampling_rng(self.seed));
        metrics_from_samples(original_points, reconstructed_points)
    }

    /// Like [`MetricEvaluator::evaluate`], drawing both sample sets from `rng`
    /// one after the other. The evaluator's own seed is ignored.
    pub fn evaluate_with_rng<R: Rng + ?Sized>(
        &self,
        original: &SurfaceMesh,
        reconstructed: &SurfaceMesh,
        rng: &mut R,
    ) -> MetricResult {
        let original_points = sample_surface(original, self.num_points, rng);
        let reconstructed_points = sample_surface(reconstructed, self.num_points, rng);
        metrics_from_samples(original_points, reconstructed_points)
    }
}

/// Evaluates a mesh pair with `n_points` unseeded samples per mesh.
pub fn evaluate(original: &SurfaceMesh, reconstructed: &SurfaceMesh, n_points: usize) -> MetricResult {
    MetricEvaluator::new(n_points).evaluate(original, reconstructed)
}

fn metrics_from_samples(
    original: StatusResult<PointSet>,
    reconstructed: StatusResult<PointSet>,
) -> MetricResult {
    let original = match original {
        Ok(points) => points,
        Err(err) => {
            warn!(mesh = "original", error = %err, "surface sampling failed, metrics unavailable");
            return MetricResult::unavailable();
        }
    };
    let reconstructed = match reconstructed {
        Ok(points) => points,
        Err(err) => {
            warn!(mesh = "reconstructed", error = %err, "surface sampling failed, metrics unavailable");
            return MetricResult::unavailable();
        }
    };

    let distances = match BidirectionalDistances::compute(&original, &reconstructed) {
        Ok(distances) => distances,
        Err(err) => {
            warn!(error = %err, "nearest-neighbor search failed, metrics unavailable");
            return MetricResult::unavailable();
        }
    };

    let chamfer = distances
        .symmetric_chamfer()
        .map_err(|err| warn!(error = %err, "chamfer distance unavailable"))
        .ok();
    let hausdorff = distances
        .symmetric_hausdorff()
        .map_err(|err| warn!(error = %err, "hausdorff distance unavailable"))
        .ok();

    MetricResult { chamfer, hausdorff }
}
