//! meshcomp core library
//!
//! Measures how much geometry a lossy mesh codec loses. Both meshes of a pair
//! are sampled uniformly over their surface, and the two point sets are
//! compared with nearest-neighbor queries on k-d trees:
//!
//! - **Chamfer distance**: mean squared nearest-neighbor distance, averaged
//!   over both directions.
//! - **Hausdorff distance**: largest nearest-neighbor distance in either
//!   direction.
//!
//! The [`benchmark`] module drives a whole dataset through a codec at several
//! quantization levels and reports rate, timing and both distances per level.

pub mod benchmark;
pub mod bit_utils;
pub mod codec;
pub mod distance;
pub mod geometry_indices;
pub mod kd_tree;
pub mod metrics;
pub mod point_set;
pub mod quantization_utils;
pub mod sampler;
pub mod status;
pub mod surface_mesh;
pub mod traits;

pub use benchmark::{
    BatchSummary, BenchmarkOptions, BenchmarkRecord, BenchmarkRunner, CancellationToken,
    MeshOutcome, DEFAULT_QUANTIZATION_LEVELS,
};
pub use codec::QuantizationCodec;
pub use distance::{
    chamfer_distance, directed_hausdorff, symmetric_chamfer, symmetric_hausdorff,
    BidirectionalDistances,
};
pub use geometry_indices::{FaceIndex, VertexIndex};
pub use kd_tree::{KdTree, Neighbor};
pub use metrics::{evaluate, MetricEvaluator, MetricResult, DEFAULT_METRIC_POINTS};
pub use point_set::{Point3, PointSet};
pub use sampler::{sample_surface, sample_surface_seeded, sampling_rng, SurfaceSampler};
pub use status::{Error, Status, StatusResult};
pub use surface_mesh::{Face, SurfaceMesh, Triangle};
pub use traits::{MemorySink, MeshCodec, MeshLoader, ResultsSink};
