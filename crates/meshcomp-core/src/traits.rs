//! Interfaces of the collaborators the benchmark driver works with.
//!
//! The metric engine never sees files or compressed bytes. Loading, encoding
//! and storing results are delegated to implementations of these traits:
//!
//! ```ignore
//! use meshcomp_core::{
//!     BenchmarkOptions, BenchmarkRunner, CancellationToken, MemorySink, QuantizationCodec,
//! };
//!
//! let runner = BenchmarkRunner::new(loader, QuantizationCodec::new(), BenchmarkOptions::new());
//! let mut sink = MemorySink::new();
//! runner.run(&paths, &mut sink, &CancellationToken::new());
//! ```

use std::path::Path;

use crate::benchmark::BenchmarkRecord;
use crate::status::StatusResult;
use crate::surface_mesh::SurfaceMesh;

/// Reads a mesh surface from storage.
///
/// Implementations report unreadable or malformed input as
/// [`crate::Error::Load`]. The file format is up to the implementation.
pub trait MeshLoader: Sync {
    fn load(&self, path: &Path) -> StatusResult<SurfaceMesh>;
}

/// A lossy geometry codec.
///
/// `quantization_bits` is the codec's quality parameter: fewer bits means
/// coarser positions and a smaller stream. Failures are reported as
/// [`crate::Error::Codec`].
pub trait MeshCodec: Sync {
    fn encode(&self, mesh: &SurfaceMesh, quantization_bits: u8) -> StatusResult<Vec<u8>>;

    fn decode(&self, data: &[u8]) -> StatusResult<SurfaceMesh>;
}

/// Receives one record per (mesh, quantization level) combination.
pub trait ResultsSink {
    fn record(&mut self, record: BenchmarkRecord);

    fn record_all(&mut self, records: Vec<BenchmarkRecord>) {
        for record in records {
            self.record(record);
        }
    }
}

/// Sink that keeps every record in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Vec<BenchmarkRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[BenchmarkRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<BenchmarkRecord> {
        self.records
    }
}

impl ResultsSink for MemorySink {
    fn record(&mut self, record: BenchmarkRecord) {
        self.records.push(record);
    }
}

impl<F: FnMut(BenchmarkRecord)> ResultsSink for F {
    fn record(&mut self, record: BenchmarkRecord) {
        self(record)
    }
}
