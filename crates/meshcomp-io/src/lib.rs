//! Mesh file input for the meshcomp benchmark.
//!
//! # Supported Formats
//!
//! | Format | Encodings                                   |
//! |--------|---------------------------------------------|
//! | OBJ    | text                                        |
//! | PLY    | ascii, binary little endian, binary big endian |
//!
//! Readers implement the common [`Reader`] trait. [`MeshFileLoader`] plugs
//! them into the benchmark driver by dispatching on the file extension, and
//! [`find_mesh_files`] collects a dataset directory:
//!
//! ```ignore
//! use meshcomp_core::{BenchmarkOptions, BenchmarkRunner, CancellationToken, MemorySink, QuantizationCodec};
//! use meshcomp_io::{find_mesh_files, MeshFileLoader};
//!
//! let paths = find_mesh_files("data/thingi10k")?;
//! let runner = BenchmarkRunner::new(MeshFileLoader::new(), QuantizationCodec::new(), options);
//! let summary = runner.run(&paths, &mut MemorySink::new(), &CancellationToken::new())?;
//! ```

pub mod obj_reader;
pub mod ply_reader;
pub mod traits;

use std::io;
use std::path::{Path, PathBuf};

use meshcomp_core::{Error, MeshLoader, StatusResult, SurfaceMesh};
use tracing::debug;
use walkdir::WalkDir;

pub use obj_reader::{read_obj, ObjReader};
pub use ply_reader::{read_ply, PlyError, PlyReader};
pub use traits::Reader;

/// File extensions [`MeshFileLoader`] understands, lowercase.
pub const MESH_EXTENSIONS: [&str; 2] = ["obj", "ply"];

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// True if `path` has an extension a reader exists for.
pub fn is_mesh_file(path: &Path) -> bool {
    extension(path).map_or(false, |ext| MESH_EXTENSIONS.contains(&ext.as_str()))
}

/// Read a mesh file, choosing the reader from the extension.
pub fn read_mesh_file<P: AsRef<Path>>(path: P) -> io::Result<SurfaceMesh> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("obj") => ObjReader::open(path)?.read_mesh(),
        Some("ply") => PlyReader::open(path)?.read_mesh(),
        _ => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("Unsupported mesh format: {}", path.display()),
        )),
    }
}

/// [`MeshLoader`] backed by the OBJ and PLY readers.
#[derive(Debug, Default, Clone, Copy)]
pub struct MeshFileLoader;

impl MeshFileLoader {
    pub fn new() -> Self {
        Self
    }
}

impl MeshLoader for MeshFileLoader {
    fn load(&self, path: &Path) -> StatusResult<SurfaceMesh> {
        let mesh = read_mesh_file(path)
            .map_err(|err| Error::Load(format!("{}: {}", path.display(), err)))?;
        debug!(
            path = %path.display(),
            vertices = mesh.num_vertices(),
            faces = mesh.num_faces(),
            "loaded mesh"
        );
        Ok(mesh)
    }
}

/// Every OBJ or PLY file under `root`, recursively, in sorted order.
///
/// Symbolic links to directories are not followed, so a link back into the
/// tree cannot report the same mesh twice.
pub fn find_mesh_files<P: AsRef<Path>>(root: P) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root.as_ref()).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && path.is_file());
        if is_file && is_mesh_file(path) {
            files.push(entry.into_path());
        }
    }
    debug!(root = %root.as_ref().display(), files = files.len(), "found mesh files");
    Ok(files)
}
