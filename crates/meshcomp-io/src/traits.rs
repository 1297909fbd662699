//! Common interface for the mesh file readers.
//!
//! ```ignore
//! use meshcomp_io::{ObjReader, Reader};
//!
//! fn load_mesh<R: Reader>(path: &str) -> io::Result<SurfaceMesh> {
//!     let mut reader = R::open(path)?;
//!     reader.read_mesh()
//! }
//!
//! let mesh = load_mesh::<ObjReader>("bunny.obj")?;
//! ```

use std::io;
use std::path::Path;

use meshcomp_core::SurfaceMesh;

/// Common interface for mesh readers.
pub trait Reader: Sized {
    /// Open a file for reading.
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self>;

    /// Read the triangulated surface stored in the file.
    ///
    /// Polygons are fan-triangulated. A file with vertices but no faces
    /// yields a mesh without faces; the caller decides whether that is usable.
    fn read_mesh(&mut self) -> io::Result<SurfaceMesh>;
}
