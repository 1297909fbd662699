//! OBJ format reader.
//!
//! Only geometry is read: `v` positions and `f` faces. Texture coordinates,
//! normals, groups and materials are ignored.

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use meshcomp_core::SurfaceMesh;

use crate::traits::Reader;

/// OBJ format reader.
#[derive(Debug)]
pub struct ObjReader {
    path: PathBuf,
}

impl ObjReader {
    /// Open an OBJ file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            ));
        }
        Ok(Self { path })
    }

    /// Read the mesh, fan-triangulating polygons.
    pub fn read_mesh(&mut self) -> io::Result<SurfaceMesh> {
        let file = fs::File::open(&self.path)?;
        read_obj(BufReader::new(file))
    }
}

impl Reader for ObjReader {
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        ObjReader::open(path)
    }

    fn read_mesh(&mut self) -> io::Result<SurfaceMesh> {
        ObjReader::read_mesh(self)
    }
}

/// Parse an OBJ stream.
///
/// Face corners may be written as `i`, `i/t`, `i//n` or `i/t/n`; only the
/// position index is used. Indices are 1-based, negative indices count back
/// from the most recent vertex.
pub fn read_obj<R: BufRead>(reader: R) -> io::Result<SurfaceMesh> {
    let mut vertices: Vec<[f32; 3]> = Vec::new();
    let mut faces: Vec<[u32; 3]> = Vec::new();
    let mut corners: Vec<u32> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = match line.split_once('#') {
            Some((data, _)) => data,
            None => line.as_str(),
        };
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let mut position = [0f32; 3];
                for value in position.iter_mut() {
                    *value = parts
                        .next()
                        .and_then(|s| s.parse().ok())
                        .ok_or_else(|| invalid_line(line_no, "vertex needs three coordinates"))?;
                }
                vertices.push(position);
            }
            Some("f") => {
                corners.clear();
                for token in parts {
                    corners.push(resolve_index(token, vertices.len(), line_no)?);
                }
                if corners.len() < 3 {
                    return Err(invalid_line(line_no, "face needs at least three vertices"));
                }
                for i in 1..corners.len() - 1 {
                    faces.push([corners[0], corners[i], corners[i + 1]]);
                }
            }
            _ => {}
        }
    }

    // Positive indices may point forward, so range checks happen once the
    // whole vertex list is known.
    let mesh = SurfaceMesh::from_parts(vertices, faces);
    mesh.validate()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
    Ok(mesh)
}

fn resolve_index(token: &str, num_vertices: usize, line_no: usize) -> io::Result<u32> {
    let index: i64 = token
        .split('/')
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid_line(line_no, &format!("bad face index '{}'", token)))?;
    let resolved = match index {
        0 => return Err(invalid_line(line_no, "face index 0 is not valid")),
        i if i > 0 => i - 1,
        i => num_vertices as i64 + i,
    };
    if resolved < 0 {
        return Err(invalid_line(
            line_no,
            &format!("relative index {} before the first vertex", index),
        ));
    }
    u32::try_from(resolved).map_err(|_| invalid_line(line_no, "face index too large"))
}

fn invalid_line(line_no: usize, msg: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("line {}: {}", line_no + 1, msg),
    )
}
