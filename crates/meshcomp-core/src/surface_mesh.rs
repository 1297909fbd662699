use crate::geometry_indices::{FaceIndex, VertexIndex};
use crate::point_set::Point3;
use crate::status::{invalid_input, ok_status, Status, StatusResult};

pub type Face = [VertexIndex; 3];

/// Triangle soup surface: a float32 vertex buffer plus index triples.
///
/// This is what loaders produce and codecs reconstruct. The metric engine
/// only ever reads it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SurfaceMesh {
    vertices: Vec<[f32; 3]>,
    faces: Vec<Face>,
}

impl SurfaceMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(vertices: Vec<[f32; 3]>, faces: Vec<[u32; 3]>) -> Self {
        let faces = faces
            .into_iter()
            .map(|f| [VertexIndex(f[0]), VertexIndex(f[1]), VertexIndex(f[2])])
            .collect();
        Self { vertices, faces }
    }

    pub fn add_vertex(&mut self, position: [f32; 3]) -> VertexIndex {
        self.vertices.push(position);
        VertexIndex::from(self.vertices.len() - 1)
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    pub fn vertex(&self, index: VertexIndex) -> [f32; 3] {
        self.vertices[usize::from(index)]
    }

    pub fn face(&self, face_id: FaceIndex) -> Face {
        self.faces[usize::from(face_id)]
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Checks that every face references an existing vertex.
    pub fn validate(&self) -> Status {
        let num_vertices = self.vertices.len();
        for (i, face) in self.faces.iter().enumerate() {
            if let Some(bad) = face.iter().find(|v| usize::from(**v) >= num_vertices) {
                return Err(invalid_input(format!(
                    "face {} references vertex {} but mesh has {} vertices",
                    i, bad.0, num_vertices
                )));
            }
        }
        ok_status()
    }

    /// Resolves a face into a triangle, failing on out-of-range indices.
    pub fn triangle(&self, face_id: FaceIndex) -> StatusResult<Triangle<'_>> {
        let face = *self
            .faces
            .get(usize::from(face_id))
            .ok_or_else(|| invalid_input(format!("face {} out of range", face_id.0)))?;
        if face.iter().any(|v| usize::from(*v) >= self.vertices.len()) {
            return Err(invalid_input(format!(
                "face {} references a vertex out of range",
                face_id.0
            )));
        }
        Ok(Triangle {
            vertices: &self.vertices,
            indices: face,
        })
    }

    pub fn triangles(&self) -> impl Iterator<Item = StatusResult<Triangle<'_>>> + '_ {
        (0..self.faces.len()).map(move |i| self.triangle(FaceIndex::from(i)))
    }

    /// Total area of all faces. Fails if any face is malformed.
    pub fn surface_area(&self) -> StatusResult<f64> {
        let mut total = 0.0;
        for triangle in self.triangles() {
            total += triangle?.area();
        }
        Ok(total)
    }

    /// Axis-aligned vertex bounds as `(min, max)`.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.vertices.first()?;
        let (mut min, mut max) = (first, first);
        for v in &self.vertices[1..] {
            for c in 0..3 {
                min[c] = min[c].min(v[c]);
                max[c] = max[c].max(v[c]);
            }
        }
        Some((min, max))
    }
}

/// A face of a [`SurfaceMesh`], borrowed together with the vertex buffer.
#[derive(Debug, Clone, Copy)]
pub struct Triangle<'a> {
    vertices: &'a [[f32; 3]],
    indices: Face,
}

impl<'a> Triangle<'a> {
    pub fn indices(&self) -> Face {
        self.indices
    }

    pub fn corners(&self) -> [Point3; 3] {
        self.indices.map(|v| {
            let p = self.vertices[usize::from(v)];
            [p[0] as f64, p[1] as f64, p[2] as f64]
        })
    }

    pub fn area(&self) -> f64 {
        let [a, b, c] = self.corners();
        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let cross = [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
            u[0] * v[1] - u[1] * v[0],
        ];
        0.5 * (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt()
    }
}
