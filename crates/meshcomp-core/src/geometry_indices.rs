#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexIndex(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceIndex(pub u32);

impl From<u32> for VertexIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl From<VertexIndex> for u32 {
    fn from(v: VertexIndex) -> Self {
        v.0
    }
}

impl From<usize> for VertexIndex {
    fn from(v: usize) -> Self {
        Self(v as u32)
    }
}

impl From<VertexIndex> for usize {
    fn from(v: VertexIndex) -> Self {
        v.0 as usize
    }
}

impl From<usize> for FaceIndex {
    fn from(v: usize) -> Self {
        Self(v as u32)
    }
}

impl From<FaceIndex> for usize {
    fn from(v: FaceIndex) -> Self {
        v.0 as usize
    }
}
