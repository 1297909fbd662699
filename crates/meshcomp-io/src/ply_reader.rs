//! PLY format reader (ASCII and binary).
//!
//! Reads `x`/`y`/`z` from the `vertex` element and the `vertex_indices` (or
//! `vertex_index`) list from the `face` element. Every other element and
//! property is parsed and discarded.

use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::SplitWhitespace;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use meshcomp_core::SurfaceMesh;
use thiserror::Error;

use crate::traits::Reader;

#[derive(Debug, Error)]
pub enum PlyError {
    #[error("missing 'ply' magic line")]
    MissingMagic,
    #[error("unsupported format '{0}'")]
    UnsupportedFormat(String),
    #[error("unknown property type '{0}'")]
    UnknownType(String),
    #[error("malformed header line '{0}'")]
    MalformedHeader(String),
    #[error("header ended without 'end_header'")]
    UnterminatedHeader,
    #[error("element '{element}' has no property '{property}'")]
    MissingProperty {
        element: &'static str,
        property: &'static str,
    },
    #[error("invalid value '{0}'")]
    InvalidValue(String),
    #[error("face with {0} vertices")]
    DegenerateFace(usize),
    #[error("invalid face: {0}")]
    InvalidFace(String),
    #[error("unexpected end of data")]
    UnexpectedEof,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<PlyError> for io::Error {
    fn from(err: PlyError) -> Self {
        match err {
            PlyError::Io(err) => err,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

type Result<T> = std::result::Result<T, PlyError>;

const MAX_RESERVED_VERTICES: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl ScalarType {
    fn from_name(name: &str) -> Result<Self> {
        Ok(match name {
            "char" | "int8" => Self::Int8,
            "uchar" | "uint8" => Self::UInt8,
            "short" | "int16" => Self::Int16,
            "ushort" | "uint16" => Self::UInt16,
            "int" | "int32" => Self::Int32,
            "uint" | "uint32" => Self::UInt32,
            "float" | "float32" => Self::Float32,
            "double" | "float64" => Self::Float64,
            other => return Err(PlyError::UnknownType(other.to_string())),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Scalar(ScalarType),
    List { count: ScalarType, item: ScalarType },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub kind: PropertyKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub count: usize,
    pub properties: Vec<Property>,
}

impl Element {
    fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyHeader {
    pub format: PlyFormat,
    pub elements: Vec<Element>,
}

/// PLY format reader.
#[derive(Debug)]
pub struct PlyReader {
    path: PathBuf,
}

impl PlyReader {
    /// Open a PLY file for reading.
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
        Ok(read_ply(BufReader::new(file))?)
    }
}

impl Reader for PlyReader {
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        PlyReader::open(path)
    }

    fn read_mesh(&mut self) -> io::Result<SurfaceMesh> {
        PlyReader::read_mesh(self)
    }
}

/// Parse a PLY stream, header and body.
pub fn read_ply<R: BufRead>(mut reader: R) -> Result<SurfaceMesh> {
    let header = read_header(&mut reader)?;
    match header.format {
        PlyFormat::Ascii => {
            let mut body = String::new();
            reader.read_to_string(&mut body)?;
            let mut source = AsciiSource {
                tokens: body.split_whitespace(),
            };
            read_body(&header, &mut source)
        }
        PlyFormat::BinaryLittleEndian => {
            read_body(&header, &mut BinarySource::<_, LittleEndian>::new(reader))
        }
        PlyFormat::BinaryBigEndian => {
            read_body(&header, &mut BinarySource::<_, BigEndian>::new(reader))
        }
    }
}

/// Parse the header, leaving `reader` positioned at the first body byte.
pub fn read_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 || line.trim() != "ply" {
        return Err(PlyError::MissingMagic);
    }

    let mut format = None;
    let mut elements: Vec<Element> = Vec::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(PlyError::UnterminatedHeader);
        }
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("end_header") => break,
            Some("comment") | Some("obj_info") | None => {}
            Some("format") => {
                format = Some(match parts.next() {
                    Some("ascii") => PlyFormat::Ascii,
                    Some("binary_little_endian") => PlyFormat::BinaryLittleEndian,
                    Some("binary_big_endian") => PlyFormat::BinaryBigEndian,
                    other => {
                        return Err(PlyError::UnsupportedFormat(
                            other.unwrap_or_default().to_string(),
                        ))
                    }
                });
            }
            Some("element") => {
                let (Some(name), Some(count)) = (parts.next(), parts.next()) else {
                    return Err(malformed(&line));
                };
                let count = count.parse().map_err(|_| malformed(&line))?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            Some("property") => {
                let element = elements.last_mut().ok_or_else(|| malformed(&line))?;
                let property = match parts.next() {
                    Some("list") => {
                        let (Some(count), Some(item), Some(name)) =
                            (parts.next(), parts.next(), parts.next())
                        else {
                            return Err(malformed(&line));
                        };
                        Property {
                            name: name.to_string(),
                            kind: PropertyKind::List {
                                count: ScalarType::from_name(count)?,
                                item: ScalarType::from_name(item)?,
                            },
                        }
                    }
                    Some(ty) => {
                        let name = parts.next().ok_or_else(|| malformed(&line))?;
                        Property {
                            name: name.to_string(),
                            kind: PropertyKind::Scalar(ScalarType::from_name(ty)?),
                        }
                    }
                    None => return Err(malformed(&line)),
                };
                element.properties.push(property);
            }
            Some(_) => return Err(malformed(&line)),
        }
    }

    let format = format.ok_or_else(|| PlyError::UnsupportedFormat("<missing>".to_string()))?;
    Ok(PlyHeader { format, elements })
}

fn malformed(line: &str) -> PlyError {
    PlyError::MalformedHeader(line.trim().to_string())
}

/// Source of property values in file order.
trait ValueSource {
    fn read(&mut self, ty: ScalarType) -> Result<f64>;
}

struct AsciiSource<'a> {
    tokens: SplitWhitespace<'a>,
}

impl ValueSource for AsciiSource<'_> {
    fn read(&mut self, _ty: ScalarType) -> Result<f64> {
        let token = self.tokens.next().ok_or(PlyError::UnexpectedEof)?;
        token
            .parse()
            .map_err(|_| PlyError::InvalidValue(token.to_string()))
    }
}

struct BinarySource<R, B> {
    reader: R,
    _order: PhantomData<B>,
}

impl<R: Read, B: ByteOrder> BinarySource<R, B> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            _order: PhantomData,
        }
    }

    fn read_raw(&mut self, ty: ScalarType) -> io::Result<f64> {
        let r = &mut self.reader;
        Ok(match ty {
            ScalarType::Int8 => r.read_i8()? as f64,
            ScalarType::UInt8 => r.read_u8()? as f64,
            ScalarType::Int16 => r.read_i16::<B>()? as f64,
            ScalarType::UInt16 => r.read_u16::<B>()? as f64,
            ScalarType::Int32 => r.read_i32::<B>()? as f64,
            ScalarType::UInt32 => r.read_u32::<B>()? as f64,
            ScalarType::Float32 => r.read_f32::<B>()? as f64,
            ScalarType::Float64 => r.read_f64::<B>()?,
        })
    }
}

impl<R: Read, B: ByteOrder> ValueSource for BinarySource<R, B> {
    fn read(&mut self, ty: ScalarType) -> Result<f64> {
        self.read_raw(ty).map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => PlyError::UnexpectedEof,
            _ => PlyError::Io(err),
        })
    }
}

fn read_body<S: ValueSource>(header: &PlyHeader, source: &mut S) -> Result<SurfaceMesh> {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();
    for element in &header.elements {
        match element.name.as_str() {
            "vertex" => read_vertices(element, source, &mut vertices)?,
            "face" => read_faces(element, source, &mut faces)?,
            _ => skip_element(element, source)?,
        }
    }

    let mesh = SurfaceMesh::from_parts(vertices, faces);
    mesh.validate()
        .map_err(|err| PlyError::InvalidFace(err.to_string()))?;
    Ok(mesh)
}

fn read_vertices<S: ValueSource>(
    element: &Element,
    source: &mut S,
    vertices: &mut Vec<[f32; 3]>,
) -> Result<()> {
    let mut axes = [0usize; 3];
    for (axis, name) in axes.iter_mut().zip(["x", "y", "z"]) {
        *axis = element
            .property_index(name)
            .ok_or(PlyError::MissingProperty {
                element: "vertex",
                property: name,
            })?;
    }

    // The count is untrusted; the body runs out long before a bogus one.
    vertices.reserve(element.count.min(MAX_RESERVED_VERTICES));
    for _ in 0..element.count {
        let mut position = [0f32; 3];
        for (i, property) in element.properties.iter().enumerate() {
            match property.kind {
                PropertyKind::Scalar(ty) => {
                    let value = source.read(ty)?;
                    if let Some(axis) = axes.iter().position(|&a| a == i) {
                        position[axis] = value as f32;
                    }
                }
                PropertyKind::List { count, item } => skip_list(source, count, item)?,
            }
        }
        vertices.push(position);
    }
    Ok(())
}

fn read_faces<S: ValueSource>(
    element: &Element,
    source: &mut S,
    faces: &mut Vec<[u32; 3]>,
) -> Result<()> {
    let indices = element
        .property_index("vertex_indices")
        .or_else(|| element.property_index("vertex_index"))
        .filter(|&i| matches!(element.properties[i].kind, PropertyKind::List { .. }))
        .ok_or(PlyError::MissingProperty {
            element: "face",
            property: "vertex_indices",
        })?;

    let mut polygon: Vec<u32> = Vec::new();
    for _ in 0..element.count {
        for (i, property) in element.properties.iter().enumerate() {
            match property.kind {
                PropertyKind::List { count, item } if i == indices => {
                    let n = read_count(source, count)?;
                    polygon.clear();
                    for _ in 0..n {
                        polygon.push(read_index(source, item)?);
                    }
                    if n < 3 {
                        return Err(PlyError::DegenerateFace(n));
                    }
                    for k in 1..n - 1 {
                        faces.push([polygon[0], polygon[k], polygon[k + 1]]);
                    }
                }
                PropertyKind::List { count, item } => skip_list(source, count, item)?,
                PropertyKind::Scalar(ty) => {
                    source.read(ty)?;
                }
            }
        }
    }
    Ok(())
}

fn skip_element<S: ValueSource>(element: &Element, source: &mut S) -> Result<()> {
    if element.properties.is_empty() {
        return Ok(());
    }
    for _ in 0..element.count {
        for property in &element.properties {
            match property.kind {
                PropertyKind::Scalar(ty) => {
                    source.read(ty)?;
                }
                PropertyKind::List { count, item } => skip_list(source, count, item)?,
            }
        }
    }
    Ok(())
}

fn skip_list<S: ValueSource>(source: &mut S, count: ScalarType, item: ScalarType) -> Result<()> {
    let n = read_count(source, count)?;
    for _ in 0..n {
        source.read(item)?;
    }
    Ok(())
}

fn read_count<S: ValueSource>(source: &mut S, ty: ScalarType) -> Result<usize> {
    let value = source.read(ty)?;
    if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(PlyError::InvalidValue(value.to_string()));
    }
    Ok(value as usize)
}

fn read_index<S: ValueSource>(source: &mut S, ty: ScalarType) -> Result<u32> {
    let value = source.read(ty)?;
    if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(PlyError::InvalidFace(format!("vertex index {}", value)));
    }
    Ok(value as u32)
}
