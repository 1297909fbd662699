//! Position-quantization mesh codec.
//!
//! Quantizes every vertex position to `bits` per axis over the mesh bounding
//! cube (the same grid Draco's attribute quantization uses), bit-packs the
//! quantized coordinates and stores faces verbatim. Connectivity is lossless;
//! only positions lose precision.
//!
//! Stream layout, little-endian:
//!
//! | field            | type                          |
//! |------------------|-------------------------------|
//! | magic            | `b"MQNT"`                     |
//! | version          | `u8`                          |
//! | bits             | `u8`                          |
//! | num_vertices     | `u32`                         |
//! | num_faces        | `u32`                         |
//! | min_values       | `3 x f32`                     |
//! | range            | `f32`                         |
//! | positions        | `num_vertices * 3 * bits` bits, padded to a byte |
//! | faces            | `num_faces * 3 x u32`         |

use std::io::{self, Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::bit_utils::{BitDecoder, BitEncoder};
use crate::quantization_utils::{check_bits, QuantizationParameters};
use crate::status::{codec_error, StatusResult};
use crate::surface_mesh::SurfaceMesh;
use crate::traits::MeshCodec;

pub const STREAM_MAGIC: &[u8; 4] = b"MQNT";
pub const STREAM_VERSION: u8 = 1;
const HEADER_SIZE: usize = 30;

#[derive(Debug, Default, Clone, Copy)]
pub struct QuantizationCodec;

impl QuantizationCodec {
    pub fn new() -> Self {
        Self
    }
}

impl MeshCodec for QuantizationCodec {
    fn encode(&self, mesh: &SurfaceMesh, quantization_bits: u8) -> StatusResult<Vec<u8>> {
        check_bits(quantization_bits)?;
        mesh.validate().map_err(|err| codec_error(err.to_string()))?;
        let num_vertices = u32::try_from(mesh.num_vertices())
            .map_err(|_| codec_error("too many vertices"))?;
        let num_faces =
            u32::try_from(mesh.num_faces()).map_err(|_| codec_error("too many faces"))?;

        let params = QuantizationParameters::compute(mesh.vertices(), quantization_bits)?;
        let quantizer = params.quantizer();

        let mut bits = BitEncoder::with_capacity_bits(mesh.num_vertices() * 3 * quantization_bits as usize);
        for position in mesh.vertices() {
            for value in params.quantize(&quantizer, position) {
                bits.put_bits(value, quantization_bits as u32);
            }
        }
        let positions = bits.into_bytes();

        let mut out = Vec::with_capacity(HEADER_SIZE + positions.len() + mesh.num_faces() * 12);
        write_stream(&mut out, &params, num_vertices, num_faces, &positions, mesh)
            .map_err(|err| codec_error(format!("failed to write stream: {}", err)))?;
        Ok(out)
    }

    fn decode(&self, data: &[u8]) -> StatusResult<SurfaceMesh> {
        if data.len() < HEADER_SIZE {
            return Err(codec_error(format!(
                "stream of {} bytes is shorter than the {} byte header",
                data.len(),
                HEADER_SIZE
            )));
        }
        let mut cursor = Cursor::new(data);
        let header = read_header(&mut cursor).map_err(|err| codec_error(err.to_string()))?;
        if &header.magic != STREAM_MAGIC {
            return Err(codec_error("bad stream magic"));
        }
        if header.version != STREAM_VERSION {
            return Err(codec_error(format!("unsupported stream version {}", header.version)));
        }
        check_bits(header.params.bits)?;

        let num_vertices = header.num_vertices as usize;
        let num_faces = header.num_faces as usize;
        let position_bits = num_vertices as u64 * 3 * header.params.bits as u64;
        let position_bytes = ((position_bits + 7) / 8) as usize;
        let expected = HEADER_SIZE as u64 + position_bytes as u64 + num_faces as u64 * 12;
        if data.len() as u64 != expected {
            return Err(codec_error(format!(
                "stream is {} bytes, header describes {}",
                data.len(),
                expected
            )));
        }

        let dequantizer = header.params.dequantizer()?;
        let mut bits = BitDecoder::new(&data[HEADER_SIZE..HEADER_SIZE + position_bytes]);
        let nbits = header.params.bits as u32;
        let mut vertices = Vec::with_capacity(num_vertices);
        for _ in 0..num_vertices {
            let mut value = [0u32; 3];
            for v in value.iter_mut() {
                *v = bits
                    .get_bits(nbits)
                    .ok_or_else(|| codec_error("truncated position data"))?;
            }
            vertices.push(header.params.dequantize(&dequantizer, &value));
        }

        let mut cursor = Cursor::new(&data[HEADER_SIZE + position_bytes..]);
        let mut faces = Vec::with_capacity(num_faces);
        for _ in 0..num_faces {
            let mut face = [0u32; 3];
            cursor
                .read_u32_into::<LittleEndian>(&mut face)
                .map_err(|err| codec_error(format!("truncated face data: {}", err)))?;
            faces.push(face);
        }

        let mesh = SurfaceMesh::from_parts(vertices, faces);
        mesh.validate().map_err(|err| codec_error(err.to_string()))?;
        Ok(mesh)
    }
}

struct StreamHeader {
    magic: [u8; 4],
    version: u8,
    num_vertices: u32,
    num_faces: u32,
    params: QuantizationParameters,
}

fn read_header<R: Read>(reader: &mut R) -> io::Result<StreamHeader> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    let version = reader.read_u8()?;
    let bits = reader.read_u8()?;
    let num_vertices = reader.read_u32::<LittleEndian>()?;
    let num_faces = reader.read_u32::<LittleEndian>()?;
    let mut min_values = [0f32; 3];
    reader.read_f32_into::<LittleEndian>(&mut min_values)?;
    let range = reader.read_f32::<LittleEndian>()?;
    Ok(StreamHeader {
        magic,
        version,
        num_vertices,
        num_faces,
        params: QuantizationParameters {
            bits,
            min_values,
            range,
        },
    })
}

fn write_stream<W: Write>(
    writer: &mut W,
    params: &QuantizationParameters,
    num_vertices: u32,
    num_faces: u32,
    positions: &[u8],
    mesh: &SurfaceMesh,
) -> io::Result<()> {
    writer.write_all(STREAM_MAGIC)?;
    writer.write_u8(STREAM_VERSION)?;
    writer.write_u8(params.bits)?;
    writer.write_u32::<LittleEndian>(num_vertices)?;
    writer.write_u32::<LittleEndian>(num_faces)?;
    for c in 0..3 {
        writer.write_f32::<LittleEndian>(params.min_values[c])?;
    }
    writer.write_f32::<LittleEndian>(params.range)?;
    writer.write_all(positions)?;
    for face in mesh.faces() {
        for v in face {
            writer.write_u32::<LittleEndian>(v.0)?;
        }
    }
    Ok(())
}
