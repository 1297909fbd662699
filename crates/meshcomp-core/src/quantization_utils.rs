//! Uniform quantization of vertex positions over a cubic bounding box.

use crate::status::{codec_error, StatusResult};

pub const MIN_QUANTIZATION_BITS: u8 = 1;
pub const MAX_QUANTIZATION_BITS: u8 = 30;

#[derive(Debug, Default, Clone, Copy)]
pub struct Quantizer {
    inverse_delta: f32,
}

impl Quantizer {
    pub fn new(range: f32, max_quantized_value: u32) -> Self {
        let inverse_delta = if range > 0.0 {
            max_quantized_value as f32 / range
        } else {
            0.0
        };
        Self { inverse_delta }
    }

    pub fn quantize_float(&self, val: f32) -> u32 {
        let val = val * self.inverse_delta;
        (val + 0.5).floor().max(0.0) as u32
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Dequantizer {
    delta: f32,
}

impl Dequantizer {
    pub fn new(range: f32, max_quantized_value: u32) -> Option<Self> {
        if max_quantized_value > 0 {
            Some(Self {
                delta: range / max_quantized_value as f32,
            })
        } else {
            None
        }
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn dequantize_float(&self, val: u32) -> f32 {
        val as f32 * self.delta
    }
}

/// Quantization grid for a set of positions: `bits` per axis over the cube
/// starting at `min_values` with edge length `range`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizationParameters {
    pub bits: u8,
    pub min_values: [f32; 3],
    pub range: f32,
}

impl QuantizationParameters {
    /// Computes the grid that covers `positions`. The range is the largest
    /// extent over the three axes; a zero range (single point) becomes 1.
    pub fn compute(positions: &[[f32; 3]], bits: u8) -> StatusResult<Self> {
        check_bits(bits)?;
        let mut min_values = [f32::MAX; 3];
        let mut max_values = [f32::MIN; 3];
        for p in positions {
            for c in 0..3 {
                if !p[c].is_finite() {
                    return Err(codec_error("position has a non-finite coordinate"));
                }
                min_values[c] = min_values[c].min(p[c]);
                max_values[c] = max_values[c].max(p[c]);
            }
        }
        if positions.is_empty() {
            min_values = [0.0; 3];
            max_values = [0.0; 3];
        }

        let mut range = 0.0f32;
        for c in 0..3 {
            range = range.max(max_values[c] - min_values[c]);
        }
        if range == 0.0 {
            range = 1.0;
        }

        Ok(Self {
            bits,
            min_values,
            range,
        })
    }

    pub fn max_quantized_value(&self) -> u32 {
        ((1u64 << self.bits) - 1) as u32
    }

    pub fn quantizer(&self) -> Quantizer {
        Quantizer::new(self.range, self.max_quantized_value())
    }

    pub fn dequantizer(&self) -> StatusResult<Dequantizer> {
        Dequantizer::new(self.range, self.max_quantized_value())
            .ok_or_else(|| codec_error("invalid quantization range"))
    }

    pub fn quantize(&self, quantizer: &Quantizer, position: &[f32; 3]) -> [u32; 3] {
        let max = self.max_quantized_value();
        let mut out = [0u32; 3];
        for c in 0..3 {
            out[c] = quantizer
                .quantize_float(position[c] - self.min_values[c])
                .min(max);
        }
        out
    }

    pub fn dequantize(&self, dequantizer: &Dequantizer, value: &[u32; 3]) -> [f32; 3] {
        let mut out = [0f32; 3];
        for c in 0..3 {
            out[c] = dequantizer.dequantize_float(value[c]) + self.min_values[c];
        }
        out
    }
}

pub fn check_bits(bits: u8) -> StatusResult<()> {
    if (MIN_QUANTIZATION_BITS..=MAX_QUANTIZATION_BITS).contains(&bits) {
        Ok(())
    } else {
        Err(codec_error(format!(
            "quantization bits must be in {}..={}, got {}",
            MIN_QUANTIZATION_BITS, MAX_QUANTIZATION_BITS, bits
        )))
    }
}
