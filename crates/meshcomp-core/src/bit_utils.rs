/// Appends values of a fixed bit width to a byte vector, LSB first.
#[derive(Debug, Default)]
pub struct BitEncoder {
    buffer: Vec<u8>,
    bit_offset: usize,
}

impl BitEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_bits(nbits: usize) -> Self {
        Self {
            buffer: Vec::with_capacity((nbits + 7) / 8),
            bit_offset: 0,
        }
    }

    pub fn put_bits(&mut self, data: u32, nbits: u32) {
        for i in 0..nbits {
            self.put_bit((data >> i) & 1);
        }
    }

    pub fn put_bit(&mut self, bit: u32) {
        let byte_offset = self.bit_offset / 8;
        let bit_shift = self.bit_offset % 8;
        if byte_offset == self.buffer.len() {
            self.buffer.push(0);
        }
        if bit != 0 {
            self.buffer[byte_offset] |= 1 << bit_shift;
        }
        self.bit_offset += 1;
    }

    pub fn bits(&self) -> usize {
        self.bit_offset
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

pub struct BitDecoder<'a> {
    buffer: &'a [u8],
    bit_offset: usize,
}

impl<'a> BitDecoder<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, bit_offset: 0 }
    }

    pub fn get_bits(&mut self, nbits: u32) -> Option<u32> {
        let mut value = 0;
        for i in 0..nbits {
            let bit = self.get_bit()?;
            value |= bit << i;
        }
        Some(value)
    }

    pub fn get_bit(&mut self) -> Option<u32> {
        let byte_offset = self.bit_offset / 8;
        let bit_shift = self.bit_offset % 8;
        let byte = self.buffer.get(byte_offset)?;
        self.bit_offset += 1;
        Some(((byte >> bit_shift) & 1) as u32)
    }

    pub fn bits_decoded(&self) -> usize {
        self.bit_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let mut encoder = BitEncoder::new();
        encoder.put_bits(0b101, 3);
        encoder.put_bits(0x3ff, 10);
        encoder.put_bits(0, 1);
        assert_eq!(encoder.bits(), 14);
        let bytes = encoder.into_bytes();
        assert_eq!(bytes.len(), 2);

        let mut decoder = BitDecoder::new(&bytes);
        assert_eq!(decoder.get_bits(3), Some(0b101));
        assert_eq!(decoder.get_bits(10), Some(0x3ff));
        assert_eq!(decoder.get_bits(1), Some(0));
        assert_eq!(decoder.bits_decoded(), 14);
        // Two padding bits remain, then the buffer runs out.
        assert_eq!(decoder.get_bits(2), Some(0));
        assert_eq!(decoder.get_bit(), None);
    }
}
