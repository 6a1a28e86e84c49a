//! PackBits decompression (Compression = 32773)
//!
//! Byte-oriented run-length coding. A control byte `n` as a signed
//! value means: `0..=127` copy `n + 1` literal bytes, `-127..=-1`
//! repeat the next byte `1 - n` times, `-128` is a no-op. Runs are not
//! required to stop at row boundaries within a strip.

use crate::compression::{fill_row, LineDecoder};
use crate::error::{Error, Result};

/// Streaming PackBits strip decoder
pub struct PackBitsDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    literal_remaining: usize,
    replicate_byte: u8,
    replicate_remaining: usize,
    bits_per_sample: u16,
    invert: bool,
}

impl<'a> PackBitsDecoder<'a> {
    /// Creates a decoder over one strip's bytes
    pub fn new(data: &'a [u8], bits_per_sample: u16, invert: bool) -> Self {
        Self {
            data,
            pos: 0,
            literal_remaining: 0,
            replicate_byte: 0,
            replicate_remaining: 0,
            bits_per_sample,
            invert,
        }
    }

    fn take(&mut self) -> Result<u8> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| Error::CorruptData("PackBits strip exhausted".to_string()))?;
        self.pos += 1;
        Ok(b)
    }

    fn next_byte(&mut self) -> Result<u8> {
        loop {
            if self.replicate_remaining > 0 {
                self.replicate_remaining -= 1;
                return Ok(self.replicate_byte);
            }
            if self.literal_remaining > 0 {
                self.literal_remaining -= 1;
                return self.take();
            }
            let control = self.take()? as i8;
            if control >= 0 {
                self.literal_remaining = control as usize + 1;
            } else if control != -128 {
                self.replicate_byte = self.take()?;
                self.replicate_remaining = (1 - control as isize) as usize;
            }
        }
    }
}

impl LineDecoder for PackBitsDecoder<'_> {
    fn decode_line(&mut self, dest: &mut [u8]) -> Result<()> {
        let bits_per_sample = self.bits_per_sample;
        let invert = self.invert;
        let mut src = || self.next_byte();
        fill_row(&mut src, dest, bits_per_sample, invert)
    }
}
