//! Uncompressed strip reading (Compression = 1)
//!
//! Rows are byte copies out of the strip buffer, routed through the
//! same scanline interface as the real decoders so the assembler does
//! not special-case them.

use crate::compression::{fill_row, LineDecoder};
use crate::error::{Error, Result};

/// Scanline reader over an uncompressed strip
pub struct RawDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    bits_per_sample: u16,
    invert: bool,
}

impl<'a> RawDecoder<'a> {
    pub fn new(data: &'a [u8], bits_per_sample: u16, invert: bool) -> Self {
        Self {
            data,
            pos: 0,
            bits_per_sample,
            invert,
        }
    }

    fn next_byte(&mut self) -> Result<u8> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| Error::CorruptData("strip shorter than its rows".to_string()))?;
        self.pos += 1;
        Ok(b)
    }
}

impl LineDecoder for RawDecoder<'_> {
    fn decode_line(&mut self, dest: &mut [u8]) -> Result<()> {
        let bits_per_sample = self.bits_per_sample;
        let invert = self.invert;
        let mut src = || self.next_byte();
        fill_row(&mut src, dest, bits_per_sample, invert)
    }
}
