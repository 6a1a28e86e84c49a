//! CCITT Group 3 one-dimensional decoding (Compression = 2)
//!
//! Modified Huffman RLE: each scanline is a sequence of alternating
//! white and black run-length codes starting with white, and every
//! scanline begins on a byte boundary.

use crate::compression::huffman::{CodeTable, RunCode, BLACK_CODES, WHITE_CODES};
use crate::compression::{fill_span, LineDecoder};
use crate::error::Result;
use crate::io::BitSource;

/// Decodes one run length, chaining make-up codes onto the following
/// code until a terminating code completes the run.
pub(crate) fn decode_run(bits: &mut BitSource, table: &CodeTable<RunCode>) -> Result<usize> {
    let mut total = 0usize;
    loop {
        let code = table.decode(bits)?;
        total += code.length as usize;
        if !code.makeup {
            return Ok(total);
        }
    }
}

/// Decodes one scanline of alternating run-length codes into a
/// pre-zeroed packed row. Shared with the T.4 mixed decoder, which
/// frames 1D lines with EOL codes instead of byte alignment.
pub(crate) fn decode_line_1d(
    bits: &mut BitSource,
    dest: &mut [u8],
    width: usize,
    invert: bool,
) -> Result<()> {
    dest.fill(0);
    let mut pos = 0usize;
    let mut white = true;
    while pos < width {
        let table = if white { &*WHITE_CODES } else { &*BLACK_CODES };
        let run = decode_run(bits, table)?;
        // runs past the margin are clamped
        let end = (pos + run).min(width);
        if white == invert {
            fill_span(dest, pos, end);
        }
        pos = end;
        white = !white;
    }
    Ok(())
}

/// One-dimensional Group 3 scanline decoder
pub struct Group3Decoder<'a> {
    bits: BitSource<'a>,
    width: usize,
    invert: bool,
}

impl<'a> Group3Decoder<'a> {
    /// Creates a decoder over one strip's bit stream
    ///
    /// When `invert` is set the ink color is swapped, so white runs
    /// produce 1 bits (BlackIsZero bilevel data).
    pub fn new(bits: BitSource<'a>, width: usize, invert: bool) -> Self {
        Self { bits, width, invert }
    }
}

impl LineDecoder for Group3Decoder<'_> {
    fn decode_line(&mut self, dest: &mut [u8]) -> Result<()> {
        decode_line_1d(&mut self.bits, dest, self.width, self.invert)?;
        self.bits.align_byte();
        Ok(())
    }
}
