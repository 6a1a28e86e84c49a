//! CCITT two-dimensional decoding (Compressions 3 and 4)
//!
//! T.6 (Group 4) codes every line against the previous one using mode
//! codes; T.4 (Group 3 with the 2D option) mixes 1D and 2D lines,
//! selected by a tag bit after each EOL. Both share the run tables and
//! the reference-line scan below.
//!
//! The decoders work directly in output bit space: `white` holds the
//! bit value a white pixel takes in the destination row, so ink
//! inversion for BlackIsZero images costs nothing extra.

use crate::compression::g3::{decode_line_1d, decode_run};
use crate::compression::huffman::{Mode2d, BLACK_CODES, MODE_CODES, ONE_RUNS, WHITE_CODES, ZERO_RUNS};
use crate::compression::{fill_span, LineDecoder};
use crate::error::{Error, Result};
use crate::io::BitSource;

#[inline]
fn bit_at(line: &[u8], pos: usize) -> bool {
    (line[pos / 8] >> (7 - pos % 8)) & 1 != 0
}

/// Length of the run of `bit`-valued pixels starting at `start`,
/// clamped to `width`. Scans whole bytes through the leading-run
/// tables rather than bit by bit.
fn run_length(line: &[u8], width: usize, start: usize, bit: bool) -> usize {
    let mut pos = start;
    while pos < width {
        let shift = pos % 8;
        let window = line[pos / 8] << shift;
        let avail = (8 - shift).min(width - pos);
        let count = if bit {
            ONE_RUNS[window as usize]
        } else {
            ZERO_RUNS[window as usize]
        } as usize;
        if count < avail {
            return pos + count - start;
        }
        pos += avail;
    }
    pos - start
}

/// Finds b1: the first changing element on the reference line strictly
/// right of `a0` whose pixel color is opposite the coding color.
///
/// The scan walks runs from the left edge (imaginary white run first),
/// so changing elements between same-color runs cannot occur and the
/// color filter skips the remaining same-color transitions.
fn find_b1(ref_line: &[u8], width: usize, white: bool, a0: isize, color: bool) -> usize {
    let mut pos = 0usize;
    let mut run_color = white;
    loop {
        let run = run_length(ref_line, width, pos, run_color);
        let next = pos + run;
        if next >= width {
            return width;
        }
        if next as isize > a0 && run_color == color {
            return next;
        }
        pos = next;
        run_color = !run_color;
    }
}

/// Decodes one two-dimensional line against `ref_line` into the
/// pre-zeroed packed row `dest`, then promotes `dest` to the new
/// reference line.
fn decode_line_2d(
    bits: &mut BitSource,
    dest: &mut [u8],
    ref_line: &mut [u8],
    width: usize,
    white: bool,
) -> Result<()> {
    dest.fill(0);
    let mut a0: isize = -1;
    let mut color = white;
    while a0 < width as isize {
        let b1 = find_b1(ref_line, width, white, a0, color);
        let b2 = if b1 >= width {
            width
        } else {
            b1 + run_length(ref_line, width, b1, bit_at(ref_line, b1))
        };
        let start = a0.max(0) as usize;

        match *MODE_CODES.decode(bits)? {
            Mode2d::Pass => {
                if color {
                    fill_span(dest, start, b2);
                }
                a0 = b2 as isize;
            }
            Mode2d::Horizontal => {
                let first_table = if color == white { &*WHITE_CODES } else { &*BLACK_CODES };
                let second_table = if color == white { &*BLACK_CODES } else { &*WHITE_CODES };
                let first = decode_run(bits, first_table)?;
                let second = decode_run(bits, second_table)?;
                let end1 = (start + first).min(width);
                if color {
                    fill_span(dest, start, end1);
                }
                let end2 = (end1 + second).min(width);
                if !color {
                    fill_span(dest, end1, end2);
                }
                a0 = end2 as isize;
            }
            Mode2d::Vertical(d) => {
                let a1 = (b1 as isize + d as isize).clamp(0, width as isize) as usize;
                if color {
                    fill_span(dest, start, a1);
                }
                a0 = a1 as isize;
                color = !color;
            }
            Mode2d::EndOfLine => {
                return Err(Error::CorruptData("EOL inside a coded line".to_string()));
            }
        }
    }
    ref_line.copy_from_slice(dest);
    Ok(())
}

fn white_reference(width: usize, white: bool) -> Vec<u8> {
    vec![if white { 0xFF } else { 0x00 }; (width + 7) / 8]
}

/// T.6 Group 4 scanline decoder
pub struct Group4Decoder<'a> {
    bits: BitSource<'a>,
    width: usize,
    white: bool,
    ref_line: Vec<u8>,
}

impl<'a> Group4Decoder<'a> {
    /// Creates a decoder over one strip's bit stream
    ///
    /// The reference line starts as an imaginary all-white row. When
    /// `invert` is set, white pixels emit 1 bits.
    pub fn new(bits: BitSource<'a>, width: usize, invert: bool) -> Self {
        Self {
            bits,
            width,
            white: invert,
            ref_line: white_reference(width, invert),
        }
    }

    #[cfg(test)]
    pub(crate) fn reference_line(&self) -> &[u8] {
        &self.ref_line
    }
}

impl LineDecoder for Group4Decoder<'_> {
    fn decode_line(&mut self, dest: &mut [u8]) -> Result<()> {
        decode_line_2d(&mut self.bits, dest, &mut self.ref_line, self.width, self.white)
    }
}

/// T.4 Group 3 scanline decoder with the optional 2D extension
///
/// Lines are framed by EOL codes with zero fill bits; when the
/// two-dimensional option is active, a tag bit after each EOL selects
/// the coding of the following line.
pub struct Group3MixedDecoder<'a> {
    bits: BitSource<'a>,
    width: usize,
    white: bool,
    two_dim: bool,
    ref_line: Vec<u8>,
}

impl<'a> Group3MixedDecoder<'a> {
    /// Creates a decoder; `two_dim` reflects T4Options bit 0
    pub fn new(bits: BitSource<'a>, width: usize, invert: bool, two_dim: bool) -> Self {
        Self {
            bits,
            width,
            white: invert,
            two_dim,
            ref_line: white_reference(width, invert),
        }
    }

    /// Skips fill bits and consumes one EOL code if present
    ///
    /// Returns whether an EOL was consumed. Writers are split on
    /// emitting the leading EOL, so its absence is tolerated.
    fn consume_eol(&mut self) -> Result<bool> {
        while self.bits.peek_bits(12) == 0 {
            self.bits.read_bit()?;
        }
        if self.bits.peek_bits(12) == 1 {
            self.bits.skip_bits(12);
            return Ok(true);
        }
        Ok(false)
    }
}

impl LineDecoder for Group3MixedDecoder<'_> {
    fn decode_line(&mut self, dest: &mut [u8]) -> Result<()> {
        let saw_eol = self.consume_eol()?;
        // without an EOL there is no tag bit; such lines are 1D
        let two_dim_line = if self.two_dim && saw_eol {
            !self.bits.read_bit()?
        } else {
            false
        };

        if two_dim_line {
            decode_line_2d(&mut self.bits, dest, &mut self.ref_line, self.width, self.white)
        } else {
            decode_line_1d(&mut self.bits, dest, self.width, self.white)?;
            self.ref_line.copy_from_slice(dest);
            Ok(())
        }
    }
}
