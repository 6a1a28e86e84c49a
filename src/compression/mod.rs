//! Strip and tile decompression
//!
//! Each supported TIFF compression scheme exposes a [`LineDecoder`]
//! that produces one scanline at a time from an in-memory strip or tile
//! buffer. The assembler drives the decoder row by row and owns
//! everything above the scanline level (predictor, orientation,
//! placement).

pub mod huffman;
pub mod g3;
pub mod g4;
pub mod lzw;
pub mod packbits;
pub mod raw;
pub mod deflate;

use crate::error::{Error, Result};

/// Compression types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// No compression
    None,
    /// CCITT Group 3 one-dimensional (modified Huffman RLE)
    CcittRle,
    /// CCITT T.4 Group 3 fax, optionally two-dimensional
    Group3Fax,
    /// CCITT T.6 Group 4 fax
    Group4Fax,
    /// LZW compression
    Lzw,
    /// Deflate/ZIP compression
    Deflate,
    /// PackBits compression
    PackBits,
}

impl Compression {
    /// Creates compression from TIFF compression tag value
    pub fn from_tag(value: u64) -> Result<Self> {
        match value {
            1 => Ok(Compression::None),
            2 => Ok(Compression::CcittRle),
            3 => Ok(Compression::Group3Fax),
            4 => Ok(Compression::Group4Fax),
            5 => Ok(Compression::Lzw),
            8 | 32946 => Ok(Compression::Deflate),
            32773 => Ok(Compression::PackBits),
            6 | 7 => Err(Error::Unsupported("JPEG compression".to_string())),
            _ => Err(Error::Unsupported(format!("Compression type {}", value))),
        }
    }

    /// Returns the name of this compression type
    pub fn name(&self) -> &'static str {
        match self {
            Compression::None => "None",
            Compression::CcittRle => "CCITT RLE",
            Compression::Group3Fax => "CCITT Group 3",
            Compression::Group4Fax => "CCITT Group 4",
            Compression::Lzw => "LZW",
            Compression::Deflate => "Deflate/ZIP",
            Compression::PackBits => "PackBits",
        }
    }

    /// True for the CCITT fax family, which is inherently bilevel
    pub fn is_ccitt(&self) -> bool {
        matches!(
            self,
            Compression::CcittRle | Compression::Group3Fax | Compression::Group4Fax
        )
    }
}

/// Produces decoded scanlines from a compressed strip or tile
///
/// For CCITT decoders `dest` is a bit-packed row of `(width + 7) / 8`
/// bytes. For byte-oriented decoders `dest` holds one byte per sample,
/// except 1-bit data which stays packed.
pub trait LineDecoder {
    /// Decodes the next scanline into `dest`
    fn decode_line(&mut self, dest: &mut [u8]) -> Result<()>;
}

/// Fills one scanline from a byte-at-a-time source, expanding 4-bit
/// samples to one byte per sample and applying the photometric
/// complement when `invert` is set.
pub(crate) fn fill_row(
    src: &mut dyn FnMut() -> Result<u8>,
    dest: &mut [u8],
    bits_per_sample: u16,
    invert: bool,
) -> Result<()> {
    match bits_per_sample {
        4 => {
            let n = dest.len();
            let mut i = 0;
            while i < n {
                let mut v = src()?;
                if invert {
                    v = !v;
                }
                dest[i] = v >> 4;
                i += 1;
                if i < n {
                    dest[i] = v & 0x0F;
                    i += 1;
                }
            }
        }
        1 | 8 => {
            for b in dest.iter_mut() {
                let v = src()?;
                *b = if invert { !v } else { v };
            }
        }
        other => {
            return Err(Error::Unsupported(format!(
                "{} bits per sample",
                other
            )));
        }
    }
    Ok(())
}

/// Sets the bits `[start, end)` of a packed scanline to 1
pub(crate) fn fill_span(dest: &mut [u8], start: usize, end: usize) {
    for i in start..end {
        dest[i / 8] |= 0x80 >> (i % 8);
    }
}
