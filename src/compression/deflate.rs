//! Deflate/ZIP decompression (Compression = 8 and legacy 32946)
//!
//! The whole strip is inflated up front, then rows are served from the
//! inflated buffer through the common scanline interface.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::compression::{fill_row, LineDecoder};
use crate::error::{Error, Result};

/// Scanline reader over an inflated strip
pub struct DeflateDecoder {
    data: Vec<u8>,
    pos: usize,
    bits_per_sample: u16,
    invert: bool,
}

impl DeflateDecoder {
    /// Inflates the strip and prepares row serving
    pub fn new(compressed: &[u8], bits_per_sample: u16, invert: bool) -> Result<Self> {
        let mut decoder = ZlibDecoder::new(compressed);
        let mut data = Vec::new();
        decoder
            .read_to_end(&mut data)
            .map_err(|e| Error::CorruptData(format!("deflate stream: {}", e)))?;
        Ok(Self {
            data,
            pos: 0,
            bits_per_sample,
            invert,
        })
    }

    fn next_byte(&mut self) -> Result<u8> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| Error::CorruptData("inflated strip shorter than its rows".to_string()))?;
        self.pos += 1;
        Ok(b)
    }
}

impl LineDecoder for DeflateDecoder {
    fn decode_line(&mut self, dest: &mut [u8]) -> Result<()> {
        let bits_per_sample = self.bits_per_sample;
        let invert = self.invert;
        let mut src = || self.next_byte();
        fill_row(&mut src, dest, bits_per_sample, invert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_round_trip_rows() {
        let original: Vec<u8> = (0..24).collect();
        let compressed = deflate(&original);

        let mut decoder = DeflateDecoder::new(&compressed, 8, false).unwrap();
        for chunk in original.chunks(8) {
            let mut row = vec![0u8; 8];
            decoder.decode_line(&mut row).unwrap();
            assert_eq!(row, chunk);
        }
    }

    #[test]
    fn test_grayscale_invert() {
        let compressed = deflate(&[0x00, 0x10, 0xFF]);
        let mut decoder = DeflateDecoder::new(&compressed, 8, true).unwrap();
        let mut row = vec![0u8; 3];
        decoder.decode_line(&mut row).unwrap();
        assert_eq!(row, vec![0xFF, 0xEF, 0x00]);
    }

    #[test]
    fn test_bad_stream_is_corrupt() {
        assert!(matches!(
            DeflateDecoder::new(&[0xDE, 0xAD, 0xBE, 0xEF], 8, false),
            Err(Error::CorruptData(_))
        ));
    }

    #[test]
    fn test_short_inflated_strip() {
        let compressed = deflate(&[1, 2]);
        let mut decoder = DeflateDecoder::new(&compressed, 8, false).unwrap();
        let mut row = vec![0u8; 4];
        assert!(matches!(
            decoder.decode_line(&mut row),
            Err(Error::CorruptData(_))
        ));
    }
}
