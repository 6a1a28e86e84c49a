//! LZW decompression (Compression = 5)
//!
//! TIFF-flavored LZW: codes are packed MSB-first, the clear code is
//! 256, end-of-information 257, and the code width grows one code
//! early ("early change"). Decoded bytes are served scanline by
//! scanline; the dictionary storage outlives a single strip so its
//! allocation is reused across the whole image.

use crate::compression::{fill_row, LineDecoder};
use crate::error::{Error, Result};
use crate::io::BitSource;

const CLEAR_CODE: u16 = 256;
const EOD_CODE: u16 = 257;
const FIRST_DYNAMIC: usize = 258;
const MAX_CODES: usize = 4096;

/// LZW dictionary storage, reusable across strips
pub struct LzwDict {
    entries: Vec<Vec<u8>>,
}

impl LzwDict {
    pub fn new() -> Self {
        let mut entries = Vec::with_capacity(MAX_CODES);
        for i in 0..256 {
            entries.push(vec![i as u8]);
        }
        // placeholders for the clear and EOD codes
        entries.push(Vec::new());
        entries.push(Vec::new());
        Self { entries }
    }

    fn reset(&mut self) {
        self.entries.truncate(FIRST_DYNAMIC);
    }
}

impl Default for LzwDict {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming LZW strip decoder
pub struct LzwDecoder<'a> {
    bits: BitSource<'a>,
    dict: &'a mut LzwDict,
    code_size: u32,
    prev: Option<u16>,
    pending: Vec<u8>,
    pending_pos: usize,
    done: bool,
    bits_per_sample: u16,
    invert: bool,
}

impl<'a> LzwDecoder<'a> {
    /// Creates a decoder over one strip, resetting `dict` state
    pub fn new(
        bits: BitSource<'a>,
        dict: &'a mut LzwDict,
        bits_per_sample: u16,
        invert: bool,
    ) -> Self {
        dict.reset();
        Self {
            bits,
            dict,
            code_size: 9,
            prev: None,
            pending: Vec::new(),
            pending_pos: 0,
            done: false,
            bits_per_sample,
            invert,
        }
    }

    fn next_byte(&mut self) -> Result<u8> {
        loop {
            if self.pending_pos < self.pending.len() {
                let b = self.pending[self.pending_pos];
                self.pending_pos += 1;
                return Ok(b);
            }
            if self.done {
                return Err(Error::CorruptData(
                    "LZW stream ended before the strip was full".to_string(),
                ));
            }
            self.pending.clear();
            self.pending_pos = 0;
            self.decode_code()?;
        }
    }

    /// Reads one code and appends its expansion to `pending`
    fn decode_code(&mut self) -> Result<()> {
        // early change: the width grows one code before the table fills
        if self.dict.entries.len() == (1 << self.code_size) - 1 && self.code_size < 12 {
            self.code_size += 1;
        }

        let code = self.bits.read_bits(self.code_size)? as u16;
        if code == EOD_CODE {
            self.done = true;
            return Ok(());
        }
        if code == CLEAR_CODE {
            self.dict.reset();
            self.code_size = 9;
            self.prev = None;
            return Ok(());
        }

        let entry = if (code as usize) < self.dict.entries.len() {
            self.dict.entries[code as usize].clone()
        } else if code as usize == self.dict.entries.len() {
            // the KwKwK case: the new entry is prev + prev[0]
            let prev = self.prev.ok_or_else(|| {
                Error::CorruptData("LZW code references an undefined entry".to_string())
            })?;
            let mut entry = self.dict.entries[prev as usize].clone();
            entry.push(entry[0]);
            entry
        } else {
            return Err(Error::CorruptData(format!("invalid LZW code {}", code)));
        };

        if let Some(prev) = self.prev {
            if self.dict.entries.len() < MAX_CODES {
                let mut new_entry = self.dict.entries[prev as usize].clone();
                new_entry.push(entry[0]);
                self.dict.entries.push(new_entry);
            }
        }
        self.prev = Some(code);
        self.pending = entry;
        Ok(())
    }
}

impl LineDecoder for LzwDecoder<'_> {
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

    // clear, 'A', 'B', code 258 ("AB"), code 260 ("ABA"), EOD at 9 bits
    const ABABABA: [u8; 7] = [0x80, 0x10, 0x48, 0x50, 0x28, 0x24, 0x04];

    fn decode_all(data: &[u8], len: usize) -> Result<Vec<u8>> {
        let mut dict = LzwDict::new();
        let mut decoder = LzwDecoder::new(BitSource::new(data, false), &mut dict, 8, false);
        let mut out = vec![0u8; len];
        decoder.decode_line(&mut out)?;
        Ok(out)
    }

    #[test]
    fn test_hand_built_stream() {
        assert_eq!(decode_all(&ABABABA, 7).unwrap(), b"ABABABA");
    }

    #[test]
    fn test_truncated_stream_is_corrupt() {
        assert!(matches!(
            decode_all(&ABABABA, 8),
            Err(Error::CorruptData(_))
        ));
    }

    #[test]
    fn test_dict_reuse_across_strips() {
        let mut dict = LzwDict::new();
        for _ in 0..2 {
            let mut decoder =
                LzwDecoder::new(BitSource::new(&ABABABA, false), &mut dict, 8, false);
            let mut out = vec![0u8; 7];
            decoder.decode_line(&mut out).unwrap();
            assert_eq!(&out, b"ABABABA");
        }
    }

    #[test]
    fn test_invert_complements_output() {
        let mut dict = LzwDict::new();
        let mut decoder = LzwDecoder::new(BitSource::new(&ABABABA, false), &mut dict, 8, true);
        let mut out = vec![0u8; 7];
        decoder.decode_line(&mut out).unwrap();
        let expected: Vec<u8> = b"ABABABA".iter().map(|b| !b).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_weezl_round_trip() {
        let source: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 251) as u8).collect();
        let compressed = weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
            .encode(&source)
            .unwrap();

        let mut dict = LzwDict::new();
        let mut decoder =
            LzwDecoder::new(BitSource::new(&compressed, false), &mut dict, 8, false);
        let mut out = vec![0u8; source.len()];
        decoder.decode_line(&mut out).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_rows_served_incrementally() {
        let mut dict = LzwDict::new();
        let mut decoder = LzwDecoder::new(BitSource::new(&ABABABA, false), &mut dict, 8, false);
        let mut row = vec![0u8; 3];
        decoder.decode_line(&mut row).unwrap();
        assert_eq!(&row, b"ABA");
        let mut row = vec![0u8; 4];
        decoder.decode_line(&mut row).unwrap();
        assert_eq!(&row, b"BABA");
    }
}
