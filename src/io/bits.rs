//! Bit-granular reading over strip buffers
//!
//! CCITT and LZW streams are bit-packed with no byte alignment between
//! codes. [`BitSource`] serves individual bits and MSB-first bit groups
//! out of an in-memory strip buffer, honoring the TIFF FillOrder tag.

use crate::error::{Error, Result};

/// A bit-level cursor over a byte slice
///
/// Bits are consumed MSB-first within each byte. When constructed with
/// `reversed_fill` (FillOrder = 2), every byte is bit-reversed on read,
/// which turns LSB-first streams back into the canonical order.
pub struct BitSource<'a> {
    data: &'a [u8],
    pos: usize,
    reversed_fill: bool,
}

impl<'a> BitSource<'a> {
    /// Creates a bit source over `data`
    pub fn new(data: &'a [u8], reversed_fill: bool) -> Self {
        Self { data, pos: 0, reversed_fill }
    }

    #[inline]
    fn byte(&self, index: usize) -> u8 {
        let b = self.data[index];
        if self.reversed_fill { b.reverse_bits() } else { b }
    }

    #[inline]
    fn bit_at(&self, pos: usize) -> u8 {
        (self.byte(pos >> 3) >> (7 - (pos & 7))) & 1
    }

    /// Total number of bits in the underlying buffer
    pub fn len_bits(&self) -> usize {
        self.data.len() * 8
    }

    /// Current bit offset from the start of the buffer
    pub fn bit_position(&self) -> usize {
        self.pos
    }

    /// Reads a single bit
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.pos >= self.len_bits() {
            return Err(Error::CorruptData("bit stream exhausted".to_string()));
        }
        let bit = self.bit_at(self.pos);
        self.pos += 1;
        Ok(bit != 0)
    }

    /// Reads `count` bits (at most 32) MSB-first into a `u32`
    pub fn read_bits(&mut self, count: u32) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            value = (value << 1) | self.read_bit()? as u32;
        }
        Ok(value)
    }

    /// Peeks at the next `count` bits without consuming them
    ///
    /// Positions past the end read as zero, so lookahead near the end of
    /// a strip never fails. Callers pad strip buffers accordingly.
    pub fn peek_bits(&self, count: u32) -> u32 {
        let mut value = 0u32;
        for i in 0..count as usize {
            let p = self.pos + i;
            let bit = if p < self.len_bits() { self.bit_at(p) } else { 0 };
            value = (value << 1) | bit as u32;
        }
        value
    }

    /// Skips `count` bits, saturating at the end of the buffer
    pub fn skip_bits(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.len_bits());
    }

    /// Reads the next 8 bits as a byte
    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Discards the remainder of the current byte
    pub fn align_byte(&mut self) {
        self.pos = (self.pos + 7) & !7;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits_msb_first() {
        let data = [0b1011_0001u8, 0b0100_0000];
        let mut bits = BitSource::new(&data, false);
        assert!(bits.read_bit().unwrap());
        assert!(!bits.read_bit().unwrap());
        assert_eq!(bits.read_bits(6).unwrap(), 0b110001);
        assert_eq!(bits.read_bits(2).unwrap(), 0b01);
        assert_eq!(bits.bit_position(), 10);
    }

    #[test]
    fn test_fill_order_reversal() {
        // 0x8D reversed bitwise is 0xB1
        let data = [0x8Du8];
        let mut bits = BitSource::new(&data, true);
        assert_eq!(bits.read_bits(8).unwrap(), 0xB1);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let data = [0b1100_0000u8];
        let mut bits = BitSource::new(&data, false);
        assert_eq!(bits.peek_bits(2), 0b11);
        assert_eq!(bits.peek_bits(4), 0b1100);
        assert!(bits.read_bit().unwrap());
        assert_eq!(bits.peek_bits(2), 0b10);
    }

    #[test]
    fn test_peek_past_end_pads_zero() {
        let data = [0xFFu8];
        let bits = BitSource::new(&data, false);
        assert_eq!(bits.peek_bits(12), 0b1111_1111_0000);
    }

    #[test]
    fn test_read_past_end_is_error() {
        let data = [0xAAu8];
        let mut bits = BitSource::new(&data, false);
        bits.skip_bits(8);
        assert!(matches!(bits.read_bit(), Err(Error::CorruptData(_))));
    }

    #[test]
    fn test_align_byte() {
        let data = [0xFFu8, 0x0F];
        let mut bits = BitSource::new(&data, false);
        bits.read_bits(3).unwrap();
        bits.align_byte();
        assert_eq!(bits.bit_position(), 8);
        assert_eq!(bits.read_byte().unwrap(), 0x0F);
        // aligning on a boundary is a no-op
        bits.align_byte();
        assert_eq!(bits.bit_position(), 16);
    }

    #[test]
    fn test_read_byte_across_boundary() {
        let data = [0b0000_1111u8, 0b1111_0000];
        let mut bits = BitSource::new(&data, false);
        bits.read_bits(4).unwrap();
        assert_eq!(bits.read_byte().unwrap(), 0xFF);
    }
}
