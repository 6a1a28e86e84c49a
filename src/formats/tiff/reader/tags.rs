//! Tag value reading operations

use std::io::{Read, Seek, SeekFrom};
use crate::error::Result;
use crate::io::{BufferedReader, SeekableReader};
use crate::io::byte_order::ByteOrderHandler;
use crate::formats::tiff::IFDEntry;

/// Handles reading tag values from TIFF files
pub struct TagReader<'a, R: SeekableReader> {
    reader: &'a mut BufferedReader<R>,
    handler: &'a dyn ByteOrderHandler,
    is_big_tiff: bool,
}

impl<'a, R: SeekableReader> TagReader<'a, R> {
    pub fn new(
        reader: &'a mut BufferedReader<R>,
        handler: &'a dyn ByteOrderHandler,
        is_big_tiff: bool,
    ) -> Self {
        Self {
            reader,
            handler,
            is_big_tiff,
        }
    }

    /// Reads tag values as u16 array
    pub fn read_u16s(&mut self, entry: &IFDEntry) -> Result<Vec<u16>> {
        self.seek_to_tag_data(entry)?;
        let mut values = Vec::with_capacity(entry.count as usize);

        for i in 0..entry.count {
            let value = self.read_single_u16(entry, i)?;
            values.push(value);
        }

        Ok(values)
    }

    /// Reads tag values as u32 array
    pub fn read_u32s(&mut self, entry: &IFDEntry) -> Result<Vec<u32>> {
        self.seek_to_tag_data(entry)?;
        let mut values = Vec::with_capacity(entry.count as usize);

        for i in 0..entry.count {
            let value = self.read_single_u32(entry, i)?;
            values.push(value);
        }

        Ok(values)
    }

    /// Reads tag values as u64 array
    pub fn read_u64s(&mut self, entry: &IFDEntry) -> Result<Vec<u64>> {
        self.seek_to_tag_data(entry)?;
        let mut values = Vec::with_capacity(entry.count as usize);

        for i in 0..entry.count {
            let value = self.read_single_u64(entry, i)?;
            values.push(value);
        }

        Ok(values)
    }

    /// Reads ASCII string from tag
    pub fn read_ascii(&mut self, entry: &IFDEntry) -> Result<String> {
        let bytes = self.read_ascii_bytes(entry)?;
        let s = String::from_utf8_lossy(&bytes)
            .trim_end_matches('\0')
            .to_string();
        Ok(s)
    }

    fn read_single_u16(&mut self, entry: &IFDEntry, index: u64) -> Result<u16> {
        if entry.is_inline(self.is_big_tiff) {
            return Ok(((entry.value_offset >> (index * 16)) & 0xFFFF) as u16);
        }
        Ok(self.handler.read_u16(self.reader)?)
    }

    fn read_single_u32(&mut self, entry: &IFDEntry, index: u64) -> Result<u32> {
        if !entry.is_inline(self.is_big_tiff) {
            return Ok(self.handler.read_u32(self.reader)?);
        }

        if index == 0 {
            return Ok((entry.value_offset & 0xFFFFFFFF) as u32);
        }
        Ok(((entry.value_offset >> 32) & 0xFFFFFFFF) as u32)
    }

    fn read_single_u64(&mut self, entry: &IFDEntry, index: u64) -> Result<u64> {
        if entry.is_inline(self.is_big_tiff) && index == 0 {
            return Ok(entry.value_offset);
        }
        Ok(self.handler.read_u64(self.reader)?)
    }

    fn read_ascii_bytes(&mut self, entry: &IFDEntry) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; entry.count as usize];

        if entry.is_inline(self.is_big_tiff) {
            let inline_bytes = entry.value_offset.to_le_bytes();
            bytes.copy_from_slice(&inline_bytes[..entry.count as usize]);
            return Ok(bytes);
        }

        self.reader.seek(SeekFrom::Start(entry.value_offset))?;
        self.reader.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn seek_to_tag_data(&mut self, entry: &IFDEntry) -> Result<()> {
        if !entry.is_inline(self.is_big_tiff) {
            self.reader.seek(SeekFrom::Start(entry.value_offset))?;
        }
        Ok(())
    }
}
