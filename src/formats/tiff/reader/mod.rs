//! TIFF reader modules

pub mod tags;
pub mod assembler;

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use memmap2::Mmap;
use crate::error::{Error, Result};
use crate::formats::tiff::tags::field_types;
use crate::formats::tiff::{Tiff, IFD, IFDEntry, BIGTIFF_MAGIC, TIFF_MAGIC};
use crate::io::{BufferedReader, ByteOrder};
use crate::raster::Raster;

use self::assembler::StripTileAssembler;
use self::tags::TagReader;

/// TIFF file reader
///
/// Walks the IFD chain and decodes images through the
/// [`StripTileAssembler`]. Strip and tile bytes come from a memory map
/// when available, falling back to buffered seeks.
#[derive(Debug)]
pub struct TiffReader {
    reader: BufferedReader<File>,
    mmap: Option<Mmap>,
    byte_order: ByteOrder,
    is_big_tiff: bool,
}

impl TiffReader {
    /// Opens a TIFF file for reading with default options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, true)
    }

    /// Opens a TIFF file with custom options
    ///
    /// # Arguments
    /// * `path` - Path to the TIFF file
    /// * `use_mmap` - Whether to use memory mapping (faster for large files)
    pub fn open_with_options<P: AsRef<Path>>(path: P, use_mmap: bool) -> Result<Self> {
        let file = File::open(&path)?;
        let mut reader = BufferedReader::new(file);

        let byte_order = ByteOrder::detect(&mut reader)?;
        let handler = byte_order.handler();

        let magic = handler.read_u16(&mut reader)?;

        let is_big_tiff = match magic {
            TIFF_MAGIC => false,
            BIGTIFF_MAGIC => true,
            _ => return Err(Error::InvalidMagic(magic)),
        };

        if is_big_tiff {
            let offset_size = handler.read_u16(&mut reader)?;
            if offset_size != 8 {
                return Err(Error::InvalidFormat(
                    format!("Invalid BigTIFF offset size: {}", offset_size)
                ));
            }
            let _reserved = handler.read_u16(&mut reader)?;
        }

        let mmap = if use_mmap {
            let file_for_mmap = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file_for_mmap)? };

            #[cfg(unix)]
            unsafe {
                libc::madvise(
                    mmap.as_ptr() as *mut libc::c_void,
                    mmap.len(),
                    libc::MADV_SEQUENTIAL | libc::MADV_WILLNEED,
                );
            }

            Some(mmap)
        } else {
            None
        };

        Ok(Self {
            reader,
            mmap,
            byte_order,
            is_big_tiff,
        })
    }

    /// Reads the TIFF file and returns the structure
    pub fn read(&mut self) -> Result<Tiff> {
        let mut tiff = Tiff::new(self.is_big_tiff);
        let mut next_ifd_offset = self.read_first_ifd_offset()?;
        let mut ifd_number = 0;

        while next_ifd_offset != 0 {
            if ifd_number > 1000 {
                return Err(Error::InvalidFormat("Too many IFDs".to_string()));
            }

            let ifd = self.read_ifd(ifd_number, next_ifd_offset)?;
            let entries_end = self.calculate_entries_end(next_ifd_offset, ifd.entry_count() as u64);

            next_ifd_offset = self.read_next_ifd_offset(entries_end)?;
            tiff.add_ifd(ifd);
            ifd_number += 1;
        }

        Ok(tiff)
    }

    /// Helper: Reads first IFD offset
    fn read_first_ifd_offset(&mut self) -> Result<u64> {
        let handler = self.byte_order.handler();
        let header_len = if self.is_big_tiff { 8 } else { 4 };
        self.reader.seek(SeekFrom::Start(header_len))?;

        if self.is_big_tiff {
            Ok(handler.read_u64(&mut self.reader)?)
        } else {
            Ok(handler.read_u32(&mut self.reader)? as u64)
        }
    }

    /// Helper: Reads next IFD offset from current position
    fn read_next_ifd_offset(&mut self, entries_end: u64) -> Result<u64> {
        let handler = self.byte_order.handler();
        self.reader.seek(SeekFrom::Start(entries_end))?;

        if self.is_big_tiff {
            Ok(handler.read_u64(&mut self.reader)?)
        } else {
            Ok(handler.read_u32(&mut self.reader)? as u64)
        }
    }

    /// Helper: Calculates the offset where next IFD pointer is located
    fn calculate_entries_end(&self, ifd_offset: u64, entry_count: u64) -> u64 {
        let entry_size = if self.is_big_tiff { 20 } else { 12 };
        let header_size = if self.is_big_tiff { 8 } else { 2 };
        ifd_offset + header_size + (entry_count * entry_size)
    }

    /// Reads a single IFD at the given offset
    fn read_ifd(&mut self, number: usize, offset: u64) -> Result<IFD> {
        let handler = self.byte_order.handler();
        self.reader.seek(SeekFrom::Start(offset))?;

        let entry_count = if self.is_big_tiff {
            handler.read_u64(&mut self.reader)?
        } else {
            handler.read_u16(&mut self.reader)? as u64
        };

        let mut ifd = IFD::new(number, offset);

        for _ in 0..entry_count {
            let tag = handler.read_u16(&mut self.reader)?;
            let field_type = handler.read_u16(&mut self.reader)?;

            let count = if self.is_big_tiff {
                handler.read_u64(&mut self.reader)?
            } else {
                handler.read_u32(&mut self.reader)? as u64
            };

            let value_offset = if self.is_big_tiff {
                handler.read_u64(&mut self.reader)?
            } else {
                handler.read_u32(&mut self.reader)? as u64
            };
            let mut entry = IFDEntry::new(tag, field_type, count, value_offset);
            entry.value_offset = self.normalize_inline(&entry);
            ifd.add_entry(entry);
        }

        Ok(ifd)
    }

    /// Big-endian files left-justify sub-word inline values inside the
    /// value field; shift them so accessors see the value itself
    fn normalize_inline(&self, entry: &IFDEntry) -> u64 {
        let value = entry.value_offset;
        if self.byte_order != ByteOrder::BigEndian || !entry.is_inline(self.is_big_tiff) {
            return value;
        }
        let field_bits = if self.is_big_tiff { 64u64 } else { 32 };
        match (entry.field_type_size() * 8, entry.count) {
            (8, 1) => value >> (field_bits - 8),
            (16, 1) => value >> (field_bits - 16),
            (16, n @ 2..=4) => {
                // Relocate each left-justified halfword down to the
                // position the extraction convention expects.
                let mut out = 0u64;
                for i in 0..n {
                    let half = (value >> (field_bits - 16 * (i + 1))) & 0xFFFF;
                    out |= half << (16 * i);
                }
                out
            }
            (32, 1) if self.is_big_tiff => value >> 32,
            (32, 2) if self.is_big_tiff => (value >> 32) | (value << 32),
            _ => value,
        }
    }

    /// Reads tag values as u16 array
    pub fn read_tag_u16s(&mut self, entry: &IFDEntry) -> Result<Vec<u16>> {
        let handler = self.byte_order.handler();
        let mut tag_reader = TagReader::new(&mut self.reader, &*handler, self.is_big_tiff);
        tag_reader.read_u16s(entry)
    }

    /// Reads tag values as u32 array
    pub fn read_tag_u32s(&mut self, entry: &IFDEntry) -> Result<Vec<u32>> {
        let handler = self.byte_order.handler();
        let mut tag_reader = TagReader::new(&mut self.reader, &*handler, self.is_big_tiff);
        tag_reader.read_u32s(entry)
    }

    /// Reads tag values as u64 array
    pub fn read_tag_u64s(&mut self, entry: &IFDEntry) -> Result<Vec<u64>> {
        let handler = self.byte_order.handler();
        let mut tag_reader = TagReader::new(&mut self.reader, &*handler, self.is_big_tiff);
        tag_reader.read_u64s(entry)
    }

    /// Reads ASCII string from tag
    pub fn read_tag_ascii(&mut self, entry: &IFDEntry) -> Result<String> {
        let handler = self.byte_order.handler();
        let mut tag_reader = TagReader::new(&mut self.reader, &*handler, self.is_big_tiff);
        tag_reader.read_ascii(entry)
    }

    /// Decodes the image described by `ifd` into a raster
    pub fn read_image(&mut self, ifd: &IFD) -> Result<Raster> {
        let bits = self.resolve_bits_per_sample(ifd)?;
        let (offsets, byte_counts) = self.resolve_segments(ifd)?;

        let assembler = StripTileAssembler::new(ifd, bits, offsets, byte_counts)?;
        assembler.assemble(|offset, len| self.read_bytes(offset, len))
    }

    /// Reads raw file bytes through the mmap or the buffered reader
    fn read_bytes(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        if let Some(mmap) = &self.mmap {
            let start = offset as usize;
            let end = start.checked_add(len).ok_or_else(|| {
                Error::OutOfBounds(format!("Segment at {} overflows", offset))
            })?;
            if end > mmap.len() {
                return Err(Error::OutOfBounds(format!(
                    "Segment at {} ({} bytes) exceeds file size {}",
                    offset, len, mmap.len()
                )));
            }
            return Ok(mmap[start..end].to_vec());
        }

        self.reader.seek(SeekFrom::Start(offset))?;
        Ok(self.reader.read_chunk(len)?)
    }

    /// Resolves the per-sample bit width, reading the full array when
    /// the tag holds one value per sample
    fn resolve_bits_per_sample(&mut self, ifd: &IFD) -> Result<u16> {
        let entry = match ifd.get_entry(crate::formats::tiff::tags::BITS_PER_SAMPLE) {
            Some(entry) => entry.clone(),
            None => return Ok(1),
        };
        if entry.count <= 1 {
            return Ok(entry.value_offset as u16);
        }

        let values = self.read_tag_u16s(&entry)?;
        let first = values[0];
        if values.iter().any(|&v| v != first) {
            return Err(Error::Unsupported(
                "Heterogeneous bits per sample".to_string(),
            ));
        }
        Ok(first)
    }

    /// Resolves strip or tile offset and byte count arrays
    ///
    /// Some writers emit tiled images with strip-tagged arrays, so the
    /// tile tags fall back to the strip tags.
    fn resolve_segments(&mut self, ifd: &IFD) -> Result<(Vec<u64>, Vec<u64>)> {
        use crate::formats::tiff::tags;

        let (offsets_entry, counts_entry) = if ifd.is_tiled() {
            (
                ifd.get_entry(tags::TILE_OFFSETS)
                    .or_else(|| ifd.get_entry(tags::STRIP_OFFSETS)),
                ifd.get_entry(tags::TILE_BYTE_COUNTS)
                    .or_else(|| ifd.get_entry(tags::STRIP_BYTE_COUNTS)),
            )
        } else {
            (
                ifd.get_entry(tags::STRIP_OFFSETS),
                ifd.get_entry(tags::STRIP_BYTE_COUNTS),
            )
        };

        let offsets_entry = offsets_entry
            .ok_or(Error::MissingTag(tags::STRIP_OFFSETS))?
            .clone();
        let counts_entry = counts_entry
            .ok_or(Error::MissingTag(tags::STRIP_BYTE_COUNTS))?
            .clone();

        let offsets = self.read_tag_offsets(&offsets_entry)?;
        let byte_counts = self.read_tag_offsets(&counts_entry)?;
        Ok((offsets, byte_counts))
    }

    fn read_tag_offsets(&mut self, entry: &IFDEntry) -> Result<Vec<u64>> {
        match entry.field_type {
            field_types::SHORT => Ok(self
                .read_tag_u16s(entry)?
                .into_iter()
                .map(u64::from)
                .collect()),
            field_types::LONG => Ok(self
                .read_tag_u32s(entry)?
                .into_iter()
                .map(u64::from)
                .collect()),
            field_types::LONG8 => self.read_tag_u64s(entry),
            other => Err(Error::InvalidFormat(format!(
                "Unexpected offset field type {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use crate::formats::tiff::tags;

    struct TiffBuilder {
        data: Vec<u8>,
        entries: Vec<(u16, u16, u32, u32)>,
    }

    impl TiffBuilder {
        fn new() -> Self {
            // classic little-endian header, IFD offset patched at the end
            let mut data = Vec::new();
            data.extend_from_slice(b"II");
            data.extend_from_slice(&42u16.to_le_bytes());
            data.extend_from_slice(&0u32.to_le_bytes());
            Self {
                data,
                entries: Vec::new(),
            }
        }

        fn short(mut self, tag: u16, value: u16) -> Self {
            self.entries
                .push((tag, tags::field_types::SHORT, 1, value as u32));
            self
        }

        fn long(mut self, tag: u16, value: u32) -> Self {
            self.entries.push((tag, tags::field_types::LONG, 1, value));
            self
        }

        fn longs(mut self, tag: u16, values: &[u32]) -> Self {
            let offset = self.data.len() as u32;
            for v in values {
                self.data.extend_from_slice(&v.to_le_bytes());
            }
            self.entries
                .push((tag, tags::field_types::LONG, values.len() as u32, offset));
            self
        }

        fn bytes(mut self, payload: &[u8]) -> (Self, u32) {
            let offset = self.data.len() as u32;
            self.data.extend_from_slice(payload);
            if self.data.len() % 2 != 0 {
                self.data.push(0);
            }
            (self, offset)
        }

        fn build(mut self) -> NamedTempFile {
            let ifd_offset = self.data.len() as u32;
            self.data[4..8].copy_from_slice(&ifd_offset.to_le_bytes());

            self.entries.sort_by_key(|e| e.0);
            self.data
                .extend_from_slice(&(self.entries.len() as u16).to_le_bytes());
            for (tag, field_type, count, value) in &self.entries {
                self.data.extend_from_slice(&tag.to_le_bytes());
                self.data.extend_from_slice(&field_type.to_le_bytes());
                self.data.extend_from_slice(&count.to_le_bytes());
                self.data.extend_from_slice(&value.to_le_bytes());
            }
            self.data.extend_from_slice(&0u32.to_le_bytes());

            let mut file = NamedTempFile::new().unwrap();
            file.write_all(&self.data).unwrap();
            file.flush().unwrap();
            file
        }
    }

    fn create_minimal_tiff() -> NamedTempFile {
        TiffBuilder::new().long(tags::IMAGE_WIDTH, 1024).build()
    }

    #[test]
    fn test_open_tiff() {
        let file = create_minimal_tiff();
        let reader = TiffReader::open(file.path());
        assert!(reader.is_ok());
        let reader = reader.unwrap();
        assert!(!reader.is_big_tiff);
    }

    #[test]
    fn test_read_tiff() {
        let file = create_minimal_tiff();
        let mut reader = TiffReader::open(file.path()).unwrap();
        let tiff = reader.read().unwrap();
        assert!(!tiff.is_big_tiff);
        assert_eq!(tiff.ifd_count(), 1);
        assert_eq!(
            tiff.main_ifd().unwrap().get_tag_value(tags::IMAGE_WIDTH),
            Some(1024)
        );
    }

    #[test]
    fn test_open_invalid_magic() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"II").unwrap();
        file.write_all(&99u16.to_le_bytes()).unwrap();
        file.write_all(&8u32.to_le_bytes()).unwrap();
        file.flush().unwrap();

        let err = TiffReader::open(file.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic(99)));
    }

    #[test]
    fn test_big_endian_inline_shorts() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"MM").unwrap();
        file.write_all(&42u16.to_be_bytes()).unwrap();
        file.write_all(&8u32.to_be_bytes()).unwrap();
        file.write_all(&1u16.to_be_bytes()).unwrap();
        // ImageWidth as an inline SHORT, left-justified in the field
        file.write_all(&tags::IMAGE_WIDTH.to_be_bytes()).unwrap();
        file.write_all(&tags::field_types::SHORT.to_be_bytes()).unwrap();
        file.write_all(&1u32.to_be_bytes()).unwrap();
        file.write_all(&640u16.to_be_bytes()).unwrap();
        file.write_all(&0u16.to_be_bytes()).unwrap();
        file.write_all(&0u32.to_be_bytes()).unwrap();
        file.flush().unwrap();

        let mut reader = TiffReader::open(file.path()).unwrap();
        let tiff = reader.read().unwrap();
        assert_eq!(
            tiff.main_ifd().unwrap().get_tag_value(tags::IMAGE_WIDTH),
            Some(640)
        );
    }

    #[test]
    fn test_big_endian_bigtiff_inline_short_array() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"MM").unwrap();
        file.write_all(&43u16.to_be_bytes()).unwrap();
        file.write_all(&8u16.to_be_bytes()).unwrap();
        file.write_all(&0u16.to_be_bytes()).unwrap();
        file.write_all(&16u64.to_be_bytes()).unwrap();
        file.write_all(&1u64.to_be_bytes()).unwrap();
        // BitsPerSample [8, 8, 8] inline in the 8-byte value field
        file.write_all(&tags::BITS_PER_SAMPLE.to_be_bytes()).unwrap();
        file.write_all(&tags::field_types::SHORT.to_be_bytes()).unwrap();
        file.write_all(&3u64.to_be_bytes()).unwrap();
        file.write_all(&[0, 8, 0, 8, 0, 8, 0, 0]).unwrap();
        file.write_all(&0u64.to_be_bytes()).unwrap();
        file.flush().unwrap();

        let mut reader = TiffReader::open(file.path()).unwrap();
        let tiff = reader.read().unwrap();
        let ifd = tiff.main_ifd().unwrap();
        let entry = ifd.get_entry(tags::BITS_PER_SAMPLE).unwrap();
        assert_eq!(reader.read_tag_u16s(entry).unwrap(), vec![8, 8, 8]);
    }

    #[test]
    fn test_decode_group4_file() {
        let (builder, strip) = TiffBuilder::new().bytes(&[0x26, 0xBF, 0x8E]);
        let file = builder
            .long(tags::IMAGE_WIDTH, 4)
            .long(tags::IMAGE_LENGTH, 4)
            .short(tags::BITS_PER_SAMPLE, 1)
            .short(tags::COMPRESSION, 4)
            .short(tags::PHOTOMETRIC_INTERPRETATION, 1)
            .long(tags::STRIP_OFFSETS, strip)
            .long(tags::ROWS_PER_STRIP, 4)
            .long(tags::STRIP_BYTE_COUNTS, 3)
            .build();

        let mut reader = TiffReader::open(file.path()).unwrap();
        let tiff = reader.read().unwrap();
        let raster = reader.read_image(tiff.main_ifd().unwrap()).unwrap();

        assert!(raster.packed);
        assert_eq!(raster.data, vec![0xC0, 0xC0, 0x00, 0x00]);
    }

    #[test]
    fn test_decode_without_mmap() {
        let (builder, strip) = TiffBuilder::new().bytes(&[1, 2, 3, 4, 5, 6]);
        let file = builder
            .long(tags::IMAGE_WIDTH, 3)
            .long(tags::IMAGE_LENGTH, 2)
            .short(tags::BITS_PER_SAMPLE, 8)
            .long(tags::STRIP_OFFSETS, strip)
            .long(tags::STRIP_BYTE_COUNTS, 6)
            .build();

        let mut reader = TiffReader::open_with_options(file.path(), false).unwrap();
        let tiff = reader.read().unwrap();
        let raster = reader.read_image(tiff.main_ifd().unwrap()).unwrap();
        assert_eq!(raster.data, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_decode_tiled_file() {
        let (builder, tiles) = TiffBuilder::new().bytes(&[1, 2, 4, 5, 3, 0, 6, 0]);
        let file = builder
            .long(tags::IMAGE_WIDTH, 3)
            .long(tags::IMAGE_LENGTH, 2)
            .short(tags::BITS_PER_SAMPLE, 8)
            .long(tags::TILE_WIDTH, 2)
            .long(tags::TILE_LENGTH, 2)
            .longs(tags::TILE_OFFSETS, &[tiles, tiles + 4])
            .longs(tags::TILE_BYTE_COUNTS, &[4, 4])
            .build();

        let mut reader = TiffReader::open(file.path()).unwrap();
        let tiff = reader.read().unwrap();
        let raster = reader.read_image(tiff.main_ifd().unwrap()).unwrap();
        assert_eq!(raster.data, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_decode_deflate_with_predictor() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression as Flate;

        let mut enc = ZlibEncoder::new(Vec::new(), Flate::default());
        enc.write_all(&[10, 5, 3, 255]).unwrap();
        let compressed = enc.finish().unwrap();

        let (builder, strip) = TiffBuilder::new().bytes(&compressed);
        let file = builder
            .long(tags::IMAGE_WIDTH, 4)
            .long(tags::IMAGE_LENGTH, 1)
            .short(tags::BITS_PER_SAMPLE, 8)
            .short(tags::COMPRESSION, 8)
            .short(tags::PREDICTOR, 2)
            .long(tags::STRIP_OFFSETS, strip)
            .long(tags::STRIP_BYTE_COUNTS, compressed.len() as u32)
            .build();

        let mut reader = TiffReader::open(file.path()).unwrap();
        let tiff = reader.read().unwrap();
        let raster = reader.read_image(tiff.main_ifd().unwrap()).unwrap();
        assert_eq!(raster.data, vec![10, 15, 18, 17]);
    }

    #[test]
    fn test_segment_past_end_of_file() {
        let file = TiffBuilder::new()
            .long(tags::IMAGE_WIDTH, 4)
            .long(tags::IMAGE_LENGTH, 1)
            .short(tags::BITS_PER_SAMPLE, 8)
            .long(tags::STRIP_OFFSETS, 0xFFFF)
            .long(tags::STRIP_BYTE_COUNTS, 4)
            .build();

        let mut reader = TiffReader::open(file.path()).unwrap();
        let tiff = reader.read().unwrap();
        let err = reader.read_image(tiff.main_ifd().unwrap()).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds(_)));
    }
}
