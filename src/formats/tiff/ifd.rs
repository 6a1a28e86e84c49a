//! Image File Directory (IFD) structures

use std::collections::HashMap;
use crate::types::Dimensions;
use super::tags;

/// Represents an Image File Directory entry
#[derive(Debug, Clone)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// Value or offset to value
    pub value_offset: u64,
}

impl IFDEntry {
    /// Creates a new IFD entry
    pub fn new(tag: u16, field_type: u16, count: u64, value_offset: u64) -> Self {
        Self {
            tag,
            field_type,
            count,
            value_offset,
        }
    }

    /// Returns the size in bytes of this field type
    pub fn field_type_size(&self) -> usize {
        use super::tags::field_types::*;
        match self.field_type {
            BYTE | ASCII | SBYTE | UNDEFINED => 1,
            SHORT | SSHORT => 2,
            LONG | SLONG | FLOAT => 4,
            RATIONAL | SRATIONAL | DOUBLE | LONG8 | SLONG8 | IFD8 => 8,
            _ => 1,
        }
    }

    /// Returns whether the value is stored inline (in value_offset field)
    pub fn is_inline(&self, is_big_tiff: bool) -> bool {
        let total_size = self.field_type_size() * self.count as usize;
        let inline_size = if is_big_tiff { 8 } else { 4 };
        total_size <= inline_size
    }
}

/// Represents an Image File Directory
#[derive(Debug, Clone)]
pub struct IFD {
    /// IFD number (0-based)
    pub number: usize,
    /// Offset to this IFD in file
    pub offset: u64,
    /// Entries in this IFD
    pub entries: Vec<IFDEntry>,
    /// Tag map for quick lookup
    tag_map: HashMap<u16, usize>,
}

impl IFD {
    /// Creates a new IFD
    pub fn new(number: usize, offset: u64) -> Self {
        Self {
            number,
            offset,
            entries: Vec::new(),
            tag_map: HashMap::new(),
        }
    }

    /// Adds an entry to this IFD
    pub fn add_entry(&mut self, entry: IFDEntry) {
        let index = self.entries.len();
        self.tag_map.insert(entry.tag, index);
        self.entries.push(entry);
    }

    /// Gets an entry by tag
    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag).and_then(|&idx| self.entries.get(idx))
    }

    /// Gets the value of a tag as u64 (for inline values)
    pub fn get_tag_value(&self, tag: u16) -> Option<u64> {
        self.get_entry(tag).map(|e| e.value_offset)
    }

    /// Returns image dimensions if available
    pub fn dimensions(&self) -> Option<Dimensions> {
        let width = self.get_tag_value(tags::IMAGE_WIDTH)?;
        let height = self.get_tag_value(tags::IMAGE_LENGTH)?;
        Some(Dimensions::new(width, height))
    }

    /// Returns compression type (1 = uncompressed when absent)
    pub fn compression(&self) -> u64 {
        self.get_tag_value(tags::COMPRESSION).unwrap_or(1)
    }

    /// Returns photometric interpretation
    pub fn photometric_interpretation(&self) -> Option<u64> {
        self.get_tag_value(tags::PHOTOMETRIC_INTERPRETATION)
    }

    /// Returns fill order (1 = MSB-first when absent)
    pub fn fill_order(&self) -> u64 {
        self.get_tag_value(tags::FILL_ORDER).unwrap_or(1)
    }

    /// Returns orientation (1 = top-left when absent)
    pub fn orientation(&self) -> u64 {
        self.get_tag_value(tags::ORIENTATION).unwrap_or(1)
    }

    /// Returns samples per pixel
    pub fn samples_per_pixel(&self) -> u64 {
        self.get_tag_value(tags::SAMPLES_PER_PIXEL).unwrap_or(1)
    }

    /// Returns bits per sample (1 when absent)
    ///
    /// For multi-sample images the entry holds an offset to one value
    /// per sample; the reader resolves those through its tag reader.
    pub fn bits_per_sample(&self) -> u64 {
        self.get_tag_value(tags::BITS_PER_SAMPLE).unwrap_or(1)
    }

    /// Returns rows per strip; absence means the whole image is one
    /// strip, which writers also express as the unsigned maximum
    pub fn rows_per_strip(&self) -> Option<u64> {
        self.get_tag_value(tags::ROWS_PER_STRIP)
    }

    /// Returns planar configuration (1 = chunky when absent)
    pub fn planar_configuration(&self) -> u64 {
        self.get_tag_value(tags::PLANAR_CONFIGURATION).unwrap_or(1)
    }

    /// Returns predictor (1 = none when absent)
    pub fn predictor(&self) -> u64 {
        self.get_tag_value(tags::PREDICTOR).unwrap_or(1)
    }

    /// Returns Group 3 coding options (0 when absent)
    pub fn t4_options(&self) -> u64 {
        self.get_tag_value(tags::T4_OPTIONS).unwrap_or(0)
    }

    /// Returns Group 4 coding options (0 when absent)
    pub fn t6_options(&self) -> u64 {
        self.get_tag_value(tags::T6_OPTIONS).unwrap_or(0)
    }

    /// Returns whether this IFD represents a tiled image
    pub fn is_tiled(&self) -> bool {
        self.get_entry(tags::TILE_WIDTH).is_some()
    }

    /// Returns tile dimensions if tiled
    pub fn tile_dimensions(&self) -> Option<Dimensions> {
        let width = self.get_tag_value(tags::TILE_WIDTH)?;
        let height = self.get_tag_value(tags::TILE_LENGTH)?;
        Some(Dimensions::new(width, height))
    }

    /// Returns number of entries
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}
