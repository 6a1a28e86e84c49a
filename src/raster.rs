//! Decoded raster storage and oriented row placement
//!
//! Strips and tiles decode in file order; the Orientation tag says
//! where those rows actually land in the displayed image. Values 1-4
//! are flips, values 5-8 additionally swap the image axes, so each
//! decoded row is scattered down an output column.

use crate::error::Result;

/// TIFF Orientation tag values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Row 0 top, column 0 left (the default)
    TopLeft,
    /// Row 0 top, column 0 right (horizontal flip)
    TopRight,
    /// Row 0 bottom, column 0 right (180 degree rotation)
    BottomRight,
    /// Row 0 bottom, column 0 left (vertical flip)
    BottomLeft,
    /// Row 0 left, column 0 top (transpose)
    LeftTop,
    /// Row 0 right, column 0 top (90 degrees clockwise)
    RightTop,
    /// Row 0 right, column 0 bottom (transverse)
    RightBottom,
    /// Row 0 left, column 0 bottom (90 degrees counter-clockwise)
    LeftBottom,
}

impl Orientation {
    /// Maps the Orientation tag value; out-of-range values fall back
    /// to the default top-left layout.
    pub fn from_tag(value: u64) -> Self {
        match value {
            2 => Orientation::TopRight,
            3 => Orientation::BottomRight,
            4 => Orientation::BottomLeft,
            5 => Orientation::LeftTop,
            6 => Orientation::RightTop,
            7 => Orientation::RightBottom,
            8 => Orientation::LeftBottom,
            _ => Orientation::TopLeft,
        }
    }

    /// True when the output image swaps width and height
    pub fn swaps_axes(&self) -> bool {
        matches!(
            self,
            Orientation::LeftTop
                | Orientation::RightTop
                | Orientation::RightBottom
                | Orientation::LeftBottom
        )
    }

    /// Output dimensions for a decoded image of `width` x `height`
    pub fn output_dimensions(&self, width: usize, height: usize) -> (usize, usize) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

/// Expands a packed bilevel row into one byte per pixel (0 or 1)
pub(crate) fn expand_bits(row: &[u8], width: usize) -> Vec<u8> {
    (0..width)
        .map(|i| (row[i / 8] >> (7 - i % 8)) & 1)
        .collect()
}

/// A decoded image
///
/// `packed` rasters hold bit-packed bilevel rows; everything else is
/// one byte per sample, channels interleaved.
#[derive(Debug)]
pub struct Raster {
    /// Output width in pixels
    pub width: usize,
    /// Output height in pixels
    pub height: usize,
    /// Samples per pixel
    pub channels: usize,
    /// True when rows are bit-packed bilevel data
    pub packed: bool,
    /// Pixel storage, row major
    pub data: Vec<u8>,
}

impl Raster {
    /// Creates a zeroed byte-per-sample raster
    pub fn new_bytes(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            packed: false,
            data: vec![0; width * height * channels],
        }
    }

    /// Creates a zeroed bit-packed bilevel raster
    pub fn new_packed(width: usize, height: usize) -> Self {
        let row_bytes = (width + 7) / 8;
        Self {
            width,
            height,
            channels: 1,
            packed: true,
            data: vec![0; row_bytes * height],
        }
    }

    /// Bytes per stored row
    pub fn row_bytes(&self) -> usize {
        if self.packed {
            (self.width + 7) / 8
        } else {
            self.width * self.channels
        }
    }

    /// Stores a packed bilevel row
    pub fn set_packed_row(&mut self, y: usize, row: &[u8]) {
        let row_bytes = self.row_bytes();
        self.data[y * row_bytes..y * row_bytes + row.len()].copy_from_slice(row);
    }

    /// Stores `pixels` (channel-interleaved) starting at `(x, y)`
    pub fn set_pixels(&mut self, x: usize, y: usize, pixels: &[u8]) {
        let offset = (y * self.width + x) * self.channels;
        self.data[offset..offset + pixels.len()].copy_from_slice(pixels);
    }

    /// Stores consecutive pixel groups downward in column `col`,
    /// starting at `row_start`
    pub fn set_column(&mut self, col: usize, row_start: usize, pixels: &[u8]) {
        for (i, px) in pixels.chunks(self.channels).enumerate() {
            let offset = ((row_start + i) * self.width + col) * self.channels;
            self.data[offset..offset + self.channels].copy_from_slice(px);
        }
    }

    /// Places one decoded row segment whose file-order position is
    /// `(x, y)` according to `orientation`
    ///
    /// The raster's own dimensions are output dimensions; for the
    /// axis-swapping orientations the caller constructs it swapped.
    /// The segment must fit; tiles are clipped before placement.
    pub fn place_row(&mut self, orientation: Orientation, x: usize, y: usize, pixels: &[u8]) {
        let w = pixels.len() / self.channels;
        match orientation {
            Orientation::TopLeft => self.set_pixels(x, y, pixels),
            Orientation::TopRight => {
                let rev = self.reverse_pixels(pixels);
                self.set_pixels(self.width - x - w, y, &rev);
            }
            Orientation::BottomRight => {
                let rev = self.reverse_pixels(pixels);
                let y = self.height - 1 - y;
                self.set_pixels(self.width - x - w, y, &rev);
            }
            Orientation::BottomLeft => {
                let y = self.height - 1 - y;
                self.set_pixels(x, y, pixels);
            }
            Orientation::LeftTop => self.set_column(y, x, pixels),
            Orientation::RightTop => self.set_column(self.width - 1 - y, x, pixels),
            Orientation::RightBottom => {
                let rev = self.reverse_pixels(pixels);
                self.set_column(self.width - 1 - y, self.height - x - w, &rev);
            }
            Orientation::LeftBottom => {
                let rev = self.reverse_pixels(pixels);
                self.set_column(y, self.height - x - w, &rev);
            }
        }
    }

    fn reverse_pixels(&self, pixels: &[u8]) -> Vec<u8> {
        let mut rev = Vec::with_capacity(pixels.len());
        for px in pixels.chunks(self.channels).rev() {
            rev.extend_from_slice(px);
        }
        rev
    }

    /// Returns the channel values of one pixel (byte rasters only)
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let offset = (y * self.width + x) * self.channels;
        &self.data[offset..offset + self.channels]
    }

    /// Returns one bit of a packed bilevel raster
    pub fn bit(&self, x: usize, y: usize) -> u8 {
        let row_bytes = self.row_bytes();
        (self.data[y * row_bytes + x / 8] >> (7 - x % 8)) & 1
    }

    /// Writes the raster as a binary PGM/PPM image
    pub fn write_pnm(&self, out: &mut dyn std::io::Write) -> Result<()> {
        match self.channels {
            3 => writeln!(out, "P6\n{} {}\n255", self.width, self.height)?,
            _ => writeln!(out, "P5\n{} {}\n255", self.width, self.height)?,
        }
        if self.packed {
            for y in 0..self.height {
                for x in 0..self.width {
                    let v = if self.bit(x, y) != 0 { 255u8 } else { 0 };
                    out.write_all(&[v])?;
                }
            }
        } else {
            out.write_all(&self.data)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(Orientation::from_tag(1), Orientation::TopLeft);
        assert_eq!(Orientation::from_tag(6), Orientation::RightTop);
        assert_eq!(Orientation::from_tag(0), Orientation::TopLeft);
        assert_eq!(Orientation::from_tag(99), Orientation::TopLeft);
    }

    #[test]
    fn test_output_dimensions() {
        assert_eq!(Orientation::TopRight.output_dimensions(3, 2), (3, 2));
        assert_eq!(Orientation::LeftTop.output_dimensions(3, 2), (2, 3));
    }

    #[test]
    fn test_expand_bits() {
        assert_eq!(expand_bits(&[0b1010_0000], 4), vec![1, 0, 1, 0]);
        assert_eq!(expand_bits(&[0xFF, 0x80], 9), vec![1; 9]);
    }

    #[test]
    fn test_raster_debug_format() {
        let raster = Raster::new_bytes(2, 1, 1);
        let text = format!("{:?}", raster);
        assert!(text.contains("Raster"));
        assert!(text.contains("width: 2"));
    }

    /// Places the rows of a 3x2 source image into a raster for each
    /// orientation and returns the flattened output.
    fn orient(tag: u64) -> Vec<u8> {
        let orientation = Orientation::from_tag(tag);
        let (w, h) = orientation.output_dimensions(3, 2);
        let mut raster = Raster::new_bytes(w, h, 1);
        raster.place_row(orientation, 0, 0, &[1, 2, 3]);
        raster.place_row(orientation, 0, 1, &[4, 5, 6]);
        raster.data.clone()
    }

    #[test]
    fn test_orientation_flips() {
        assert_eq!(orient(1), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(orient(2), vec![3, 2, 1, 6, 5, 4]);
        assert_eq!(orient(3), vec![6, 5, 4, 3, 2, 1]);
        assert_eq!(orient(4), vec![4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_orientation_axis_swaps() {
        assert_eq!(orient(5), vec![1, 4, 2, 5, 3, 6]);
        assert_eq!(orient(6), vec![4, 1, 5, 2, 6, 3]);
        assert_eq!(orient(7), vec![6, 3, 5, 2, 4, 1]);
        assert_eq!(orient(8), vec![3, 6, 2, 5, 1, 4]);
    }

    #[test]
    fn test_orientation_preserves_pixel_groups() {
        // RGB pixels flip as groups, not as raw bytes
        let orientation = Orientation::TopRight;
        let mut raster = Raster::new_bytes(2, 1, 3);
        raster.place_row(orientation, 0, 0, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(raster.data, vec![4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_partial_row_placement() {
        // a clipped tile row lands at its offset
        let mut raster = Raster::new_bytes(4, 2, 1);
        raster.place_row(Orientation::TopLeft, 2, 1, &[9, 9]);
        assert_eq!(raster.data, vec![0, 0, 0, 0, 0, 0, 9, 9]);
    }

    #[test]
    fn test_packed_raster_round_trip() {
        let mut raster = Raster::new_packed(4, 2);
        raster.set_packed_row(0, &[0xC0]);
        assert_eq!(raster.bit(0, 0), 1);
        assert_eq!(raster.bit(2, 0), 0);
        assert_eq!(raster.bit(0, 1), 0);
    }

    #[test]
    fn test_write_pnm_gray() {
        let mut raster = Raster::new_bytes(2, 1, 1);
        raster.set_pixels(0, 0, &[7, 8]);
        let mut out = Vec::new();
        raster.write_pnm(&mut out).unwrap();
        assert!(out.starts_with(b"P5\n2 1\n255\n"));
        assert_eq!(&out[out.len() - 2..], &[7, 8]);
    }
}
