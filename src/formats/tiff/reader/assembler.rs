//! Strip and tile assembly
//!
//! [`StripTileAssembler`] turns an IFD's compressed strips or tiles
//! into a [`Raster`]. It owns everything above the scanline level:
//! segment geometry, decoder construction, predictor reversal,
//! orientation placement and tile clipping. The scanlines themselves
//! come from the [`LineDecoder`] implementations in
//! [`crate::compression`].

use crate::compression::deflate::DeflateDecoder;
use crate::compression::g3::Group3Decoder;
use crate::compression::g4::{Group3MixedDecoder, Group4Decoder};
use crate::compression::lzw::{LzwDecoder, LzwDict};
use crate::compression::packbits::PackBitsDecoder;
use crate::compression::raw::RawDecoder;
use crate::compression::{Compression, LineDecoder};
use crate::error::{Error, Result};
use crate::formats::tiff::{tags, IFD};
use crate::io::BitSource;
use crate::raster::{expand_bits, Orientation, Raster};

/// Decodes the strips or tiles of one IFD into a raster
///
/// Construction validates the IFD up front; nothing is read from the
/// file until [`assemble`](Self::assemble) runs. Decode failures abort
/// with the first error, no resync is attempted.
pub struct StripTileAssembler {
    width: usize,
    height: usize,
    samples: usize,
    bits: u16,
    compression: Compression,
    invert: bool,
    reversed_fill: bool,
    orientation: Orientation,
    predictor: u64,
    two_dim: bool,
    rows_per_strip: usize,
    tile: Option<(usize, usize)>,
    offsets: Vec<u64>,
    byte_counts: Vec<u64>,
}

impl StripTileAssembler {
    /// Builds an assembler for `ifd`, failing fast on anything the
    /// decode stage cannot handle
    ///
    /// `offsets` and `byte_counts` are the resolved strip or tile
    /// arrays; `bits_per_sample` is the resolved per-sample width.
    pub fn new(
        ifd: &IFD,
        bits_per_sample: u16,
        offsets: Vec<u64>,
        byte_counts: Vec<u64>,
    ) -> Result<Self> {
        let dims = ifd
            .dimensions()
            .ok_or(Error::MissingTag(tags::IMAGE_WIDTH))?;
        let width = dims.width as usize;
        let height = dims.height as usize;
        if width == 0 || height == 0 {
            return Err(Error::InvalidFormat("Zero image dimensions".to_string()));
        }

        if ifd.planar_configuration() == 2 {
            return Err(Error::Unsupported(
                "Planar configuration 2 (separate planes)".to_string(),
            ));
        }

        let compression = Compression::from_tag(ifd.compression())?;

        let photometric = ifd.photometric_interpretation();
        if let Some(p) = photometric {
            use tags::photometric::*;
            if matches!(p, MASK | SEPARATED | YCBCR | CIELAB) {
                return Err(Error::Unsupported(format!(
                    "Photometric interpretation {}",
                    p
                )));
            }
        }

        if !matches!(bits_per_sample, 1 | 4 | 8) {
            return Err(Error::Unsupported(format!(
                "{} bits per sample",
                bits_per_sample
            )));
        }
        if compression.is_ccitt() && bits_per_sample != 1 {
            return Err(Error::Unsupported(format!(
                "{} with {} bits per sample",
                compression.name(),
                bits_per_sample
            )));
        }

        let predictor = ifd.predictor();
        if predictor == 2 && bits_per_sample != 8 {
            return Err(Error::Unsupported(format!(
                "Predictor 2 with {} bits per sample",
                bits_per_sample
            )));
        }
        if predictor > 2 {
            return Err(Error::Unsupported(format!("Predictor {}", predictor)));
        }

        // uncompressed mode inside CCITT streams is not decoded
        if compression == Compression::Group3Fax && ifd.t4_options() & 0x2 != 0 {
            return Err(Error::Unsupported("T.4 uncompressed mode".to_string()));
        }
        if compression == Compression::Group4Fax && ifd.t6_options() & 0x2 != 0 {
            return Err(Error::Unsupported("T.6 uncompressed mode".to_string()));
        }

        let samples = ifd.samples_per_pixel() as usize;
        let invert = samples == 1 && photometric == Some(tags::photometric::WHITE_IS_ZERO);

        let tile = ifd
            .tile_dimensions()
            .map(|d| (d.width as usize, d.height as usize))
            .filter(|&(tw, th)| tw > 0 && th > 0);

        // absence and the unsigned maximum both mean one strip
        let rows = ifd.rows_per_strip().unwrap_or(u64::MAX);
        let rows_per_strip = if rows == 0 || rows >= height as u64 {
            height
        } else {
            rows as usize
        };

        let expected = match tile {
            Some((tw, th)) => {
                ((width + tw - 1) / tw) * ((height + th - 1) / th)
            }
            None => (height + rows_per_strip - 1) / rows_per_strip,
        };
        if offsets.len() < expected || byte_counts.len() < offsets.len() {
            return Err(Error::InvalidFormat(format!(
                "Expected {} segments, found {} offsets and {} byte counts",
                expected,
                offsets.len(),
                byte_counts.len()
            )));
        }

        Ok(Self {
            width,
            height,
            samples,
            bits: bits_per_sample,
            compression,
            invert,
            reversed_fill: ifd.fill_order() == 2,
            orientation: Orientation::from_tag(ifd.orientation()),
            predictor,
            two_dim: ifd.t4_options() & 0x1 != 0,
            rows_per_strip,
            tile,
            offsets,
            byte_counts,
        })
    }

    /// Builds the zeroed output raster this assembler will fill
    ///
    /// Strip-organized bilevel images in top-left orientation stay
    /// bit-packed; everything else is one byte per sample.
    pub fn output_raster(&self) -> Raster {
        let packed = self.tile.is_none()
            && self.bits == 1
            && self.orientation == Orientation::TopLeft;

        if packed {
            Raster::new_packed(self.width, self.height)
        } else {
            let (w, h) = self.orientation.output_dimensions(self.width, self.height);
            Raster::new_bytes(w, h, self.samples)
        }
    }

    /// Decodes every strip or tile, placing rows through `fetch`
    ///
    /// `fetch(offset, len)` returns `len` bytes of the underlying file.
    pub fn assemble<F>(&self, fetch: F) -> Result<Raster>
    where
        F: FnMut(u64, usize) -> Result<Vec<u8>>,
    {
        let mut raster = self.output_raster();
        self.assemble_into(&mut raster, fetch)?;
        Ok(raster)
    }

    /// Decodes into a raster from [`output_raster`](Self::output_raster)
    ///
    /// On error, rows already placed stay in `raster`; callers must not
    /// assume an all-or-nothing image on failure.
    pub fn assemble_into<F>(&self, raster: &mut Raster, mut fetch: F) -> Result<()>
    where
        F: FnMut(u64, usize) -> Result<Vec<u8>>,
    {
        let mut dict = LzwDict::new();

        if let Some((tw, th)) = self.tile {
            self.assemble_tiles(raster, &mut dict, &mut fetch, tw, th)
        } else {
            self.assemble_strips(raster, &mut dict, &mut fetch)
        }
    }

    fn assemble_strips<F>(
        &self,
        raster: &mut Raster,
        dict: &mut LzwDict,
        fetch: &mut F,
    ) -> Result<()>
    where
        F: FnMut(u64, usize) -> Result<Vec<u8>>,
    {
        let packed = raster.packed;
        for (s, (&offset, &count)) in self.offsets.iter().zip(&self.byte_counts).enumerate() {
            let y0 = s * self.rows_per_strip;
            if y0 >= self.height {
                break;
            }
            let rows = self.rows_per_strip.min(self.height - y0);

            let buf = self.read_segment(fetch, offset, count)?;
            let mut decoder = self.make_decoder(&buf, count as usize, dict, self.width)?;
            let mut row = vec![0u8; self.row_len(self.width)];

            for j in 0..rows {
                decoder.decode_line(&mut row)?;
                self.finish_row(&mut row);
                if packed {
                    raster.set_packed_row(y0 + j, &row);
                } else {
                    let pixels = self.row_pixels(&row, self.width, self.width);
                    raster.place_row(self.orientation, 0, y0 + j, &pixels);
                }
            }
        }
        Ok(())
    }

    fn assemble_tiles<F>(
        &self,
        raster: &mut Raster,
        dict: &mut LzwDict,
        fetch: &mut F,
        tw: usize,
        th: usize,
    ) -> Result<()>
    where
        F: FnMut(u64, usize) -> Result<Vec<u8>>,
    {
        let across = (self.width + tw - 1) / tw;

        for (t, (&offset, &count)) in self.offsets.iter().zip(&self.byte_counts).enumerate() {
            let x0 = (t % across) * tw;
            let y0 = (t / across) * th;
            if y0 >= self.height {
                break;
            }
            // clip against the right and bottom image borders
            let cols = tw.min(self.width - x0);
            let rows = th.min(self.height - y0);

            let buf = self.read_segment(fetch, offset, count)?;
            let mut decoder = self.make_decoder(&buf, count as usize, dict, tw)?;
            let mut row = vec![0u8; self.row_len(tw)];

            for j in 0..rows {
                decoder.decode_line(&mut row)?;
                self.finish_row(&mut row);
                let pixels = self.row_pixels(&row, tw, cols);
                raster.place_row(self.orientation, x0, y0 + j, &pixels);
            }
        }
        Ok(())
    }

    /// Fetches one segment with two pad bytes of slack, so greedy
    /// terminal-code lookahead in the fax decoders stays in bounds
    fn read_segment<F>(&self, fetch: &mut F, offset: u64, count: u64) -> Result<Vec<u8>>
    where
        F: FnMut(u64, usize) -> Result<Vec<u8>>,
    {
        let mut buf = fetch(offset, count as usize)?;
        buf.extend_from_slice(&[0, 0]);
        Ok(buf)
    }

    fn make_decoder<'a>(
        &self,
        buf: &'a [u8],
        len: usize,
        dict: &'a mut LzwDict,
        row_width: usize,
    ) -> Result<Box<dyn LineDecoder + 'a>> {
        // byte decoders see the exact segment; bit decoders keep the pad
        let data = &buf[..len.min(buf.len())];
        let invert = self.invert && self.predictor != 2;

        Ok(match self.compression {
            Compression::None => Box::new(RawDecoder::new(data, self.bits, invert)),
            Compression::PackBits => Box::new(PackBitsDecoder::new(data, self.bits, invert)),
            Compression::Deflate => Box::new(DeflateDecoder::new(data, self.bits, invert)?),
            Compression::Lzw => Box::new(LzwDecoder::new(
                BitSource::new(buf, self.reversed_fill),
                dict,
                self.bits,
                invert,
            )),
            Compression::CcittRle => Box::new(Group3Decoder::new(
                BitSource::new(buf, self.reversed_fill),
                row_width,
                self.invert,
            )),
            Compression::Group3Fax => Box::new(Group3MixedDecoder::new(
                BitSource::new(buf, self.reversed_fill),
                row_width,
                self.invert,
                self.two_dim,
            )),
            Compression::Group4Fax => Box::new(Group4Decoder::new(
                BitSource::new(buf, self.reversed_fill),
                row_width,
                self.invert,
            )),
        })
    }

    /// Decoded bytes per scanline of a segment `w` pixels wide
    fn row_len(&self, w: usize) -> usize {
        if self.bits == 1 {
            (w + 7) / 8
        } else {
            w * self.samples
        }
    }

    /// Reverses horizontal differencing and applies the photometric
    /// complement the decoder skipped while the predictor was pending
    fn finish_row(&self, row: &mut [u8]) {
        if self.predictor != 2 {
            return;
        }
        for i in self.samples..row.len() {
            row[i] = row[i].wrapping_add(row[i - self.samples]);
        }
        if self.invert {
            for b in row.iter_mut() {
                *b = !*b;
            }
        }
    }

    /// Converts one decoded scanline into placeable pixel bytes,
    /// truncated to `cols` pixels
    fn row_pixels(&self, row: &[u8], w: usize, cols: usize) -> Vec<u8> {
        if self.bits == 1 {
            let mut pixels = expand_bits(row, w);
            pixels.truncate(cols);
            pixels
        } else {
            row[..cols * self.samples].to_vec()
        }
    }
}
