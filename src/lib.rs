//! tiffdec - TIFF strip and tile decompression
//!
//! tiffdec reads TIFF and BigTIFF files and decodes their strips or
//! tiles into in-memory rasters. It handles the CCITT Group 3 and
//! Group 4 fax schemes, LZW, PackBits, Deflate and uncompressed data,
//! with predictor reversal and full orientation handling.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use tiffdec::TiffReader;
//!
//! let mut reader = TiffReader::open("scan.tif")?;
//! let tiff = reader.read()?;
//!
//! if let Some(ifd) = tiff.main_ifd() {
//!     let dims = ifd.dimensions().unwrap();
//!     println!("Size: {} x {}", dims.width, dims.height);
//!
//!     let raster = reader.read_image(ifd)?;
//!     println!("Decoded {} bytes", raster.data.len());
//! }
//! # Ok::<(), tiffdec::Error>(())
//! ```

pub mod io;
pub mod error;
pub mod types;
pub mod formats;
pub mod compression;
pub mod raster;

pub use error::{Error, Result};
pub use types::Dimensions;
pub use formats::tiff::{
    Tiff, TiffReader, IFD, IFDEntry,
    tags, TIFF_MAGIC, BIGTIFF_MAGIC
};
pub use io::{ByteOrder, BufferedReader, SeekableReader, BitSource};
pub use compression::{Compression, LineDecoder};
pub use raster::{Raster, Orientation};
