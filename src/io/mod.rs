//! I/O utilities for tiffdec
//!
//! Provides core I/O primitives for reading TIFF container structures
//! and compressed strip data.

pub mod traits;
pub mod byte_order;
pub mod buffer;
pub mod bits;

pub use traits::SeekableReader;
pub use byte_order::ByteOrder;
pub use buffer::BufferedReader;
pub use bits::BitSource;
