//! Buffered reading utilities
//!
//! Provides buffered I/O for walking TIFF directory structures, where
//! reads are small and frequent.

use std::io::{Read, Result, Seek, SeekFrom};
use crate::io::SeekableReader;

/// A buffered reader that wraps any [`SeekableReader`]
///
/// Maintains an internal buffer to reduce the number of system calls
/// for small reads. Large reads bypass the buffer entirely.
#[derive(Debug)]
pub struct BufferedReader<R: SeekableReader> {
    inner: R,
    buffer: Vec<u8>,
    pos: usize,
    cap: usize,
    buffer_size: usize,
}

impl<R: SeekableReader> BufferedReader<R> {
    /// Creates a new buffered reader with default buffer size (8KB)
    pub fn new(inner: R) -> Self {
        Self::with_capacity(8192, inner)
    }

    /// Creates a new buffered reader with specified buffer size
    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            inner,
            buffer: vec![0; capacity],
            pos: 0,
            cap: 0,
            buffer_size: capacity,
        }
    }

    /// Reads a chunk of specified size from the reader
    ///
    /// Returns a vector containing exactly `size` bytes, or an error
    /// if not enough data is available.
    pub fn read_chunk(&mut self, size: usize) -> Result<Vec<u8>> {
        let mut chunk = vec![0u8; size];
        self.read_exact(&mut chunk)?;
        Ok(chunk)
    }

    fn fill_buffer(&mut self) -> Result<()> {
        self.cap = self.inner.read(&mut self.buffer)?;
        self.pos = 0;
        Ok(())
    }
}

impl<R: SeekableReader> Read for BufferedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.pos >= self.cap {
            if buf.len() >= self.buffer_size {
                return self.inner.read(buf);
            }
            self.fill_buffer()?;
            if self.cap == 0 {
                return Ok(0);
            }
        }

        let available = self.cap - self.pos;
        let to_read = available.min(buf.len());
        buf[..to_read].copy_from_slice(&self.buffer[self.pos..self.pos + to_read]);
        self.pos += to_read;
        Ok(to_read)
    }
}

impl<R: SeekableReader> Seek for BufferedReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.pos = 0;
        self.cap = 0;
        self.inner.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_in_chunks() {
        let cursor = Cursor::new(vec![0x10u8, 0x20, 0x30, 0x40]);
        let mut reader = BufferedReader::new(cursor);

        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0x10, 0x20]);

        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0x30, 0x40]);
    }

    #[test]
    fn test_seek_and_read() {
        let cursor = Cursor::new(vec![0x10u8, 0x20, 0x30, 0x40]);
        let mut reader = BufferedReader::new(cursor);

        reader.seek(SeekFrom::Start(2)).unwrap();

        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0x30, 0x40]);
    }

    #[test]
    fn test_read_chunk() {
        let cursor = Cursor::new(vec![0x10u8, 0x20, 0x30, 0x40, 0x50]);
        let mut reader = BufferedReader::new(cursor);

        let chunk = reader.read_chunk(3).unwrap();
        assert_eq!(chunk, vec![0x10, 0x20, 0x30]);

        let chunk = reader.read_chunk(2).unwrap();
        assert_eq!(chunk, vec![0x40, 0x50]);
    }

    #[test]
    fn test_read_chunk_insufficient_data() {
        let cursor = Cursor::new(vec![0x10u8, 0x20]);
        let mut reader = BufferedReader::new(cursor);

        assert!(reader.read_chunk(3).is_err());
    }

    #[test]
    fn test_large_read_bypasses_buffer() {
        let cursor = Cursor::new(vec![0u8; 16384]);
        let mut reader = BufferedReader::with_capacity(1024, cursor);

        let mut buf = vec![0u8; 8192];
        let n = reader.read(&mut buf).unwrap();
        assert_eq!(n, 8192);
    }

    #[test]
    fn test_sequential_small_reads() {
        let data: Vec<u8> = (0..100).collect();
        let mut reader = BufferedReader::with_capacity(32, Cursor::new(data));

        for i in 0u8..100 {
            let mut buf = [0u8; 1];
            reader.read_exact(&mut buf).unwrap();
            assert_eq!(buf[0], i);
        }
    }
}
