//! Error types for tiffdec

use std::fmt;
use std::io;

/// Result type for tiffdec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading and decoding TIFF images
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(io::Error),

    /// Invalid TIFF format
    InvalidFormat(String),

    /// Invalid byte order
    InvalidByteOrder(u16),

    /// Invalid TIFF magic number
    InvalidMagic(u16),

    /// Missing required tag
    MissingTag(u16),

    /// Unsupported feature, detected before any strip is decoded
    Unsupported(String),

    /// Corrupt compressed data encountered mid-decode
    CorruptData(String),

    /// Out of bounds access
    OutOfBounds(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            Error::InvalidByteOrder(value) => write!(f, "Invalid byte order: 0x{:04X}", value),
            Error::InvalidMagic(value) => write!(f, "Invalid TIFF magic number: {}", value),
            Error::MissingTag(tag) => write!(f, "Missing required tag: {}", tag),
            Error::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            Error::CorruptData(msg) => write!(f, "Corrupt data: {}", msg),
            Error::OutOfBounds(msg) => write!(f, "Out of bounds: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidFormat("test".to_string());
        assert_eq!(err.to_string(), "Invalid format: test");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_corrupt_data() {
        let err = Error::CorruptData("bad Huffman code".to_string());
        assert!(err.to_string().contains("bad Huffman code"));
    }

    #[test]
    fn test_missing_tag() {
        let err = Error::MissingTag(256);
        assert!(err.to_string().contains("256"));
    }
}
