//! File format support

pub mod tiff;
