use thiserror::Error;

use crate::format::{NativeEncoding, StandardFormat};

/// Common errors across the pixel pipeline
#[derive(Error, Debug)]
pub enum RdpError {
    #[error("Precondition violated: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Caller contract violations, detected before any output is written
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreconditionError {
    #[error("Expected {expected} stream(s), got {actual}")]
    StreamCount { expected: usize, actual: usize },

    #[error("Stream {index} has format {actual}, expected {expected}")]
    FormatMismatch {
        index: usize,
        expected: StandardFormat,
        actual: StandardFormat,
    },

    #[error("Encoding {actual} cannot be read by this decoder")]
    EncodingMismatch { actual: NativeEncoding },

    #[error("Stream {index} is {width}x{height}, larger than the {mode_width}x{mode_height} mode")]
    StreamExceedsMode {
        index: usize,
        width: usize,
        height: usize,
        mode_width: usize,
        mode_height: usize,
    },

    #[error("Streams of a split mode must share dimensions")]
    StreamDimensions,

    #[error("Width {width} is not a multiple of the macropixel width {macropixel_width}")]
    MacropixelWidth { width: usize, macropixel_width: usize },

    #[error("Buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Buffer covers {actual} pixels, expected at least {expected}")]
    PixelCount { expected: usize, actual: usize },

    #[error("Size of a {width}x{height} image overflows")]
    SizeOverflow { width: usize, height: usize },

    #[error("Image is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    Dimensions {
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },

    #[error("Format {0} is not byte addressable per pixel")]
    NotByteAddressable(StandardFormat),

    #[error("Rectification table entry {index} points at {entry}, source holds {source_pixels} pixels")]
    TableEntry {
        index: usize,
        entry: u32,
        source_pixels: usize,
    },
}

pub type Result<T> = std::result::Result<T, RdpError>;
