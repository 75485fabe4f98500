use rdp_core::{RdpError, StandardFormat};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Core(#[from] RdpError),

    #[error("Format {0} has no equivalent here")]
    UnsupportedFormat(StandardFormat),

    #[error("Image dimensions {width}x{height} are too large")]
    Dimensions { width: usize, height: usize },

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, IoError>;
