//! Conversion of pipeline frames into `ndarray` arrays

use ndarray::{Array2, Array3};
use rdp_core::{ImageView, PreconditionError, RdpError, StandardFormat};
use tracing::debug;

use crate::convert::le_words;
use crate::error::{IoError, Result};

/// Raw bytes as `[height, width, bytes_per_pixel]`
pub fn to_array(view: &ImageView<'_>) -> Result<Array3<u8>> {
    let format = view.format();
    let bytes = format
        .bytes_per_pixel()
        .ok_or(RdpError::from(PreconditionError::NotByteAddressable(format)))?;
    debug!(width = view.width(), height = view.height(), %format, "converting frame to array");

    let array = Array3::from_shape_vec((view.height(), view.width(), bytes), view.data().to_vec())?;
    Ok(array)
}

/// 16-bit samples of a Z16 or Y16 frame as `[height, width]`
pub fn to_depth_array(view: &ImageView<'_>) -> Result<Array2<u16>> {
    match view.format() {
        StandardFormat::Z16 | StandardFormat::Y16 => {}
        other => return Err(IoError::UnsupportedFormat(other)),
    }
    debug!(width = view.width(), height = view.height(), "converting frame to depth array");

    let array = Array2::from_shape_vec((view.height(), view.width()), le_words(view.data()))?;
    Ok(array)
}
