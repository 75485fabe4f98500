use super::{FourCc, NativeEncoding, StandardFormat};
use crate::error::{PreconditionError, Result};

/// Byte footprint of a `width` x `height` image in a standard format
pub fn image_size(width: usize, height: usize, format: StandardFormat) -> Result<usize> {
    match format.bytes_per_pixel() {
        Some(bytes) => area(width, height, bytes),
        None => {
            // YUYV packs two pixels per 4-byte macropixel
            if width % 2 != 0 {
                return Err(PreconditionError::MacropixelWidth {
                    width,
                    macropixel_width: 2,
                }
                .into());
            }
            area(width, height, 2)
        }
    }
}

/// Byte footprint of a raw frame in a sensor-native encoding
pub fn native_image_size(width: usize, height: usize, encoding: NativeEncoding) -> Result<usize> {
    let macropixel_width = encoding.macropixel_width();
    if width % macropixel_width != 0 {
        return Err(PreconditionError::MacropixelWidth {
            width,
            macropixel_width,
        }
        .into());
    }
    area(width / macropixel_width, height, encoding.macropixel_bytes())
        .map_err(|_| PreconditionError::SizeOverflow { width, height }.into())
}

/// `columns * rows * bytes`, failing instead of wrapping
fn area(columns: usize, rows: usize, bytes: usize) -> Result<usize> {
    columns
        .checked_mul(rows)
        .and_then(|pixels| pixels.checked_mul(bytes))
        .ok_or_else(|| {
            PreconditionError::SizeOverflow {
                width: columns,
                height: rows,
            }
            .into()
        })
}

/// Same as [`native_image_size`], resolving the encoding from its code first
pub fn fourcc_image_size(width: usize, height: usize, fourcc: FourCc) -> Result<usize> {
    native_image_size(width, height, NativeEncoding::try_from(fourcc)?)
}
