//! Conversion of pipeline frames into `image` crate buffers

use ::image::{DynamicImage, ImageBuffer, Luma, Pixel, Rgb, Rgba};
use rdp_core::{ImageView, StandardFormat};
use tracing::debug;

use crate::error::{IoError, Result};

/// Copy a frame into an owned `DynamicImage`.
///
/// BGR layouts are reordered to RGB. Z16 becomes 16-bit luma holding raw
/// depth units. YUYV has no per-pixel layout and is rejected.
pub fn to_dynamic_image(view: &ImageView<'_>) -> Result<DynamicImage> {
    let (width, height) = image_dimensions(view)?;
    let data = view.data();
    debug!(width, height, format = %view.format(), "converting frame to image");

    let image = match view.format() {
        StandardFormat::Y8 => DynamicImage::ImageLuma8(buffer::<Luma<u8>>(view, data.to_vec())?),
        StandardFormat::Y16 | StandardFormat::Z16 => {
            DynamicImage::ImageLuma16(buffer::<Luma<u16>>(view, le_words(data))?)
        }
        StandardFormat::Rgb8 => DynamicImage::ImageRgb8(buffer::<Rgb<u8>>(view, data.to_vec())?),
        StandardFormat::Bgr8 => {
            let swapped = data
                .chunks_exact(3)
                .flat_map(|p| [p[2], p[1], p[0]])
                .collect();
            DynamicImage::ImageRgb8(buffer::<Rgb<u8>>(view, swapped)?)
        }
        StandardFormat::Rgba8 => {
            DynamicImage::ImageRgba8(buffer::<Rgba<u8>>(view, data.to_vec())?)
        }
        StandardFormat::Bgra8 => {
            let swapped = data
                .chunks_exact(4)
                .flat_map(|p| [p[2], p[1], p[0], p[3]])
                .collect();
            DynamicImage::ImageRgba8(buffer::<Rgba<u8>>(view, swapped)?)
        }
        StandardFormat::Yuyv => return Err(IoError::UnsupportedFormat(StandardFormat::Yuyv)),
    };
    Ok(image)
}

/// Little-endian 16-bit samples
pub(crate) fn le_words(data: &[u8]) -> Vec<u16> {
    data.chunks_exact(2)
        .map(|w| u16::from_le_bytes([w[0], w[1]]))
        .collect()
}

fn image_dimensions(view: &ImageView<'_>) -> Result<(u32, u32)> {
    let too_large = || IoError::Dimensions {
        width: view.width(),
        height: view.height(),
    };
    let width = u32::try_from(view.width()).map_err(|_| too_large())?;
    let height = u32::try_from(view.height()).map_err(|_| too_large())?;
    Ok((width, height))
}

fn buffer<P: Pixel>(
    view: &ImageView<'_>,
    samples: Vec<P::Subpixel>,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>> {
    let (width, height) = image_dimensions(view)?;
    ImageBuffer::from_raw(width, height, samples).ok_or(IoError::Dimensions {
        width: view.width(),
        height: view.height(),
    })
}
