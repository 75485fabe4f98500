use super::{SubdeviceMode, validate};
use crate::error::{PreconditionError, Result};
use crate::format::{NativeEncoding, StandardFormat};
use crate::frame::ImageViewMut;

/// Byte order of an RGB-family output pixel
pub trait RgbLayout {
    const FORMAT: StandardFormat;
    const BYTES: usize;

    fn write(r: u8, g: u8, b: u8, target: &mut [u8]);
}

pub struct Rgb8;
pub struct Bgr8;
pub struct Rgba8;
pub struct Bgra8;

impl RgbLayout for Rgb8 {
    const FORMAT: StandardFormat = StandardFormat::Rgb8;
    const BYTES: usize = 3;

    fn write(r: u8, g: u8, b: u8, target: &mut [u8]) {
        target.copy_from_slice(&[r, g, b]);
    }
}

impl RgbLayout for Bgr8 {
    const FORMAT: StandardFormat = StandardFormat::Bgr8;
    const BYTES: usize = 3;

    fn write(r: u8, g: u8, b: u8, target: &mut [u8]) {
        target.copy_from_slice(&[b, g, r]);
    }
}

impl RgbLayout for Rgba8 {
    const FORMAT: StandardFormat = StandardFormat::Rgba8;
    const BYTES: usize = 4;

    fn write(r: u8, g: u8, b: u8, target: &mut [u8]) {
        target.copy_from_slice(&[r, g, b, 255]);
    }
}

impl RgbLayout for Bgra8 {
    const FORMAT: StandardFormat = StandardFormat::Bgra8;
    const BYTES: usize = 4;

    fn write(r: u8, g: u8, b: u8, target: &mut [u8]) {
        target.copy_from_slice(&[b, g, r, 255]);
    }
}

/// Limited-range luma and chroma with their biases removed
#[derive(Debug, Clone, Copy)]
struct Macropixel {
    y0: i32,
    y1: i32,
    u: i32,
    v: i32,
}

impl Macropixel {
    /// Bytes are Y0, U, Y1, V
    fn read(source: &[u8]) -> Self {
        Self {
            y0: i32::from(source[0]) - 16,
            u: i32::from(source[1]) - 128,
            y1: i32::from(source[2]) - 16,
            v: i32::from(source[3]) - 128,
        }
    }
}

fn clamp_byte(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

pub(crate) fn yuv_to_rgb(y: i32, u: i32, v: i32) -> (u8, u8, u8) {
    let r = clamp_byte((128 + 298 * y + 409 * v) >> 8);
    let g = clamp_byte((128 + 298 * y - 100 * u - 208 * v) >> 8);
    let b = clamp_byte((128 + 298 * y + 516 * u) >> 8);
    (r, g, b)
}

/// Decode each YUY2 macropixel into two chroma-sharing output pixels
pub(super) fn unpack_from_yuy2<L: RgbLayout>(
    mode: &SubdeviceMode,
    source: &[u8],
    outputs: &mut [ImageViewMut<'_>],
) -> Result<()> {
    validate(mode, source, outputs, &[NativeEncoding::Yuy2], &[L::FORMAT])?;

    let request = &mode.streams[0];
    if request.width % 2 != 0 {
        return Err(PreconditionError::MacropixelWidth {
            width: request.width,
            macropixel_width: 2,
        }
        .into());
    }

    let in_stride = mode.raw_stride()?;
    let out_stride = request.width * L::BYTES;
    if out_stride == 0 {
        return Ok(());
    }

    let out = outputs[0].data_mut();
    for (src_row, dst_row) in source
        .chunks_exact(in_stride)
        .zip(out.chunks_exact_mut(out_stride))
    {
        for (src, dst) in src_row
            .chunks_exact(4)
            .zip(dst_row.chunks_exact_mut(2 * L::BYTES))
        {
            let pixel = Macropixel::read(src);
            let (first, second) = dst.split_at_mut(L::BYTES);

            let (r, g, b) = yuv_to_rgb(pixel.y0, pixel.u, pixel.v);
            L::write(r, g, b, first);
            let (r, g, b) = yuv_to_rgb(pixel.y1, pixel.u, pixel.v);
            L::write(r, g, b, second);
        }
    }
    Ok(())
}
