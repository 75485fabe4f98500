use super::{SubdeviceMode, validate};
use crate::error::Result;
use crate::format::{NativeEncoding, StandardFormat};
use crate::frame::ImageViewMut;

/// One raw pixel in, one output pixel out
pub trait PixelConversion {
    type Value: Copy;

    /// Raw layouts this conversion reads
    const ENCODINGS: &'static [NativeEncoding];
    const TARGET: StandardFormat;
    const SOURCE_BYTES: usize;
    const TARGET_BYTES: usize;

    /// Read one raw pixel from `SOURCE_BYTES` bytes
    fn read(source: &[u8]) -> Self::Value;

    /// Write one output pixel into `TARGET_BYTES` bytes
    fn write(value: Self::Value, target: &mut [u8]);
}

/// 8-bit greyscale widened to 16 bits, full white stays full white
pub struct Y16FromY8;

impl PixelConversion for Y16FromY8 {
    type Value = u8;

    const ENCODINGS: &'static [NativeEncoding] = &[NativeEncoding::Y8, NativeEncoding::Invi];
    const TARGET: StandardFormat = StandardFormat::Y16;
    const SOURCE_BYTES: usize = 1;
    const TARGET_BYTES: usize = 2;

    fn read(source: &[u8]) -> u8 {
        source[0]
    }

    fn write(value: u8, target: &mut [u8]) {
        let wide = u16::from(value);
        target.copy_from_slice(&(wide | wide << 8).to_le_bytes());
    }
}

/// 10 significant bits in a 16-bit container, scaled to the full 16-bit range
pub struct Y16FromY10;

impl PixelConversion for Y16FromY10 {
    type Value = u16;

    const ENCODINGS: &'static [NativeEncoding] = &[NativeEncoding::Y16];
    const TARGET: StandardFormat = StandardFormat::Y16;
    const SOURCE_BYTES: usize = 2;
    const TARGET_BYTES: usize = 2;

    fn read(source: &[u8]) -> u16 {
        u16::from_le_bytes([source[0], source[1]])
    }

    fn write(value: u16, target: &mut [u8]) {
        target.copy_from_slice(&(value << 6).to_le_bytes());
    }
}

/// Convert every pixel of the requested sub-rectangle, skipping the trailing
/// raw pixels of each row
pub(super) fn unpack_pixels<C: PixelConversion>(
    mode: &SubdeviceMode,
    source: &[u8],
    outputs: &mut [ImageViewMut<'_>],
) -> Result<()> {
    validate(mode, source, outputs, C::ENCODINGS, &[C::TARGET])?;

    let request = &mode.streams[0];
    let in_stride = mode.raw_stride()?;
    let out_stride = request.width * C::TARGET_BYTES;
    if out_stride == 0 {
        return Ok(());
    }

    let out = outputs[0].data_mut();
    for (src_row, dst_row) in source
        .chunks_exact(in_stride)
        .zip(out.chunks_exact_mut(out_stride))
    {
        for (src, dst) in src_row
            .chunks_exact(C::SOURCE_BYTES)
            .zip(dst_row.chunks_exact_mut(C::TARGET_BYTES))
        {
            C::write(C::read(src), dst);
        }
    }
    Ok(())
}
