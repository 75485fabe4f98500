use super::{SubdeviceMode, validate};
use crate::error::{PreconditionError, Result};
use crate::format::{NativeEncoding, StandardFormat};
use crate::frame::ImageViewMut;

/// One raw pixel carrying two channels, each written to its own stream
pub trait ChannelSplit {
    type Pixel: Copy;

    const ENCODING: NativeEncoding;
    const FORMATS: [StandardFormat; 2];
    const FIRST_BYTES: usize;
    const SECOND_BYTES: usize;

    /// Read one raw pixel of `ENCODING.macropixel_bytes()` bytes
    fn read(source: &[u8]) -> Self::Pixel;

    fn write_first(pixel: Self::Pixel, target: &mut [u8]);

    fn write_second(pixel: Self::Pixel, target: &mut [u8]);
}

/// Left and right 8-bit samples, one byte each
pub struct Y8Y8FromY8i;

impl ChannelSplit for Y8Y8FromY8i {
    type Pixel = [u8; 2];

    const ENCODING: NativeEncoding = NativeEncoding::Y8i;
    const FORMATS: [StandardFormat; 2] = [StandardFormat::Y8, StandardFormat::Y8];
    const FIRST_BYTES: usize = 1;
    const SECOND_BYTES: usize = 1;

    fn read(source: &[u8]) -> [u8; 2] {
        [source[0], source[1]]
    }

    fn write_first(pixel: [u8; 2], target: &mut [u8]) {
        target[0] = pixel[0];
    }

    fn write_second(pixel: [u8; 2], target: &mut [u8]) {
        target[0] = pixel[1];
    }
}

/// Two 12-bit containers holding 10-bit samples, packed into 3 bytes.
///
/// ```text
/// byte 0: right[7:0]
/// byte 1: left[3:0] << 4 | right[11:8]
/// byte 2: left[11:4]
/// ```
///
/// Stream 0 receives the left sample, stream 1 the right one.
pub struct Y16Y16FromY12i;

impl Y16Y16FromY12i {
    /// `s << 6 | s >> 4` approximates `s * 65535 / 1023` for 10-bit `s`
    fn widen(sample: u16) -> [u8; 2] {
        (sample << 6 | sample >> 4).to_le_bytes()
    }
}

impl ChannelSplit for Y16Y16FromY12i {
    /// (left, right)
    type Pixel = (u16, u16);

    const ENCODING: NativeEncoding = NativeEncoding::Y12i;
    const FORMATS: [StandardFormat; 2] = [StandardFormat::Y16, StandardFormat::Y16];
    const FIRST_BYTES: usize = 2;
    const SECOND_BYTES: usize = 2;

    fn read(source: &[u8]) -> (u16, u16) {
        let [b0, b1, b2] = [source[0], source[1], source[2]].map(u16::from);
        let right = b0 | (b1 & 0x0F) << 8;
        let left = b1 >> 4 | b2 << 4;
        (left, right)
    }

    fn write_first(pixel: (u16, u16), target: &mut [u8]) {
        target.copy_from_slice(&Self::widen(pixel.0));
    }

    fn write_second(pixel: (u16, u16), target: &mut [u8]) {
        target.copy_from_slice(&Self::widen(pixel.1));
    }
}

/// Little-endian 16-bit depth followed by an 8-bit infrared byte
fn read_inri(source: &[u8]) -> ([u8; 2], u8) {
    ([source[0], source[1]], source[2])
}

/// Depth to Z16, infrared to Y8
pub struct Z16Y8FromInri;

impl ChannelSplit for Z16Y8FromInri {
    type Pixel = ([u8; 2], u8);

    const ENCODING: NativeEncoding = NativeEncoding::Inri;
    const FORMATS: [StandardFormat; 2] = [StandardFormat::Z16, StandardFormat::Y8];
    const FIRST_BYTES: usize = 2;
    const SECOND_BYTES: usize = 1;

    fn read(source: &[u8]) -> Self::Pixel {
        read_inri(source)
    }

    fn write_first(pixel: Self::Pixel, target: &mut [u8]) {
        target.copy_from_slice(&pixel.0);
    }

    fn write_second(pixel: Self::Pixel, target: &mut [u8]) {
        target[0] = pixel.1;
    }
}

/// Depth to Z16, infrared replicated into both bytes of Y16
pub struct Z16Y16FromInri;

impl ChannelSplit for Z16Y16FromInri {
    type Pixel = ([u8; 2], u8);

    const ENCODING: NativeEncoding = NativeEncoding::Inri;
    const FORMATS: [StandardFormat; 2] = [StandardFormat::Z16, StandardFormat::Y16];
    const FIRST_BYTES: usize = 2;
    const SECOND_BYTES: usize = 2;

    fn read(source: &[u8]) -> Self::Pixel {
        read_inri(source)
    }

    fn write_first(pixel: Self::Pixel, target: &mut [u8]) {
        target.copy_from_slice(&pixel.0);
    }

    fn write_second(pixel: Self::Pixel, target: &mut [u8]) {
        target.copy_from_slice(&[pixel.1, pixel.1]);
    }
}

/// Read each raw pixel once and scatter its channels to two streams
pub(super) fn split_frame<S: ChannelSplit>(
    mode: &SubdeviceMode,
    source: &[u8],
    outputs: &mut [ImageViewMut<'_>],
) -> Result<()> {
    validate(mode, source, outputs, &[S::ENCODING], &S::FORMATS)?;

    let request = &mode.streams[0];
    if request.width == 0 || request.height == 0 {
        return Ok(());
    }
    let source_bytes = S::ENCODING.macropixel_bytes();
    let in_stride = mode.raw_stride()?;

    let (first, second) = match outputs {
        [first, second] => (first, second),
        _ => {
            return Err(PreconditionError::StreamCount {
                expected: 2,
                actual: mode.streams.len(),
            }
            .into());
        }
    };
    let rows = first
        .data_mut()
        .chunks_exact_mut(request.width * S::FIRST_BYTES)
        .zip(second.data_mut().chunks_exact_mut(request.width * S::SECOND_BYTES));

    for (src_row, (a_row, b_row)) in source.chunks_exact(in_stride).zip(rows) {
        let pixels = src_row
            .chunks_exact(source_bytes)
            .zip(a_row.chunks_exact_mut(S::FIRST_BYTES))
            .zip(b_row.chunks_exact_mut(S::SECOND_BYTES));
        for ((src, a), b) in pixels {
            let pixel = S::read(src);
            S::write_first(pixel, a);
            S::write_second(pixel, b);
        }
    }
    Ok(())
}
