//! Decoding of sensor-native frames into standard images
//!
//! A [`SubdeviceMode`] describes one raw capture configuration and the
//! stream(s) it decodes into. Its [`Unpacker`] names the decoder. Every
//! decoder checks the whole mode, the raw buffer and every output before it
//! writes a single byte.

mod pixel;
mod split;
mod subrect;
mod yuy2;

pub use pixel::{PixelConversion, Y16FromY8, Y16FromY10};
pub use split::{ChannelSplit, Y8Y8FromY8i, Y16Y16FromY12i, Z16Y8FromInri, Z16Y16FromInri};
pub use yuy2::{Bgr8, Bgra8, Rgb8, Rgba8, RgbLayout};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PreconditionError, Result};
use crate::format::{NativeEncoding, StandardFormat, native_image_size};
use crate::frame::{ImageViewMut, expect_shape};

/// One decoded output a mode produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRequest {
    pub width: usize,
    pub height: usize,
    pub format: StandardFormat,
}

impl StreamRequest {
    pub fn new(width: usize, height: usize, format: StandardFormat) -> Self {
        Self {
            width,
            height,
            format,
        }
    }
}

/// Decoder used by a [`SubdeviceMode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unpacker {
    /// Row-wise crop of an encoding that already matches its output format
    Subrect,
    Y16FromY8,
    Y16FromY10,
    RgbFromYuy2,
    RgbaFromYuy2,
    BgrFromYuy2,
    BgraFromYuy2,
    Y8Y8FromY8i,
    Y16Y16FromY12i,
    Z16Y8FromInri,
    Z16Y16FromInri,
}

impl Unpacker {
    /// Pick the decoder turning `encoding` into streams of `formats`.
    ///
    /// A `Y16 ` encoding carries 10 significant bits, so a Y16 request is
    /// rescaled rather than copied.
    pub fn select(encoding: NativeEncoding, formats: &[StandardFormat]) -> Option<Unpacker> {
        use NativeEncoding as E;
        use StandardFormat as F;

        let unpacker = match (encoding, formats) {
            (E::Y16, [F::Y16]) => Unpacker::Y16FromY10,
            (E::Y8 | E::Invi, [F::Y16]) => Unpacker::Y16FromY8,
            (E::Yuy2, [F::Rgb8]) => Unpacker::RgbFromYuy2,
            (E::Yuy2, [F::Rgba8]) => Unpacker::RgbaFromYuy2,
            (E::Yuy2, [F::Bgr8]) => Unpacker::BgrFromYuy2,
            (E::Yuy2, [F::Bgra8]) => Unpacker::BgraFromYuy2,
            (E::Y8i, [F::Y8, F::Y8]) => Unpacker::Y8Y8FromY8i,
            (E::Y12i, [F::Y16, F::Y16]) => Unpacker::Y16Y16FromY12i,
            (E::Inri, [F::Z16, F::Y8]) => Unpacker::Z16Y8FromInri,
            (E::Inri, [F::Z16, F::Y16]) => Unpacker::Z16Y16FromInri,
            (_, [format]) if encoding.passthrough_format() == Some(*format) => Unpacker::Subrect,
            _ => return None,
        };
        Some(unpacker)
    }

    /// Number of output streams this decoder fills
    pub const fn stream_count(&self) -> usize {
        match self {
            Unpacker::Y8Y8FromY8i
            | Unpacker::Y16Y16FromY12i
            | Unpacker::Z16Y8FromInri
            | Unpacker::Z16Y16FromInri => 2,
            _ => 1,
        }
    }

    /// Decode `source`, a raw frame of `mode`, into `outputs`
    pub fn unpack(
        &self,
        mode: &SubdeviceMode,
        source: &[u8],
        outputs: &mut [ImageViewMut<'_>],
    ) -> Result<()> {
        debug!(
            encoding = %mode.encoding,
            width = mode.width,
            height = mode.height,
            unpacker = ?self,
            "unpacking raw frame"
        );

        match self {
            Unpacker::Subrect => subrect::unpack_subrect(mode, source, outputs),
            Unpacker::Y16FromY8 => pixel::unpack_pixels::<Y16FromY8>(mode, source, outputs),
            Unpacker::Y16FromY10 => pixel::unpack_pixels::<Y16FromY10>(mode, source, outputs),
            Unpacker::RgbFromYuy2 => yuy2::unpack_from_yuy2::<Rgb8>(mode, source, outputs),
            Unpacker::RgbaFromYuy2 => yuy2::unpack_from_yuy2::<Rgba8>(mode, source, outputs),
            Unpacker::BgrFromYuy2 => yuy2::unpack_from_yuy2::<Bgr8>(mode, source, outputs),
            Unpacker::BgraFromYuy2 => yuy2::unpack_from_yuy2::<Bgra8>(mode, source, outputs),
            Unpacker::Y8Y8FromY8i => split::split_frame::<Y8Y8FromY8i>(mode, source, outputs),
            Unpacker::Y16Y16FromY12i => {
                split::split_frame::<Y16Y16FromY12i>(mode, source, outputs)
            }
            Unpacker::Z16Y8FromInri => split::split_frame::<Z16Y8FromInri>(mode, source, outputs),
            Unpacker::Z16Y16FromInri => {
                split::split_frame::<Z16Y16FromInri>(mode, source, outputs)
            }
        }
    }
}

/// One raw capture configuration and the streams it decodes into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdeviceMode {
    pub width: usize,
    pub height: usize,
    pub encoding: NativeEncoding,
    pub streams: Vec<StreamRequest>,
    pub unpacker: Unpacker,
}

impl SubdeviceMode {
    pub fn new(
        width: usize,
        height: usize,
        encoding: NativeEncoding,
        streams: Vec<StreamRequest>,
        unpacker: Unpacker,
    ) -> Self {
        Self {
            width,
            height,
            encoding,
            streams,
            unpacker,
        }
    }

    /// Build a mode whose decoder is chosen from the requested formats
    pub fn with_streams(
        width: usize,
        height: usize,
        encoding: NativeEncoding,
        streams: Vec<StreamRequest>,
    ) -> Option<Self> {
        let formats: Vec<StandardFormat> = streams.iter().map(|s| s.format).collect();
        let unpacker = Unpacker::select(encoding, &formats)?;
        Some(Self::new(width, height, encoding, streams, unpacker))
    }

    /// Bytes of one raw frame
    pub fn raw_size(&self) -> Result<usize> {
        native_image_size(self.width, self.height, self.encoding)
    }

    /// Bytes of one raw row
    pub fn raw_stride(&self) -> Result<usize> {
        native_image_size(self.width, 1, self.encoding)
    }

    pub fn unpack(&self, source: &[u8], outputs: &mut [ImageViewMut<'_>]) -> Result<()> {
        self.unpacker.unpack(self, source, outputs)
    }
}

/// Shared precondition check for every decoder.
///
/// `encodings` lists the raw layouts the decoder reads, `formats` the output
/// format of each stream, in order.
pub(crate) fn validate(
    mode: &SubdeviceMode,
    source: &[u8],
    outputs: &[ImageViewMut<'_>],
    encodings: &[NativeEncoding],
    formats: &[StandardFormat],
) -> Result<()> {
    if !encodings.contains(&mode.encoding) {
        return Err(PreconditionError::EncodingMismatch {
            actual: mode.encoding,
        }
        .into());
    }

    for count in [mode.streams.len(), outputs.len()] {
        if count != formats.len() {
            return Err(PreconditionError::StreamCount {
                expected: formats.len(),
                actual: count,
            }
            .into());
        }
    }

    for (index, (request, &format)) in mode.streams.iter().zip(formats).enumerate() {
        if request.format != format {
            return Err(PreconditionError::FormatMismatch {
                index,
                expected: format,
                actual: request.format,
            }
            .into());
        }
        if request.width > mode.width || request.height > mode.height {
            return Err(PreconditionError::StreamExceedsMode {
                index,
                width: request.width,
                height: request.height,
                mode_width: mode.width,
                mode_height: mode.height,
            }
            .into());
        }
    }

    if let [first, second] = mode.streams.as_slice() {
        if first.width != second.width || first.height != second.height {
            return Err(PreconditionError::StreamDimensions.into());
        }
    }

    for (index, (output, request)) in outputs.iter().zip(&mode.streams).enumerate() {
        expect_shape(
            output.width(),
            output.height(),
            output.format(),
            request.width,
            request.height,
            request.format,
            index,
        )?;
    }

    let expected = mode.raw_size()?;
    if source.len() != expected {
        return Err(PreconditionError::BufferSize {
            expected,
            actual: source.len(),
        }
        .into());
    }

    Ok(())
}
