use super::{SubdeviceMode, validate};
use crate::error::{PreconditionError, Result};
use crate::format::image_size;
use crate::frame::ImageViewMut;

/// Crop a raw frame whose layout already matches its output format
pub(super) fn unpack_subrect(
    mode: &SubdeviceMode,
    source: &[u8],
    outputs: &mut [ImageViewMut<'_>],
) -> Result<()> {
    let format = mode
        .encoding
        .passthrough_format()
        .ok_or(PreconditionError::EncodingMismatch {
            actual: mode.encoding,
        })?;
    validate(mode, source, outputs, &[mode.encoding], &[format])?;

    let request = &mode.streams[0];
    let in_stride = mode.raw_stride()?;
    let out_stride = image_size(request.width, 1, request.format)?;
    let row_bytes = in_stride.min(out_stride);
    let rows = mode.height.min(request.height);
    if row_bytes == 0 {
        return Ok(());
    }

    let out = outputs[0].data_mut();
    for (src, dst) in source
        .chunks_exact(in_stride)
        .zip(out.chunks_exact_mut(out_stride))
        .take(rows)
    {
        dst[..row_bytes].copy_from_slice(&src[..row_bytes]);
    }
    Ok(())
}
