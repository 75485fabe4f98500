//! Format-tagged views over caller-owned pixel buffers
//!
//! A view checks once, at construction, that its buffer holds exactly
//! `image_size(width, height, format)` bytes. Engines then treat the bytes as
//! fixed-stride memory without further length checks.

use crate::error::{PreconditionError, Result};
use crate::format::{StandardFormat, image_size};

/// Read-only image buffer
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    format: StandardFormat,
}

impl<'a> ImageView<'a> {
    pub fn new(data: &'a [u8], width: usize, height: usize, format: StandardFormat) -> Result<Self> {
        check_len(data.len(), width, height, format)?;
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> StandardFormat {
        self.format
    }

    /// Bytes of one row
    pub fn stride(&self) -> usize {
        row_bytes(self.width, self.format)
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

/// Writable image buffer
#[derive(Debug)]
pub struct ImageViewMut<'a> {
    data: &'a mut [u8],
    width: usize,
    height: usize,
    format: StandardFormat,
}

impl<'a> ImageViewMut<'a> {
    pub fn new(
        data: &'a mut [u8],
        width: usize,
        height: usize,
        format: StandardFormat,
    ) -> Result<Self> {
        check_len(data.len(), width, height, format)?;
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    pub fn data(&self) -> &[u8] {
        &*self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> StandardFormat {
        self.format
    }

    pub fn stride(&self) -> usize {
        row_bytes(self.width, self.format)
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Reborrow as a read-only view
    pub fn as_view(&self) -> ImageView<'_> {
        ImageView {
            data: &*self.data,
            width: self.width,
            height: self.height,
            format: self.format,
        }
    }

    /// Fill every pixel with `pixel`, which must be one pixel wide
    pub fn fill(&mut self, pixel: &[u8]) -> Result<()> {
        let bytes = self
            .format
            .bytes_per_pixel()
            .ok_or(PreconditionError::NotByteAddressable(self.format))?;
        if pixel.len() != bytes {
            return Err(PreconditionError::BufferSize {
                expected: bytes,
                actual: pixel.len(),
            }
            .into());
        }
        for chunk in self.data.chunks_exact_mut(bytes) {
            chunk.copy_from_slice(pixel);
        }
        Ok(())
    }
}

/// Ensure a view has the given dimensions and format
pub(crate) fn expect_shape(
    width: usize,
    height: usize,
    format: StandardFormat,
    expected_width: usize,
    expected_height: usize,
    expected_format: StandardFormat,
    index: usize,
) -> Result<()> {
    if format != expected_format {
        return Err(PreconditionError::FormatMismatch {
            index,
            expected: expected_format,
            actual: format,
        }
        .into());
    }
    if width != expected_width || height != expected_height {
        return Err(PreconditionError::Dimensions {
            expected_width,
            expected_height,
            actual_width: width,
            actual_height: height,
        }
        .into());
    }
    Ok(())
}

fn row_bytes(width: usize, format: StandardFormat) -> usize {
    match format.bytes_per_pixel() {
        Some(bytes) => width * bytes,
        None => width * 2,
    }
}

/// Once this passes, row bytes and pixel count of the view fit in `usize`
fn check_len(len: usize, width: usize, height: usize, format: StandardFormat) -> Result<()> {
    image_size(width, 1, format)?;
    let expected = image_size(width, height, format)?;
    if len != expected {
        return Err(PreconditionError::BufferSize {
            expected,
            actual: len,
        }
        .into());
    }
    Ok(())
}
