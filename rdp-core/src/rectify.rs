//! Precomputed lookup tables that remove lens distortion and rotation
//!
//! A table is built once per calibration by running the depth walk over the
//! rectified image at a constant depth of one unit. Every rectified pixel then
//! holds the raster index of the unrectified pixel it samples from, or
//! [`UNMAPPED`] when its ray leaves the source image.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::align::{ConstantDepth, PixelTransfer, align_images};
use crate::camera::{Extrinsics, Geometry, Intrinsics};
use crate::error::{PreconditionError, Result};
use crate::frame::{ImageView, ImageViewMut};

/// Table entry for a rectified pixel with no source pixel
pub const UNMAPPED: u32 = u32::MAX;

/// Nearest-neighbour map from rectified pixels to unrectified source pixels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectificationTable {
    width: usize,
    height: usize,
    source_width: usize,
    source_height: usize,
    entries: Vec<u32>,
}

/// Writes each source index into the slot of the rectified pixel that found it
struct TableRecord<'a> {
    entries: &'a mut [u32],
}

impl PixelTransfer for TableRecord<'_> {
    fn extent(&self) -> (Option<usize>, Option<usize>) {
        (Some(self.entries.len()), None)
    }

    fn transfer(&mut self, rect_index: usize, unrect_index: usize) {
        // Source indices beyond u32 cannot be stored and stay unmapped
        if let Ok(index) = u32::try_from(unrect_index) {
            if index != UNMAPPED {
                self.entries[rect_index] = index;
            }
        }
    }
}

impl RectificationTable {
    /// Build the table for a rectified stream and the stream it is resampled
    /// from.
    pub fn compute<G: Geometry + ?Sized>(
        rect_intrinsics: &Intrinsics,
        rect_to_unrect: &Extrinsics,
        unrect_intrinsics: &Intrinsics,
        geometry: &G,
    ) -> Result<Self> {
        let mut entries = vec![UNMAPPED; rect_intrinsics.pixel_count()?];
        let mut record = TableRecord {
            entries: &mut entries,
        };
        align_images(
            rect_intrinsics,
            rect_to_unrect,
            unrect_intrinsics,
            geometry,
            &ConstantDepth(1.0),
            &mut record,
        )?;

        let table = Self {
            width: rect_intrinsics.width,
            height: rect_intrinsics.height,
            source_width: unrect_intrinsics.width,
            source_height: unrect_intrinsics.height,
            entries,
        };
        debug!(
            width = table.width,
            height = table.height,
            source_width = table.source_width,
            source_height = table.source_height,
            coverage = table.coverage(),
            "computed rectification table"
        );
        Ok(table)
    }

    /// Rectified resolution
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Resolution of the images this table samples from
    pub fn source_dimensions(&self) -> (usize, usize) {
        (self.source_width, self.source_height)
    }

    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Source index for rectified pixel `index`, `None` when unmapped or out
    /// of range
    pub fn get(&self, index: usize) -> Option<usize> {
        match self.entries.get(index) {
            Some(&UNMAPPED) | None => None,
            Some(&entry) => Some(entry as usize),
        }
    }

    /// Fraction of rectified pixels that have a source
    pub fn coverage(&self) -> f32 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let mapped = self.entries.iter().filter(|&&e| e != UNMAPPED).count();
        mapped as f32 / self.entries.len() as f32
    }

    /// Gather `source` through the table into `out`.
    ///
    /// Unmapped pixels of `out` keep their previous contents. Nothing is
    /// written unless every check passes.
    pub fn apply(&self, source: &ImageView<'_>, out: &mut ImageViewMut<'_>) -> Result<()> {
        self.check(source, out)?;
        debug!(
            width = self.width,
            height = self.height,
            format = %source.format(),
            "rectifying image"
        );

        let src = source.data();
        let dst = out.data_mut();
        let gathered = match source.format().bytes_per_pixel() {
            Some(1) => self.gather::<1>(src, dst),
            Some(2) => self.gather::<2>(src, dst),
            Some(3) => self.gather::<3>(src, dst),
            Some(4) => self.gather::<4>(src, dst),
            _ => return Err(PreconditionError::NotByteAddressable(source.format()).into()),
        };
        trace!(gathered, "rectified pixels written");
        Ok(())
    }

    fn check(&self, source: &ImageView<'_>, out: &ImageViewMut<'_>) -> Result<()> {
        let format = source.format();
        if format.bytes_per_pixel().is_none() {
            return Err(PreconditionError::NotByteAddressable(format).into());
        }
        if out.format() != format {
            return Err(PreconditionError::FormatMismatch {
                index: 1,
                expected: format,
                actual: out.format(),
            }
            .into());
        }
        if (source.width(), source.height()) != self.source_dimensions() {
            return Err(PreconditionError::Dimensions {
                expected_width: self.source_width,
                expected_height: self.source_height,
                actual_width: source.width(),
                actual_height: source.height(),
            }
            .into());
        }
        if (out.width(), out.height()) != self.dimensions() {
            return Err(PreconditionError::Dimensions {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: out.width(),
                actual_height: out.height(),
            }
            .into());
        }
        let expected = self.width.checked_mul(self.height).ok_or(
            PreconditionError::SizeOverflow {
                width: self.width,
                height: self.height,
            },
        )?;
        if self.entries.len() != expected {
            return Err(PreconditionError::BufferSize {
                expected,
                actual: self.entries.len(),
            }
            .into());
        }

        let source_pixels = source.pixel_count();
        if let Some((index, &entry)) = self
            .entries
            .iter()
            .enumerate()
            .find(|&(_, &e)| e != UNMAPPED && e as usize >= source_pixels)
        {
            return Err(PreconditionError::TableEntry {
                index,
                entry,
                source_pixels,
            }
            .into());
        }
        Ok(())
    }

    fn gather<const N: usize>(&self, source: &[u8], out: &mut [u8]) -> usize {
        let mut gathered = 0;
        for (dst, &entry) in out.chunks_exact_mut(N).zip(&self.entries) {
            if entry == UNMAPPED {
                continue;
            }
            let from = entry as usize * N;
            dst.copy_from_slice(&source[from..from + N]);
            gathered += 1;
        }
        gathered
    }
}

/// Resample `source` through `table` into `out`
pub fn rectify_image(
    table: &RectificationTable,
    source: &ImageView<'_>,
    out: &mut ImageViewMut<'_>,
) -> Result<()> {
    table.apply(source, out)
}
