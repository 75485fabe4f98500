use tracing::{debug, trace};

use super::{DepthSource, PixelTransfer, ScaledDepth, align_images};
use crate::camera::{Extrinsics, Geometry, Intrinsics};
use crate::error::{PreconditionError, Result};
use crate::format::StandardFormat;
use crate::frame::{ImageView, ImageViewMut, expect_shape};

/// Copies an `N`-byte pixel from the depth-side source to the other-side target
pub struct ForwardCopy<'a, const N: usize> {
    source: &'a [u8],
    target: &'a mut [u8],
}

impl<'a, const N: usize> ForwardCopy<'a, N> {
    pub fn new(source: &'a [u8], target: &'a mut [u8]) -> Self {
        Self { source, target }
    }
}

impl<const N: usize> PixelTransfer for ForwardCopy<'_, N> {
    fn transfer(&mut self, depth_index: usize, other_index: usize) {
        copy_pixel::<N>(self.source, depth_index, self.target, other_index);
    }

    fn extent(&self) -> (Option<usize>, Option<usize>) {
        (Some(self.source.len() / N), Some(self.target.len() / N))
    }
}

/// Copies an `N`-byte pixel from the other-side source to the depth-side target
pub struct BackwardCopy<'a, const N: usize> {
    source: &'a [u8],
    target: &'a mut [u8],
}

impl<'a, const N: usize> BackwardCopy<'a, N> {
    pub fn new(source: &'a [u8], target: &'a mut [u8]) -> Self {
        Self { source, target }
    }
}

impl<const N: usize> PixelTransfer for BackwardCopy<'_, N> {
    fn transfer(&mut self, depth_index: usize, other_index: usize) {
        copy_pixel::<N>(self.source, other_index, self.target, depth_index);
    }

    fn extent(&self) -> (Option<usize>, Option<usize>) {
        (Some(self.target.len() / N), Some(self.source.len() / N))
    }
}

fn copy_pixel<const N: usize>(source: &[u8], from: usize, target: &mut [u8], to: usize) {
    target[to * N..(to + 1) * N].copy_from_slice(&source[from * N..(from + 1) * N]);
}

/// Calibrated pair of a depth stream and one other stream
///
/// Both operations leave output pixels they never reach untouched, so the
/// caller pre-fills `out` with whatever "no data" value it wants.
#[derive(Debug, Clone)]
pub struct Aligner<'a, G: Geometry> {
    depth_intrinsics: &'a Intrinsics,
    depth_to_other: &'a Extrinsics,
    other_intrinsics: &'a Intrinsics,
    geometry: G,
}

impl<'a, G: Geometry> Aligner<'a, G> {
    pub fn new(
        depth_intrinsics: &'a Intrinsics,
        depth_to_other: &'a Extrinsics,
        other_intrinsics: &'a Intrinsics,
        geometry: G,
    ) -> Self {
        Self {
            depth_intrinsics,
            depth_to_other,
            other_intrinsics,
            geometry,
        }
    }

    pub fn depth_intrinsics(&self) -> &Intrinsics {
        self.depth_intrinsics
    }

    pub fn other_intrinsics(&self) -> &Intrinsics {
        self.other_intrinsics
    }

    /// Run the shared walk with any depth source and transfer
    pub fn walk<D, T>(&self, depth: &D, transfer: &mut T) -> Result<usize>
    where
        D: DepthSource + ?Sized,
        T: PixelTransfer + ?Sized,
    {
        align_images(
            self.depth_intrinsics,
            self.depth_to_other,
            self.other_intrinsics,
            &self.geometry,
            depth,
            transfer,
        )
    }

    /// Re-render the depth image from the other sensor's viewpoint.
    ///
    /// `out` is Z16 at the other stream's resolution and receives raw depth
    /// units, not meters.
    pub fn depth_to_other(
        &self,
        depth: &ImageView<'_>,
        depth_scale: f32,
        out: &mut ImageViewMut<'_>,
    ) -> Result<()> {
        self.check_depth(depth)?;
        let other = self.other_intrinsics;
        expect_shape(
            out.width(),
            out.height(),
            out.format(),
            other.width,
            other.height,
            StandardFormat::Z16,
            1,
        )?;

        debug!(
            depth_width = depth.width(),
            depth_height = depth.height(),
            other_width = other.width,
            other_height = other.height,
            depth_scale,
            "aligning depth to other stream"
        );

        let source = ScaledDepth::new(depth.data(), depth_scale);
        let mut copy = ForwardCopy::<2>::new(depth.data(), out.data_mut());
        let transferred = self.walk(&source, &mut copy)?;
        trace!(transferred, "depth pixels written");
        Ok(())
    }

    /// Sample the other image at the location each depth pixel projects to.
    ///
    /// `out` matches the depth stream's resolution and `other`'s format.
    pub fn other_to_depth(
        &self,
        depth: &ImageView<'_>,
        depth_scale: f32,
        other: &ImageView<'_>,
        out: &mut ImageViewMut<'_>,
    ) -> Result<()> {
        self.check_depth(depth)?;
        let format = other.format();
        let bytes = format
            .bytes_per_pixel()
            .ok_or(PreconditionError::NotByteAddressable(format))?;
        expect_shape(
            other.width(),
            other.height(),
            format,
            self.other_intrinsics.width,
            self.other_intrinsics.height,
            format,
            1,
        )?;
        expect_shape(
            out.width(),
            out.height(),
            out.format(),
            self.depth_intrinsics.width,
            self.depth_intrinsics.height,
            format,
            2,
        )?;

        debug!(
            depth_width = depth.width(),
            depth_height = depth.height(),
            other_width = other.width(),
            other_height = other.height(),
            %format,
            "aligning other stream to depth"
        );

        let source = ScaledDepth::new(depth.data(), depth_scale);
        let target = out.data_mut();
        let transferred = match bytes {
            1 => self.walk(&source, &mut BackwardCopy::<1>::new(other.data(), target))?,
            2 => self.walk(&source, &mut BackwardCopy::<2>::new(other.data(), target))?,
            3 => self.walk(&source, &mut BackwardCopy::<3>::new(other.data(), target))?,
            4 => self.walk(&source, &mut BackwardCopy::<4>::new(other.data(), target))?,
            _ => return Err(PreconditionError::NotByteAddressable(format).into()),
        };
        trace!(transferred, "other pixels sampled");
        Ok(())
    }

    fn check_depth(&self, depth: &ImageView<'_>) -> Result<()> {
        expect_shape(
            depth.width(),
            depth.height(),
            depth.format(),
            self.depth_intrinsics.width,
            self.depth_intrinsics.height,
            StandardFormat::Z16,
            0,
        )
    }
}

/// Re-render `depth` from the other sensor's viewpoint into `out`
pub fn align_depth_to_other<G: Geometry>(
    depth: &ImageView<'_>,
    depth_scale: f32,
    depth_intrinsics: &Intrinsics,
    depth_to_other: &Extrinsics,
    other_intrinsics: &Intrinsics,
    geometry: G,
    out: &mut ImageViewMut<'_>,
) -> Result<()> {
    Aligner::new(depth_intrinsics, depth_to_other, other_intrinsics, geometry)
        .depth_to_other(depth, depth_scale, out)
}

/// Resample `other` onto the depth image's pixel grid into `out`
#[allow(clippy::too_many_arguments)]
pub fn align_other_to_depth<G: Geometry>(
    depth: &ImageView<'_>,
    depth_scale: f32,
    depth_intrinsics: &Intrinsics,
    depth_to_other: &Extrinsics,
    other_intrinsics: &Intrinsics,
    other: &ImageView<'_>,
    geometry: G,
    out: &mut ImageViewMut<'_>,
) -> Result<()> {
    Aligner::new(depth_intrinsics, depth_to_other, other_intrinsics, geometry)
        .other_to_depth(depth, depth_scale, other, out)
}
