//! Depth-driven pixel mapping between two calibrated streams
//!
//! [`align_images`] is the one geometric walk shared by alignment and
//! rectification. It visits the depth image in raster order, deprojects every
//! pixel with a non-zero depth, moves the point into the other sensor's frame,
//! projects it and hands the nearest in-bounds pixel to a [`PixelTransfer`].
//!
//! No interpolation and no occlusion handling: when several depth pixels land
//! on the same target pixel, the one visited last wins. Pixels with zero depth
//! or an out-of-bounds projection are skipped and their targets left as they
//! were.

mod transfer;

pub use transfer::{Aligner, BackwardCopy, ForwardCopy, align_depth_to_other, align_other_to_depth};

use tracing::trace;

use crate::camera::{Extrinsics, Geometry, Intrinsics};
use crate::error::{PreconditionError, Result};

/// Metric depth for a depth-image raster index, `0.0` meaning no data
pub trait DepthSource {
    fn depth_at(&self, index: usize) -> f32;

    /// Number of indices `depth_at` accepts, `None` when unbounded
    fn pixel_count(&self) -> Option<usize> {
        None
    }
}

/// Action taken for each depth pixel that lands inside the other image
pub trait PixelTransfer {
    fn transfer(&mut self, depth_index: usize, other_index: usize);

    /// Depth-side and other-side indices `transfer` accepts, `None` when
    /// unbounded
    fn extent(&self) -> (Option<usize>, Option<usize>) {
        (None, None)
    }
}

/// Z16 depth buffer scaled to meters
#[derive(Debug, Clone, Copy)]
pub struct ScaledDepth<'a> {
    pixels: &'a [u8],
    scale: f32,
}

impl<'a> ScaledDepth<'a> {
    /// `pixels` holds little-endian 16-bit depth units
    pub fn new(pixels: &'a [u8], scale: f32) -> Self {
        Self { pixels, scale }
    }
}

impl DepthSource for ScaledDepth<'_> {
    fn depth_at(&self, index: usize) -> f32 {
        let raw = u16::from_le_bytes([self.pixels[2 * index], self.pixels[2 * index + 1]]);
        f32::from(raw) * self.scale
    }

    fn pixel_count(&self) -> Option<usize> {
        Some(self.pixels.len() / 2)
    }
}

/// The same depth everywhere, for direction-only mappings
#[derive(Debug, Clone, Copy)]
pub struct ConstantDepth(pub f32);

impl DepthSource for ConstantDepth {
    fn depth_at(&self, _index: usize) -> f32 {
        self.0
    }
}

/// Walk every depth pixel and transfer the ones that land in the other image.
///
/// `depth` and `transfer` must cover every pixel of the intrinsics on their
/// side; this is checked before the walk starts. Returns the number of
/// transfers made.
pub fn align_images<G, D, T>(
    depth_intrinsics: &Intrinsics,
    depth_to_other: &Extrinsics,
    other_intrinsics: &Intrinsics,
    geometry: &G,
    depth: &D,
    transfer: &mut T,
) -> Result<usize>
where
    G: Geometry + ?Sized,
    D: DepthSource + ?Sized,
    T: PixelTransfer + ?Sized,
{
    let depth_pixels = depth_intrinsics.pixel_count()?;
    let other_pixels = other_intrinsics.pixel_count()?;
    let (depth_extent, other_extent) = transfer.extent();
    for (available, required) in [
        (depth.pixel_count(), depth_pixels),
        (depth_extent, depth_pixels),
        (other_extent, other_pixels),
    ] {
        if let Some(actual) = available.filter(|&actual| actual < required) {
            return Err(PreconditionError::PixelCount {
                expected: required,
                actual,
            }
            .into());
        }
    }

    let mut transferred = 0;
    let mut depth_index = 0;

    for y in 0..depth_intrinsics.height {
        for x in 0..depth_intrinsics.width {
            let index = depth_index;
            depth_index += 1;

            let d = depth.depth_at(index);
            if d == 0.0 {
                continue;
            }

            let Some(depth_point) = geometry.deproject(depth_intrinsics, (x as f32, y as f32), d)
            else {
                continue;
            };
            let other_point = geometry.transform(depth_to_other, &depth_point);
            let Some((px, py)) = geometry.project(other_intrinsics, &other_point) else {
                continue;
            };
            if !px.is_finite() || !py.is_finite() {
                continue;
            }

            let Some(other_index) =
                other_intrinsics.index_of(px.round() as i64, py.round() as i64)
            else {
                continue;
            };

            transfer.transfer(index, other_index);
            transferred += 1;
        }
    }

    trace!(transferred, visited = depth_index, "depth walk finished");
    Ok(transferred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PinholeGeometry;
    use crate::error::RdpError;
    use nalgebra::Vector3;

    /// Records every (depth, other) pair the walk produces
    #[derive(Default)]
    struct Recorder(Vec<(usize, usize)>);

    impl PixelTransfer for Recorder {
        fn transfer(&mut self, depth_index: usize, other_index: usize) {
            self.0.push((depth_index, other_index));
        }
    }

    struct Depths(Vec<f32>);

    impl DepthSource for Depths {
        fn depth_at(&self, index: usize) -> f32 {
            self.0[index]
        }

        fn pixel_count(&self) -> Option<usize> {
            Some(self.0.len())
        }
    }

    /// Sends every point to the same pixel
    struct Collapse;

    impl Geometry for Collapse {
        fn deproject(&self, _: &Intrinsics, pixel: (f32, f32), depth: f32) -> Option<Vector3<f32>> {
            Some(Vector3::new(pixel.0, pixel.1, depth))
        }

        fn project(&self, _: &Intrinsics, _: &Vector3<f32>) -> Option<(f32, f32)> {
            Some((1.0, 0.0))
        }
    }

    fn unit_camera(width: usize, height: usize) -> Intrinsics {
        Intrinsics::new_ideal(width, height, 1.0, 1.0, 0.0, 0.0)
    }

    #[test]
    fn test_walk_is_raster_ordered_identity() {
        let intrin = Intrinsics::new_ideal(3, 2, 2.0, 2.0, 1.0, 0.5);
        let mut recorder = Recorder::default();
        let count = align_images(
            &intrin,
            &Extrinsics::identity(),
            &intrin,
            &PinholeGeometry,
            &ConstantDepth(1.5),
            &mut recorder,
        )
        .unwrap();
        assert_eq!(count, 6);
        assert_eq!(recorder.0, (0..6).map(|i| (i, i)).collect::<Vec<_>>());
    }

    #[test]
    fn test_walk_skips_zero_depth() {
        let intrin = unit_camera(2, 2);
        let mut recorder = Recorder::default();
        let depths = Depths(vec![0.0, 1.0, 0.0, 2.0]);
        align_images(
            &intrin,
            &Extrinsics::identity(),
            &intrin,
            &PinholeGeometry,
            &depths,
            &mut recorder,
        )
        .unwrap();
        assert_eq!(recorder.0, [(1, 1), (3, 3)]);
    }

    #[test]
    fn test_walk_skips_out_of_bounds() {
        let intrin = unit_camera(3, 1);
        // One unit to the right at depth one is one pixel to the right
        let shift = Extrinsics::from_row_major(
            [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
        );
        let mut recorder = Recorder::default();
        align_images(
            &intrin,
            &shift,
            &intrin,
            &PinholeGeometry,
            &ConstantDepth(1.0),
            &mut recorder,
        )
        .unwrap();
        assert_eq!(recorder.0, [(0, 1), (1, 2)]);
    }

    #[test]
    fn test_walk_skips_points_behind_other_camera() {
        let intrin = unit_camera(2, 2);
        let behind = Extrinsics::from_row_major(
            [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, -10.0],
        );
        let mut recorder = Recorder::default();
        let count = align_images(
            &intrin,
            &behind,
            &intrin,
            &PinholeGeometry,
            &ConstantDepth(1.0),
            &mut recorder,
        )
        .unwrap();
        assert_eq!(count, 0);
        assert!(recorder.0.is_empty());
    }

    #[test]
    fn test_walk_uses_custom_geometry() {
        let depth_intrin = unit_camera(2, 2);
        let other_intrin = unit_camera(2, 1);
        let mut recorder = Recorder::default();
        align_images(
            &depth_intrin,
            &Extrinsics::identity(),
            &other_intrin,
            &Collapse,
            &ConstantDepth(1.0),
            &mut recorder,
        )
        .unwrap();
        assert_eq!(recorder.0, [(0, 1), (1, 1), (2, 1), (3, 1)]);
    }

    #[test]
    fn test_walk_rejects_short_depth_buffer() {
        let intrin = unit_camera(2, 2);
        let mut recorder = Recorder::default();
        let err = align_images(
            &intrin,
            &Extrinsics::identity(),
            &intrin,
            &PinholeGeometry,
            &ScaledDepth::new(&[0xE8u8, 0x03], 0.001),
            &mut recorder,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RdpError::Precondition(PreconditionError::PixelCount {
                expected: 4,
                actual: 1
            })
        ));
        assert!(recorder.0.is_empty());
    }

    #[test]
    fn test_walk_rejects_short_transfer_target() {
        let intrin = unit_camera(2, 2);
        let depth = [0xE8u8, 0x03].repeat(4);
        let mut target = [0u8; 6];
        let err = align_images(
            &intrin,
            &Extrinsics::identity(),
            &intrin,
            &PinholeGeometry,
            &ScaledDepth::new(&depth, 0.001),
            &mut ForwardCopy::<2>::new(&depth, &mut target),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RdpError::Precondition(PreconditionError::PixelCount {
                expected: 4,
                actual: 3
            })
        ));
        assert_eq!(target, [0; 6]);
    }

    #[test]
    fn test_walk_rejects_overflowing_intrinsics() {
        let depth_intrin = unit_camera(2, 1);
        let other_intrin = unit_camera(usize::MAX, 3);
        let mut recorder = Recorder::default();
        let err = align_images(
            &depth_intrin,
            &Extrinsics::identity(),
            &other_intrin,
            &PinholeGeometry,
            &ConstantDepth(1.0),
            &mut recorder,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RdpError::Precondition(PreconditionError::SizeOverflow { .. })
        ));
    }

    #[test]
    fn test_scaled_depth_reads_little_endian() {
        let pixels = [0xE8, 0x03, 0x00, 0x00];
        let depth = ScaledDepth::new(&pixels, 0.001);
        assert!((depth.depth_at(0) - 1.0).abs() < 1e-6);
        assert_eq!(depth.depth_at(1), 0.0);
        assert_eq!(depth.pixel_count(), Some(2));
    }
}
