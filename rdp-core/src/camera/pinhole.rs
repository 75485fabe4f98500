use super::distortion::{self, invert};
use super::{DistortionModel, Geometry, Intrinsics};
use nalgebra::Vector3;

/// Pinhole projection with Brown-Conrady lens models
///
/// `ModifiedBrownConrady` images are distorted in closed form on projection
/// and undistorted iteratively on deprojection; `InverseBrownConrady` is the
/// mirror image.
#[derive(Debug, Clone, Copy, Default)]
pub struct PinholeGeometry;

impl Geometry for PinholeGeometry {
    fn deproject(
        &self,
        intrinsics: &Intrinsics,
        pixel: (f32, f32),
        depth: f32,
    ) -> Option<Vector3<f32>> {
        let x = f64::from((pixel.0 - intrinsics.ppx) / intrinsics.fx);
        let y = f64::from((pixel.1 - intrinsics.ppy) / intrinsics.fy);

        let coeffs = &intrinsics.coeffs;
        let (x, y) = match intrinsics.model {
            DistortionModel::None => (x, y),
            DistortionModel::InverseBrownConrady => {
                distortion::inverse_brown_conrady(coeffs, x, y)
            }
            DistortionModel::ModifiedBrownConrady => {
                invert(|x, y| distortion::modified_brown_conrady(coeffs, x, y), x, y).ok()?
            }
        };

        Some(Vector3::new(depth * x as f32, depth * y as f32, depth))
    }

    fn project(&self, intrinsics: &Intrinsics, point: &Vector3<f32>) -> Option<(f32, f32)> {
        if point.z <= 0.0 {
            return None;
        }

        let x = f64::from(point.x / point.z);
        let y = f64::from(point.y / point.z);

        let coeffs = &intrinsics.coeffs;
        let (x, y) = match intrinsics.model {
            DistortionModel::None => (x, y),
            DistortionModel::ModifiedBrownConrady => {
                distortion::modified_brown_conrady(coeffs, x, y)
            }
            DistortionModel::InverseBrownConrady => {
                invert(|x, y| distortion::inverse_brown_conrady(coeffs, x, y), x, y).ok()?
            }
        };

        Some((
            x as f32 * intrinsics.fx + intrinsics.ppx,
            y as f32 * intrinsics.fy + intrinsics.ppy,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Extrinsics;

    fn camera() -> Intrinsics {
        Intrinsics::new_ideal(640, 480, 600.0, 600.0, 320.0, 240.0)
    }

    #[test]
    fn test_pinhole_ideal_projection() {
        let pixel = PinholeGeometry
            .project(&camera(), &Vector3::new(0.0, 0.0, 1.0))
            .unwrap();
        assert!((pixel.0 - 320.0).abs() < 1e-4);
        assert!((pixel.1 - 240.0).abs() < 1e-4);
    }

    #[test]
    fn test_pinhole_ideal_offset_projection() {
        let pixel = PinholeGeometry
            .project(&camera(), &Vector3::new(0.5, 0.25, 2.0))
            .unwrap();
        assert!((pixel.0 - 470.0).abs() < 1e-3); // 320 + 600 * 0.25
        assert!((pixel.1 - 315.0).abs() < 1e-3); // 240 + 600 * 0.125
    }

    #[test]
    fn test_pinhole_behind_camera() {
        assert!(
            PinholeGeometry
                .project(&camera(), &Vector3::new(0.0, 0.0, -1.0))
                .is_none()
        );
        assert!(
            PinholeGeometry
                .project(&camera(), &Vector3::new(0.0, 0.0, 0.0))
                .is_none()
        );
    }

    #[test]
    fn test_deproject_scales_by_depth() {
        let point = PinholeGeometry
            .deproject(&camera(), (620.0, 240.0), 2.0)
            .unwrap();
        assert!((point - Vector3::new(1.0, 0.0, 2.0)).norm() < 1e-5);
    }

    #[test]
    fn test_pinhole_roundtrip() {
        let intrin = camera();
        let pixel = (123.0, 401.0);
        let point = PinholeGeometry.deproject(&intrin, pixel, 1.7).unwrap();
        let back = PinholeGeometry.project(&intrin, &point).unwrap();
        assert!((back.0 - pixel.0).abs() < 1e-3);
        assert!((back.1 - pixel.1).abs() < 1e-3);
    }

    #[test]
    fn test_modified_brown_conrady_roundtrip() {
        let intrin = camera().with_distortion(
            DistortionModel::ModifiedBrownConrady,
            [-0.05, 0.01, 0.001, -0.001, 0.0],
        );
        let point = Vector3::new(0.2, -0.1, 1.0);
        let pixel = PinholeGeometry.project(&intrin, &point).unwrap();

        // Distortion moves the pixel away from the ideal projection
        let ideal = PinholeGeometry.project(&camera(), &point).unwrap();
        assert!((pixel.0 - ideal.0).abs() > 0.1);

        let back = PinholeGeometry.deproject(&intrin, pixel, 1.0).unwrap();
        assert!((back - point).norm() < 1e-4);
    }

    #[test]
    fn test_inverse_brown_conrady_roundtrip() {
        let intrin = camera().with_distortion(
            DistortionModel::InverseBrownConrady,
            [0.08, -0.02, 0.0005, 0.0005, 0.0],
        );
        let pixel = (500.0, 100.0);
        let point = PinholeGeometry.deproject(&intrin, pixel, 1.0).unwrap();
        let back = PinholeGeometry.project(&intrin, &point).unwrap();
        assert!((back.0 - pixel.0).abs() < 1e-2);
        assert!((back.1 - pixel.1).abs() < 1e-2);
    }

    #[test]
    fn test_default_transform_uses_extrinsics() {
        let extrin = Extrinsics::from_row_major(
            [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            [0.1, 0.0, 0.0],
        );
        let moved = PinholeGeometry.transform(&extrin, &Vector3::new(0.0, 0.0, 1.0));
        assert!((moved - Vector3::new(0.1, 0.0, 1.0)).norm() < 1e-6);
    }
}
