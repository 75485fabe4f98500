//! Camera calibration records and the projective geometry the engines walk

mod distortion;
mod pinhole;

pub use distortion::DistortionError;
pub use pinhole::PinholeGeometry;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{PreconditionError, Result};

/// Lens model attached to a set of intrinsics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistortionModel {
    /// Rectilinear image, coefficients ignored
    #[default]
    None,
    /// Distortion is applied when projecting into this image
    ModifiedBrownConrady,
    /// Distortion is removed when deprojecting out of this image
    InverseBrownConrady,
}

/// Projective model of one camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub width: usize,
    pub height: usize,
    /// Focal length x (pixel)
    pub fx: f32,
    /// Focal length y (pixel)
    pub fy: f32,
    /// Principal point x (pixel)
    pub ppx: f32,
    /// Principal point y (pixel)
    pub ppy: f32,
    #[serde(default)]
    pub model: DistortionModel,
    /// `[k1, k2, p1, p2, k3]`
    #[serde(default)]
    pub coeffs: [f32; 5],
}

impl Intrinsics {
    /// Intrinsics of a distortion-free camera
    pub fn new_ideal(width: usize, height: usize, fx: f32, fy: f32, ppx: f32, ppy: f32) -> Self {
        Self {
            width,
            height,
            fx,
            fy,
            ppx,
            ppy,
            model: DistortionModel::None,
            coeffs: [0.0; 5],
        }
    }

    pub fn with_distortion(mut self, model: DistortionModel, coeffs: [f32; 5]) -> Self {
        self.model = model;
        self.coeffs = coeffs;
        self
    }

    /// `width * height`, failing for calibrations too large to address
    pub fn pixel_count(&self) -> Result<usize> {
        self.width
            .checked_mul(self.height)
            .ok_or_else(|| {
                PreconditionError::SizeOverflow {
                    width: self.width,
                    height: self.height,
                }
                .into()
            })
    }

    /// Raster index of an integer pixel, `None` when it falls outside the image
    pub fn index_of(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }
}

/// Rigid transform from one sensor's frame into another's
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ExtrinsicsRecord", into = "ExtrinsicsRecord")]
pub struct Extrinsics {
    pub rotation: Matrix3<f32>,
    pub translation: Vector3<f32>,
}

impl Extrinsics {
    pub fn new(rotation: Matrix3<f32>, translation: Vector3<f32>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Build from a row-major 3x3 rotation and a translation
    pub fn from_row_major(rotation: [f32; 9], translation: [f32; 3]) -> Self {
        Self {
            rotation: Matrix3::from_row_slice(&rotation),
            translation: Vector3::from(translation),
        }
    }

    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Apply to a point: `R * p + t`
    pub fn transform(&self, point: &Vector3<f32>) -> Vector3<f32> {
        self.rotation * point + self.translation
    }

    /// Transform going the opposite way, assuming `rotation` is orthonormal
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.transpose();
        let translation = -(rotation * self.translation);
        Self {
            rotation,
            translation,
        }
    }
}

impl Default for Extrinsics {
    fn default() -> Self {
        Self::identity()
    }
}

/// Wire form of [`Extrinsics`]: nine row-major rotation floats and three
/// translation floats
#[derive(Serialize, Deserialize)]
struct ExtrinsicsRecord {
    rotation: [f32; 9],
    translation: [f32; 3],
}

impl From<ExtrinsicsRecord> for Extrinsics {
    fn from(record: ExtrinsicsRecord) -> Self {
        Extrinsics::from_row_major(record.rotation, record.translation)
    }
}

impl From<Extrinsics> for ExtrinsicsRecord {
    fn from(extrinsics: Extrinsics) -> Self {
        let r = &extrinsics.rotation;
        ExtrinsicsRecord {
            rotation: [
                r[(0, 0)],
                r[(0, 1)],
                r[(0, 2)],
                r[(1, 0)],
                r[(1, 1)],
                r[(1, 2)],
                r[(2, 0)],
                r[(2, 1)],
                r[(2, 2)],
            ],
            translation: [
                extrinsics.translation.x,
                extrinsics.translation.y,
                extrinsics.translation.z,
            ],
        }
    }
}

/// Projection primitives the alignment and rectification walks are built on.
///
/// Implementations own every detail of the lens model; callers only see
/// pixels, depths and points. Returning `None` marks a pixel the walk should
/// skip.
pub trait Geometry {
    /// Pixel plus metric depth to a point in the camera's frame
    fn deproject(&self, intrinsics: &Intrinsics, pixel: (f32, f32), depth: f32)
    -> Option<Vector3<f32>>;

    /// Point in one frame to the same point in another
    fn transform(&self, extrinsics: &Extrinsics, point: &Vector3<f32>) -> Vector3<f32> {
        extrinsics.transform(point)
    }

    /// Point in the camera's frame to image coordinates
    fn project(&self, intrinsics: &Intrinsics, point: &Vector3<f32>) -> Option<(f32, f32)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_of_bounds() {
        let intrin = Intrinsics::new_ideal(4, 3, 1.0, 1.0, 0.0, 0.0);
        assert_eq!(intrin.index_of(0, 0), Some(0));
        assert_eq!(intrin.index_of(3, 2), Some(11));
        assert_eq!(intrin.index_of(4, 0), None);
        assert_eq!(intrin.index_of(0, 3), None);
        assert_eq!(intrin.index_of(-1, 1), None);
    }

    #[test]
    fn test_pixel_count_overflow() {
        assert_eq!(Intrinsics::new_ideal(4, 3, 1.0, 1.0, 0.0, 0.0).pixel_count().unwrap(), 12);
        let huge = Intrinsics::new_ideal(usize::MAX, 2, 1.0, 1.0, 0.0, 0.0);
        assert!(huge.pixel_count().is_err());
    }

    #[test]
    fn test_extrinsics_row_major() {
        let extrin = Extrinsics::from_row_major([0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0], [
            1.0, 2.0, 3.0,
        ]);
        // 90 degrees about z: (1, 0, 0) -> (0, 1, 0)
        let p = extrin.transform(&Vector3::new(1.0, 0.0, 0.0));
        assert!((p - Vector3::new(1.0, 3.0, 3.0)).norm() < 1e-6);
    }

    #[test]
    fn test_extrinsics_inverse_round_trip() {
        let extrin = Extrinsics::from_row_major([0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0], [
            0.025, 0.0, 0.004,
        ]);
        let point = Vector3::new(0.3, -0.2, 1.5);
        let back = extrin.inverse().transform(&extrin.transform(&point));
        assert!((back - point).norm() < 1e-6);
    }

    #[test]
    fn test_extrinsics_serde_is_row_major() {
        let json = r#"{"rotation":[0,-1,0,1,0,0,0,0,1],"translation":[0.5,0,0]}"#;
        let extrin: Extrinsics = serde_json::from_str(json).unwrap();
        assert_eq!(extrin.rotation[(0, 1)], -1.0);
        assert_eq!(extrin.rotation[(1, 0)], 1.0);
        assert_eq!(extrin.translation.x, 0.5);

        let value = serde_json::to_value(&extrin).unwrap();
        assert_eq!(value["rotation"][1], -1.0);
    }

    #[test]
    fn test_intrinsics_serde_defaults_to_no_distortion() {
        let json = r#"{"width":640,"height":480,"fx":615.0,"fy":615.0,"ppx":320.0,"ppy":240.0}"#;
        let intrin: Intrinsics = serde_json::from_str(json).unwrap();
        assert_eq!(intrin.model, DistortionModel::None);
        assert_eq!(intrin.coeffs, [0.0; 5]);

        let json = r#"{"width":640,"height":480,"fx":615.0,"fy":615.0,"ppx":320.0,"ppy":240.0,
            "model":"inverse_brown_conrady","coeffs":[0.1,0.0,0.0,0.0,0.0]}"#;
        let intrin: Intrinsics = serde_json::from_str(json).unwrap();
        assert_eq!(intrin.model, DistortionModel::InverseBrownConrady);
    }
}
