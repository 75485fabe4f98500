//! Brown-Conrady lens polynomials in the two directions a depth camera uses
//!
//! Coefficients follow the `[k1, k2, p1, p2, k3]` order of the calibration
//! records. Math runs in f64 so the iterative inversions converge cleanly.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistortionError {
    SingularJacobian,
    NonConvergent,
}

type Result<T> = std::result::Result<T, DistortionError>;

const MAX_ITERATIONS: usize = 20;
const TOLERANCE: f64 = 1e-10;

/// Forward model: radial scale is applied first, tangential terms use the
/// scaled coordinates
pub(super) fn modified_brown_conrady(coeffs: &[f32; 5], x: f64, y: f64) -> (f64, f64) {
    let [k1, k2, p1, p2, k3] = coeffs.map(f64::from);
    let r2 = x * x + y * y;
    let f = 1.0 + k1 * r2 + k2 * r2 * r2 + k3 * r2 * r2 * r2;
    let x = x * f;
    let y = y * f;
    let dx = x + 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
    let dy = y + 2.0 * p2 * x * y + p1 * (r2 + 2.0 * y * y);
    (dx, dy)
}

/// Inverse model: maps distorted normalized coordinates back to ideal ones
pub(super) fn inverse_brown_conrady(coeffs: &[f32; 5], x: f64, y: f64) -> (f64, f64) {
    let [k1, k2, p1, p2, k3] = coeffs.map(f64::from);
    let r2 = x * x + y * y;
    let f = 1.0 + k1 * r2 + k2 * r2 * r2 + k3 * r2 * r2 * r2;
    let ux = x * f + 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
    let uy = y * f + 2.0 * p2 * x * y + p1 * (r2 + 2.0 * y * y);
    (ux, uy)
}

/// Solve `model(x, y) == (target_x, target_y)` with Newton-Raphson
pub(super) fn invert<F>(model: F, target_x: f64, target_y: f64) -> Result<(f64, f64)>
where
    F: Fn(f64, f64) -> (f64, f64),
{
    let mut x = target_x;
    let mut y = target_y;

    for _ in 0..MAX_ITERATIONS {
        let (fx, fy) = model(x, y);
        let rx = target_x - fx;
        let ry = target_y - fy;

        if rx.abs() < TOLERANCE && ry.abs() < TOLERANCE {
            return Ok((x, y));
        }

        // Finite-difference Jacobian
        let eps = 1e-7;
        let (fx_x, fy_x) = model(x + eps, y);
        let (fx_y, fy_y) = model(x, y + eps);

        let j11 = (fx_x - fx) / eps;
        let j21 = (fy_x - fy) / eps;
        let j12 = (fx_y - fx) / eps;
        let j22 = (fy_y - fy) / eps;

        let det = j11 * j22 - j12 * j21;
        if det.abs() < 1e-18 {
            return Err(DistortionError::SingularJacobian);
        }

        x += (j22 * rx - j12 * ry) / det;
        y += (-j21 * rx + j11 * ry) / det;
    }

    Err(DistortionError::NonConvergent)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COEFFS: [f32; 5] = [-0.1, 0.01, 0.001, -0.001, 0.0];

    #[test]
    fn zero_coefficients_are_identity() {
        let coeffs = [0.0; 5];
        let (x, y) = (0.123, -0.456);
        assert_eq!(modified_brown_conrady(&coeffs, x, y), (x, y));
        assert_eq!(inverse_brown_conrady(&coeffs, x, y), (x, y));
    }

    #[test]
    fn modified_round_trip() {
        let (x, y) = (0.2, -0.15);
        let (xd, yd) = modified_brown_conrady(&COEFFS, x, y);
        let (xu, yu) = invert(|x, y| modified_brown_conrady(&COEFFS, x, y), xd, yd).unwrap();
        assert!((x - xu).abs() < 1e-6);
        assert!((y - yu).abs() < 1e-6);
    }

    #[test]
    fn inverse_round_trip() {
        let (x, y) = (0.3, 0.1);
        let (xu, yu) = inverse_brown_conrady(&COEFFS, x, y);
        let (xd, yd) = invert(|x, y| inverse_brown_conrady(&COEFFS, x, y), xu, yu).unwrap();
        assert!((x - xd).abs() < 1e-6);
        assert!((y - yd).abs() < 1e-6);
    }

    #[test]
    fn signals_non_convergence() {
        let coeffs = [1e6, 1e6, 1.0, -1.0, 1e6];
        let res = invert(|x, y| modified_brown_conrady(&coeffs, x, y), 10.0, 10.0);
        assert!(res.is_err());
    }
}
