//! Pinhole intrinsics and radial-tangential distortion.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Pinhole camera intrinsics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CameraIntrinsics {
    /// Focal length in x (pixels).
    pub fx: f64,
    /// Focal length in y (pixels).
    pub fy: f64,
    /// Principal point x (pixels).
    pub cx: f64,
    /// Principal point y (pixels).
    pub cy: f64,
    /// Axis skew (pixels); zero for almost every real camera.
    #[serde(default)]
    pub skew: f64,
}

impl CameraIntrinsics {
    /// Returns `true` when all entries are finite and focal lengths are non-zero.
    pub fn is_valid(&self) -> bool {
        [self.fx, self.fy, self.cx, self.cy, self.skew]
            .iter()
            .all(|v| v.is_finite())
            && self.fx.abs() > 1e-12
            && self.fy.abs() > 1e-12
    }

    /// Pixel coordinates to normalized pinhole coordinates (`K⁻¹·p`).
    pub fn pixel_to_normalized(&self, pixel: Point2<f64>) -> Option<Point2<f64>> {
        if !self.is_valid() {
            return None;
        }
        let y = (pixel.y - self.cy) / self.fy;
        let x = (pixel.x - self.cx - self.skew * y) / self.fx;
        (x.is_finite() && y.is_finite()).then(|| Point2::new(x, y))
    }

    pub fn normalized_to_pixel(&self, normalized: Point2<f64>) -> Point2<f64> {
        Point2::new(
            self.fx * normalized.x + self.skew * normalized.y + self.cx,
            self.fy * normalized.y + self.cy,
        )
    }
}

/// Brown-Conrady coefficients in OpenCV order `(k1, k2, p1, p2, k3)`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RadialTangentialDistortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

impl RadialTangentialDistortion {
    /// Build from an OpenCV-style coefficient vector.
    ///
    /// Four or more coefficients are required; entries past `k3` (rational
    /// and thin-prism terms) are not modelled and are ignored.
    pub fn from_coefficients(coeffs: &[f64]) -> Option<Self> {
        if coeffs.len() < 4 {
            return None;
        }
        Some(Self {
            k1: coeffs[0],
            k2: coeffs[1],
            p1: coeffs[2],
            p2: coeffs[3],
            k3: coeffs.get(4).copied().unwrap_or(0.0),
        })
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Apply distortion to normalized coordinates.
    pub fn distort(&self, p: Point2<f64>) -> Point2<f64> {
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        let radial = 1.0 + self.k1 * r2 + self.k2 * r2 * r2 + self.k3 * r2 * r2 * r2;
        let x_tan = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let y_tan = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        Point2::new(x * radial + x_tan, y * radial + y_tan)
    }

    /// Invert [`Self::distort`] by fixed-point iteration.
    pub fn undistort(&self, distorted: Point2<f64>, cfg: UndistortConfig) -> Option<Point2<f64>> {
        if self.is_zero() {
            return Some(distorted);
        }
        let (xd, yd) = (distorted.x, distorted.y);
        let (mut x, mut y) = (xd, yd);

        for _ in 0..cfg.max_iters.max(1) {
            let r2 = x * x + y * y;
            let radial = 1.0 + self.k1 * r2 + self.k2 * r2 * r2 + self.k3 * r2 * r2 * r2;
            if !radial.is_finite() || radial.abs() < 1e-12 {
                return None;
            }
            let dx_tan = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
            let dy_tan = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
            let x_next = (xd - dx_tan) / radial;
            let y_next = (yd - dy_tan) / radial;
            if !x_next.is_finite() || !y_next.is_finite() {
                return None;
            }

            let step = ((x_next - x).powi(2) + (y_next - y).powi(2)).sqrt();
            x = x_next;
            y = y_next;
            if step <= cfg.eps.max(0.0) {
                break;
            }
        }

        Some(Point2::new(x, y))
    }
}

/// Settings for iterative undistortion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UndistortConfig {
    /// Maximum fixed-point iterations.
    pub max_iters: usize,
    /// Stop when the update norm drops below this threshold.
    pub eps: f64,
}

impl Default for UndistortConfig {
    fn default() -> Self {
        Self {
            max_iters: 20,
            eps: 1e-12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics {
            fx: 900.0,
            fy: 920.0,
            cx: 640.0,
            cy: 360.0,
            skew: 0.0,
        }
    }

    #[test]
    fn zero_focal_is_rejected() {
        let k = CameraIntrinsics {
            fx: 0.0,
            ..intrinsics()
        };
        assert!(!k.is_valid());
        assert!(k.pixel_to_normalized(Point2::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn pixel_normalized_round_trip() {
        let k = CameraIntrinsics {
            skew: 0.7,
            ..intrinsics()
        };
        let p = Point2::new(812.5, 97.25);
        let n = k.pixel_to_normalized(p).expect("valid intrinsics");
        let back = k.normalized_to_pixel(n);
        assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-9);
        assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-9);
    }

    #[test]
    fn undistort_inverts_moderate_distortion() {
        let d = RadialTangentialDistortion {
            k1: -0.12,
            k2: 0.03,
            p1: 0.001,
            p2: -0.0008,
            k3: 0.0,
        };
        for p in [
            Point2::new(0.0, 0.0),
            Point2::new(0.2, -0.1),
            Point2::new(-0.35, 0.25),
        ] {
            let back = d
                .undistort(d.distort(p), UndistortConfig::default())
                .expect("converges");
            assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-8);
            assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-8);
        }
    }

    #[test]
    fn coefficient_vector_needs_four_entries() {
        assert!(RadialTangentialDistortion::from_coefficients(&[0.1, 0.2, 0.0]).is_none());
        let d = RadialTangentialDistortion::from_coefficients(&[0.1, 0.2, 0.0, 0.0])
            .expect("four coefficients");
        assert_eq!(d.k3, 0.0);
    }
}
