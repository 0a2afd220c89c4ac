//! Single-marker pose from four image corners.
//!
//! The marker is a square of side `s` lying on `Z = 0` in its own frame with
//! corners, in detector order, at `(-s/2, s/2)`, `(s/2, s/2)`, `(s/2, -s/2)`
//! and `(-s/2, -s/2)`. Corners are undistorted into normalized camera
//! coordinates, a plane-to-image homography `H ~ [r1 r2 t]` is fitted and
//! decomposed into a rotation (projected onto SO(3)) and a translation.

use log::trace;
use marker_guide_core::{homography_from_4pt, CalibrationData, MarkerObservation};
use nalgebra::{Matrix3, Point2, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::PoseError;

/// Marker pose in the camera frame: `X_cam = rotation · X_marker + translation`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseReading {
    /// Marker origin in camera coordinates, in the units of the marker size.
    pub translation: Vector3<f64>,
    /// Orthonormal rotation, marker → camera.
    pub rotation: Matrix3<f64>,
}

/// Pose estimator for square markers of a known physical size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseEstimator {
    marker_size: f64,
}

impl PoseEstimator {
    pub fn new(marker_size: f64) -> Result<Self, PoseError> {
        if !marker_size.is_finite() || marker_size <= 0.0 {
            return Err(PoseError::InvalidMarkerSize(marker_size));
        }
        Ok(Self { marker_size })
    }

    pub fn marker_size(&self) -> f64 {
        self.marker_size
    }

    /// Marker corners in the marker plane, in detector order.
    pub fn object_points(&self) -> [Point2<f64>; 4] {
        let h = 0.5 * self.marker_size;
        [
            Point2::new(-h, h),
            Point2::new(h, h),
            Point2::new(h, -h),
            Point2::new(-h, -h),
        ]
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, fields(id = marker.id))
    )]
    pub fn estimate(
        &self,
        calibration: &CalibrationData,
        marker: &MarkerObservation,
    ) -> Result<PoseReading, PoseError> {
        let mut normalized = [Point2::origin(); 4];
        for (index, (dst, &px)) in normalized.iter_mut().zip(&marker.corners).enumerate() {
            *dst = calibration
                .undistort_to_normalized(px)
                .ok_or(PoseError::Undistortion { index })?;
        }

        let h = homography_from_4pt(&self.object_points(), &normalized)
            .ok_or(PoseError::DegenerateCorners)?;
        let pose = decompose_planar_homography(&h.h)?;
        trace!(
            "marker {} pose t=({:.3}, {:.3}, {:.3})",
            marker.id,
            pose.translation.x,
            pose.translation.y,
            pose.translation.z
        );
        Ok(pose)
    }
}

/// Decompose `H ~ [r1 r2 t]` (plane → normalized image) into a rigid pose.
fn decompose_planar_homography(h: &Matrix3<f64>) -> Result<PoseReading, PoseError> {
    let h1 = h.column(0).into_owned();
    let h2 = h.column(1).into_owned();
    let h3 = h.column(2).into_owned();

    let denom = 0.5 * (h1.norm() + h2.norm());
    if !denom.is_finite() || denom <= 1e-12 {
        return Err(PoseError::DegenerateHomography);
    }
    let mut lambda = 1.0 / denom;
    if h3.z < 0.0 {
        lambda = -lambda;
    }

    let r1 = h1 * lambda;
    let r2 = h2 * lambda;
    let t = h3 * lambda;
    let r3 = r1.cross(&r2);
    if r3.norm() <= 1e-12 {
        return Err(PoseError::DegenerateHomography);
    }

    let approx = Matrix3::from_columns(&[r1, r2, r3]);
    let svd = approx.svd(true, true);
    let (Some(mut u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Err(PoseError::DegenerateHomography);
    };
    if (u * v_t).determinant() < 0.0 {
        u.column_mut(2).neg_mut();
    }
    let rotation = u * v_t;

    if t.z.is_nan() || t.z <= 1e-9 {
        return Err(PoseError::BehindCamera { z: t.z });
    }
    Ok(PoseReading {
        translation: t,
        rotation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use marker_guide_core::RadialTangentialDistortion;
    use nalgebra::Rotation3;

    fn calibration(distortion: RadialTangentialDistortion) -> CalibrationData {
        CalibrationData::new(
            Matrix3::new(1000.0, 0.0, 640.0, 0.0, 1000.0, 360.0, 0.0, 0.0, 1.0),
            distortion,
        )
        .expect("valid intrinsics")
    }

    /// Marker facing the camera, turned by `yaw_deg` about the vertical axis.
    fn facing_rotation(yaw_deg: f64) -> Matrix3<f64> {
        let turn = Rotation3::from_axis_angle(&Vector3::y_axis(), yaw_deg.to_radians());
        turn.matrix() * Matrix3::from_diagonal(&Vector3::new(1.0, -1.0, -1.0))
    }

    fn project(
        calib: &CalibrationData,
        est: &PoseEstimator,
        rotation: &Matrix3<f64>,
        t: &Vector3<f64>,
    ) -> MarkerObservation {
        let corners = est.object_points().map(|p| {
            let x = rotation * Vector3::new(p.x, p.y, 0.0) + t;
            let n = Point2::new(x.x / x.z, x.y / x.z);
            let d = calib.distortion().distort(n);
            calib.intrinsics().normalized_to_pixel(d)
        });
        MarkerObservation { id: 10, corners }
    }

    #[test]
    fn recovers_synthetic_pose() {
        let calib = calibration(RadialTangentialDistortion::default());
        let est = PoseEstimator::new(9.5).expect("size");
        let rotation = facing_rotation(20.0);
        let t = Vector3::new(5.0, -2.0, 80.0);

        let obs = project(&calib, &est, &rotation, &t);
        let pose = est.estimate(&calib, &obs).expect("pose");

        assert_relative_eq!(pose.translation, t, epsilon = 1e-6);
        assert_relative_eq!(pose.rotation, rotation, epsilon = 1e-6);
    }

    #[test]
    fn recovers_pose_through_lens_distortion() {
        let calib = calibration(RadialTangentialDistortion {
            k1: -0.2,
            k2: 0.05,
            p1: 0.001,
            p2: -0.001,
            k3: 0.0,
        });
        let est = PoseEstimator::new(9.5).expect("size");
        let rotation = facing_rotation(-35.0);
        let t = Vector3::new(-12.0, 4.0, 60.0);

        let obs = project(&calib, &est, &rotation, &t);
        let pose = est.estimate(&calib, &obs).expect("pose");

        assert_relative_eq!(pose.translation, t, epsilon = 1e-5);
        assert_relative_eq!(pose.rotation, rotation, epsilon = 1e-6);
    }

    #[test]
    fn collinear_corners_fail() {
        let calib = calibration(RadialTangentialDistortion::default());
        let est = PoseEstimator::new(9.5).expect("size");
        let obs = MarkerObservation::new(
            10,
            [[100.0, 100.0], [200.0, 100.0], [300.0, 100.0], [150.0, 180.0]],
        );
        assert_eq!(
            est.estimate(&calib, &obs),
            Err(PoseError::DegenerateCorners)
        );
    }

    #[test]
    fn rejects_non_positive_marker_size() {
        assert!(matches!(
            PoseEstimator::new(0.0),
            Err(PoseError::InvalidMarkerSize(_))
        ));
        assert!(PoseEstimator::new(f64::NAN).is_err());
    }
}
