//! 3-2-1 (yaw-pitch-roll) Euler angles.
//!
//! Convention: `R = Rz(yaw) · Ry(pitch) · Rx(roll)`. At gimbal lock
//! (`|pitch| = 90°`) roll and yaw are not separable; yaw is then fixed to 0
//! and the whole in-plane rotation is reported as roll.

use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Threshold on `sqrt(R00² + R10²)` below which the decomposition is singular.
pub const GIMBAL_LOCK_EPS: f64 = 1e-6;

const ORTHONORMAL_EPS: f64 = 1e-6;

/// Euler angles in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    /// Rotation about x.
    pub roll: f64,
    /// Rotation about y.
    pub pitch: f64,
    /// Rotation about z.
    pub yaw: f64,
}

/// `true` when `‖I − RᵀR‖_F < 1e-6`.
///
/// Only orthonormality is checked, so reflections (det = −1) pass as well.
pub fn is_rotation_matrix(r: &Matrix3<f64>) -> bool {
    (Matrix3::identity() - r.transpose() * r).norm() < ORTHONORMAL_EPS
}

/// Decompose an orthonormal matrix into 3-2-1 Euler angles.
///
/// # Panics
///
/// In debug builds, if `r` is not orthonormal (see [`is_rotation_matrix`]).
/// Passing such a matrix is a caller bug.
pub fn euler_from_rotation(r: &Matrix3<f64>) -> EulerAngles {
    debug_assert!(
        is_rotation_matrix(r),
        "Euler decomposition requires an orthonormal matrix"
    );

    let sy = (r[(0, 0)] * r[(0, 0)] + r[(1, 0)] * r[(1, 0)]).sqrt();
    if sy >= GIMBAL_LOCK_EPS {
        EulerAngles {
            roll: r[(2, 1)].atan2(r[(2, 2)]),
            pitch: (-r[(2, 0)]).atan2(sy),
            yaw: r[(1, 0)].atan2(r[(0, 0)]),
        }
    } else {
        EulerAngles {
            roll: (-r[(1, 2)]).atan2(r[(1, 1)]),
            pitch: (-r[(2, 0)]).atan2(sy),
            yaw: 0.0,
        }
    }
}

/// Inverse of [`euler_from_rotation`].
pub fn rotation_from_euler(angles: EulerAngles) -> Matrix3<f64> {
    let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), angles.yaw);
    let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), angles.pitch);
    let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), angles.roll);
    (rz * ry * rx).into_inner()
}
