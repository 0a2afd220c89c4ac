//! Distance, bearing and facing angle derived from a marker pose.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::PoseError;
use crate::estimator::PoseReading;
use crate::euler::euler_from_rotation;

/// Linear correction fitted for one camera rig.
///
/// Maps the raw pose translation into the units announced to the user
/// (inches for the default rig) and removes the mounting bias of the bearing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigCorrection {
    /// Scale applied to the forward (z) translation.
    pub z_scale: f64,
    /// Offset added to the scaled forward translation.
    pub z_offset: f64,
    /// Scale applied to the lateral (x) translation.
    pub x_scale: f64,
    /// Mounting bias added to the rounded bearing, degrees.
    pub bearing_bias_deg: i32,
}

impl Default for RigCorrection {
    fn default() -> Self {
        Self {
            z_scale: 0.3,
            z_offset: 0.2588,
            x_scale: 0.3695,
            bearing_bias_deg: 8,
        }
    }
}

/// Largest accepted mounting bias, degrees.
pub const MAX_BEARING_BIAS_DEG: i32 = 180;

impl RigCorrection {
    /// Scales must be finite and positive, the offset finite and the bias
    /// within `±MAX_BEARING_BIAS_DEG`.
    pub fn validate(&self) -> Result<(), PoseError> {
        for (field, value) in [("z_scale", self.z_scale), ("x_scale", self.x_scale)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PoseError::InvalidRig { field, value });
            }
        }
        if !self.z_offset.is_finite() {
            return Err(PoseError::InvalidRig {
                field: "z_offset",
                value: self.z_offset,
            });
        }
        if self.bearing_bias_deg.unsigned_abs() > MAX_BEARING_BIAS_DEG.unsigned_abs() {
            return Err(PoseError::InvalidRig {
                field: "bearing_bias_deg",
                value: f64::from(self.bearing_bias_deg),
            });
        }
        Ok(())
    }

    /// Corrected `(x', z')` for a raw camera-frame translation.
    pub fn apply(&self, translation: &Vector3<f64>) -> (f64, f64) {
        (
            translation.x * self.x_scale,
            translation.z * self.z_scale + self.z_offset,
        )
    }
}

/// Per-frame reading handed to the smoother and the feedback loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearingEstimate {
    /// Rounded straight-line distance to the marker in rig units.
    pub distance: u32,
    /// Signed bearing in degrees; negative means the marker is to the left.
    pub position_angle: i32,
    /// Instantaneous facing error of the marker toward the camera, degrees.
    pub orientation_raw: i32,
}

impl BearingEstimate {
    pub fn from_pose(pose: &PoseReading, rig: &RigCorrection) -> Result<Self, PoseError> {
        let (x, z) = rig.apply(&pose.translation);
        if !x.is_finite() || !z.is_finite() || z == 0.0 {
            return Err(PoseError::ZeroForwardDistance);
        }

        let distance = (z * z + x * x).sqrt().round() as u32;
        let position_angle =
            (x.atan2(z).to_degrees().round() as i32).saturating_add(rig.bearing_bias_deg);

        Ok(Self {
            distance,
            position_angle,
            orientation_raw: orientation_angle(&pose.rotation),
        })
    }
}

/// Facing angle of the marker, degrees.
///
/// The rotation is inverted to express the camera in the marker frame, the
/// Z row is negated to move from the camera-forward to the world convention
/// and the negated pitch of the 3-2-1 decomposition is returned.
pub fn orientation_angle(rotation: &Matrix3<f64>) -> i32 {
    let flip = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0));
    let attitude = euler_from_rotation(&(flip * rotation.transpose()));
    (-attitude.pitch.to_degrees()).round() as i32
}
