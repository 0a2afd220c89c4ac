//! Pose and bearing estimation for a single fiducial marker.
//!
//! Current focus:
//! - planar pose recovery from the four marker corners and camera calibration,
//! - rig-specific correction of the raw translation into distance and bearing,
//! - the facing (orientation) angle from a 3-2-1 Euler decomposition,
//! - conversion of the distance into the phrase that is spoken to the user.
//!
//! Marker detection itself is external; this crate starts from corners.

mod bearing;
mod distance;
mod error;
mod estimator;
mod euler;

pub use bearing::{orientation_angle, BearingEstimate, RigCorrection, MAX_BEARING_BIAS_DEG};
pub use distance::SpokenDistance;
pub use error::PoseError;
pub use estimator::{PoseEstimator, PoseReading};
pub use euler::{
    euler_from_rotation, is_rotation_matrix, rotation_from_euler, EulerAngles, GIMBAL_LOCK_EPS,
};

use marker_guide_core::{CalibrationData, MarkerObservation};

/// Run the full per-marker chain: corners → pose → corrected bearing.
pub fn estimate_bearing(
    estimator: &PoseEstimator,
    rig: &RigCorrection,
    calibration: &CalibrationData,
    marker: &MarkerObservation,
) -> Result<BearingEstimate, PoseError> {
    let pose = estimator.estimate(calibration, marker)?;
    BearingEstimate::from_pose(&pose, rig)
}
