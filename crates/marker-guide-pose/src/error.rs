/// Reasons a detected marker does not yield a usable pose.
///
/// All variants mean "no reading this frame"; none of them is fatal.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    #[error("marker size must be positive and finite, got {0}")]
    InvalidMarkerSize(f64),
    #[error("corner {index} could not be undistorted")]
    Undistortion { index: usize },
    #[error("marker corners are degenerate (collinear or coincident)")]
    DegenerateCorners,
    #[error("homography does not decompose into a rigid pose")]
    DegenerateHomography,
    #[error("marker is not in front of the camera (z = {z:.4})")]
    BehindCamera { z: f64 },
    #[error("rig correction {field} is out of range: {value}")]
    InvalidRig { field: &'static str, value: f64 },
    #[error("corrected forward distance is zero")]
    ZeroForwardDistance,
}
