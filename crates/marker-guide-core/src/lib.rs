//! Core types and utilities for the marker-guide navigation aid.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete camera, marker detector or audio engine: frames
//! arrive as [`FrameDetections`] and calibration as plain-text matrices.

mod calibration;
mod camera;
mod detection;
mod homography;
mod logger;

pub use calibration::{load_matrix_text, parse_matrix_text, CalibrationData, CalibrationError};
pub use camera::{CameraIntrinsics, RadialTangentialDistortion, UndistortConfig};
pub use detection::{AllowList, FrameDetections, MarkerObservation};
pub use homography::{homography_from_4pt, Homography};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
