//! JSON configuration for a guide session.

use std::fs;
use std::path::{Path, PathBuf};

use marker_guide_core::{AllowList, CalibrationData, CalibrationError};
use marker_guide_feedback::{
    AudioSink, FeedbackParams, OrientationSmoother, ParamsError, SmootherParams,
};
use marker_guide_pose::{PoseError, PoseEstimator, RigCorrection};
use serde::{Deserialize, Serialize};

use crate::session::GuideSession;

#[derive(thiserror::Error, Debug)]
pub enum GuideIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
    #[error(transparent)]
    Pose(#[from] PoseError),
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error("allow-list is empty; no marker would ever be tracked")]
    EmptyAllowList,
}

/// Locations of the two calibration matrix files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPaths {
    pub camera_matrix_path: PathBuf,
    pub distortion_path: PathBuf,
}

impl Default for CalibrationPaths {
    fn default() -> Self {
        Self {
            camera_matrix_path: PathBuf::from("camMTX.txt"),
            distortion_path: PathBuf::from("distort.txt"),
        }
    }
}

impl CalibrationPaths {
    /// Resolve relative paths against `base` (usually the config directory).
    pub fn resolved(&self, base: &Path) -> Self {
        let join = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };
        Self {
            camera_matrix_path: join(&self.camera_matrix_path),
            distortion_path: join(&self.distortion_path),
        }
    }

    pub fn load(&self) -> Result<CalibrationData, CalibrationError> {
        CalibrationData::load(&self.camera_matrix_path, &self.distortion_path)
    }
}

fn default_marker_size() -> f64 {
    9.5
}

/// Physical target description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Printed side length of the marker, in the units of the translation.
    #[serde(default = "default_marker_size")]
    pub size: f64,
    #[serde(default)]
    pub allowed_ids: AllowList,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            size: default_marker_size(),
            allowed_ids: AllowList::default(),
        }
    }
}

/// Asset names handed to playback engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub left_tone: String,
    pub right_tone: String,
    pub out_of_view_tone: String,
    pub voice: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            left_tone: "440.wav".to_string(),
            right_tone: "250.wav".to_string(),
            out_of_view_tone: "100.wav".to_string(),
            voice: "english".to_string(),
        }
    }
}

/// Full session configuration. Every section has defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuideConfig {
    #[serde(default)]
    pub calibration: CalibrationPaths,
    #[serde(default)]
    pub marker: MarkerConfig,
    #[serde(default)]
    pub rig: RigCorrection,
    #[serde(default)]
    pub feedback: FeedbackParams,
    #[serde(default)]
    pub smoother: SmootherParams,
    #[serde(default)]
    pub audio: AudioConfig,
}

impl GuideConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, GuideIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), GuideIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Check everything that does not require touching the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        PoseEstimator::new(self.marker.size)?;
        self.rig.validate()?;
        self.feedback.validate()?;
        self.smoother.validate()?;
        if self.marker.allowed_ids.ids().is_empty() {
            return Err(ConfigError::EmptyAllowList);
        }
        Ok(())
    }

    /// Build a session around already-loaded calibration.
    pub fn build_session_with<S: AudioSink>(
        &self,
        calibration: CalibrationData,
        sink: S,
    ) -> Result<GuideSession<S>, ConfigError> {
        self.validate()?;
        let estimator = PoseEstimator::new(self.marker.size)?;
        let smoother = OrientationSmoother::new(self.smoother.clone())?;
        Ok(GuideSession::new(
            calibration,
            estimator,
            self.rig,
            self.marker.allowed_ids.clone(),
            self.feedback.clone(),
            smoother,
            sink,
        ))
    }

    /// Load calibration from disk and build a session. Fails before any
    /// frame is processed if calibration is missing or malformed.
    pub fn build_session<S: AudioSink>(&self, sink: S) -> Result<GuideSession<S>, ConfigError> {
        self.validate()?;
        let calibration = self.calibration.load()?;
        self.build_session_with(calibration, sink)
    }
}
