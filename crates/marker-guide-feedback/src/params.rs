use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("smoother window ({window}) must be larger than twice the trim ({trim})")]
    WindowTooSmall { window: usize, trim: usize },
    #[error("smoother max_dev must be finite and non-negative, got {0}")]
    InvalidMaxDev(f64),
    #[error("volume_full_scale_deg must be positive, got {0}")]
    InvalidFullScale(f32),
    #[error("out_of_view_volume must be within [0, 1], got {0}")]
    InvalidVolume(f32),
}

/// Thresholds of the feedback state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackParams {
    /// Consecutive frames without a reading tolerated before the out-of-view
    /// tone is forced on. The tone starts on frame `miss_threshold + 1`.
    pub miss_threshold: u32,
    /// Consecutive centered frames tolerated before announcing. The
    /// announcement fires on frame `centered_threshold + 1`.
    pub centered_threshold: u32,
    /// Bearings with `|angle| < center_tolerance_deg` count as centered.
    pub center_tolerance_deg: i32,
    /// Bearing magnitude that maps to full tone volume.
    pub volume_full_scale_deg: f32,
    /// Fixed volume of the out-of-view tone.
    pub out_of_view_volume: f32,
}

impl Default for FeedbackParams {
    fn default() -> Self {
        Self {
            miss_threshold: 20,
            centered_threshold: 10,
            center_tolerance_deg: 1,
            volume_full_scale_deg: 30.0,
            out_of_view_volume: 0.5,
        }
    }
}

impl FeedbackParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(self.volume_full_scale_deg.is_finite() && self.volume_full_scale_deg > 0.0) {
            return Err(ParamsError::InvalidFullScale(self.volume_full_scale_deg));
        }
        if !(0.0..=1.0).contains(&self.out_of_view_volume) {
            return Err(ParamsError::InvalidVolume(self.out_of_view_volume));
        }
        Ok(())
    }

    /// Directional tone volume for a bearing, clamped to `[0, 1]`.
    pub fn tone_volume(&self, position_angle: i32) -> f32 {
        (position_angle.unsigned_abs() as f32 / self.volume_full_scale_deg).clamp(0.0, 1.0)
    }
}

/// Orientation smoother configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherParams {
    /// Number of most recent raw readings kept.
    pub window: usize,
    /// Readings dropped from each end of the sorted window.
    pub trim: usize,
    /// Secondary filter radius in standard deviations of the trimmed set.
    pub max_dev: f64,
}

impl Default for SmootherParams {
    fn default() -> Self {
        Self {
            window: 13,
            trim: 2,
            max_dev: 1.0,
        }
    }
}

impl SmootherParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.window <= 2 * self.trim {
            return Err(ParamsError::WindowTooSmall {
                window: self.window,
                trim: self.trim,
            });
        }
        if !self.max_dev.is_finite() || self.max_dev < 0.0 {
            return Err(ParamsError::InvalidMaxDev(self.max_dev));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn volume_scales_and_clamps() {
        let p = FeedbackParams::default();
        assert_abs_diff_eq!(p.tone_volume(15), 0.5);
        assert_abs_diff_eq!(p.tone_volume(-15), 0.5);
        assert_abs_diff_eq!(p.tone_volume(-45), 1.0);
        assert_abs_diff_eq!(p.tone_volume(0), 0.0);
        assert_abs_diff_eq!(p.tone_volume(i32::MIN), 1.0);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let bad = FeedbackParams {
            out_of_view_volume: 1.5,
            ..FeedbackParams::default()
        };
        assert_eq!(bad.validate(), Err(ParamsError::InvalidVolume(1.5)));

        let tiny = SmootherParams {
            window: 4,
            trim: 2,
            max_dev: 1.0,
        };
        assert!(matches!(
            tiny.validate(),
            Err(ParamsError::WindowTooSmall { .. })
        ));
        assert!(SmootherParams::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let p: FeedbackParams = serde_json::from_str(r#"{"miss_threshold": 5}"#).expect("json");
        assert_eq!(p.miss_threshold, 5);
        assert_eq!(p.centered_threshold, 10);
    }
}
