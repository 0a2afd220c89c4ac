//! One guidance session: calibration, smoothing and feedback state wired to
//! an audio sink.

use log::{debug, info, warn};
use marker_guide_core::{AllowList, CalibrationData, FrameDetections};
use marker_guide_feedback::{
    step, AudioSink, FeedbackMode, FeedbackParams, FeedbackState, OrientationSmoother, Reading,
    Tone, ToneDriver,
};
use marker_guide_pose::{estimate_bearing, BearingEstimate, PoseEstimator, RigCorrection};
use serde::Serialize;

/// What happened on one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame_index: usize,
    /// Id of the allow-listed marker used this frame.
    pub marker_id: Option<u32>,
    pub estimate: Option<BearingEstimate>,
    /// Smoothed orientation, present whenever `estimate` is.
    pub orientation: Option<i32>,
    /// Why a selected marker produced no reading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pose_error: Option<String>,
    pub mode: FeedbackMode,
    pub state: FeedbackState,
    pub announced: bool,
}

impl FrameReport {
    pub fn has_reading(&self) -> bool {
        self.estimate.is_some()
    }
}

/// Owns everything that persists across frames.
#[derive(Debug)]
pub struct GuideSession<S: AudioSink> {
    calibration: CalibrationData,
    estimator: PoseEstimator,
    rig: RigCorrection,
    allowed: AllowList,
    params: FeedbackParams,
    smoother: OrientationSmoother,
    state: FeedbackState,
    driver: ToneDriver<S>,
    frames: usize,
    started: bool,
}

impl<S: AudioSink> GuideSession<S> {
    pub fn new(
        calibration: CalibrationData,
        estimator: PoseEstimator,
        rig: RigCorrection,
        allowed: AllowList,
        params: FeedbackParams,
        smoother: OrientationSmoother,
        sink: S,
    ) -> Self {
        Self {
            calibration,
            estimator,
            rig,
            allowed,
            params,
            smoother,
            state: FeedbackState::default(),
            driver: ToneDriver::new(sink),
            frames: 0,
            started: false,
        }
    }

    /// Start the out-of-view tone. Until a marker is seen the user hears it.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        info!(
            "session started; tracking marker ids {:?}",
            self.allowed.ids()
        );
        self.driver
            .play(Tone::OutOfView, self.params.out_of_view_volume);
        self.started = true;
    }

    /// Run one frame through pose, smoothing and the state machine, then
    /// forward the resulting commands to the sink.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, fields(frame = self.frames)))]
    pub fn process_frame(&mut self, frame: &FrameDetections) -> FrameReport {
        if !self.started {
            self.start();
        }
        let frame_index = self.frames;
        self.frames += 1;

        let selected = self.allowed.select(frame);
        let mut pose_error = None;
        let reading = selected.and_then(|marker| {
            match estimate_bearing(&self.estimator, &self.rig, &self.calibration, marker) {
                Ok(estimate) => {
                    let orientation = self.smoother.update(estimate.orientation_raw);
                    debug!(
                        "frame {frame_index}: marker {} at {} in, {}° bearing, orientation {} -> {}",
                        marker.id,
                        estimate.distance,
                        estimate.position_angle,
                        estimate.orientation_raw,
                        orientation
                    );
                    Some(Reading {
                        estimate,
                        orientation,
                    })
                }
                Err(err) => {
                    warn!("frame {frame_index}: marker {} skipped: {err}", marker.id);
                    pose_error = Some(err.to_string());
                    None
                }
            }
        });

        let transition = step(self.state, reading.as_ref(), &self.params);
        self.state = transition.state;
        self.driver.apply(&transition.commands);

        FrameReport {
            frame_index,
            marker_id: selected.map(|m| m.id),
            estimate: reading.map(|r| r.estimate),
            orientation: reading.map(|r| r.orientation),
            pose_error,
            mode: self.state.mode(&self.params),
            state: self.state,
            announced: transition.announced,
        }
    }

    /// Silence every tone and hand the sink back.
    pub fn stop(mut self) -> S {
        self.driver.stop_all();
        info!("session stopped after {} frames", self.frames);
        self.driver.into_sink()
    }

    pub fn state(&self) -> &FeedbackState {
        &self.state
    }

    pub fn frames_processed(&self) -> usize {
        self.frames
    }

    pub fn driver(&self) -> &ToneDriver<S> {
        &self.driver
    }

    pub fn smoother(&self) -> &OrientationSmoother {
        &self.smoother
    }
}
