//! High-level facade crate for the `marker-guide-*` workspace.
//!
//! This crate provides:
//! - re-exports of the geometry, pose and feedback crates
//! - a JSON [`GuideConfig`] that builds a ready-to-run [`GuideSession`]
//! - the capture loop ([`run_loop`]) over any [`FrameSource`]
//!
//! ## Quickstart
//!
//! ```no_run
//! use marker_guide::{run_loop, GuideConfig, LogSink, ReplaySource, StopSignal};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GuideConfig::load_json("guide.json")?;
//! let session = config.build_session(LogSink::new(config.audio.clone()))?;
//! let source = ReplaySource::load_json("frames.json")?;
//! let (summary, _sink) = run_loop(session, source, &StopSignal::new(), None, |_| {})?;
//! println!("{} announcements", summary.announcements);
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Library code logs through `log`. Binaries install either
//! `marker_guide::core::init_with_level` (plain stderr) or, with the
//! `tracing` feature, `marker_guide::core::init_tracing(json)`, which filters
//! by `RUST_LOG` and also receives `log` records.
//!
//! ## API map
//! - `marker_guide::core`: calibration files, undistortion, detections, homography.
//! - `marker_guide::pose`: marker pose, distance, bearing and orientation.
//! - `marker_guide::feedback`: orientation smoother, state machine, audio sink.

pub use marker_guide_core as core;
pub use marker_guide_feedback as feedback;
pub use marker_guide_pose as pose;

mod config;
mod session;
mod sink;
mod source;

pub use config::{
    AudioConfig, CalibrationPaths, ConfigError, GuideConfig, GuideIoError, MarkerConfig,
};
pub use session::{FrameReport, GuideSession};
pub use sink::LogSink;
pub use source::{
    run_loop, FrameSource, ReplaySource, RunSummary, SourceError, StopReason, StopSignal,
};

pub use marker_guide_core::{FrameDetections, MarkerObservation};
pub use marker_guide_feedback::{AudioSink, Tone};
pub use marker_guide_pose::BearingEstimate;
