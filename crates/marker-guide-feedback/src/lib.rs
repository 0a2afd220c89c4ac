//! Audio feedback for the marker guide.
//!
//! This crate wires together:
//! - a robust sliding-window smoother for the noisy orientation angle,
//! - a per-frame state machine that turns bearings into tone and speech
//!   commands (pure: state in, state and commands out),
//! - a tone driver that forwards those commands to an [`AudioSink`] without
//!   redundant play/stop calls.
//!
//! Playback engines are external and plug in through [`AudioSink`].

mod audio;
mod machine;
mod params;
mod phrases;
mod smoother;

pub use audio::{AudioCommand, AudioError, AudioSink, Tone, ToneDriver};
pub use machine::{step, Direction, FeedbackMode, FeedbackState, Reading, Transition};
pub use params::{FeedbackParams, ParamsError, SmootherParams};
pub use phrases::{announcement, orientation_phrase};
pub use smoother::{robust_mean, OrientationSmoother};
