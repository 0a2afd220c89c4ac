//! Per-frame feedback state machine.
//!
//! [`step`] is pure: it takes the previous [`FeedbackState`] and this frame's
//! reading (if any) and returns the next state plus the audio commands to
//! issue. Counters are the only memory; there is no timer.

use log::{debug, info};
use marker_guide_pose::BearingEstimate;
use serde::{Deserialize, Serialize};

use crate::audio::{AudioCommand, Tone};
use crate::params::FeedbackParams;
use crate::phrases::announcement;

/// Side on which the marker was last seen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    None,
    Left,
    Right,
    Centered,
}

/// What the user is currently hearing, derived from [`FeedbackState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackMode {
    Searching,
    Left,
    Right,
    Centered,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackState {
    /// Frames since the last usable reading.
    pub missed_frames: u32,
    /// Consecutive centered frames since the last announcement.
    pub centered_frames: u32,
    pub last_direction: Direction,
}

impl FeedbackState {
    pub fn mode(&self, params: &FeedbackParams) -> FeedbackMode {
        if self.missed_frames > params.miss_threshold {
            return FeedbackMode::Searching;
        }
        match self.last_direction {
            Direction::None => FeedbackMode::Searching,
            Direction::Left => FeedbackMode::Left,
            Direction::Right => FeedbackMode::Right,
            Direction::Centered => FeedbackMode::Centered,
        }
    }
}

/// A usable reading for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub estimate: BearingEstimate,
    /// Smoothed orientation angle, degrees.
    pub orientation: i32,
}

/// Result of one [`step`].
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: FeedbackState,
    pub commands: Vec<AudioCommand>,
    /// Whether the distance/orientation announcement fired this frame.
    pub announced: bool,
}

fn play(tone: Tone, volume: f32) -> AudioCommand {
    AudioCommand::Play { tone, volume }
}

fn stop(tone: Tone) -> AudioCommand {
    AudioCommand::Stop { tone }
}

/// Advance the feedback loop by one frame.
pub fn step(
    mut state: FeedbackState,
    reading: Option<&Reading>,
    params: &FeedbackParams,
) -> Transition {
    let mut commands = Vec::new();

    state.missed_frames = state.missed_frames.saturating_add(1);
    if state.missed_frames > params.miss_threshold {
        if state.missed_frames == params.miss_threshold + 1 {
            debug!("marker lost for {} frames", state.missed_frames);
        }
        commands.push(stop(Tone::Right));
        commands.push(stop(Tone::Left));
        commands.push(play(Tone::OutOfView, params.out_of_view_volume));
    }

    let Some(reading) = reading else {
        return Transition {
            state,
            commands,
            announced: false,
        };
    };
    state.missed_frames = 0;

    let angle = reading.estimate.position_angle;
    let previous = state.last_direction;
    if angle.unsigned_abs() < params.center_tolerance_deg.unsigned_abs() {
        commands.push(stop(Tone::Left));
        commands.push(stop(Tone::Right));
        commands.push(stop(Tone::OutOfView));
        state.last_direction = Direction::Centered;
        state.centered_frames = state.centered_frames.saturating_add(1);
    } else if angle < 0 {
        commands.push(play(Tone::Left, params.tone_volume(angle)));
        commands.push(stop(Tone::Right));
        commands.push(stop(Tone::OutOfView));
        state.last_direction = Direction::Left;
        state.centered_frames = 0;
    } else {
        commands.push(play(Tone::Right, params.tone_volume(angle)));
        commands.push(stop(Tone::Left));
        commands.push(stop(Tone::OutOfView));
        state.last_direction = Direction::Right;
        state.centered_frames = 0;
    }
    if previous != state.last_direction {
        debug!("direction {:?} -> {:?} at {angle}°", previous, state.last_direction);
    }

    let mut announced = false;
    if state.centered_frames > params.centered_threshold {
        let [distance, orientation] = announcement(reading.estimate.distance, reading.orientation);
        info!("announcing: {distance}; {orientation}");
        commands.push(AudioCommand::Speak { text: distance });
        commands.push(AudioCommand::Speak { text: orientation });
        state.centered_frames = 0;
        announced = true;
    }

    Transition {
        state,
        commands,
        announced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(position_angle: i32) -> Reading {
        Reading {
            estimate: BearingEstimate {
                distance: 30,
                position_angle,
                orientation_raw: 0,
            },
            orientation: 7,
        }
    }

    fn run(
        state: FeedbackState,
        frames: &[Option<Reading>],
        params: &FeedbackParams,
    ) -> (FeedbackState, Vec<Transition>) {
        let mut state = state;
        let mut out = Vec::new();
        for frame in frames {
            let t = step(state, frame.as_ref(), params);
            state = t.state;
            out.push(t);
        }
        (state, out)
    }

    fn speech(t: &Transition) -> Vec<&str> {
        t.commands
            .iter()
            .filter_map(|c| match c {
                AudioCommand::Speak { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn positive_bearing_plays_right_tone() {
        let p = FeedbackParams::default();
        let t = step(FeedbackState::default(), Some(&reading(15)), &p);
        assert_eq!(
            t.commands,
            vec![
                play(Tone::Right, 0.5),
                stop(Tone::Left),
                stop(Tone::OutOfView)
            ]
        );
        assert_eq!(t.state.last_direction, Direction::Right);
        assert_eq!(t.state.mode(&p), FeedbackMode::Right);
    }

    #[test]
    fn negative_bearing_plays_clamped_left_tone() {
        let p = FeedbackParams::default();
        let t = step(FeedbackState::default(), Some(&reading(-45)), &p);
        assert_eq!(t.commands[0], play(Tone::Left, 1.0));
        assert!(t.commands.contains(&stop(Tone::Right)));
        assert_eq!(t.state.last_direction, Direction::Left);
    }

    #[test]
    fn zero_bearing_silences_everything() {
        let p = FeedbackParams::default();
        let t = step(FeedbackState::default(), Some(&reading(0)), &p);
        assert_eq!(
            t.commands,
            vec![stop(Tone::Left), stop(Tone::Right), stop(Tone::OutOfView)]
        );
        assert_eq!(t.state.centered_frames, 1);
        assert_eq!(t.state.last_direction, Direction::Centered);
    }

    #[test]
    fn out_of_view_forced_on_twenty_first_miss() {
        let p = FeedbackParams::default();
        let start = FeedbackState {
            last_direction: Direction::Left,
            ..FeedbackState::default()
        };
        let (state, transitions) = run(start, &[None; 21], &p);
        assert!(transitions[..20].iter().all(|t| t.commands.is_empty()));
        assert_eq!(
            transitions[20].commands,
            vec![
                stop(Tone::Right),
                stop(Tone::Left),
                play(Tone::OutOfView, 0.5)
            ]
        );
        assert_eq!(state.missed_frames, 21);
        assert_eq!(state.last_direction, Direction::Left);
        assert_eq!(state.mode(&p), FeedbackMode::Searching);
    }

    #[test]
    fn reading_resets_miss_counter() {
        let p = FeedbackParams::default();
        let mut frames = vec![None; 19];
        frames.push(Some(reading(5)));
        frames.extend([None; 20]);
        let (state, transitions) = run(FeedbackState::default(), &frames, &p);
        assert_eq!(state.missed_frames, 20);
        assert!(!transitions
            .iter()
            .any(|t| t.commands.contains(&play(Tone::OutOfView, 0.5))));
    }

    #[test]
    fn reading_on_twenty_first_frame_cancels_forced_tone() {
        let p = FeedbackParams::default();
        let mut frames = vec![None; 20];
        frames.push(Some(reading(-6)));
        let (state, transitions) = run(FeedbackState::default(), &frames, &p);
        let last = &transitions[20].commands;
        let forced = last
            .iter()
            .position(|c| *c == play(Tone::OutOfView, 0.5))
            .expect("forced on the 21st frame");
        let cancelled = last
            .iter()
            .rposition(|c| *c == stop(Tone::OutOfView))
            .expect("reading stops it again");
        assert!(forced < cancelled);
        assert_eq!(state.missed_frames, 0);
        assert_eq!(state.last_direction, Direction::Left);
    }

    #[test]
    fn announcement_fires_on_eleventh_centered_frame() {
        let p = FeedbackParams::default();
        let frames = vec![Some(reading(0)); 22];
        let (state, transitions) = run(FeedbackState::default(), &frames, &p);

        let fired: Vec<usize> = transitions
            .iter()
            .enumerate()
            .filter(|(_, t)| t.announced)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(fired, vec![10, 21]);
        assert_eq!(
            speech(&transitions[10]),
            vec!["Distance 2 and a half feet", "Orientation -7 degrees"]
        );
        assert_eq!(transitions[10].state.centered_frames, 0);
        assert_eq!(state.centered_frames, 0);
    }

    #[test]
    fn off_center_frame_restarts_centering() {
        let p = FeedbackParams::default();
        let mut frames = vec![Some(reading(0)); 10];
        frames.push(Some(reading(3)));
        frames.extend(vec![Some(reading(0)); 10]);
        let (state, transitions) = run(FeedbackState::default(), &frames, &p);
        assert!(transitions.iter().all(|t| !t.announced));
        assert_eq!(state.centered_frames, 10);
    }

    #[test]
    fn missed_frames_keep_centering_progress() {
        let p = FeedbackParams::default();
        let mut frames = vec![Some(reading(0)); 10];
        frames.extend([None; 3]);
        frames.push(Some(reading(0)));
        let (_, transitions) = run(FeedbackState::default(), &frames, &p);
        assert!(transitions.last().expect("frames").announced);
    }
}
