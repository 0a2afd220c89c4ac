//! Audio sink interface and the tone driver in front of it.

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// The three looped cues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Marker is to the left.
    Left,
    /// Marker is to the right.
    Right,
    /// Marker has not been seen for a while.
    OutOfView,
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Left, Tone::Right, Tone::OutOfView];

    fn index(self) -> usize {
        match self {
            Tone::Left => 0,
            Tone::Right => 1,
            Tone::OutOfView => 2,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tone::Left => "left",
            Tone::Right => "right",
            Tone::OutOfView => "out-of-view",
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("tone {tone} failed: {reason}")]
    Tone { tone: Tone, reason: String },
    #[error("speech failed: {0}")]
    Speech(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Playback engine used by the feedback loop.
///
/// Tones and speech play on independent channels: a looped tone keeps
/// playing while a phrase is spoken.
pub trait AudioSink {
    /// Start `tone` looping at `volume` (in `[0, 1]`). If it is already
    /// looping only its volume changes.
    fn play_looped(&mut self, tone: Tone, volume: f32) -> Result<(), AudioError>;

    /// Stop `tone`. Stopping a silent tone is not an error.
    fn stop(&mut self, tone: Tone) -> Result<(), AudioError>;

    /// Speak `text` and return only once playback has finished.
    fn speak_blocking(&mut self, text: &str) -> Result<(), AudioError>;
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn play_looped(&mut self, tone: Tone, volume: f32) -> Result<(), AudioError> {
        (**self).play_looped(tone, volume)
    }

    fn stop(&mut self, tone: Tone) -> Result<(), AudioError> {
        (**self).stop(tone)
    }

    fn speak_blocking(&mut self, text: &str) -> Result<(), AudioError> {
        (**self).speak_blocking(text)
    }
}

/// One instruction produced by the state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AudioCommand {
    Play { tone: Tone, volume: f32 },
    Stop { tone: Tone },
    Speak { text: String },
}

/// Forwards commands to a sink, skipping calls that would not change what
/// is audible.
///
/// Within one frame only the last command per tone is applied, tones are
/// updated before any speech, and phrases are spoken in order. Sink errors
/// are logged and never abort the frame.
#[derive(Debug)]
pub struct ToneDriver<S> {
    sink: S,
    playing: [Option<f32>; 3],
}

impl<S: AudioSink> ToneDriver<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            playing: [None; 3],
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Current volume of `tone`, `None` when silent.
    pub fn volume(&self, tone: Tone) -> Option<f32> {
        self.playing[tone.index()]
    }

    pub fn is_playing(&self, tone: Tone) -> bool {
        self.volume(tone).is_some()
    }

    pub fn apply(&mut self, commands: &[AudioCommand]) {
        let mut last: [Option<Option<f32>>; 3] = [None; 3];
        for cmd in commands {
            match *cmd {
                AudioCommand::Play { tone, volume } => last[tone.index()] = Some(Some(volume)),
                AudioCommand::Stop { tone } => last[tone.index()] = Some(None),
                AudioCommand::Speak { .. } => {}
            }
        }
        for tone in Tone::ALL {
            match last[tone.index()] {
                Some(Some(volume)) => self.play(tone, volume),
                Some(None) => self.stop(tone),
                None => {}
            }
        }
        for cmd in commands {
            if let AudioCommand::Speak { text } = cmd {
                self.speak(text);
            }
        }
    }

    pub fn play(&mut self, tone: Tone, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        if self.playing[tone.index()] == Some(volume) {
            return;
        }
        match self.sink.play_looped(tone, volume) {
            Ok(()) => {
                debug!("tone {tone} at {volume:.2}");
                self.playing[tone.index()] = Some(volume);
            }
            Err(err) => warn!("audio: {err}"),
        }
    }

    pub fn stop(&mut self, tone: Tone) {
        if self.playing[tone.index()].is_none() {
            return;
        }
        match self.sink.stop(tone) {
            Ok(()) => {
                debug!("tone {tone} stopped");
                self.playing[tone.index()] = None;
            }
            Err(err) => warn!("audio: {err}"),
        }
    }

    pub fn stop_all(&mut self) {
        for tone in Tone::ALL {
            self.stop(tone);
        }
    }

    pub fn speak(&mut self, text: &str) {
        if let Err(err) = self.sink.speak_blocking(text) {
            warn!("audio: {err}");
        }
    }
}
