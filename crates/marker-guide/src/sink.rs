use log::info;
use marker_guide_feedback::{AudioError, AudioSink, Tone};

use crate::config::AudioConfig;

/// Audio sink that reports playback through the logger instead of a device.
///
/// Used for replays and dry runs; every call succeeds.
#[derive(Debug, Clone)]
pub struct LogSink {
    assets: AudioConfig,
    spoken: Vec<String>,
}

impl LogSink {
    pub fn new(assets: AudioConfig) -> Self {
        Self {
            assets,
            spoken: Vec::new(),
        }
    }

    pub fn asset(&self, tone: Tone) -> &str {
        match tone {
            Tone::Left => &self.assets.left_tone,
            Tone::Right => &self.assets.right_tone,
            Tone::OutOfView => &self.assets.out_of_view_tone,
        }
    }

    /// Phrases spoken so far, in order.
    pub fn spoken(&self) -> &[String] {
        &self.spoken
    }
}

impl AudioSink for LogSink {
    fn play_looped(&mut self, tone: Tone, volume: f32) -> Result<(), AudioError> {
        info!("loop {} ({tone}) at volume {volume:.2}", self.asset(tone));
        Ok(())
    }

    fn stop(&mut self, tone: Tone) -> Result<(), AudioError> {
        info!("stop {} ({tone})", self.asset(tone));
        Ok(())
    }

    fn speak_blocking(&mut self, text: &str) -> Result<(), AudioError> {
        info!("say [{}] \"{text}\"", self.assets.voice);
        self.spoken.push(text.to_string());
        Ok(())
    }
}
