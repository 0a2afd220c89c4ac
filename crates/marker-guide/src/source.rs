//! Frame sources and the capture loop.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use marker_guide_core::FrameDetections;
use marker_guide_feedback::AudioSink;
use serde::Serialize;

use crate::config::GuideIoError;
use crate::session::{FrameReport, GuideSession};

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Io(#[from] GuideIoError),
    #[error("frame {index} could not be read: {reason}")]
    Frame { index: usize, reason: String },
}

/// Something that yields one set of marker detections per captured frame.
///
/// `None` means the stream has ended. Dropping the source releases whatever
/// capture handle it owns.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<Result<FrameDetections, SourceError>>;
}

/// Replays pre-recorded detections, one entry per frame.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    frames: std::vec::IntoIter<FrameDetections>,
}

impl ReplaySource {
    pub fn from_frames(frames: Vec<FrameDetections>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }

    /// Read a JSON array of frames; each frame is an array of
    /// `{"id": .., "corners": [[x, y]; 4]}` objects.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, GuideIoError> {
        let raw = fs::read_to_string(path)?;
        let frames: Vec<FrameDetections> = serde_json::from_str(&raw)?;
        Ok(Self::from_frames(frames))
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Option<Result<FrameDetections, SourceError>> {
        self.frames.next().map(Ok)
    }
}

/// Shared flag that asks a running loop to finish after the current frame.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndOfStream,
    Requested,
    FrameLimit,
}

/// Totals for a finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames: usize,
    pub readings: usize,
    pub announcements: usize,
    pub stopped_by: StopReason,
}

/// Drive `session` from `source` until the stream ends, `stop` is raised or
/// `max_frames` frames have been processed. The session is started first and
/// stopped (all tones silenced) on every exit path; its sink is returned.
pub fn run_loop<S, F, C>(
    mut session: GuideSession<S>,
    mut source: F,
    stop: &StopSignal,
    max_frames: Option<usize>,
    mut on_frame: C,
) -> Result<(RunSummary, S), SourceError>
where
    S: AudioSink,
    F: FrameSource,
    C: FnMut(&FrameReport),
{
    session.start();
    let mut readings = 0;
    let mut announcements = 0;

    let stopped_by = loop {
        if stop.is_stop_requested() {
            break StopReason::Requested;
        }
        if max_frames.is_some_and(|max| session.frames_processed() >= max) {
            break StopReason::FrameLimit;
        }
        let frame = match source.next_frame() {
            None => break StopReason::EndOfStream,
            Some(Ok(frame)) => frame,
            Some(Err(err)) => {
                drop(source);
                session.stop();
                return Err(err);
            }
        };
        let report = session.process_frame(&frame);
        readings += usize::from(report.has_reading());
        announcements += usize::from(report.announced);
        on_frame(&report);
    };
    drop(source);
    debug!("capture loop ended: {stopped_by:?}");

    let summary = RunSummary {
        frames: session.frames_processed(),
        readings,
        announcements,
        stopped_by,
    };
    let sink = session.stop();
    info!(
        "{} frames, {} readings, {} announcements",
        summary.frames, summary.readings, summary.announcements
    );
    Ok((summary, sink))
}
