use crate::error::FrameSourceError;
use sentrygrid_types::Frame;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceProtocol {
    Rtsp,
    Http,
    File,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceConfig {
    pub url: String,
    pub protocol: SourceProtocol,
    pub username: Option<String>,
    pub password: Option<String>,
    pub target_width: u32,
    pub target_height: u32,
    pub target_fps: f32,
    pub enabled: bool,
}

/// Blocking frame producer. Implementations may drop frames to hold
/// `target_fps`; `sequence_no` on the returned [`Frame`] must still be
/// monotonic and reflect only accepted frames.
pub trait FrameSource: Send {
    /// Returns one frame or a non-terminal/terminal error. Must not block
    /// past `deadline`.
    fn next(&mut self, deadline: Instant) -> Result<Frame, FrameSourceError>;

    /// Non-destructive connectivity probe: obtain at least one frame, then
    /// release any resources grabbed only for the test. Bounded by
    /// `timeout`.
    fn test_connection(&mut self, timeout: Duration) -> Result<(), FrameSourceError> {
        self.next(Instant::now() + timeout).map(|_| ())
    }
}

/// A small fixed sequence of frames, useful for tests and the example
/// binary when no real camera backend is wired up.
pub struct FixedFrameSource {
    frames: std::collections::VecDeque<Frame>,
}

impl FixedFrameSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl FrameSource for FixedFrameSource {
    fn next(&mut self, _deadline: Instant) -> Result<Frame, FrameSourceError> {
        self.frames.pop_front().ok_or(FrameSourceError::ConnectionLost)
    }
}
