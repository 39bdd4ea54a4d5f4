//! Frame sinks: the boundary between the paced core and the outside world.
//!
//! The scheduler drives any [`FrameSink`] through a fixed lifecycle:
//! `initialize` once, `submit` once per frame with strictly increasing
//! presentation indices, and `finalize` exactly once at the end (also
//! after a failed submission, as best-effort cleanup).
//!
//! Implementations:
//!
//! - [`FfmpegSink`]: pipes raw NV12 frames into an `ffmpeg` process that
//!   encodes and publishes them to the destination.
//! - [`MemorySink`]: keeps submitted indices and frame digests in memory,
//!   with optional failure injection.
//! - [`crate::capture::CaptureRecorder`]: writes frames to a capture file.

mod ffmpeg;
mod memory;

use std::io;

pub use ffmpeg::FfmpegSink;
pub use memory::{MemorySink, SubmittedFrame};

use crate::compute::Frame;
use crate::schema::StreamConfig;

/// Stream parameters agreed with the sink at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkParams {
    /// Frame width in pixels.
    pub width: usize,
    /// Frame height in pixels.
    pub height: usize,
    /// Frames per second; presentation index `i` is shown at `i / frame_rate` s.
    pub frame_rate: u32,
    /// Target bitrate hint (bits per second).
    pub bitrate: u64,
    /// Keyframe interval hint (frames).
    pub gop_size: u32,
}

impl SinkParams {
    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            frame_rate: config.frame_rate,
            bitrate: config.bitrate,
            gop_size: config.gop_size,
        }
    }

    /// Size of one NV12 frame in bytes.
    #[inline]
    pub fn frame_size(&self) -> usize {
        Frame::byte_len_for(self.width, self.height)
    }
}

/// Consumer of rendered frames.
pub trait FrameSink {
    /// Open the outbound session.
    fn initialize(&mut self, params: &SinkParams) -> Result<(), SinkError>;

    /// Accept one frame tagged with its presentation index.
    fn submit(&mut self, frame: &Frame, index: u64) -> Result<(), SinkError>;

    /// Flush and close the session.
    fn finalize(&mut self) -> Result<(), SinkError>;
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn initialize(&mut self, params: &SinkParams) -> Result<(), SinkError> {
        (**self).initialize(params)
    }

    fn submit(&mut self, frame: &Frame, index: u64) -> Result<(), SinkError> {
        (**self).submit(frame, index)
    }

    fn finalize(&mut self) -> Result<(), SinkError> {
        (**self).finalize()
    }
}

/// Errors reported by frame sinks.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to start encoder '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Sink used before initialize")]
    NotInitialized,

    #[error("Frame is {actual} bytes, sink expects {expected}")]
    FrameSize { expected: usize, actual: usize },

    #[error("Encoder exited with {status}")]
    EncoderExit { status: std::process::ExitStatus },

    #[error("Frame {index} rejected: {reason}")]
    Rejected { index: u64, reason: String },
}
