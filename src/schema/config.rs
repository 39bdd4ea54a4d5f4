//! Configuration types for Life Stream sessions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default destination file, relative to the working directory.
pub const DEFAULT_DESTINATION_FILE: &str = "stream_url.txt";

fn default_destination_file() -> String {
    DEFAULT_DESTINATION_FILE.to_string()
}

/// Top-level stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Frame width in pixels.
    pub width: usize,
    /// Frame height in pixels.
    pub height: usize,
    /// Frames per second.
    pub frame_rate: u32,
    /// Edge length of one cell in pixels.
    pub cell_size: usize,
    /// Number of frames each generation stays on screen.
    pub generation_duration: u32,
    /// Inject a perturbation every N generations.
    pub perturb_interval: u64,
    /// Randomly fill the board and run `pregenerate_steps` before streaming.
    pub pregenerate: bool,
    /// Number of unpaced steps run before the first frame.
    pub pregenerate_steps: u64,
    /// Target bitrate hint passed to the sink (bits per second).
    pub bitrate: u64,
    /// Keyframe interval hint passed to the sink (frames).
    pub gop_size: u32,
    /// Random seed (None = seeded from entropy).
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Stop after this many frames (0 = unlimited).
    #[serde(default)]
    pub max_frames: u64,
    /// Frames between progress signals (0 = one nominal second).
    #[serde(default)]
    pub progress_interval: u32,
    /// File holding the destination address on its first line.
    #[serde(default = "default_destination_file")]
    pub destination_file: String,
    /// Encoder/muxer settings.
    #[serde(default)]
    pub encoder: EncoderConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frame_rate: 30,
            cell_size: 8,
            generation_duration: 15,
            perturb_interval: 20,
            pregenerate: true,
            pregenerate_steps: 1200,
            bitrate: 3_000_000,
            gop_size: 60,
            random_seed: None,
            max_frames: 0,
            progress_interval: 0,
            destination_file: default_destination_file(),
            encoder: EncoderConfig::default(),
        }
    }
}

/// Settings for the external encoder process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Encoder executable.
    pub program: String,
    /// Video codec name understood by the encoder.
    pub codec: String,
    /// Codec preset.
    pub preset: String,
    /// Container format.
    pub format: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            codec: "libx264".to_string(),
            preset: "medium".to_string(),
            format: "flv".to_string(),
        }
    }
}

impl StreamConfig {
    /// Board width in cells.
    #[inline]
    pub fn grid_width(&self) -> usize {
        self.width / self.cell_size
    }

    /// Board height in cells.
    #[inline]
    pub fn grid_height(&self) -> usize {
        self.height / self.cell_size
    }

    /// Nominal duration of one frame.
    pub fn frame_period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.frame_rate as u64)
    }

    /// Frames between progress signals, resolving the 0 default.
    pub fn effective_progress_interval(&self) -> u64 {
        if self.progress_interval == 0 {
            self.frame_rate as u64
        } else {
            self.progress_interval as u64
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(ConfigError::OddDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.cell_size == 0
            || self.width % self.cell_size != 0
            || self.height % self.cell_size != 0
        {
            return Err(ConfigError::InvalidCellSize {
                cell_size: self.cell_size,
                width: self.width,
                height: self.height,
            });
        }
        if self.frame_rate == 0 {
            return Err(ConfigError::InvalidFrameRate);
        }
        if self.generation_duration == 0 {
            return Err(ConfigError::InvalidGenerationDuration);
        }
        if self.perturb_interval == 0 {
            return Err(ConfigError::InvalidPerturbInterval);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Frame dimensions (width, height) must be non-zero")]
    InvalidDimensions,
    #[error("Frame dimensions must be even for NV12 output, got {width}x{height}")]
    OddDimensions { width: usize, height: usize },
    #[error("Cell size {cell_size} must be non-zero and divide the frame size {width}x{height}")]
    InvalidCellSize {
        cell_size: usize,
        width: usize,
        height: usize,
    },
    #[error("Frame rate must be non-zero")]
    InvalidFrameRate,
    #[error("Generation duration must be non-zero")]
    InvalidGenerationDuration,
    #[error("Perturb interval must be non-zero")]
    InvalidPerturbInterval,
}
