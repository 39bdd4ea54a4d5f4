//! Life Stream - Game of Life as a paced live video source.
//!
//! This crate runs a toroidal Conway's Game of Life board and turns it
//! into a steady stream of NV12 video frames for an encoder/muxer. Frames
//! leave at a fixed rate with drift-free pacing; each generation stays on
//! screen for a configurable number of frames and the board is perturbed
//! from time to time so it never settles.
//!
//! # Architecture
//!
//! - `schema`: Configuration types and the destination file
//! - `compute`: Grid, rendering, pacing and the stream scheduler
//! - `sink`: The `FrameSink` boundary and its ffmpeg/in-memory implementations
//! - `capture`: Capture file recorder and player
//!
//! # Example
//!
//! ```rust,no_run
//! use life_stream::{
//!     compute::StreamScheduler,
//!     schema::StreamConfig,
//!     sink::MemorySink,
//! };
//!
//! // Five seconds of 30 fps video
//! let config = StreamConfig {
//!     max_frames: 150,
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let mut scheduler = StreamScheduler::new(config, MemorySink::new()).unwrap();
//! let summary = scheduler.run().unwrap();
//!
//! println!("{}", summary);
//! ```

pub mod capture;
pub mod compute;
pub mod schema;
pub mod sink;

// Re-export commonly used types
pub use compute::{Grid, Simulation, StreamScheduler, StreamSummary};
pub use schema::{Destination, StreamConfig};
pub use sink::{FfmpegSink, FrameSink, MemorySink};
