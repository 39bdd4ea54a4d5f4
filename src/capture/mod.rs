//! Capture files: recording a stream to disk instead of publishing it.
//!
//! # File Format
//!
//! ```text
//! Header (40 bytes, little-endian):
//!   Magic: "LSCP" (4 bytes)
//!   Version: u16
//!   Flags: u16 (low nibble: compression)
//!   Width: u32
//!   Height: u32
//!   Frame rate: u32
//!   Frame count: u64
//!   First presentation index: u64
//!   Reserved: 4 bytes
//!
//! Frame data (variable):
//!   One NV12 frame each (width * height * 3 / 2 bytes), optionally LZ4
//!
//! Frame index table (frame_count * 16 bytes, at end of file):
//!   Offset: u64
//!   Stored size: u64
//! ```

mod format;
mod player;
mod recorder;

pub use format::{CAPTURE_MAGIC, CAPTURE_VERSION, CaptureHeader, CompressionType, FrameIndex};
pub use player::{CapturePlayer, FrameIterator};
pub use recorder::CaptureRecorder;
