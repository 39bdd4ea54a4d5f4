//! Capture recorder: a frame sink that writes to a capture file.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::format::{CaptureHeader, CompressionType, FrameIndex, compress_lz4};
use crate::compute::Frame;
use crate::sink::{FrameSink, SinkError, SinkParams};

/// Frame sink storing every submitted frame in a `.lscap` file.
///
/// The file is created on `initialize`; the frame index table and the
/// final frame count are written on `finalize`.
pub struct CaptureRecorder {
    path: PathBuf,
    compression: CompressionType,
    writer: Option<BufWriter<File>>,
    header: Option<CaptureHeader>,
    frame_indices: Vec<FrameIndex>,
    /// Byte offset where the next frame will be written.
    next_offset: u64,
}

impl CaptureRecorder {
    /// Create a recorder. LZ4 falls back to raw frames when the `lz4`
    /// feature is disabled, so the header never claims a compression that
    /// was not applied.
    pub fn new<P: AsRef<Path>>(path: P, compression: CompressionType) -> Self {
        let compression = if cfg!(feature = "lz4") {
            compression
        } else {
            CompressionType::None
        };
        Self {
            path: path.as_ref().to_path_buf(),
            compression,
            writer: None,
            header: None,
            frame_indices: Vec::new(),
            next_offset: 0,
        }
    }

    /// Compression recorded in the header.
    pub fn compression(&self) -> CompressionType {
        self.compression
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frame_indices.len() as u64
    }
}

impl FrameSink for CaptureRecorder {
    fn initialize(&mut self, params: &SinkParams) -> Result<(), SinkError> {
        let mut writer = BufWriter::new(File::create(&self.path)?);

        let header = CaptureHeader {
            width: params.width as u32,
            height: params.height as u32,
            frame_rate: params.frame_rate,
            frame_count: 0, // Updated on finalize
            first_index: 0,
            compression: self.compression,
        };
        header.write_to(&mut writer)?;

        log::info!("recording capture to {}", self.path.display());
        self.writer = Some(writer);
        self.header = Some(header);
        self.frame_indices.clear();
        self.next_offset = CaptureHeader::SIZE as u64;
        Ok(())
    }

    fn submit(&mut self, frame: &Frame, index: u64) -> Result<(), SinkError> {
        let (Some(writer), Some(header)) = (self.writer.as_mut(), self.header.as_mut()) else {
            return Err(SinkError::NotInitialized);
        };

        if frame.byte_len() != header.frame_size() {
            return Err(SinkError::FrameSize {
                expected: header.frame_size(),
                actual: frame.byte_len(),
            });
        }

        // Stored frames must be contiguous in presentation order.
        if self.frame_indices.is_empty() {
            header.first_index = index;
        } else if index != header.first_index + self.frame_indices.len() as u64 {
            return Err(SinkError::Rejected {
                index,
                reason: format!(
                    "expected presentation index {}",
                    header.first_index + self.frame_indices.len() as u64
                ),
            });
        }

        let offset = self.next_offset;
        let size = match header.compression {
            CompressionType::None => {
                for plane in frame.planes() {
                    writer.write_all(plane)?;
                }
                frame.byte_len()
            }
            CompressionType::Lz4 => {
                let mut raw = Vec::with_capacity(frame.byte_len());
                for plane in frame.planes() {
                    raw.extend_from_slice(plane);
                }
                let compressed = compress_lz4(&raw);
                writer.write_all(&compressed)?;
                compressed.len()
            }
        };

        self.next_offset += size as u64;
        self.frame_indices.push(FrameIndex {
            offset,
            size: size as u64,
        });
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SinkError> {
        let (Some(mut writer), Some(mut header)) = (self.writer.take(), self.header.take()) else {
            return Ok(());
        };

        for index in &self.frame_indices {
            index.write_to(&mut writer)?;
        }

        header.frame_count = self.frame_indices.len() as u64;
        writer.seek(SeekFrom::Start(0))?;
        header.write_to(&mut writer)?;
        writer.flush()?;

        log::info!(
            "capture {} finalized with {} frames",
            self.path.display(),
            header.frame_count
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CapturePlayer;
    use crate::compute::{Grid, Renderer};
    use tempfile::tempdir;

    fn params() -> SinkParams {
        SinkParams {
            width: 8,
            height: 4,
            frame_rate: 10,
            bitrate: 0,
            gop_size: 0,
        }
    }

    #[test]
    fn test_recorder_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("basic.lscap");

        let mut recorder = CaptureRecorder::new(&path, CompressionType::None);
        recorder.initialize(&params()).unwrap();
        let frame = Frame::new(8, 4);
        for i in 0..5 {
            recorder.submit(&frame, i).unwrap();
        }
        recorder.finalize().unwrap();

        let len = std::fs::metadata(&path).unwrap().len();
        let expected = CaptureHeader::SIZE + 5 * frame.byte_len() + 5 * FrameIndex::SIZE;
        assert_eq!(len, expected as u64);

        let player = CapturePlayer::open(&path).unwrap();
        assert_eq!(player.frame_count(), 5);
        assert_eq!(player.header().first_index, 0);
    }

    #[test]
    fn test_rejects_index_gap() {
        let dir = tempdir().unwrap();
        let mut recorder =
            CaptureRecorder::new(dir.path().join("gap.lscap"), CompressionType::None);
        recorder.initialize(&params()).unwrap();

        let frame = Frame::new(8, 4);
        recorder.submit(&frame, 0).unwrap();
        let err = recorder.submit(&frame, 2).unwrap_err();
        assert!(matches!(err, SinkError::Rejected { index: 2, .. }));
        assert_eq!(recorder.frames_written(), 1);
    }

    #[test]
    fn test_finalize_without_initialize() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("never.lscap");
        let mut recorder = CaptureRecorder::new(&path, CompressionType::None);
        assert!(recorder.finalize().is_ok());
        assert!(!path.exists());
    }

    #[test]
    fn test_offsets_follow_stored_sizes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("offsets.lscap");

        let mut recorder = CaptureRecorder::new(&path, CompressionType::Lz4);
        recorder.initialize(&params()).unwrap();
        let renderer = Renderer::new(1);
        let mut grid = Grid::new(8, 4);
        let mut frame = Frame::new(8, 4);
        for i in 0..4u64 {
            grid.set(i as usize, 0, true);
            renderer.render(&grid, &mut frame);
            recorder.submit(&frame, i).unwrap();
        }

        let mut expected = CaptureHeader::SIZE as u64;
        for index in &recorder.frame_indices {
            assert_eq!(index.offset, expected);
            expected += index.size;
        }
        recorder.finalize().unwrap();

        let mut player = CapturePlayer::open(&path).unwrap();
        let last = player.read_frame(3).unwrap();
        assert_eq!(&last[..4], &[255, 255, 255, 255]);
        assert_eq!(last.len(), frame.byte_len());
    }

    #[test]
    fn test_header_matches_applied_compression() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lz4.lscap");

        let mut recorder = CaptureRecorder::new(&path, CompressionType::Lz4);
        let expected = if cfg!(feature = "lz4") {
            CompressionType::Lz4
        } else {
            CompressionType::None
        };
        assert_eq!(recorder.compression(), expected);

        recorder.initialize(&params()).unwrap();
        let frame = Frame::new(8, 4);
        recorder.submit(&frame, 0).unwrap();
        recorder.finalize().unwrap();

        let stored = recorder.frame_indices[0].size as usize;
        if expected == CompressionType::None {
            assert_eq!(stored, frame.byte_len());
        }

        let mut player = CapturePlayer::open(&path).unwrap();
        assert_eq!(player.header().compression, expected);
        assert_eq!(player.read_frame(0).unwrap().len(), frame.byte_len());
    }
}
