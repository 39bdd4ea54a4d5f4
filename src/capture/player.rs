//! Capture player for reading recorded frames back.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::format::{CaptureHeader, CompressionType, FrameIndex, decompress_lz4};

/// Reader for `.lscap` files. Frames are returned as raw NV12 bytes.
pub struct CapturePlayer {
    reader: BufReader<File>,
    header: CaptureHeader,
    frame_indices: Vec<FrameIndex>,
}

impl CapturePlayer {
    /// Open a capture file.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let header = CaptureHeader::read_from(&mut reader)?;

        // The index table sits at the end of the file.
        let table_size = header.frame_count * FrameIndex::SIZE as u64;
        let file_len = reader.seek(SeekFrom::End(0))?;
        let table_start = file_len
            .checked_sub(table_size)
            .filter(|&start| start >= CaptureHeader::SIZE as u64)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "Truncated LSCP index table")
            })?;
        reader.seek(SeekFrom::Start(table_start))?;

        let mut frame_indices = Vec::with_capacity(header.frame_count as usize);
        for _ in 0..header.frame_count {
            frame_indices.push(FrameIndex::read_from(&mut reader)?);
        }

        Ok(Self {
            reader,
            header,
            frame_indices,
        })
    }

    pub fn header(&self) -> &CaptureHeader {
        &self.header
    }

    pub fn frame_count(&self) -> u64 {
        self.header.frame_count
    }

    /// Read the `n`-th stored frame.
    pub fn read_frame(&mut self, n: u64) -> io::Result<Vec<u8>> {
        let index = *self.frame_indices.get(n as usize).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Frame {} out of range ({} frames)", n, self.frame_count()),
            )
        })?;

        self.reader.seek(SeekFrom::Start(index.offset))?;
        let mut data = vec![0u8; index.size as usize];
        self.reader.read_exact(&mut data)?;

        let raw = match self.header.compression {
            CompressionType::None => data,
            CompressionType::Lz4 => decompress_lz4(&data)?,
        };

        if raw.len() != self.header.frame_size() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Frame {} is {} bytes, expected {}",
                    n,
                    raw.len(),
                    self.header.frame_size()
                ),
            ));
        }
        Ok(raw)
    }

    /// Iterate over all stored frames.
    pub fn frames(&mut self) -> FrameIterator<'_> {
        FrameIterator {
            player: self,
            current: 0,
        }
    }
}

/// Iterator over captured frames.
pub struct FrameIterator<'a> {
    player: &'a mut CapturePlayer,
    current: u64,
}

impl Iterator for FrameIterator<'_> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.player.frame_count() {
            return None;
        }
        let result = self.player.read_frame(self.current);
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.player.frame_count() - self.current) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FrameIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureRecorder;
    use crate::compute::{
        ALIVE_LUMA, Frame, Grid, ManualClock, NEUTRAL_CHROMA, Renderer, Simulation,
        StreamScheduler,
    };
    use crate::schema::StreamConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::tempdir;

    fn config() -> StreamConfig {
        StreamConfig {
            width: 16,
            height: 8,
            frame_rate: 10,
            cell_size: 2,
            generation_duration: 2,
            perturb_interval: 1000,
            pregenerate: false,
            max_frames: 6,
            random_seed: Some(5),
            ..Default::default()
        }
    }

    fn glider() -> Grid {
        Grid::from_rows(&["........", "..#.....", "...#....", ".###...."])
    }

    fn record(compression: CompressionType) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.lscap");

        let simulation = Simulation::from_grid(glider(), StdRng::seed_from_u64(0), 1000);
        let mut scheduler = StreamScheduler::with_clock(
            config(),
            CaptureRecorder::new(&path, compression),
            ManualClock::new(),
        )
        .unwrap()
        .with_simulation(simulation);
        scheduler.run().unwrap();

        (dir, path)
    }

    fn expected_frames() -> Vec<Vec<u8>> {
        let renderer = Renderer::new(2);
        let mut sim = Simulation::from_grid(glider(), StdRng::seed_from_u64(0), 1000);
        let mut frame = Frame::new(16, 8);
        let mut out = Vec::new();
        for i in 0..6u64 {
            if i % 2 == 0 {
                if i != 0 {
                    sim.step();
                }
                renderer.render(sim.current(), &mut frame);
            }
            let mut bytes = frame.luma().to_vec();
            bytes.extend_from_slice(frame.chroma());
            out.push(bytes);
        }
        out
    }

    #[test]
    fn test_scheduler_capture_roundtrip() {
        let (_dir, path) = record(CompressionType::None);
        let mut player = CapturePlayer::open(&path).unwrap();

        assert_eq!(player.frame_count(), 6);
        assert_eq!(player.header().width, 16);
        assert_eq!(player.header().frame_rate, 10);

        let frames: Vec<Vec<u8>> = player.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames, expected_frames());

        let first = &frames[0];
        assert_eq!(first.iter().take(128).filter(|&&p| p == ALIVE_LUMA).count(), 5 * 4);
        assert!(first[128..].iter().all(|&c| c == NEUTRAL_CHROMA));
    }

    #[test]
    fn test_lz4_capture_roundtrip() {
        let (_dir, path) = record(CompressionType::Lz4);
        let mut player = CapturePlayer::open(&path).unwrap();
        assert_eq!(player.header().compression, CompressionType::Lz4);

        let frames: Vec<Vec<u8>> = player.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames, expected_frames());
    }

    #[test]
    fn test_out_of_range_frame() {
        let (_dir, path) = record(CompressionType::None);
        let mut player = CapturePlayer::open(&path).unwrap();
        let err = player.read_frame(6).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
