//! In-memory sink that records what it receives.

use super::{FrameSink, SinkError, SinkParams};
use crate::compute::Frame;

/// Record of one accepted frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedFrame {
    /// Presentation index.
    pub index: u64,
    /// Number of bright luma pixels.
    pub lit_pixels: usize,
    /// FNV-1a digest of both planes.
    pub digest: u64,
}

/// Sink keeping submitted frames in memory.
///
/// `fail_at` makes the submission with that presentation index fail,
/// which lets callers exercise the abort path. `fail_finalize` makes every
/// `finalize` call fail after it has been counted.
#[derive(Debug, Default)]
pub struct MemorySink {
    params: Option<SinkParams>,
    frames: Vec<SubmittedFrame>,
    fail_at: Option<u64>,
    fail_initialize: bool,
    fail_finalize: bool,
    finalize_calls: u32,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the submission carrying presentation index `index`.
    pub fn failing_at(index: u64) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    /// Refuse to initialize.
    pub fn refusing() -> Self {
        Self {
            fail_initialize: true,
            ..Self::default()
        }
    }

    /// Fail every `finalize` call.
    pub fn failing_finalize() -> Self {
        Self::new().with_failing_finalize()
    }

    /// Also fail every `finalize` call.
    pub fn with_failing_finalize(mut self) -> Self {
        self.fail_finalize = true;
        self
    }

    /// Parameters received by `initialize`.
    pub fn params(&self) -> Option<&SinkParams> {
        self.params.as_ref()
    }

    /// Accepted frames in submission order.
    pub fn frames(&self) -> &[SubmittedFrame] {
        &self.frames
    }

    /// Presentation indices in submission order.
    pub fn indices(&self) -> Vec<u64> {
        self.frames.iter().map(|f| f.index).collect()
    }

    pub fn finalize_calls(&self) -> u32 {
        self.finalize_calls
    }
}

fn fnv1a(planes: [&[u8]; 2]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for plane in planes {
        for &b in plane {
            hash ^= b as u64;
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

impl FrameSink for MemorySink {
    fn initialize(&mut self, params: &SinkParams) -> Result<(), SinkError> {
        if self.fail_initialize {
            return Err(SinkError::Rejected {
                index: 0,
                reason: "session refused".to_string(),
            });
        }
        self.params = Some(*params);
        Ok(())
    }

    fn submit(&mut self, frame: &Frame, index: u64) -> Result<(), SinkError> {
        let params = self.params.as_ref().ok_or(SinkError::NotInitialized)?;
        if frame.byte_len() != params.frame_size() {
            return Err(SinkError::FrameSize {
                expected: params.frame_size(),
                actual: frame.byte_len(),
            });
        }
        if self.fail_at == Some(index) {
            return Err(SinkError::Rejected {
                index,
                reason: "injected failure".to_string(),
            });
        }

        self.frames.push(SubmittedFrame {
            index,
            lit_pixels: frame.luma().iter().filter(|&&p| p != 0).count(),
            digest: fnv1a(frame.planes()),
        });
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SinkError> {
        self.finalize_calls += 1;
        if self.fail_finalize {
            return Err(SinkError::Rejected {
                index: self.frames.len() as u64,
                reason: "injected finalize failure".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SinkParams {
        SinkParams {
            width: 8,
            height: 4,
            frame_rate: 10,
            bitrate: 1000,
            gop_size: 20,
        }
    }

    #[test]
    fn test_records_frames() {
        let mut sink = MemorySink::new();
        sink.initialize(&params()).unwrap();

        let frame = Frame::new(8, 4);
        sink.submit(&frame, 0).unwrap();
        sink.submit(&frame, 1).unwrap();
        sink.finalize().unwrap();

        assert_eq!(sink.indices(), vec![0, 1]);
        assert_eq!(sink.frames()[0].digest, sink.frames()[1].digest);
        assert_eq!(sink.frames()[0].lit_pixels, 0);
        assert_eq!(sink.finalize_calls(), 1);
    }

    #[test]
    fn test_requires_initialize() {
        let mut sink = MemorySink::new();
        let err = sink.submit(&Frame::new(8, 4), 0).unwrap_err();
        assert!(matches!(err, SinkError::NotInitialized));
    }

    #[test]
    fn test_rejects_wrong_frame_size() {
        let mut sink = MemorySink::new();
        sink.initialize(&params()).unwrap();
        let err = sink.submit(&Frame::new(4, 4), 0).unwrap_err();
        assert!(matches!(
            err,
            SinkError::FrameSize {
                expected: 48,
                actual: 24
            }
        ));
    }

    #[test]
    fn test_injected_failure() {
        let mut sink = MemorySink::failing_at(1);
        sink.initialize(&params()).unwrap();
        let frame = Frame::new(8, 4);
        assert!(sink.submit(&frame, 0).is_ok());
        assert!(matches!(
            sink.submit(&frame, 1),
            Err(SinkError::Rejected { index: 1, .. })
        ));
        assert_eq!(sink.indices(), vec![0]);
    }

    #[test]
    fn test_injected_finalize_failure() {
        let mut sink = MemorySink::failing_finalize();
        sink.initialize(&params()).unwrap();
        sink.submit(&Frame::new(8, 4), 0).unwrap();

        assert!(matches!(
            sink.finalize(),
            Err(SinkError::Rejected { index: 1, .. })
        ));
        assert_eq!(sink.finalize_calls(), 1);
        assert_eq!(sink.indices(), vec![0]);
    }
}
