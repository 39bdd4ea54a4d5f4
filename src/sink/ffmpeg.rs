//! Encoder/muxer sink backed by an external `ffmpeg` process.
//!
//! Raw NV12 frames are written to the child's stdin; ffmpeg encodes them
//! and muxes the result to the destination (an RTMP ingest URL or a file).
//! Closing stdin lets ffmpeg flush the encoder and write the trailer.

use std::io::Write;
use std::process::{Child, ChildStdin, Command, Stdio};

use super::{FrameSink, SinkError, SinkParams};
use crate::compute::Frame;
use crate::schema::{Destination, EncoderConfig};

/// Sink streaming frames through ffmpeg.
pub struct FfmpegSink {
    encoder: EncoderConfig,
    destination: Destination,
    params: Option<SinkParams>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl FfmpegSink {
    pub fn new(encoder: EncoderConfig, destination: Destination) -> Self {
        Self {
            encoder,
            destination,
            params: None,
            child: None,
            stdin: None,
        }
    }

    /// Command-line arguments for the encoder process.
    pub fn args(&self, params: &SinkParams) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "warning", "-y"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        // Input: raw frames on stdin.
        args.extend([
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "nv12".to_string(),
            "-s:v".to_string(),
            format!("{}x{}", params.width, params.height),
            "-r".to_string(),
            params.frame_rate.to_string(),
            "-i".to_string(),
            "-".to_string(),
        ]);

        // Output: encoded and muxed to the destination.
        args.extend([
            "-c:v".to_string(),
            self.encoder.codec.clone(),
            "-preset".to_string(),
            self.encoder.preset.clone(),
            "-b:v".to_string(),
            params.bitrate.to_string(),
            "-g".to_string(),
            params.gop_size.to_string(),
            "-f".to_string(),
            self.encoder.format.clone(),
            self.destination.to_string(),
        ]);

        args
    }
}

impl FrameSink for FfmpegSink {
    fn initialize(&mut self, params: &SinkParams) -> Result<(), SinkError> {
        let args = self.args(params);
        log::info!("starting {} {}", self.encoder.program, args.join(" "));

        let mut command = Command::new(&self.encoder.program);
        command
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        // A terminal interrupt goes to the whole foreground process group.
        // The encoder gets its own group so that it only stops once stdin
        // is closed by `finalize`.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command
            .spawn()
            .map_err(|source| SinkError::Spawn {
                program: self.encoder.program.clone(),
                source,
            })?;

        self.stdin = child.stdin.take();
        self.child = Some(child);
        self.params = Some(*params);
        Ok(())
    }

    fn submit(&mut self, frame: &Frame, _index: u64) -> Result<(), SinkError> {
        // ffmpeg derives timestamps from the input frame rate, so frame order
        // on the pipe is the presentation order.
        let params = self.params.as_ref().ok_or(SinkError::NotInitialized)?;
        if frame.byte_len() != params.frame_size() {
            return Err(SinkError::FrameSize {
                expected: params.frame_size(),
                actual: frame.byte_len(),
            });
        }

        let stdin = self.stdin.as_mut().ok_or(SinkError::NotInitialized)?;
        for plane in frame.planes() {
            stdin.write_all(plane)?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SinkError> {
        // Closing the pipe signals end of input.
        drop(self.stdin.take());

        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let status = child.wait()?;
        log::info!("encoder exited with {status}");
        if status.success() {
            Ok(())
        } else {
            Err(SinkError::EncoderExit { status })
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
