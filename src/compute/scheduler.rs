//! Stream scheduler - drives the simulate/render/submit/pace cycle.
//!
//! One thread owns everything: the simulation, the frame buffer and the
//! sink. Each cycle for frame `i`:
//!
//! 1. every `generation_duration` frames (except frame 0) advance the board,
//! 2. on the same frames re-render the board into the frame buffer,
//! 3. submit the frame with presentation index `i`,
//! 4. sleep until the next deadline of the fixed frame schedule,
//! 5. every `progress_interval` frames report progress.
//!
//! Cancellation is polled once per cycle boundary, so a stop request
//! takes effect within roughly one frame period.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{Clock, Frame, PaceOutcome, Pacer, Renderer, Simulation, SystemClock};
use crate::schema::{ConfigError, StreamConfig};
use crate::sink::{FrameSink, SinkError, SinkParams};

/// Lifecycle of a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Not started yet.
    Idle,
    /// Emitting paced frames.
    Running,
    /// Stop requested; finalizing the sink.
    Draining,
    /// Terminal.
    Stopped,
}

/// Why a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The cancel handle was set.
    Cancelled,
    /// `max_frames` frames were emitted.
    FrameLimit,
}

/// Liveness report passed to the progress callback.
#[derive(Debug, Clone)]
pub struct StreamProgress {
    /// Presentation index of the frame just emitted.
    pub frame: u64,
    /// Generation on screen.
    pub generation: u64,
    /// Live cells in that generation.
    pub population: usize,
    /// How far behind schedule the loop currently is.
    pub lag: Duration,
    /// Frames so far that missed their deadline.
    pub overruns: u64,
}

/// Progress callback type.
pub type ProgressCallback = Box<dyn FnMut(&StreamProgress)>;

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct StreamSummary {
    /// Frames accepted by the sink.
    pub frames: u64,
    /// Generations computed, including pre-generation.
    pub generations: u64,
    /// Frames that missed their deadline.
    pub overruns: u64,
    pub reason: StopReason,
}

impl std::fmt::Display for StreamSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames, {} generations, {} late frames ({:?})",
            self.frames, self.generations, self.overruns, self.reason
        )
    }
}

/// Scheduler errors. All of them end the session.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Sink initialization failed: {0}")]
    SinkInit(#[source] SinkError),

    #[error("Submitting frame {index} failed: {source}")]
    Submit {
        index: u64,
        #[source]
        source: SinkError,
    },

    #[error("Finalizing sink failed: {0}")]
    Finalize(#[source] SinkError),

    #[error("Scheduler has already run")]
    AlreadyStarted,
}

/// Paced frame producer feeding a [`FrameSink`].
pub struct StreamScheduler<S: FrameSink, C: Clock = SystemClock> {
    config: StreamConfig,
    sink: S,
    simulation: Simulation,
    renderer: Renderer,
    frame: Frame,
    pacer: Pacer<C>,
    state: SchedulerState,
    frames_emitted: u64,
    overruns: u64,
    cancelled: Arc<AtomicBool>,
    progress: Option<ProgressCallback>,
}

impl<S: FrameSink> StreamScheduler<S> {
    /// Create a scheduler paced by the wall clock.
    pub fn new(config: StreamConfig, sink: S) -> Result<Self, StreamError> {
        Self::with_clock(config, sink, SystemClock)
    }
}

impl<S: FrameSink, C: Clock> StreamScheduler<S, C> {
    /// Create a scheduler paced by `clock`.
    pub fn with_clock(config: StreamConfig, sink: S, clock: C) -> Result<Self, StreamError> {
        config.validate()?;

        let simulation = Simulation::new(&config);
        let renderer = Renderer::new(config.cell_size);
        let frame = Frame::new(config.width, config.height);
        let pacer = Pacer::new(clock, config.frame_rate);

        Ok(Self {
            config,
            sink,
            simulation,
            renderer,
            frame,
            pacer,
            state: SchedulerState::Idle,
            frames_emitted: 0,
            overruns: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
            progress: None,
        })
    }

    /// Replace the simulation (e.g. to start from a known pattern).
    pub fn with_simulation(mut self, simulation: Simulation) -> Self {
        assert_eq!(
            (simulation.current().width(), simulation.current().height()),
            (self.config.grid_width(), self.config.grid_height()),
            "simulation does not match the configured grid"
        );
        self.simulation = simulation;
        self
    }

    /// Set the progress callback.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Get cancellation handle. Storing `true` stops the run at the next cycle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the scheduler, returning the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Frames accepted by the sink so far.
    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    /// Run the session until cancelled, `max_frames` is reached, or the sink fails.
    pub fn run(&mut self) -> Result<StreamSummary, StreamError> {
        if self.state != SchedulerState::Idle {
            return Err(StreamError::AlreadyStarted);
        }

        let params = SinkParams::from_config(&self.config);
        if let Err(e) = self.sink.initialize(&params) {
            self.state = SchedulerState::Stopped;
            return Err(StreamError::SinkInit(e));
        }

        if self.config.pregenerate && self.config.pregenerate_steps > 0 {
            log::debug!("pre-generating {} steps", self.config.pregenerate_steps);
            self.simulation.run(self.config.pregenerate_steps);
        }

        self.state = SchedulerState::Running;
        self.pacer.restart();
        log::info!(
            "streaming {}x{} at {} fps ({}x{} cells)",
            self.config.width,
            self.config.height,
            self.config.frame_rate,
            self.config.grid_width(),
            self.config.grid_height()
        );

        let reason = loop {
            if self.cancelled.load(Ordering::Relaxed) {
                break StopReason::Cancelled;
            }
            if self.config.max_frames > 0 && self.frames_emitted >= self.config.max_frames {
                break StopReason::FrameLimit;
            }

            let index = self.frames_emitted;
            if let Err(source) = self.cycle(index) {
                log::error!("frame {index} rejected by sink: {source}");
                self.state = SchedulerState::Draining;
                if let Err(e) = self.sink.finalize() {
                    log::warn!("best-effort finalize failed: {e}");
                }
                self.state = SchedulerState::Stopped;
                return Err(StreamError::Submit { index, source });
            }
        };

        self.state = SchedulerState::Draining;
        log::info!("draining after {} frames ({reason:?})", self.frames_emitted);
        let finalized = self.sink.finalize();
        self.state = SchedulerState::Stopped;
        finalized.map_err(StreamError::Finalize)?;

        Ok(StreamSummary {
            frames: self.frames_emitted,
            generations: self.simulation.generation(),
            overruns: self.overruns,
            reason,
        })
    }

    /// One generate/render/submit/pace cycle for presentation index `index`.
    fn cycle(&mut self, index: u64) -> Result<(), SinkError> {
        let generation_duration = self.config.generation_duration as u64;
        if index % generation_duration == 0 {
            if index != 0 {
                self.simulation.step();
            }
            self.renderer.render(self.simulation.current(), &mut self.frame);
        }

        self.sink.submit(&self.frame, index)?;
        self.frames_emitted += 1;

        if let PaceOutcome::Overrun(late) = self.pacer.wait() {
            self.overruns += 1;
            if late > self.config.frame_period() {
                log::warn!("frame {index} finished {late:?} after its deadline");
            }
        }

        let interval = self.config.effective_progress_interval();
        if index != 0 && index % interval == 0 {
            if let Some(callback) = self.progress.as_mut() {
                let current = self.simulation.current();
                callback(&StreamProgress {
                    frame: index,
                    generation: self.simulation.generation(),
                    population: current.population(),
                    lag: self.pacer.lag(),
                    overruns: self.overruns,
                });
            }
        }

        Ok(())
    }
}
