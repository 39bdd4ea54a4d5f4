//! Compute module - Simulation, rendering and pacing for Life Stream.

mod grid;
mod pacing;
mod render;
mod scheduler;
mod simulation;

pub use grid::*;
pub use pacing::{Clock, PaceOutcome, Pacer, SystemClock};
pub use render::*;
pub use scheduler::*;
pub use simulation::*;

#[cfg(test)]
pub(crate) use pacing::ManualClock;
