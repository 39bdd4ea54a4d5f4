//! Schema module - Configuration types for Life Stream sessions.

mod config;
mod destination;

pub use config::*;
pub use destination::*;
