//! Built-in scheduled jobs.

pub mod sweep;

pub use sweep::{BufferSweep, SweepReport};
