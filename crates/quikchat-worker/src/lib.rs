//! Background reconciliation for QuikChat.
//!
//! This crate provides:
//! - [`BufferSweep`], which moves buffered events into durable storage
//! - [`CronScheduler`], which runs the sweep on a cron schedule

pub mod jobs;
pub mod scheduler;

pub use jobs::{BufferSweep, SweepReport};
pub use scheduler::CronScheduler;
