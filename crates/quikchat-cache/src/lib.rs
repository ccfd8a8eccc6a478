//! # quikchat-cache
//!
//! Event buffer implementations for QuikChat. Two backends:
//!
//! - **memory**: in-process buffer on [dashmap](https://crates.io/crates/dashmap),
//!   plus a [moka](https://crates.io/crates/moka) profile cache
//! - **redis**: Redis sorted sets via the [redis](https://crates.io/crates/redis) crate
//!
//! The backend is selected at runtime based on configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::BufferManager;
