//! Redis event buffer.

pub mod buffer;
pub mod client;

pub use buffer::RedisEventBuffer;
pub use client::RedisClient;
