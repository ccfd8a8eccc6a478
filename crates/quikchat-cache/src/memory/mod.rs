//! In-process buffer and profile cache.

pub mod buffer;
pub mod profiles;

pub use buffer::MemoryEventBuffer;
pub use profiles::CachedUserDirectory;
