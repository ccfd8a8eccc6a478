//! Per-connection state and the read/write pumps.

pub mod frame;
pub mod handle;
pub mod heartbeat;
pub mod pump;

pub use frame::Frame;
pub use handle::{ClientHandle, EnqueueError};
pub use heartbeat::Heartbeat;
