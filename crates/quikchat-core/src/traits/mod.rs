//! Core traits defined in `quikchat-core` and implemented by other crates.
//!
//! The delivery core is written against these seams so the stores, the
//! directories, and the token verifier can be swapped (Postgres/Redis in
//! production, in-memory fakes in tests).

pub mod authenticator;
pub mod buffer;
pub mod directory;
pub mod event_store;

pub use authenticator::Authenticator;
pub use buffer::EventBuffer;
pub use directory::{GroupDirectory, UserDirectory};
pub use event_store::DurableEventStore;
