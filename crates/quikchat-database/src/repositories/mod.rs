//! Repository implementations of the core storage and directory traits.

pub mod directory;
pub mod event;

pub use directory::{PgGroupDirectory, PgUserDirectory};
pub use event::PgEventStore;
