//! Event persistence orchestration.

pub mod service;

pub use service::{EventService, StoredIn};
