//! # quikchat-service
//!
//! Service layer between the delivery core and the two event stores.
//! [`EventService`] owns the write policy (buffer first, durable store as
//! fallback), the merged read of undelivered events, and acknowledgement.
//!
//! Services follow constructor injection: all dependencies are provided at
//! construction time via `Arc` references.

pub mod event;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use event::{EventService, StoredIn};
