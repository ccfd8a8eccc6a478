//! Core type definitions used across the QuikChat workspace.

pub mod id;
pub mod recipient;
pub mod user;

pub use id::*;
pub use recipient::{GroupSummary, Recipient};
pub use user::{AuthenticatedUser, UserProfile};
