//! # quikchat-core
//!
//! Core crate for QuikChat. Contains configuration schemas, typed
//! identifiers, the real-time event model, the collaborator traits the
//! delivery core is written against, and the unified error system.
//!
//! This crate has **no** internal dependencies on other QuikChat crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
