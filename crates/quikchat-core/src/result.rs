//! Convenience result type alias for QuikChat.

use crate::error::AppError;

/// A specialized `Result` type for QuikChat operations.
pub type AppResult<T> = Result<T, AppError>;
