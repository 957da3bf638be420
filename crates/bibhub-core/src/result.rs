//! Convenience result type alias for bibhub.

use crate::error::AppError;

/// A specialized `Result` type for bibhub operations.
pub type AppResult<T> = Result<T, AppError>;
