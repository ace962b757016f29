//! Centralized error handling module
//!
//! `AppError` covers configuration, storage and serialization failures,
//! `ApiError` is returned by the authenticated REST client, and `PushError`
//! is the taxonomy surfaced by the push subscription manager.

pub mod api;
pub mod context;
pub mod push;
pub mod types;

pub use api::{error_message, status_message, ApiError, ApiResult, ErrorMessages};
pub use context::{ErrorContext, ErrorContextExt};
pub use push::{PlatformError, PushError, PushResult, WorkerError};
pub use types::{AppError, AppResult};

/// Convert from anyhow::Error to AppError for the CLI boundary
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Other {
            message: err.to_string(),
            source: None,
        }
    }
}
