use thiserror::Error;

/// Failures surfaced by the push subscription manager
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PushError {
    #[error("Push notifications are not supported in this browser")]
    Unsupported,

    #[error("Notification permission not granted")]
    PermissionDenied,

    #[error("Service Worker registration failed: {0}")]
    Registration(String),

    #[error("Failed to fetch VAPID key: {0}")]
    KeyFetch(String),

    #[error("Failed to subscribe: {0}")]
    Subscription(String),

    #[error("Failed to save subscription: {0}")]
    ServerSync(String),
}

pub type PushResult<T> = Result<T, PushError>;

/// Opaque failure reported by the browser push platform
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PlatformError(pub String);

impl PlatformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Failures while the service worker handles an event
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker platform call failed: {0}")]
    Platform(#[from] PlatformError),

    #[error("Failed to sync rotated subscription: {0}")]
    Sync(#[from] crate::errors::ApiError),
}

impl PushError {
    /// Terminal until the user changes browser settings or switches browser
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Unsupported | Self::PermissionDenied)
    }
}
