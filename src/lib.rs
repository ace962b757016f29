//! Engage client library
//!
//! Authenticated REST client with single-flight token refresh, typed
//! services for the WhatsApp engagement backend, and the web push
//! subscription manager with its service worker event contract.

pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod push;
pub mod services;
pub mod storage;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{build_api_client, ApiClient};
pub use config::{Config, ConfigManager};
pub use errors::{error_message, ApiError, AppError, PushError};
pub use push::{NotificationStatus, PushManager};
pub use worker::ServiceWorker;
