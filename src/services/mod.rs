//! Typed wrappers over the REST endpoints
//!
//! Everything goes through the authenticated `ApiClient` except login,
//! which uses the raw transport so bad credentials never trigger a refresh.

pub mod auth;
pub mod chat;
pub mod health;
pub mod notifications;
pub mod projects;

pub use auth::AuthService;
pub use chat::ChatApi;
pub use health::{CheckOutcome, ConnectionReport, HealthApi};
pub use notifications::NotificationApi;
pub use projects::ProjectApi;
