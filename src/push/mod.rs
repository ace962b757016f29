//! Web push subscription management
//!
//! `PushManager` drives the subscription lifecycle against two seams:
//! a `PushPlatform` (the browser's service worker, permission and push
//! APIs) and a `PushBackend` (the REST endpoints that store subscriptions).

pub mod manager;
pub mod memory;
pub mod platform;
pub mod vapid;

pub use manager::{NotificationStatus, PushManager};
pub use memory::InMemoryPlatform;
pub use platform::{is_secure_origin, Capabilities, PushPlatform, WorkerRegistration};
pub use vapid::{decode_base64url, pad_base64};

use async_trait::async_trait;

use crate::errors::ApiResult;
use crate::models::PushSubscription;

/// Server side of the subscription lifecycle
#[async_trait]
pub trait PushBackend: Send + Sync {
    async fn vapid_public_key(&self) -> ApiResult<String>;
    async fn save_subscription(&self, user_id: i64, subscription: &PushSubscription) -> ApiResult<()>;
    async fn remove_subscription(&self, endpoint: &str) -> ApiResult<()>;
    async fn send_test(&self) -> ApiResult<()>;
}
