//! Browser push capabilities behind a trait

use async_trait::async_trait;
use url::Url;

use crate::errors::PlatformError;
use crate::models::{Permission, PushSubscription, SubscriptionOptions};

/// Which of the three browser features the page can use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub service_worker: bool,
    pub push_manager: bool,
    pub notifications: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            service_worker: true,
            push_manager: true,
            notifications: true,
        }
    }

    pub fn none() -> Self {
        Self {
            service_worker: false,
            push_manager: false,
            notifications: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.service_worker && self.push_manager && self.notifications
    }
}

/// Handle to a registered service worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRegistration {
    pub script: String,
    pub scope: String,
}

#[async_trait]
pub trait PushPlatform: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    /// Origin the page is served from
    fn origin(&self) -> &Url;

    fn permission(&self) -> Permission;

    /// Show the permission prompt and return the user's answer
    async fn request_permission(&self) -> Permission;

    async fn register_worker(&self, script: &str, scope: &str) -> Result<WorkerRegistration, PlatformError>;

    async fn subscribe(
        &self,
        registration: &WorkerRegistration,
        options: &SubscriptionOptions,
    ) -> Result<PushSubscription, PlatformError>;

    async fn subscription(
        &self,
        registration: &WorkerRegistration,
    ) -> Result<Option<PushSubscription>, PlatformError>;

    async fn unsubscribe(
        &self,
        registration: &WorkerRegistration,
        subscription: &PushSubscription,
    ) -> Result<(), PlatformError>;
}

/// Service workers only run on https or on a loopback host
pub fn is_secure_origin(origin: &Url) -> bool {
    if origin.scheme() == "https" {
        return true;
    }
    matches!(
        origin.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]")
    )
}
