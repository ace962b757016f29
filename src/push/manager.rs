use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

use super::platform::{is_secure_origin, PushPlatform, WorkerRegistration};
use super::vapid::decode_base64url;
use super::PushBackend;
use crate::config::PushConfig;
use crate::errors::{PushError, PushResult};
use crate::models::{Permission, PushSubscription, SubscriptionOptions};

/// Snapshot shown on the notification settings screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationStatus {
    pub supported: bool,
    pub permission: Permission,
    pub subscribed: bool,
}

/// Subscription lifecycle for one page
///
/// Construct once and share by `Arc`; the worker registration is cached
/// after the first successful `register_worker`.
pub struct PushManager {
    platform: Arc<dyn PushPlatform>,
    backend: Arc<dyn PushBackend>,
    worker_script: String,
    worker_scope: String,
    registration: Mutex<Option<WorkerRegistration>>,
}

impl PushManager {
    pub fn new(platform: Arc<dyn PushPlatform>, backend: Arc<dyn PushBackend>, config: &PushConfig) -> Self {
        Self {
            platform,
            backend,
            worker_script: config.worker_script.clone(),
            worker_scope: config.worker_scope.clone(),
            registration: Mutex::new(None),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.platform.capabilities().is_complete()
    }

    pub fn permission(&self) -> Permission {
        if !self.is_supported() {
            return Permission::Denied;
        }
        self.platform.permission()
    }

    pub async fn request_permission(&self) -> Permission {
        if !self.is_supported() {
            warn!("Notifications are not supported on this platform");
            return Permission::Denied;
        }
        let permission = self.platform.request_permission().await;
        info!("Notification permission: {}", permission);
        permission
    }

    pub fn registration(&self) -> Option<WorkerRegistration> {
        self.lock_registration().clone()
    }

    /// Register the service worker script; requires a secure origin
    pub async fn register_worker(&self) -> PushResult<WorkerRegistration> {
        if !self.is_supported() {
            return Err(PushError::Unsupported);
        }

        let origin = self.platform.origin();
        if !is_secure_origin(origin) {
            error!("Refusing to register service worker on insecure origin {}", origin);
            return Err(PushError::Registration(
                "Service Workers require HTTPS (or localhost for development)".to_string(),
            ));
        }

        let registration = self
            .platform
            .register_worker(&self.worker_script, &self.worker_scope)
            .await
            .map_err(|e| PushError::Registration(e.to_string()))?;

        info!(
            "Service worker {} registered at scope {}",
            registration.script, registration.scope
        );
        *self.lock_registration() = Some(registration.clone());
        Ok(registration)
    }

    /// Subscribe this page and store the subscription for `user_id`
    pub async fn subscribe(&self, user_id: i64) -> PushResult<PushSubscription> {
        if !self.is_supported() {
            return Err(PushError::Unsupported);
        }

        let permission = match self.permission() {
            Permission::Denied => Permission::Denied,
            Permission::Granted => Permission::Granted,
            Permission::Default => self.request_permission().await,
        };
        if permission != Permission::Granted {
            warn!("Notification permission not granted ({})", permission);
            return Err(PushError::PermissionDenied);
        }

        let registration = match self.registration() {
            Some(registration) => registration,
            None => self.register_worker().await?,
        };

        let key = self
            .backend
            .vapid_public_key()
            .await
            .map_err(|e| PushError::KeyFetch(e.to_string()))?;
        let application_server_key = decode_base64url(&key)
            .map_err(|e| PushError::KeyFetch(format!("invalid public key: {}", e)))?;

        let subscription = self
            .platform
            .subscribe(&registration, &SubscriptionOptions::user_visible(application_server_key))
            .await
            .map_err(|e| PushError::Subscription(e.to_string()))?;

        if let Err(e) = self.backend.save_subscription(user_id, &subscription).await {
            warn!("Saving subscription failed, rolling back: {}", e);
            if let Err(rollback) = self.platform.unsubscribe(&registration, &subscription).await {
                error!("Rollback of push subscription failed: {}", rollback);
            }
            return Err(PushError::ServerSync(e.to_string()));
        }

        info!("Subscribed to push notifications");
        Ok(subscription)
    }

    /// Best effort: failures are logged, never returned
    pub async fn unsubscribe(&self) {
        let Some(registration) = self.registration() else {
            warn!("No service worker registration found");
            return;
        };

        let subscription = match self.platform.subscription(&registration).await {
            Ok(Some(subscription)) => subscription,
            Ok(None) => {
                debug!("No active push subscription");
                return;
            }
            Err(e) => {
                error!("Error reading push subscription: {}", e);
                return;
            }
        };

        if let Err(e) = self.platform.unsubscribe(&registration, &subscription).await {
            error!("Error unsubscribing from push notifications: {}", e);
            return;
        }

        match self.backend.remove_subscription(&subscription.endpoint).await {
            Ok(()) => info!("Unsubscribed from push notifications"),
            Err(e) => error!("Failed to remove subscription on the server: {}", e),
        }
    }

    pub async fn subscription(&self) -> Option<PushSubscription> {
        let registration = self.registration()?;
        match self.platform.subscription(&registration).await {
            Ok(subscription) => subscription,
            Err(e) => {
                error!("Error getting subscription: {}", e);
                None
            }
        }
    }

    pub async fn is_subscribed(&self) -> bool {
        self.subscription().await.is_some()
    }

    pub async fn send_test_notification(&self) -> PushResult<()> {
        self.backend
            .send_test()
            .await
            .map_err(|e| PushError::ServerSync(e.to_string()))
    }

    /// Store a subscription the push service rotated
    pub async fn resync_subscription(&self, user_id: i64, subscription: &PushSubscription) -> PushResult<()> {
        self.backend
            .save_subscription(user_id, subscription)
            .await
            .map_err(|e| PushError::ServerSync(e.to_string()))?;
        debug!("Resynced subscription {}", subscription.endpoint);
        Ok(())
    }

    pub async fn status(&self) -> NotificationStatus {
        let supported = self.is_supported();
        let subscribed = supported && self.is_subscribed().await;
        NotificationStatus {
            supported,
            permission: self.permission(),
            subscribed,
        }
    }

    fn lock_registration(&self) -> std::sync::MutexGuard<'_, Option<WorkerRegistration>> {
        self.registration.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
