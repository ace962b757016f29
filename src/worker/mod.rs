//! Service worker event contract
//!
//! Lifecycle, push display, click routing and subscription rotation,
//! against a `WorkerHost` that stands in for the worker global scope.

pub mod runner;

pub use runner::{WorkerHandle, WorkerRunner};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::errors::{PlatformError, WorkerError};
use crate::models::{PushSubscription, SubscriptionOptions};
use crate::push::PushBackend;

pub const DEFAULT_TITLE: &str = "Nova Mensagem";
pub const DEFAULT_BODY: &str = "Você recebeu uma nova mensagem";
pub const DEFAULT_ICON: &str = "/icon-192x192.png";
pub const DEFAULT_BADGE: &str = "/badge-72x72.png";
pub const DEFAULT_URL: &str = "/chat";
pub const VIBRATE_PATTERN: [u32; 3] = [200, 100, 200];

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Install,
    Activate,
    /// Raw payload text as delivered by the push service
    Push { payload: Option<String> },
    NotificationClick { notification: NotificationContent },
    PushSubscriptionChange { old_options: Option<SubscriptionOptions> },
}

impl WorkerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Push { .. } => "push",
            Self::NotificationClick { .. } => "notificationclick",
            Self::PushSubscriptionChange { .. } => "pushsubscriptionchange",
        }
    }
}

/// Everything passed to `showNotification`
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: Option<String>,
    pub data: Value,
    pub require_interaction: bool,
    pub vibrate: Vec<u32>,
}

impl NotificationContent {
    /// Defaults with the payload's top-level fields merged over them
    ///
    /// A payload that is missing, not JSON, or not an object leaves the
    /// defaults untouched.
    pub fn from_payload(payload: Option<&str>) -> Self {
        let mut fields = default_fields();

        if let Some(raw) = payload {
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(overrides)) => fields.extend(overrides),
                Ok(other) => warn!("Ignoring non-object push payload: {}", other),
                Err(e) => warn!("Error parsing notification payload: {}", e),
            }
        }

        let text = |key: &str, default: &str| {
            fields
                .get(key)
                .and_then(scalar_text)
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            title: text("title", DEFAULT_TITLE),
            body: text("body", DEFAULT_BODY),
            icon: text("icon", DEFAULT_ICON),
            badge: text("badge", DEFAULT_BADGE),
            tag: fields.get("tag").and_then(scalar_text),
            data: fields.get("data").cloned().unwrap_or(Value::Null),
            require_interaction: false,
            vibrate: VIBRATE_PATTERN.to_vec(),
        }
    }

    /// Where a click should take the user
    pub fn target_url(&self) -> &str {
        self.data
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_URL)
    }
}

/// Strings as-is, numbers and booleans in their JSON spelling
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn default_fields() -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("title".into(), json!(DEFAULT_TITLE));
    fields.insert("body".into(), json!(DEFAULT_BODY));
    fields.insert("icon".into(), json!(DEFAULT_ICON));
    fields.insert("badge".into(), json!(DEFAULT_BADGE));
    fields.insert("data".into(), json!({ "url": DEFAULT_URL }));
    fields
}

/// An open page controlled by the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
}

/// Worker global scope: clients, notifications and the push manager
#[async_trait]
pub trait WorkerHost: Send + Sync {
    async fn skip_waiting(&self);
    async fn claim_clients(&self);
    async fn show_notification(&self, notification: &NotificationContent) -> Result<(), PlatformError>;
    async fn close_notification(&self, notification: &NotificationContent);
    /// Window clients, uncontrolled ones included
    async fn window_clients(&self) -> Vec<WindowClient>;
    async fn focus(&self, client: &WindowClient) -> Result<(), PlatformError>;
    async fn open_window(&self, url: &str) -> Result<(), PlatformError>;
    async fn resubscribe(&self, options: &SubscriptionOptions) -> Result<PushSubscription, PlatformError>;
}

/// Where rotated subscriptions are reported
pub struct SubscriptionSync {
    pub backend: Arc<dyn PushBackend>,
    pub user_id: i64,
}

pub struct ServiceWorker {
    host: Arc<dyn WorkerHost>,
    sync: Option<SubscriptionSync>,
}

impl ServiceWorker {
    pub fn new(host: Arc<dyn WorkerHost>) -> Self {
        Self { host, sync: None }
    }

    pub fn with_sync(mut self, backend: Arc<dyn PushBackend>, user_id: i64) -> Self {
        self.sync = Some(SubscriptionSync { backend, user_id });
        self
    }

    pub async fn handle(&self, event: WorkerEvent) -> Result<(), WorkerError> {
        debug!("Worker event: {}", event.name());
        match event {
            WorkerEvent::Install => {
                info!("Service worker installing");
                self.host.skip_waiting().await;
            }
            WorkerEvent::Activate => {
                info!("Service worker activating");
                self.host.claim_clients().await;
            }
            WorkerEvent::Push { payload } => {
                let notification = NotificationContent::from_payload(payload.as_deref());
                self.host.show_notification(&notification).await?;
            }
            WorkerEvent::NotificationClick { notification } => {
                self.on_click(&notification).await?;
            }
            WorkerEvent::PushSubscriptionChange { old_options } => {
                self.on_subscription_change(old_options).await?;
            }
        }
        Ok(())
    }

    async fn on_click(&self, notification: &NotificationContent) -> Result<(), PlatformError> {
        self.host.close_notification(notification).await;

        let target = notification.target_url();
        let clients = self.host.window_clients().await;
        if let Some(client) = clients.iter().find(|c| c.url.contains(target)) {
            debug!("Focusing window {} for {}", client.id, target);
            return self.host.focus(client).await;
        }

        debug!("Opening new window for {}", target);
        self.host.open_window(target).await
    }

    async fn on_subscription_change(&self, old_options: Option<SubscriptionOptions>) -> Result<(), WorkerError> {
        let Some(options) = old_options else {
            warn!("Push subscription changed without previous options, cannot resubscribe");
            return Ok(());
        };

        let subscription = self.host.resubscribe(&options).await?;
        info!("Re-subscribed at {}", subscription.endpoint);

        if let Some(sync) = &self.sync {
            sync.backend
                .save_subscription(sync.user_id, &subscription)
                .await?;
        }
        Ok(())
    }
}
