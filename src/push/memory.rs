//! In-process push platform
//!
//! Behaves like a browser with a scripted user: the permission prompt
//! answers with a preset value, subscriptions get sequential endpoints.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use url::Url;

use super::platform::{Capabilities, PushPlatform, WorkerRegistration};
use crate::config::PushConfig;
use crate::errors::{AppResult, PlatformError};
use crate::models::{Permission, PushSubscription, SubscriptionKeys, SubscriptionOptions};

#[derive(Debug)]
struct PlatformState {
    permission: Permission,
    prompt_answer: Permission,
    registration: Option<WorkerRegistration>,
    subscription: Option<(PushSubscription, SubscriptionOptions)>,
    fail_subscribe: Option<String>,
    fail_unsubscribe: Option<String>,
}

#[derive(Debug)]
pub struct InMemoryPlatform {
    origin: Url,
    capabilities: Capabilities,
    state: Mutex<PlatformState>,
    prompts: AtomicUsize,
    subscribe_calls: AtomicUsize,
    issued: AtomicUsize,
}

impl InMemoryPlatform {
    /// Fully capable platform whose prompt grants permission
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            capabilities: Capabilities::all(),
            state: Mutex::new(PlatformState {
                permission: Permission::Default,
                prompt_answer: Permission::Granted,
                registration: None,
                subscription: None,
                fail_subscribe: None,
                fail_unsubscribe: None,
            }),
            prompts: AtomicUsize::new(0),
            subscribe_calls: AtomicUsize::new(0),
            issued: AtomicUsize::new(0),
        }
    }

    /// Platform served from the configured `push.origin`
    pub fn from_config(config: &PushConfig) -> AppResult<Self> {
        Ok(Self::new(config.origin_url()?))
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_permission(self, permission: Permission) -> Self {
        self.lock().permission = permission;
        self
    }

    pub fn with_prompt_answer(self, answer: Permission) -> Self {
        self.lock().prompt_answer = answer;
        self
    }

    pub fn fail_subscribe(&self, message: &str) {
        self.lock().fail_subscribe = Some(message.to_string());
    }

    pub fn fail_unsubscribe(&self, message: &str) {
        self.lock().fail_unsubscribe = Some(message.to_string());
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> Option<PushSubscription> {
        self.lock().subscription.as_ref().map(|(s, _)| s.clone())
    }

    /// Options the live subscription was created with
    pub fn current_options(&self) -> Option<SubscriptionOptions> {
        self.lock().subscription.as_ref().map(|(_, o)| o.clone())
    }

    /// Drop the live subscription as if the push service expired it
    pub fn expire_subscription(&self) -> Option<(PushSubscription, SubscriptionOptions)> {
        self.lock().subscription.take()
    }

    /// Issue a fresh subscription, replacing any live one
    pub fn issue(&self, options: &SubscriptionOptions) -> PushSubscription {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let subscription = PushSubscription {
            endpoint: format!("https://push.example.net/send/{}", n),
            expiration_time: None,
            keys: SubscriptionKeys {
                p256dh: format!("p256dh-{}", n),
                auth: format!("auth-{}", n),
            },
        };
        self.lock().subscription = Some((subscription.clone(), options.clone()));
        subscription
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PushPlatform for InMemoryPlatform {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn origin(&self) -> &Url {
        &self.origin
    }

    fn permission(&self) -> Permission {
        self.lock().permission
    }

    async fn request_permission(&self) -> Permission {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        // Browsers only prompt while undecided
        if state.permission == Permission::Default {
            state.permission = state.prompt_answer;
        }
        state.permission
    }

    async fn register_worker(&self, script: &str, scope: &str) -> Result<WorkerRegistration, PlatformError> {
        let registration = WorkerRegistration {
            script: script.to_string(),
            scope: scope.to_string(),
        };
        self.lock().registration = Some(registration.clone());
        Ok(registration)
    }

    async fn subscribe(
        &self,
        _registration: &WorkerRegistration,
        options: &SubscriptionOptions,
    ) -> Result<PushSubscription, PlatformError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.lock().fail_subscribe.clone() {
            return Err(PlatformError(message));
        }
        if self.lock().permission != Permission::Granted {
            return Err(PlatformError::new("permission not granted"));
        }
        Ok(self.issue(options))
    }

    async fn subscription(
        &self,
        _registration: &WorkerRegistration,
    ) -> Result<Option<PushSubscription>, PlatformError> {
        Ok(self.current())
    }

    async fn unsubscribe(
        &self,
        _registration: &WorkerRegistration,
        subscription: &PushSubscription,
    ) -> Result<(), PlatformError> {
        let mut state = self.lock();
        if let Some(message) = state.fail_unsubscribe.clone() {
            return Err(PlatformError(message));
        }
        if matches!(&state.subscription, Some((live, _)) if live.endpoint == subscription.endpoint) {
            state.subscription = None;
        }
        Ok(())
    }
}
