//! Fakes shared by unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use crate::client::{ApiRequest, ApiResponse, HttpTransport, LoginRedirect, TokenRefresher};
use crate::errors::{ApiError, ApiResult};
use crate::models::AuthResponse;

type Handler = Box<dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync>;

/// Transport answering from a closure and recording what it was sent
pub struct ScriptedTransport {
    handler: Handler,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(handler: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;
        Ok((self.handler)(request))
    }
}

/// Refresher that can hold the exchange open until the test releases it
pub struct GatedRefresher {
    outcome: Result<AuthResponse, String>,
    gate: Notify,
    gated: bool,
    calls: AtomicUsize,
    last_token: Mutex<Option<String>>,
}

impl GatedRefresher {
    pub fn open(outcome: Result<AuthResponse, String>) -> Arc<Self> {
        Self::build(outcome, false)
    }

    pub fn closed(outcome: Result<AuthResponse, String>) -> Arc<Self> {
        Self::build(outcome, true)
    }

    fn build(outcome: Result<AuthResponse, String>, gated: bool) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            gate: Notify::new(),
            gated,
            calls: AtomicUsize::new(0),
            last_token: Mutex::new(None),
        })
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_token(&self) -> Option<String> {
        self.last_token.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenRefresher for GatedRefresher {
    async fn refresh(&self, refresh_token: &str) -> ApiResult<AuthResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_token.lock().unwrap() = Some(refresh_token.to_string());
        if self.gated {
            self.gate.notified().await;
        }
        self.outcome.clone().map_err(ApiError::RefreshFailed)
    }
}

#[derive(Default)]
pub struct RecordingRedirect {
    paths: Mutex<Vec<String>>,
}

impl RecordingRedirect {
    pub fn count(&self) -> usize {
        self.paths.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<String> {
        self.paths.lock().unwrap().last().cloned()
    }
}

impl LoginRedirect for RecordingRedirect {
    fn redirect_to_login(&self, login_path: &str) {
        self.paths.lock().unwrap().push(login_path.to_string());
    }
}

/// Poll `condition` while letting spawned tasks run
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached in time");
}

/// Client wired like production but over a scripted transport
pub fn client_over(
    transport: Arc<ScriptedTransport>,
) -> (Arc<crate::client::ApiClient>, Arc<crate::storage::MemoryStore>) {
    let store = Arc::new(crate::storage::MemoryStore::new());
    let refresher = Arc::new(crate::client::HttpTokenRefresher::new(transport.clone()));
    let client = Arc::new(crate::client::ApiClient::new(
        transport,
        store.clone(),
        refresher,
        Arc::new(crate::client::LogRedirect),
    ));
    (client, store)
}

/// Push backend recording what the manager stored
#[derive(Default)]
pub struct RecordingBackend {
    key: Option<String>,
    fail_save: bool,
    key_fetches: AtomicUsize,
    tests_sent: AtomicUsize,
    saved: Mutex<Vec<(i64, String)>>,
    removed: Mutex<Vec<String>>,
}

impl RecordingBackend {
    pub fn with_key(key: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            ..Default::default()
        }
    }

    pub fn failing_key() -> Self {
        Self::default()
    }

    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    pub fn saved(&self) -> Vec<(i64, String)> {
        self.saved.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    pub fn key_fetches(&self) -> usize {
        self.key_fetches.load(Ordering::SeqCst)
    }

    pub fn tests_sent(&self) -> usize {
        self.tests_sent.load(Ordering::SeqCst)
    }

    fn server_error() -> ApiError {
        ApiError::Status {
            status: 500,
            message: "Internal Server Error".to_string(),
            body: None,
        }
    }
}

#[async_trait]
impl crate::push::PushBackend for RecordingBackend {
    async fn vapid_public_key(&self) -> ApiResult<String> {
        self.key_fetches.fetch_add(1, Ordering::SeqCst);
        self.key.clone().ok_or_else(Self::server_error)
    }

    async fn save_subscription(
        &self,
        user_id: i64,
        subscription: &crate::models::PushSubscription,
    ) -> ApiResult<()> {
        if self.fail_save {
            return Err(Self::server_error());
        }
        self.saved
            .lock()
            .unwrap()
            .push((user_id, subscription.endpoint.clone()));
        Ok(())
    }

    async fn remove_subscription(&self, endpoint: &str) -> ApiResult<()> {
        self.removed.lock().unwrap().push(endpoint.to_string());
        Ok(())
    }

    async fn send_test(&self) -> ApiResult<()> {
        if self.fail_save {
            return Err(Self::server_error());
        }
        self.tests_sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Worker scope that records every call
#[derive(Default)]
pub struct RecordingHost {
    windows: Vec<crate::worker::WindowClient>,
    fail_show: Mutex<Option<String>>,
    calls: Mutex<Vec<&'static str>>,
    shown: Mutex<Vec<crate::worker::NotificationContent>>,
    focused: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
    resubscribed: Mutex<Vec<crate::models::SubscriptionOptions>>,
}

impl RecordingHost {
    pub fn with_windows(windows: &[(&str, &str)]) -> Self {
        Self {
            windows: windows
                .iter()
                .map(|(id, url)| crate::worker::WindowClient {
                    id: id.to_string(),
                    url: url.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn fail_show(&self, message: &str) {
        *self.fail_show.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn shown(&self) -> Vec<crate::worker::NotificationContent> {
        self.shown.lock().unwrap().clone()
    }

    pub fn focused(&self) -> Vec<String> {
        self.focused.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn resubscribed_with(&self) -> Vec<crate::models::SubscriptionOptions> {
        self.resubscribed.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl crate::worker::WorkerHost for RecordingHost {
    async fn skip_waiting(&self) {
        self.record("skip_waiting");
    }

    async fn claim_clients(&self) {
        self.record("claim_clients");
    }

    async fn show_notification(
        &self,
        notification: &crate::worker::NotificationContent,
    ) -> Result<(), crate::errors::PlatformError> {
        self.record("show_notification");
        if let Some(message) = self.fail_show.lock().unwrap().clone() {
            return Err(crate::errors::PlatformError(message));
        }
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }

    async fn close_notification(&self, _notification: &crate::worker::NotificationContent) {
        self.record("close_notification");
    }

    async fn window_clients(&self) -> Vec<crate::worker::WindowClient> {
        self.record("window_clients");
        self.windows.clone()
    }

    async fn focus(&self, client: &crate::worker::WindowClient) -> Result<(), crate::errors::PlatformError> {
        self.record("focus");
        self.focused.lock().unwrap().push(client.id.clone());
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<(), crate::errors::PlatformError> {
        self.record("open_window");
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn resubscribe(
        &self,
        options: &crate::models::SubscriptionOptions,
    ) -> Result<crate::models::PushSubscription, crate::errors::PlatformError> {
        self.record("resubscribe");
        self.resubscribed.lock().unwrap().push(options.clone());
        Ok(crate::models::PushSubscription {
            endpoint: "https://push.example.net/send/rotated".to_string(),
            expiration_time: None,
            keys: crate::models::SubscriptionKeys {
                p256dh: "p".to_string(),
                auth: "a".to_string(),
            },
        })
    }
}
