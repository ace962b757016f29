//! Authenticated API client
//!
//! Every request is decorated with the stored bearer token at dispatch time.
//! A 401 triggers a single-flight refresh: the first caller leads the
//! exchange, callers hitting 401 meanwhile park on a one-shot channel, and
//! everybody replays once the outcome is known. A failed refresh (or any
//! 403) clears the session and sends the user back to the login page.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::mem;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::refresh::TokenRefresher;
use super::transport::{ApiRequest, ApiResponse, HttpTransport};
use crate::errors::{ApiError, ApiResult};
use crate::storage::{CredentialStore, SessionStoreExt, AUTH_TOKEN_KEY};

/// Entry point the user is sent to when the session cannot be recovered
pub const LOGIN_PATH: &str = "/auth/login";

/// Receives the "go back to login" signal
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self, login_path: &str);
}

/// Redirect for headless use: logs and lets the caller surface the error
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect_to_login(&self, login_path: &str) {
        warn!("Session ended, sign in again via {}", login_path);
    }
}

type RefreshOutcome = Result<(), String>;

enum RefreshState {
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

enum RefreshTicket {
    Leader,
    Follower(oneshot::Receiver<RefreshOutcome>),
}

pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    redirect: Arc<dyn LoginRedirect>,
    refresh_state: Mutex<RefreshState>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Self {
        Self {
            transport,
            store,
            refresher,
            redirect,
            refresh_state: Mutex::new(RefreshState::Idle),
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Undecorated transport, for endpoints that must not trigger a refresh
    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    pub fn set_token(&self, token: &str) -> ApiResult<()> {
        self.store.set(AUTH_TOKEN_KEY, token)?;
        Ok(())
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock_state(), RefreshState::Refreshing { .. })
    }

    /// Requests parked behind the refresh in flight
    pub fn queued_requests(&self) -> usize {
        match &*self.lock_state() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => waiters.len(),
        }
    }

    /// Send a request, recovering from an expired access token once
    pub async fn execute(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let (response, sent_token) = self.dispatch(&request).await?;

        if response.status == 401 {
            return self.recover_unauthorized(&request, sent_token).await;
        }

        self.check_status(&request, response)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.fetch(ApiRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(ApiRequest::put(path).json(body)?).await
    }

    /// Execute and decode the JSON body
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let path = request.path.clone();
        let response = self.execute(request).await?;
        response.decode(&path)
    }

    /// Execute and discard the body
    pub async fn send(&self, request: ApiRequest) -> ApiResult<()> {
        self.execute(request).await.map(|_| ())
    }

    async fn dispatch(&self, request: &ApiRequest) -> ApiResult<(ApiResponse, Option<String>)> {
        let token = self.store.access_token();
        let mut outbound = request.clone();
        outbound.set_bearer(token.as_deref());

        let response = self.transport.send(&outbound).await?;
        debug!("{} -> {}", request.describe(), response.status);
        Ok((response, token))
    }

    /// Second and final attempt; a repeated 401 is not refreshed again
    async fn replay(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let (response, _) = self.dispatch(request).await?;
        self.check_status(request, response)
    }

    fn check_status(&self, request: &ApiRequest, response: ApiResponse) -> ApiResult<ApiResponse> {
        if response.status == 403 {
            warn!("{} forbidden, ending session", request.describe());
            self.handle_auth_failure();
        }
        response.error_for_status(&request.path)
    }

    async fn recover_unauthorized(
        &self,
        request: &ApiRequest,
        sent_token: Option<String>,
    ) -> ApiResult<ApiResponse> {
        // Token already rotated by a refresh that finished after we dispatched
        let current = self.store.access_token();
        if current.is_some() && current != sent_token {
            debug!("{} used a stale token, replaying", request.describe());
            return self.replay(request).await;
        }

        match self.join_refresh() {
            RefreshTicket::Follower(outcome) => match outcome.await {
                Ok(Ok(())) => self.replay(request).await,
                Ok(Err(reason)) => Err(ApiError::RefreshFailed(reason)),
                Err(_) => Err(ApiError::RefreshFailed("refresh was abandoned".to_string())),
            },
            RefreshTicket::Leader => {
                let guard = scopeguard::guard(self, |client| client.abandon_refresh());
                let outcome = self.refresh_session().await;
                scopeguard::ScopeGuard::into_inner(guard);

                let waiters = self.finish_refresh();
                debug!("Refresh finished, releasing {} queued request(s)", waiters.len());
                for waiter in waiters {
                    let _ = waiter.send(outcome.clone());
                }

                match outcome {
                    Ok(()) => self.replay(request).await,
                    Err(reason) => {
                        warn!("Token refresh failed: {}", reason);
                        self.handle_auth_failure();
                        Err(ApiError::RefreshFailed(reason))
                    }
                }
            }
        }
    }

    fn join_refresh(&self) -> RefreshTicket {
        let mut state = self.lock_state();
        if let RefreshState::Refreshing { waiters } = &mut *state {
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            return RefreshTicket::Follower(rx);
        }

        *state = RefreshState::Refreshing {
            waiters: Vec::new(),
        };
        RefreshTicket::Leader
    }

    async fn refresh_session(&self) -> RefreshOutcome {
        let refresh_token = self
            .store
            .refresh_token()
            .ok_or_else(|| "no refresh token stored".to_string())?;

        let auth = self
            .refresher
            .refresh(&refresh_token)
            .await
            .map_err(|e| e.to_string())?;

        self.store
            .save_session(&auth.token, &auth.refresh_token, auth.user.as_ref())
            .map_err(|e| e.to_string())?;

        info!("Access token refreshed");
        Ok(())
    }

    /// Back to `Idle`, handing the parked waiters to the caller
    fn finish_refresh(&self) -> Vec<oneshot::Sender<RefreshOutcome>> {
        let mut state = self.lock_state();
        match mem::replace(&mut *state, RefreshState::Idle) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        }
    }

    /// Leader future dropped mid-refresh; dropping the senders fails the waiters
    fn abandon_refresh(&self) {
        let waiters = self.finish_refresh();
        warn!("Token refresh abandoned with {} queued request(s)", waiters.len());
    }

    fn handle_auth_failure(&self) {
        if let Err(e) = self.store.clear_session() {
            warn!("Failed to clear stored credentials: {}", e);
        }
        self.redirect.redirect_to_login(LOGIN_PATH);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RefreshState> {
        self.refresh_state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::Method;
    use crate::models::AuthResponse;
    use crate::storage::{MemoryStore, SESSION_KEYS};
    use crate::test_support::{wait_until, GatedRefresher, RecordingRedirect, ScriptedTransport};

    fn ok_for(token: &'static str) -> impl Fn(&ApiRequest) -> ApiResponse + Send + Sync {
        move |req: &ApiRequest| {
            if req.bearer() == Some(token) {
                ApiResponse::new(200, r#"{"ok":true}"#)
            } else {
                ApiResponse::new(401, r#"{"message":"expired"}"#)
            }
        }
    }

    fn new_pair() -> AuthResponse {
        AuthResponse {
            token: "T2".into(),
            refresh_token: "R2".into(),
            user: None,
        }
    }

    fn client_with(
        transport: Arc<ScriptedTransport>,
        refresher: Arc<GatedRefresher>,
    ) -> (Arc<ApiClient>, Arc<MemoryStore>, Arc<RecordingRedirect>) {
        let store = Arc::new(MemoryStore::new());
        store.save_session("T1", "R1", None).unwrap();
        let redirect = Arc::new(RecordingRedirect::default());
        let client = Arc::new(ApiClient::new(
            transport,
            store.clone(),
            refresher,
            redirect.clone(),
        ));
        (client, store, redirect)
    }

    #[tokio::test]
    async fn test_bearer_attached_when_token_present() {
        let transport = ScriptedTransport::new(ok_for("T1"));
        let (client, _, _) = client_with(transport.clone(), GatedRefresher::open(Ok(new_pair())));

        client.send(ApiRequest::get("/conversations")).await.unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].header("authorization"), Some("Bearer T1"));
    }

    #[tokio::test]
    async fn test_no_header_without_token() {
        let transport = ScriptedTransport::new(|req| {
            assert!(req.header("Authorization").is_none());
            ApiResponse::new(200, "{}")
        });
        let store = Arc::new(MemoryStore::new());
        let client = ApiClient::new(
            transport.clone(),
            store,
            GatedRefresher::open(Ok(new_pair())),
            Arc::new(LogRedirect),
        );

        client.send(ApiRequest::post("/auth/login")).await.unwrap();
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_then_replay_with_new_token() {
        let transport = ScriptedTransport::new(ok_for("T2"));
        let refresher = GatedRefresher::open(Ok(new_pair()));
        let (client, store, redirect) = client_with(transport.clone(), refresher.clone());

        let body = ApiRequest::post("/conversations/c1/messages")
            .json(&serde_json::json!({ "text": "oi" }))
            .unwrap()
            .with_header("X-Trace", "abc");
        let response = client.execute(body).await.unwrap();
        assert_eq!(response.status, 200);

        assert_eq!(refresher.calls(), 1);
        assert_eq!(refresher.last_token().as_deref(), Some("R1"));
        assert_eq!(store.access_token().as_deref(), Some("T2"));
        assert_eq!(store.refresh_token().as_deref(), Some("R2"));
        assert_eq!(redirect.count(), 0);

        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        let replay = &sent[1];
        assert_eq!(replay.method, Method::Post);
        assert_eq!(replay.path, "/conversations/c1/messages");
        assert_eq!(replay.body, sent[0].body);
        assert_eq!(replay.header("X-Trace"), Some("abc"));
        assert_eq!(replay.bearer(), Some("T2"));
        assert!(!client.is_refreshing());
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let transport = ScriptedTransport::new(ok_for("T2"));
        let refresher = GatedRefresher::closed(Ok(new_pair()));
        let (client, store, _) = client_with(transport.clone(), refresher.clone());

        let first = tokio::spawn({
            let client = client.clone();
            async move { client.execute(ApiRequest::get("/conversations")).await }
        });
        let second = tokio::spawn({
            let client = client.clone();
            async move { client.execute(ApiRequest::get("/projects")).await }
        });

        wait_until(|| refresher.calls() == 1 && client.queued_requests() == 1).await;
        refresher.release();

        assert_eq!(first.await.unwrap().unwrap().status, 200);
        assert_eq!(second.await.unwrap().unwrap().status, 200);

        assert_eq!(refresher.calls(), 1);
        assert_eq!(store.access_token().as_deref(), Some("T2"));

        let replays: Vec<_> = transport
            .requests()
            .into_iter()
            .filter(|r| r.bearer() == Some("T2"))
            .map(|r| r.path)
            .collect();
        assert_eq!(replays.len(), 2);
        assert!(replays.contains(&"/conversations".to_string()));
        assert!(replays.contains(&"/projects".to_string()));
        assert_eq!(client.queued_requests(), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_rejects_queue_and_clears_session() {
        let transport = ScriptedTransport::new(ok_for("never"));
        let refresher = GatedRefresher::closed(Err("refresh token revoked".to_string()));
        let (client, store, redirect) = client_with(transport.clone(), refresher.clone());

        let first = tokio::spawn({
            let client = client.clone();
            async move { client.execute(ApiRequest::get("/conversations")).await }
        });
        let second = tokio::spawn({
            let client = client.clone();
            async move { client.execute(ApiRequest::get("/projects")).await }
        });

        wait_until(|| refresher.calls() == 1 && client.queued_requests() == 1).await;
        refresher.release();

        let first = first.await.unwrap().unwrap_err();
        let second = second.await.unwrap().unwrap_err();
        assert!(matches!(first, ApiError::RefreshFailed(_)));
        assert!(matches!(second, ApiError::RefreshFailed(_)));

        for key in SESSION_KEYS {
            assert!(store.get(key).is_none(), "{} should be cleared", key);
        }
        assert_eq!(redirect.count(), 1);
        assert_eq!(redirect.last().as_deref(), Some(LOGIN_PATH));
        // Neither request was replayed
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_is_a_refresh_failure() {
        let transport = ScriptedTransport::new(ok_for("T2"));
        let refresher = GatedRefresher::open(Ok(new_pair()));
        let store = Arc::new(MemoryStore::new());
        store.set(AUTH_TOKEN_KEY, "T1").unwrap();
        let redirect = Arc::new(RecordingRedirect::default());
        let client = ApiClient::new(transport, store.clone(), refresher.clone(), redirect.clone());

        let err = client.execute(ApiRequest::get("/conversations")).await.unwrap_err();
        assert!(matches!(err, ApiError::RefreshFailed(_)));
        assert_eq!(refresher.calls(), 0);
        assert!(store.access_token().is_none());
        assert_eq!(redirect.count(), 1);
    }

    #[tokio::test]
    async fn test_replayed_request_is_not_refreshed_twice() {
        let transport = ScriptedTransport::new(|_| ApiResponse::new(401, ""));
        let refresher = GatedRefresher::open(Ok(new_pair()));
        let (client, _, redirect) = client_with(transport.clone(), refresher.clone());

        let err = client.execute(ApiRequest::get("/conversations")).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
        assert_eq!(refresher.calls(), 1);
        assert_eq!(transport.requests().len(), 2);
        assert_eq!(redirect.count(), 0);
    }

    #[tokio::test]
    async fn test_forbidden_clears_session_without_refresh() {
        let transport = ScriptedTransport::new(|_| ApiResponse::new(403, r#"{"message":"sem acesso"}"#));
        let refresher = GatedRefresher::open(Ok(new_pair()));
        let (client, store, redirect) = client_with(transport, refresher.clone());

        let err = client.execute(ApiRequest::get("/projects")).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden { .. }));
        assert_eq!(err.backend_message(), Some("sem acesso"));
        assert_eq!(refresher.calls(), 0);
        assert!(store.access_token().is_none());
        assert_eq!(redirect.count(), 1);
    }

    #[tokio::test]
    async fn test_other_statuses_propagate() {
        let transport = ScriptedTransport::new(|_| ApiResponse::new(404, ""));
        let (client, store, redirect) =
            client_with(transport, GatedRefresher::open(Ok(new_pair())));

        let err = client.get::<serde_json::Value>("/projects/9").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(store.access_token().as_deref(), Some("T1"));
        assert_eq!(redirect.count(), 0);
    }

    #[tokio::test]
    async fn test_stale_token_replays_without_new_refresh() {
        let transport = ScriptedTransport::new(ok_for("T2"));
        let refresher = GatedRefresher::open(Ok(new_pair()));
        let (client, store, _) = client_with(transport.clone(), refresher.clone());

        // Simulate a refresh that completed between dispatch and the 401
        let request = ApiRequest::get("/conversations");
        store.set(AUTH_TOKEN_KEY, "T2").unwrap();
        let response = client
            .recover_unauthorized(&request, Some("T1".to_string()))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(refresher.calls(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_refresh_returns_to_idle() {
        let transport = ScriptedTransport::new(ok_for("T2"));
        let refresher = GatedRefresher::closed(Ok(new_pair()));
        let (client, _, _) = client_with(transport, refresher.clone());

        let leader = tokio::spawn({
            let client = client.clone();
            async move { client.execute(ApiRequest::get("/conversations")).await }
        });
        wait_until(|| refresher.calls() == 1).await;

        let follower = tokio::spawn({
            let client = client.clone();
            async move { client.execute(ApiRequest::get("/projects")).await }
        });
        wait_until(|| client.queued_requests() == 1).await;
        leader.abort();
        let _ = leader.await;

        let err = follower.await.unwrap().unwrap_err();
        assert!(matches!(err, ApiError::RefreshFailed(ref reason) if reason == "refresh was abandoned"));
        assert!(!client.is_refreshing());
        assert_eq!(client.queued_requests(), 0);
    }
}
