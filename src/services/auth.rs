use std::sync::Arc;
use tracing::{info, warn};

use crate::client::{ApiClient, ApiRequest};
use crate::errors::ApiResult;
use crate::models::{AuthResponse, LoginRequest, LogoutRequest, User};
use crate::storage::{SessionStoreExt, USER_KEY};

pub const LOGIN_ENDPOINT: &str = "/auth/login";
pub const LOGOUT_ENDPOINT: &str = "/auth/logout";

/// Session lifecycle on top of the shared credential store
pub struct AuthService {
    client: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Exchange credentials for a token pair and persist the session
    ///
    /// Sent on the raw transport: rejected credentials come back as
    /// `Unauthorized` instead of starting a token refresh.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let request = ApiRequest::post(LOGIN_ENDPOINT).json(&LoginRequest { email, password })?;
        let auth: AuthResponse = self
            .client
            .transport()
            .send(&request)
            .await?
            .error_for_status(LOGIN_ENDPOINT)?
            .decode(LOGIN_ENDPOINT)?;

        if !auth.token.is_empty() {
            self.client.store().save_session(
                &auth.token,
                &auth.refresh_token,
                auth.user.as_ref(),
            )?;
            info!("Signed in as {}", auth.user.as_ref().map_or("unknown user", |u| u.email.as_str()));
        }

        Ok(auth)
    }

    /// Invalidate the refresh token server-side; local state is cleared regardless
    pub async fn logout(&self) -> ApiResult<()> {
        let outcome = match ApiRequest::post(LOGOUT_ENDPOINT).json(&LogoutRequest::default()) {
            Ok(request) => self.client.send(request).await,
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            warn!("Logout request failed, clearing local session anyway: {}", e);
        }

        self.client.store().clear_session()?;
        info!("Signed out");
        Ok(())
    }

    pub fn current_user(&self) -> Option<User> {
        self.client.store().user()
    }

    pub fn set_current_user(&self, user: Option<&User>) -> ApiResult<()> {
        match user {
            Some(user) => self.client.store().save_user(user)?,
            None => self.client.store().remove(USER_KEY)?,
        }
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.store().access_token().is_some()
    }
}
