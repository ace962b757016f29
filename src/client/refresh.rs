use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::transport::{ApiRequest, HttpTransport};
use crate::errors::ApiResult;
use crate::models::{AuthResponse, RefreshRequest};

pub const REFRESH_PATH: &str = "/auth/refresh";

/// Exchanges a refresh token for a new token pair
///
/// Injected into `ApiClient` so the client never depends on the auth service.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> ApiResult<AuthResponse>;
}

/// Calls `POST /auth/refresh` on the raw transport
///
/// The refresh call bypasses the client's 401 interception, so a rejected
/// refresh token can never queue behind the refresh that is waiting for it.
pub struct HttpTokenRefresher {
    transport: Arc<dyn HttpTransport>,
}

impl HttpTokenRefresher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> ApiResult<AuthResponse> {
        debug!("Exchanging refresh token");
        let request = ApiRequest::post(REFRESH_PATH).json(&RefreshRequest { refresh_token })?;
        let response = self
            .transport
            .send(&request)
            .await?
            .error_for_status(REFRESH_PATH)?;
        response.decode(REFRESH_PATH)
    }
}
