//! Push notification endpoints
//!
//! Sent through the authenticated client, so subscriptions are tied to the
//! signed-in user and an expired token is refreshed like any other call.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::client::{ApiClient, ApiRequest, ApiResponse};
use crate::errors::{ApiError, ApiResult};
use crate::models::{PushSubscription, SubscribeRequest, UnsubscribeRequest, VapidKeyResponse};
use crate::push::PushBackend;

pub const VAPID_KEY_PATH: &str = "/notifications/vapid-public-key";
pub const SUBSCRIBE_PATH: &str = "/notifications/subscribe";
pub const UNSUBSCRIBE_PATH: &str = "/notifications/unsubscribe";
pub const TEST_PATH: &str = "/notifications/test";

pub struct NotificationApi {
    client: Arc<ApiClient>,
}

impl NotificationApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    async fn call(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        debug!("{}", request.describe());
        self.client.execute(request).await
    }
}

#[async_trait]
impl PushBackend for NotificationApi {
    async fn vapid_public_key(&self) -> ApiResult<String> {
        let response = self.call(ApiRequest::get(VAPID_KEY_PATH)).await?;
        let body: VapidKeyResponse = response.decode(VAPID_KEY_PATH)?;
        body.public_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ApiError::Decode {
                path: VAPID_KEY_PATH.to_string(),
                message: "No public key in response".to_string(),
            })
    }

    async fn save_subscription(&self, user_id: i64, subscription: &PushSubscription) -> ApiResult<()> {
        let request = ApiRequest::post(SUBSCRIBE_PATH).json(&SubscribeRequest {
            user_id,
            subscription,
        })?;
        self.call(request).await.map(|_| ())
    }

    async fn remove_subscription(&self, endpoint: &str) -> ApiResult<()> {
        let request = ApiRequest::delete(UNSUBSCRIBE_PATH).json(&UnsubscribeRequest { endpoint })?;
        self.call(request).await.map(|_| ())
    }

    async fn send_test(&self) -> ApiResult<()> {
        let request = ApiRequest::post(TEST_PATH).json(&json!({}))?;
        self.call(request).await.map(|_| ())
    }
}
