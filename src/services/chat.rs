use std::sync::Arc;
use tracing::debug;

use crate::client::{ApiClient, ApiRequest};
use crate::errors::{ApiError, ApiResult};
use crate::models::{Conversation, CustomNameRequest, Message, SendMessageRequest};

/// Conversations and messages of the WhatsApp inbox
pub struct ChatApi {
    client: Arc<ApiClient>,
}

impl ChatApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn conversations(&self) -> ApiResult<Vec<Conversation>> {
        self.client.get("/conversations").await
    }

    pub async fn messages(&self, conversation_id: &str) -> ApiResult<Vec<Message>> {
        self.client
            .get(&format!("/conversations/{}/messages", conversation_id))
            .await
    }

    /// Send a text message, optionally as a reply
    pub async fn send_message(
        &self,
        conversation_id: &str,
        text: &str,
        reply_to_id: Option<&str>,
    ) -> ApiResult<Message> {
        if text.trim().is_empty() {
            return Err(ApiError::InvalidRequest("message text is empty".to_string()));
        }

        debug!("Sending message to conversation {}", conversation_id);
        self.client
            .post(
                &format!("/conversations/{}/messages", conversation_id),
                &SendMessageRequest { text, reply_to_id },
            )
            .await
    }

    pub async fn update_contact_custom_name(&self, contact_id: &str, custom_name: &str) -> ApiResult<()> {
        let request = ApiRequest::patch(format!("/conversations/{}/custom-name", contact_id))
            .json(&CustomNameRequest { custom_name })?;
        self.client.send(request).await
    }
}
