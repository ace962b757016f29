use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub wa_id: String,
    pub name: Option<String>,
    pub custom_name: Option<String>,
    pub profile_pic: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Name shown in the conversation list: custom name, then profile name, then the WhatsApp id
    pub fn display_name(&self) -> &str {
        self.custom_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.wa_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub contact_id: String,
    pub contact: Contact,
    pub last_message_at: DateTime<Utc>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Text,
    Image,
    Video,
    Audio,
    Sticker,
    Document,
    Location,
    Reaction,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub contact_id: String,
    #[serde(default)]
    pub contact: Option<Contact>,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub text_body: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub template_header: Option<String>,
    #[serde(default)]
    pub template_footer: Option<String>,
    #[serde(default)]
    pub media_id: Option<String>,
    #[serde(default)]
    pub media_local_path: Option<String>,
    #[serde(default)]
    pub media_filename: Option<String>,
    #[serde(default)]
    pub media_mime_type: Option<String>,
    #[serde(default)]
    pub is_voice: Option<bool>,
    #[serde(default)]
    pub is_animated: Option<bool>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub reaction_emoji: Option<String>,
    pub status: MessageStatus,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub reply_to: Option<Box<Message>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Best-effort one-line preview of the message content
    pub fn preview(&self) -> String {
        if let Some(text) = self.text_body.as_deref().or(self.caption.as_deref()) {
            return text.to_string();
        }

        match self.kind {
            MessageType::Reaction => self.reaction_emoji.clone().unwrap_or_default(),
            MessageType::Location => match (self.latitude, self.longitude) {
                (Some(lat), Some(lon)) => format!("[location {lat:.5}, {lon:.5}]"),
                _ => "[location]".to_string(),
            },
            MessageType::Audio if self.is_voice == Some(true) => "[voice]".to_string(),
            other => format!("[{}]", format!("{other:?}").to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest<'a> {
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomNameRequest<'a> {
    pub custom_name: &'a str,
}
