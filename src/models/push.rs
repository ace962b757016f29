use serde::{Deserialize, Serialize};

/// Browser notification permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Default,
    Granted,
    Denied,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Default => "default",
            Self::Granted => "granted",
            Self::Denied => "denied",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Subscription issued by the push service, in its `toJSON()` shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub endpoint: String,
    #[serde(default)]
    pub expiration_time: Option<i64>,
    pub keys: SubscriptionKeys,
}

/// Options a subscription was created with; reused on `pushsubscriptionchange`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionOptions {
    pub user_visible_only: bool,
    pub application_server_key: Vec<u8>,
}

impl SubscriptionOptions {
    pub fn user_visible(application_server_key: Vec<u8>) -> Self {
        Self {
            user_visible_only: true,
            application_server_key,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidKeyResponse {
    #[serde(default)]
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest<'a> {
    pub user_id: i64,
    pub subscription: &'a PushSubscription,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnsubscribeRequest<'a> {
    pub endpoint: &'a str,
}
