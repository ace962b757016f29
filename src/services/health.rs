//! Backend connectivity check
//!
//! Probes `GET /health` and the VAPID key endpoint independently so a
//! reachable server with push misconfigured is told apart from an
//! unreachable one.

use std::sync::Arc;
use tracing::{debug, warn};

use super::notifications::{NotificationApi, VAPID_KEY_PATH};
use crate::client::{ApiClient, ApiRequest};
use crate::push::PushBackend;

pub const HEALTH_PATH: &str = "/health";

/// Characters of the VAPID key shown in reports
const KEY_PREVIEW_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub path: &'static str,
    /// Detail on success, failure reason otherwise
    pub result: Result<String, String>,
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    pub health: CheckOutcome,
    pub vapid_key: CheckOutcome,
}

impl ConnectionReport {
    pub fn is_ok(&self) -> bool {
        self.health.is_ok() && self.vapid_key.is_ok()
    }
}

pub struct HealthApi {
    client: Arc<ApiClient>,
}

impl HealthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn check_health(&self) -> CheckOutcome {
        let result = match self.client.execute(ApiRequest::get(HEALTH_PATH)).await {
            Ok(response) => Ok(format!("HTTP {}", response.status)),
            Err(e) => {
                warn!("Health check failed: {}", e);
                Err(e.to_string())
            }
        };
        CheckOutcome {
            path: HEALTH_PATH,
            result,
        }
    }

    pub async fn check_vapid_key(&self) -> CheckOutcome {
        let api = NotificationApi::new(self.client.clone());
        let result = match api.vapid_public_key().await {
            Ok(key) => Ok(key_preview(&key)),
            Err(e) => {
                warn!("VAPID key fetch failed: {}", e);
                Err(e.to_string())
            }
        };
        CheckOutcome {
            path: VAPID_KEY_PATH,
            result,
        }
    }

    /// Run both checks; the second runs even when the first fails
    pub async fn check_connection(&self) -> ConnectionReport {
        let health = self.check_health().await;
        let vapid_key = self.check_vapid_key().await;
        debug!("Connection check finished, ok = {}", health.is_ok() && vapid_key.is_ok());
        ConnectionReport { health, vapid_key }
    }
}

fn key_preview(key: &str) -> String {
    if key.chars().count() <= KEY_PREVIEW_LEN {
        return key.to_string();
    }
    let prefix: String = key.chars().take(KEY_PREVIEW_LEN).collect();
    format!("{}...", prefix)
}
