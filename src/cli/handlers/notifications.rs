//! Notification endpoint commands

use anyhow::Result;

use super::super::{CliContext, NotificationAction};
use super::api_failure;
use crate::errors::ErrorMessages;
use crate::push::{decode_base64url, PushBackend};

pub struct NotificationHandler<'a> {
    context: &'a CliContext,
}

impl<'a> NotificationHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub async fn handle_notifications(&self, action: NotificationAction) -> Result<()> {
        let api = self.context.notification_api()?;

        match action {
            NotificationAction::VapidKey => {
                let key = api
                    .vapid_public_key()
                    .await
                    .map_err(|e| api_failure(e, ErrorMessages::load))?;
                let decoded = decode_base64url(&key)?;
                println!("{key}");
                tracing::debug!("VAPID key decodes to {} bytes", decoded.len());
            }
            NotificationAction::Test => {
                api.send_test()
                    .await
                    .map_err(|e| api_failure(e, ErrorMessages::unknown))?;
                println!("Test notification requested");
            }
        }
        Ok(())
    }
}

super::traits::impl_context_handler!(NotificationHandler<'a>);
