//! Command handlers for all CLI operations
//!
//! `CommandHandler` routes parsed commands to one handler per area. API
//! failures are reported with the user-facing message for the operation.

pub mod chat;
pub mod check;
pub mod config;
pub mod notifications;
pub mod projects;
pub mod session;
pub mod traits;

use anyhow::Result;
use serde::Serialize;

use self::chat::ChatHandler;
use self::check::CheckHandler;
use self::config::ConfigHandler;
use self::notifications::NotificationHandler;
use self::projects::ProjectHandler;
use self::session::SessionHandler;
use self::traits::HandlerBuilder;
use super::{CliContext, Commands};
use crate::errors::ApiError;

pub struct CommandHandler {
    context: CliContext,
}

impl CommandHandler {
    pub fn new(context: CliContext) -> Self {
        Self { context }
    }

    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        let builder = HandlerBuilder::new(&self.context);
        match command {
            Commands::Init { global, force } => {
                builder
                    .create_with_context::<ConfigHandler>()
                    .handle_init(global, force)
                    .await
            }
            Commands::Config { action } => {
                builder
                    .create_with_context::<ConfigHandler>()
                    .handle_config(action)
                    .await
            }
            Commands::Login { email, password } => {
                builder
                    .create_with_context::<SessionHandler>()
                    .handle_login(&email, &password)
                    .await
            }
            Commands::Logout => {
                builder
                    .create_with_context::<SessionHandler>()
                    .handle_logout()
                    .await
            }
            Commands::Whoami => builder.create_with_context::<SessionHandler>().handle_whoami(),
            Commands::Conversations { json } => {
                builder
                    .create_with_context::<ChatHandler>()
                    .handle_conversations(json)
                    .await
            }
            Commands::Messages {
                conversation_id,
                json,
            } => {
                builder
                    .create_with_context::<ChatHandler>()
                    .handle_messages(&conversation_id, json)
                    .await
            }
            Commands::Send {
                conversation_id,
                text,
                reply_to,
            } => {
                builder
                    .create_with_context::<ChatHandler>()
                    .handle_send(&conversation_id, &text, reply_to.as_deref())
                    .await
            }
            Commands::Rename { contact_id, name } => {
                builder
                    .create_with_context::<ChatHandler>()
                    .handle_rename(&contact_id, &name)
                    .await
            }
            Commands::Projects { action } => {
                builder
                    .create_with_context::<ProjectHandler>()
                    .handle_projects(action)
                    .await
            }
            Commands::Notifications { action } => {
                builder
                    .create_with_context::<NotificationHandler>()
                    .handle_notifications(action)
                    .await
            }
            Commands::Check => builder.create_with_context::<CheckHandler>().handle_check().await,
        }
    }
}

/// Turn an API error into the message shown to the user
pub(crate) fn api_failure(
    error: ApiError,
    describe: fn(&(dyn std::error::Error + 'static)) -> String,
) -> anyhow::Error {
    tracing::debug!("API call failed: {}", error);
    anyhow::anyhow!(describe(&error))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
