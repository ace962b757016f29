//! Conversation and message commands

use anyhow::Result;

use super::super::CliContext;
use super::{api_failure, print_json};
use crate::errors::ErrorMessages;
use crate::models::Direction;
use crate::services::ChatApi;

pub struct ChatHandler<'a> {
    context: &'a CliContext,
}

impl<'a> ChatHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    fn chat(&self) -> Result<ChatApi> {
        Ok(ChatApi::new(self.context.api_client()?))
    }

    pub async fn handle_conversations(&self, json: bool) -> Result<()> {
        let conversations = self
            .chat()?
            .conversations()
            .await
            .map_err(|e| api_failure(e, ErrorMessages::load))?;

        if json {
            return print_json(&conversations);
        }
        if conversations.is_empty() {
            println!("No conversations");
            return Ok(());
        }
        for conversation in &conversations {
            let unread = match conversation.unread_count {
                0 => String::new(),
                n => format!(" [{n} unread]"),
            };
            println!(
                "{}  {}  {}{}",
                conversation.id,
                conversation.last_message_at.format("%Y-%m-%d %H:%M"),
                conversation.contact.display_name(),
                unread
            );
        }
        Ok(())
    }

    pub async fn handle_messages(&self, conversation_id: &str, json: bool) -> Result<()> {
        let messages = self
            .chat()?
            .messages(conversation_id)
            .await
            .map_err(|e| api_failure(e, ErrorMessages::load))?;

        if json {
            return print_json(&messages);
        }
        for message in &messages {
            let arrow = match message.direction {
                Direction::Inbound => "<-",
                Direction::Outbound => "->",
            };
            println!(
                "{} {} {}",
                message.timestamp.format("%Y-%m-%d %H:%M"),
                arrow,
                message.preview()
            );
        }
        Ok(())
    }

    pub async fn handle_send(&self, conversation_id: &str, text: &str, reply_to: Option<&str>) -> Result<()> {
        let message = self
            .chat()?
            .send_message(conversation_id, text, reply_to)
            .await
            .map_err(|e| api_failure(e, ErrorMessages::save))?;
        println!("Message {} sent", message.id);
        Ok(())
    }

    pub async fn handle_rename(&self, contact_id: &str, name: &str) -> Result<()> {
        self.chat()?
            .update_contact_custom_name(contact_id, name)
            .await
            .map_err(|e| api_failure(e, ErrorMessages::save))?;
        println!("Contact {contact_id} renamed to {name}");
        Ok(())
    }
}

super::traits::impl_context_handler!(ChatHandler<'a>);
