//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error};

use crate::analysis::UploadKind;
use crate::dialogue::MediciDialogue;

use super::event::Event;
use super::executor::{handle_event, Origin};
use super::BotContext;

/// Reduce a message to an event: commands and text, documents, photos
pub fn event_from_message(msg: &Message) -> Event {
    if let Some(text) = msg.text() {
        return Event::from_text(text);
    }
    if let Some(document) = msg.document() {
        return Event::Upload(UploadKind::Document {
            file_name: document.file_name.clone(),
        });
    }
    if msg.photo().is_some() {
        return Event::Upload(UploadKind::Photo);
    }
    Event::Unsupported
}

/// Sender of a message, falling back to the chat for anonymous senders
pub fn message_origin(msg: &Message) -> Origin {
    let user = msg.from.as_ref();
    Origin {
        user_id: user.map(|u| u.id.0 as i64).unwrap_or(msg.chat.id.0),
        chat_id: msg.chat.id,
        first_name: user.map(|u| u.first_name.clone()),
        username: user.and_then(|u| u.username.clone()),
        message_id: None,
    }
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: MediciDialogue,
    ctx: Arc<BotContext>,
) -> Result<()> {
    let origin = message_origin(&msg);
    let event = event_from_message(&msg);
    debug!(user_id = %origin.user_id, event = ?event, "Received message");

    if let Err(e) = handle_event(&bot, &ctx, &dialogue, &origin, event).await {
        error!(user_id = %origin.user_id, error = %e, "Failed to handle message");
    }

    Ok(())
}
