//! Callback Handler module for processing inline keyboard interactions

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{debug, error};

use crate::dialogue::MediciDialogue;

use super::event::Event;
use super::executor::{handle_event, Origin};
use super::BotContext;

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    dialogue: MediciDialogue,
    ctx: Arc<BotContext>,
) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    // Stop the loading indicator before the typing pause
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        debug!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    let Some(message) = &q.message else {
        debug!(user_id = %q.from.id, "Callback query without a message, ignoring");
        return Ok(());
    };

    let origin = Origin {
        user_id: q.from.id.0 as i64,
        chat_id: message.chat().id,
        first_name: Some(q.from.first_name.clone()),
        username: q.from.username.clone(),
        message_id: Some(message.id()),
    };
    let event = Event::from_callback(q.data.as_deref().unwrap_or(""));

    if let Err(e) = handle_event(&bot, &ctx, &dialogue, &origin, event).await {
        error!(user_id = %origin.user_id, error = %e, "Failed to handle callback query");
    }

    Ok(())
}
