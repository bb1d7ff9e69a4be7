//! Runs a [`Transition`] against Telegram and the database.
//!
//! Session state is stored before any side effect. Failures of the
//! profile store, the event log, the booking sink and the operator channel
//! are logged and never change the conversation.

use anyhow::{Context, Result};
use chrono::Local;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, MessageId};
use tracing::{debug, error, info, warn};

use crate::analysis::{MaterialType, PROGRESS_STEPS};
use crate::db::{self, ConsultationRequest};
use crate::dialogue::MediciDialogue;
use crate::localization::t;
use crate::materials::Material;
use crate::profile::Counter;

use super::dialogue_manager::{
    transition, LogEntry, Pause, ProfileUpdate, Record, Reply, Screen, Transition, TransitionContext,
};
use super::event::Event;
use super::ui_builder::{
    analysis_progress_text, material_caption, material_file_name, materials_keyboard,
    operator_notice_text, render_screen, Rendered, ViewContext,
};
use super::BotContext;

/// Where an event came from and where replies go
#[derive(Debug, Clone)]
pub struct Origin {
    pub user_id: i64,
    pub chat_id: ChatId,
    pub first_name: Option<String>,
    pub username: Option<String>,
    /// Message carrying the pressed button; replies edit it when set
    pub message_id: Option<MessageId>,
}

/// Feed one event through the state machine and perform its effects
pub async fn handle_event(
    bot: &Bot,
    ctx: &BotContext,
    dialogue: &MediciDialogue,
    origin: &Origin,
    event: Event,
) -> Result<()> {
    let state = dialogue.get().await?.unwrap_or_default();
    let before = state.name();
    let step = transition(
        state,
        event,
        &TransitionContext {
            today: Local::now().date_naive(),
        },
    );
    debug!(user_id = %origin.user_id, from = before, to = step.next.name(), "State transition");

    if step.next.is_active() {
        dialogue.update(step.next.clone()).await?;
    } else {
        dialogue.exit().await?;
    }
    execute(bot, ctx, origin, step).await
}

async fn execute(bot: &Bot, ctx: &BotContext, origin: &Origin, step: Transition) -> Result<()> {
    let Transition {
        reply,
        profile,
        log,
        record,
        notify_operator,
        ..
    } = step;

    // A material counts as downloaded only once it has been delivered
    let deferred = matches!(reply, Some(Reply::Document(_)));
    if let Some(update) = &profile {
        if !deferred {
            apply_profile_update(ctx, origin.user_id, update).await;
        }
    }
    if let Some(entry) = log {
        write_log(ctx, origin.user_id, &entry).await;
    }
    if let Some(record) = record {
        save_record(ctx, origin.user_id, &record).await;
    }
    if let Some(request) = notify_operator {
        notify_operator_channel(bot, ctx, origin, &request).await;
    }

    match reply {
        Some(Reply::Screen(screen)) => show_screen(bot, ctx, origin, &screen).await,
        Some(Reply::Document(material)) => deliver_material(bot, ctx, origin, material).await,
        None => Ok(()),
    }
}

async fn apply_profile_update(ctx: &BotContext, user_id: i64, update: &ProfileUpdate) {
    let result = match update {
        ProfileUpdate::Touch => db::touch(&ctx.pool, user_id).await,
        ProfileUpdate::Increment(counter) => db::increment(&ctx.pool, user_id, *counter).await,
        ProfileUpdate::SetField(field, value) => db::set_field(&ctx.pool, user_id, *field, value).await,
    };
    if let Err(e) = result {
        warn!(user_id = %user_id, update = ?update, error = %e, "Profile update failed");
    }
}

async fn write_log(ctx: &BotContext, user_id: i64, entry: &LogEntry) {
    if let Err(e) = db::log_event(&ctx.pool, user_id, entry.action, &entry.payload).await {
        warn!(user_id = %user_id, action = entry.action, error = %e, "Event log write failed");
    }
}

async fn save_record(ctx: &BotContext, user_id: i64, record: &Record) {
    let result = match record {
        Record::Consultation(request) => db::save_consultation(&ctx.pool, user_id, request).await,
        Record::QuizAttempt(attempt) => db::save_quiz_attempt(&ctx.pool, user_id, attempt).await,
    };
    if let Err(e) = result {
        error!(user_id = %user_id, error = %e, "Failed to store record");
    }
}

async fn notify_operator_channel(bot: &Bot, ctx: &BotContext, origin: &Origin, request: &ConsultationRequest) {
    let Some(chat_id) = ctx.config.operator_chat_id else {
        debug!("Operator notifications disabled");
        return;
    };

    let text = operator_notice_text(request, origin.user_id, origin.username.as_deref());
    match bot.send_message(ChatId(chat_id), text).await {
        Ok(_) => info!(user_id = %origin.user_id, "Operator notified about consultation"),
        Err(e) => error!(user_id = %origin.user_id, error = %e, "Failed to notify operator"),
    }
}

/// Show "typing..." and wait before replying
async fn typing_pause(bot: &Bot, ctx: &BotContext, chat_id: ChatId, pause: Pause) {
    let delay = pause.scale(ctx.config.typing_delay);
    if delay.is_zero() {
        return;
    }
    if let Err(e) = bot.send_chat_action(chat_id, ChatAction::Typing).await {
        debug!(error = %e, "Failed to send typing action");
    }
    tokio::time::sleep(delay).await;
}

async fn show_screen(bot: &Bot, ctx: &BotContext, origin: &Origin, screen: &Screen) -> Result<()> {
    typing_pause(bot, ctx, origin.chat_id, screen.pause()).await;

    let profile = if screen.needs_profile() {
        match db::get_profile(&ctx.pool, origin.user_id).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(user_id = %origin.user_id, error = %e, "Failed to load profile");
                None
            }
        }
    } else {
        None
    };
    let view = ViewContext {
        profile: profile.as_ref(),
        first_name: origin.first_name.as_deref(),
    };

    match screen {
        Screen::Analysis(kind) => run_analysis(bot, ctx, origin, *kind, &view).await,
        Screen::CalendarPage { .. } => {
            let rendered = render_screen(screen, &view);
            if let (Some(message_id), Some(keyboard)) = (origin.message_id, rendered.keyboard.clone()) {
                match bot
                    .edit_message_reply_markup(origin.chat_id, message_id)
                    .reply_markup(keyboard)
                    .await
                {
                    Ok(_) => return Ok(()),
                    Err(e) => warn!(user_id = %origin.user_id, error = %e, "Failed to update calendar"),
                }
            }
            respond(bot, origin, rendered).await.map(|_| ())
        }
        _ => respond(bot, origin, render_screen(screen, &view)).await.map(|_| ()),
    }
}

/// Animate the progress bar in one message, then replace it with the report
async fn run_analysis(
    bot: &Bot,
    ctx: &BotContext,
    origin: &Origin,
    kind: MaterialType,
    view: &ViewContext<'_>,
) -> Result<()> {
    let started = Rendered {
        text: t("analysis-started"),
        keyboard: None,
    };
    let message_id = respond(bot, origin, started).await?;

    for (percent, status) in PROGRESS_STEPS {
        if let Err(e) = bot
            .edit_message_text(origin.chat_id, message_id, analysis_progress_text(percent, status))
            .await
        {
            debug!(user_id = %origin.user_id, error = %e, "Failed to update progress");
        }
        tokio::time::sleep(ctx.config.analysis_step_delay).await;
    }

    let report = render_screen(&Screen::Analysis(kind), view);
    let target = Origin {
        message_id: Some(message_id),
        ..origin.clone()
    };
    respond(bot, &target, report).await.map(|_| ())
}

/// Send the material file with the materials keyboard attached, then count the download
async fn deliver_material(bot: &Bot, ctx: &BotContext, origin: &Origin, material: Material) -> Result<()> {
    typing_pause(bot, ctx, origin.chat_id, Pause::Normal).await;

    let path = match material.resolve(&ctx.config.materials_dir) {
        Ok(path) => path,
        Err(e) => {
            warn!(user_id = %origin.user_id, error = %e, "Material missing");
            let rendered = Rendered {
                text: t("material-unavailable"),
                keyboard: Some(materials_keyboard()),
            };
            return respond(bot, origin, rendered).await.map(|_| ());
        }
    };

    let document = InputFile::file(path).file_name(material_file_name(material));
    match bot
        .send_document(origin.chat_id, document)
        .caption(material_caption(material))
        .reply_markup(materials_keyboard())
        .await
    {
        Ok(_) => {
            info!(user_id = %origin.user_id, material = material.code(), "Material delivered");
            apply_profile_update(ctx, origin.user_id, &ProfileUpdate::Increment(Counter::MaterialsDownloaded))
                .await;
            Ok(())
        }
        Err(e) => {
            error!(user_id = %origin.user_id, error = %e, "Failed to send material");
            let rendered = Rendered {
                text: t("material-send-failed"),
                keyboard: Some(materials_keyboard()),
            };
            respond(bot, origin, rendered).await.map(|_| ())
        }
    }
}

/// Edit the originating message when there is one, else send a new message
async fn respond(bot: &Bot, origin: &Origin, rendered: Rendered) -> Result<MessageId> {
    if let Some(message_id) = origin.message_id {
        let mut request = bot.edit_message_text(origin.chat_id, message_id, rendered.text.clone());
        if let Some(keyboard) = rendered.keyboard.clone() {
            request = request.reply_markup(keyboard);
        }
        match request.await {
            Ok(message) => return Ok(message.id),
            Err(e) => debug!(user_id = %origin.user_id, error = %e, "Edit failed, sending a new message"),
        }
    }

    let mut request = bot.send_message(origin.chat_id, rendered.text);
    if let Some(keyboard) = rendered.keyboard {
        request = request.reply_markup(keyboard);
    }
    let message = request.await.context("Failed to send message")?;
    Ok(message.id)
}
