use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::HandlerExt;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use medici_bot::bot::{self, BotContext};
use medici_bot::config::BotConfig;
use medici_bot::db;
use medici_bot::dialogue::DialogueState;
use medici_bot::localization::init_localization;
use medici_bot::session::SessionStore;

/// How often idle sessions are swept
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Medici Telegram Bot");

    let config = BotConfig::from_env().context("Invalid configuration")?;
    init_localization()?;

    info!(database_url = %config.database_url, "Initializing database");
    let pool = db::connect(&config.database_url).await?;
    db::init_database_schema(&pool).await?;

    let sessions = Arc::new(SessionStore::new(config.session_ttl));
    Arc::clone(&sessions).spawn_sweeper(SWEEP_INTERVAL);

    let bot = Bot::new(config.bot_token.clone());
    if config.operator_chat_id.is_none() {
        info!("MANAGER_CHAT_ID not set, operator notifications disabled");
    }

    let context = Arc::new(BotContext { config, pool });

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, SessionStore, DialogueState>()
                .endpoint(bot::message_handler),
        )
        .branch(
            Update::filter_callback_query()
                .enter_dialogue::<CallbackQuery, SessionStore, DialogueState>()
                .endpoint(bot::callback_handler),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![context, sessions])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
