//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `event`: Reduces updates to events and encodes button data
//! - `dialogue_manager`: The pure conversation state machine
//! - `ui_builder`: Creates keyboards and formats messages
//! - `executor`: Applies transitions to Telegram and the database
//! - `message_handler`: Handles incoming text, photo, and document messages
//! - `callback_handler`: Handles inline keyboard callback queries

use sqlx::SqlitePool;

use crate::config::BotConfig;

pub mod callback_handler;
pub mod dialogue_manager;
pub mod event;
pub mod executor;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

pub use dialogue_manager::{transition, Screen, Transition, TransitionContext};
pub use event::{Button, Command, Event};

/// Shared dependencies of every handler
pub struct BotContext {
    pub config: BotConfig,
    pub pool: SqlitePool,
}
