//! # Medici Marketing Telegram Bot
//!
//! A Telegram bot for a medical-marketing agency: topic advice, free
//! materials, a CPL / ROAS calculator, a knowledge quiz, canned reviews of
//! uploaded ads and consultation booking, with per-user engagement
//! statistics stored in SQLite.

pub mod analysis;
pub mod bot;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod localization;
pub mod materials;
pub mod metrics;
pub mod profile;
pub mod quiz;
pub mod session;
