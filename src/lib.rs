//! ED AFK Notifier - Elite Dangerous journal notifications for AFK sessions.

pub mod bots;
pub mod config;
pub mod display;
pub mod engine;
pub mod journal;
pub mod status;
