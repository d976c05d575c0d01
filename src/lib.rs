//! # Koyeb Telegram Bot
//!
//! A Telegram bot that remote-controls apps on the Koyeb platform: log in
//! with an API key, pick an app, then deploy, read logs, and manage
//! environment variables from chat. Multi-step input (API key, app name,
//! env key/value) is collected through per-chat dialogs that never block
//! on user input.

pub mod bot;
pub mod db;
pub mod dialogue;
pub mod koyeb;
pub mod koyeb_errors;
pub mod session;
