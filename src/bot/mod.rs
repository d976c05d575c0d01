//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Transport glue and the transport-agnostic message pipeline
//! - `router`: Maps command names plus session state to handlers, enforcing guards
//! - `dialogue_manager`: Multi-step dialog transitions and completion actions
//! - `replies`: Fixed reply texts and message formatting

pub mod dialogue_manager;
pub mod message_handler;
pub mod replies;
pub mod router;

use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::error;

use crate::dialogue::DIALOG_TTL;
use crate::koyeb::AppPlatform;
use crate::session::SessionStore;

// Re-export the main entry points for use in main.rs and tests
pub use message_handler::{handle_text, message_handler};

/// Shared collaborators every handler invocation needs.
#[derive(Clone)]
pub struct BotDeps {
    pub sessions: SessionStore,
    pub platform: Arc<dyn AppPlatform>,
    /// Optional credential persistence; `None` runs the bot purely in memory.
    pub credentials: Option<Arc<Mutex<Connection>>>,
    /// How long a pending dialog stays valid before it is treated as
    /// abandoned.
    pub dialog_ttl: Duration,
}

impl BotDeps {
    pub fn new(
        platform: Arc<dyn AppPlatform>,
        credentials: Option<Arc<Mutex<Connection>>>,
    ) -> Self {
        Self {
            sessions: SessionStore::new(),
            platform,
            credentials,
            dialog_ttl: DIALOG_TTL,
        }
    }

    pub fn with_dialog_ttl(mut self, ttl: Duration) -> Self {
        self.dialog_ttl = ttl;
        self
    }
}

/// Persist a chat's API key. Persistence failures are logged, never
/// surfaced to the chat.
pub(crate) async fn persist_credential(deps: &BotDeps, chat_id: i64, api_key: &str) {
    if let Some(db) = &deps.credentials {
        let conn = db.lock().await;
        if let Err(e) = crate::db::upsert_credential(&conn, chat_id, api_key) {
            error!(chat_id, error = %e, "Failed to persist credential");
        }
    }
}

/// Persist (or clear) a chat's selected app.
pub(crate) async fn persist_selected_app(deps: &BotDeps, chat_id: i64, app_id: Option<&str>) {
    if let Some(db) = &deps.credentials {
        let conn = db.lock().await;
        if let Err(e) = crate::db::update_selected_app(&conn, chat_id, app_id) {
            error!(chat_id, error = %e, "Failed to persist app selection");
        }
    }
}

/// Remove a chat's stored credential on logout.
pub(crate) async fn remove_credential(deps: &BotDeps, chat_id: i64) {
    if let Some(db) = &deps.credentials {
        let conn = db.lock().await;
        if let Err(e) = crate::db::delete_credential(&conn, chat_id) {
            error!(chat_id, error = %e, "Failed to delete stored credential");
        }
    }
}
