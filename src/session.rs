//! Per-chat session state and the store that owns it.
//!
//! Every Telegram chat gets exactly one [`Session`]. Sessions are created
//! lazily on first contact and live for the process lifetime; `/logout`
//! clears credentials but never removes the session record itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

use crate::dialogue::PendingDialog;

/// Mutable state for a single chat identity.
#[derive(Debug, Default)]
pub struct Session {
    /// True once Koyeb has accepted the chat's API key.
    pub logged_in: bool,
    /// Access token returned by authentication. Present iff `logged_in`.
    pub auth_token: Option<String>,
    /// Currently targeted app. Survives logout.
    pub selected_app_id: Option<String>,
    /// The multi-step dialog awaiting this chat's next free-text reply,
    /// if any. At most one; a new dialog entry replaces it.
    pub pending_dialog: Option<PendingDialog>,
    /// Whether a credential-restore attempt has already run for this
    /// session since process start.
    pub hydrated: bool,
}

impl Session {
    /// Clear credentials atomically. The selected app is retained so the
    /// user can log back in and continue where they left off.
    pub fn log_out(&mut self) {
        self.logged_in = false;
        self.auth_token = None;
        self.pending_dialog = None;
    }

    /// Record a successful authentication.
    pub fn log_in(&mut self, token: String) {
        self.auth_token = Some(token);
        self.logged_in = true;
    }
}

/// Get-or-create store of sessions keyed by chat id.
///
/// The outer map lock is held only for the lookup; all message handling
/// happens under the per-chat `tokio::sync::Mutex`, so two messages for
/// the same chat serialize while different chats proceed in parallel.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<StdMutex<HashMap<i64, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session handle for a chat, creating a default session if
    /// this chat has never been seen.
    pub fn entry(&self, chat_id: i64) -> Arc<Mutex<Session>> {
        let mut map = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(map.entry(chat_id).or_default())
    }

    /// Apply a mutation to one chat's session under its lock.
    pub async fn update<F, R>(&self, chat_id: i64, mutator: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let entry = self.entry(chat_id);
        let mut session = entry.lock().await;
        mutator(&mut session)
    }
}
