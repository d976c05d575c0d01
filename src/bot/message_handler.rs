//! Message Handler: the transport-agnostic message pipeline plus the
//! teloxide endpoint that feeds it.

use anyhow::Result;
use teloxide::prelude::*;
use tracing::{debug, error, info, warn};

use crate::session::Session;

use super::{dialogue_manager, replies, router, BotDeps};

/// Teloxide endpoint: extract the text, run the pipeline under the chat's
/// session lock, relay every reply back to the chat.
pub async fn message_handler(bot: Bot, msg: Message, deps: BotDeps) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let replies = handle_text(&deps, msg.chat.id.0, text).await?;
    for reply in replies {
        bot.send_message(msg.chat.id, reply).await?;
    }
    Ok(())
}

/// Process one inbound message for a chat and return the replies to send.
///
/// The chat's session lock is held for the whole call, so messages for one
/// chat are handled strictly in order while other chats proceed in
/// parallel. Routing: command text goes to the router (a dialog entry
/// command replaces any pending dialog), free text goes to the pending
/// dialog's continuation, and free text with no pending dialog is ignored.
pub async fn handle_text(deps: &BotDeps, chat_id: i64, text: &str) -> Result<Vec<String>> {
    let entry = deps.sessions.entry(chat_id);
    let mut session = entry.lock().await;

    if !session.hydrated {
        hydrate_session(deps, &mut session, chat_id).await;
    }

    let mut out = Vec::new();
    if session
        .pending_dialog
        .as_ref()
        .is_some_and(|pending| pending.is_expired(deps.dialog_ttl))
    {
        info!(chat_id, "Clearing expired dialog");
        session.pending_dialog = None;
        out.push(replies::DIALOG_EXPIRED.to_string());
    }

    if let Some((name, args)) = router::parse_command(text) {
        out.extend(router::dispatch(deps, &mut session, chat_id, &name, &args).await?);
    } else if session.pending_dialog.is_some() {
        out.extend(
            dialogue_manager::handle_dialog_reply(deps, &mut session, chat_id, text).await?,
        );
    } else {
        debug!(chat_id, "Ignoring free text with no pending dialog");
    }

    Ok(out)
}

/// One-shot credential restore for a session created after process start.
/// Re-authenticates with the stored API key; failures leave the session
/// logged out and are never surfaced to the chat.
async fn hydrate_session(deps: &BotDeps, session: &mut Session, chat_id: i64) {
    session.hydrated = true;
    let Some(db) = &deps.credentials else {
        return;
    };

    let stored = {
        let conn = db.lock().await;
        crate::db::fetch_credential(&conn, chat_id)
    };

    match stored {
        Ok(Some(credential)) => match deps.platform.authenticate(&credential.api_key).await {
            Ok(token) => {
                session.log_in(token);
                if session.selected_app_id.is_none() {
                    session.selected_app_id = credential.app_id;
                }
                info!(chat_id, "Session restored from stored credential");
            }
            Err(e) => {
                warn!(chat_id, error = %e, "Stored credential no longer valid");
            }
        },
        Ok(None) => {}
        Err(e) => {
            error!(chat_id, error = %e, "Failed to read stored credential");
        }
    }
}
