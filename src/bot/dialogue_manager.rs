//! Dialogue Manager: state transitions and completion actions for the
//! multi-step dialogs.
//!
//! Beginning a dialog never blocks; the prompt is returned and the
//! continuation runs when the chat's next free-text message arrives.
//! Malformed input aborts the dialog outright, and a completion action
//! always runs with the pending dialog already cleared, so a failure
//! leaves the session back at idle with nothing partially collected.

use anyhow::Result;
use tracing::{info, warn};

use crate::dialogue::{
    validate_api_key, validate_app_id, validate_app_name, validate_env_key, validate_env_value,
    DialogKind, PendingDialog,
};
use crate::session::Session;

use super::{persist_credential, persist_selected_app, replies, BotDeps};

/// Start a dialog for this chat, replacing any dialog already pending.
/// Returns the first prompt to send.
pub fn begin_dialog(session: &mut Session, kind: DialogKind) -> &'static str {
    session.pending_dialog = Some(PendingDialog::new(kind));
    kind.prompt(0)
}

/// Feed a free-text reply into the chat's pending dialog. Callers must
/// only invoke this when a dialog is pending; a missing dialog is a no-op.
pub async fn handle_dialog_reply(
    deps: &BotDeps,
    session: &mut Session,
    chat_id: i64,
    text: &str,
) -> Result<Vec<String>> {
    let Some(mut pending) = session.pending_dialog.take() else {
        return Ok(Vec::new());
    };

    match validate_step(pending.kind, pending.current_step(), text) {
        Err(msg) => {
            // Malformed input aborts the dialog; the user re-invokes the
            // command to retry.
            warn!(chat_id, kind = ?pending.kind, "Dialog aborted on malformed input");
            Ok(vec![msg.to_string()])
        }
        Ok(value) => {
            pending.push(value);
            if pending.is_complete() {
                complete_dialog(deps, session, chat_id, pending.kind, pending.collected).await
            } else {
                let prompt = pending.kind.prompt(pending.current_step());
                session.pending_dialog = Some(pending);
                Ok(vec![prompt.to_string()])
            }
        }
    }
}

fn validate_step(kind: DialogKind, step: usize, input: &str) -> Result<String, &'static str> {
    match (kind, step) {
        (DialogKind::Login, _) => validate_api_key(input),
        (DialogKind::CreateApp, _) => validate_app_name(input),
        (DialogKind::SelectApp, _) => validate_app_id(input),
        (DialogKind::SetEnvVar, 0) => validate_env_key(input),
        (DialogKind::SetEnvVar, _) => validate_env_value(input),
    }
}

/// Run a dialog's completion action with all collected inputs. Session
/// fields are only mutated after the remote call succeeds.
async fn complete_dialog(
    deps: &BotDeps,
    session: &mut Session,
    chat_id: i64,
    kind: DialogKind,
    collected: Vec<String>,
) -> Result<Vec<String>> {
    match kind {
        DialogKind::Login => {
            let [api_key] = collected.as_slice() else {
                return Ok(Vec::new());
            };
            match deps.platform.authenticate(api_key).await {
                Ok(token) => {
                    session.log_in(token);
                    persist_credential(deps, chat_id, api_key).await;
                    info!(chat_id, "Chat logged in");
                    Ok(vec![replies::LOGIN_OK.to_string()])
                }
                Err(e) => {
                    warn!(chat_id, error = %e, "Login failed");
                    Ok(vec![e.to_string()])
                }
            }
        }
        DialogKind::CreateApp => {
            let [name] = collected.as_slice() else {
                return Ok(Vec::new());
            };
            let Some(token) = session.auth_token.clone() else {
                return Ok(vec![replies::NOT_LOGGED_IN.to_string()]);
            };
            match deps.platform.create_app(&token, name).await {
                Ok(app_id) => {
                    session.selected_app_id = Some(app_id.clone());
                    persist_selected_app(deps, chat_id, Some(&app_id)).await;
                    info!(chat_id, app_id = %app_id, "App created");
                    Ok(vec![replies::format_app_created(&app_id)])
                }
                Err(e) => {
                    warn!(chat_id, error = %e, "App creation failed");
                    Ok(vec![e.to_string()])
                }
            }
        }
        DialogKind::SelectApp => {
            let [app_id] = collected.as_slice() else {
                return Ok(Vec::new());
            };
            let Some(token) = session.auth_token.clone() else {
                return Ok(vec![replies::NOT_LOGGED_IN.to_string()]);
            };
            // Verify the app exists before selecting it.
            match deps.platform.get_app(&token, app_id).await {
                Ok(_) => {
                    session.selected_app_id = Some(app_id.clone());
                    persist_selected_app(deps, chat_id, Some(app_id)).await;
                    info!(chat_id, app_id = %app_id, "App selected");
                    Ok(vec![replies::format_app_selected(app_id)])
                }
                Err(e) => {
                    warn!(chat_id, error = %e, "App selection failed");
                    Ok(vec![e.to_string()])
                }
            }
        }
        DialogKind::SetEnvVar => {
            let [key, value] = collected.as_slice() else {
                return Ok(Vec::new());
            };
            let (Some(token), Some(app_id)) =
                (session.auth_token.clone(), session.selected_app_id.clone())
            else {
                return Ok(vec![replies::NO_APP_SELECTED.to_string()]);
            };
            match deps.platform.set_env_var(&token, &app_id, key, value).await {
                Ok(()) => Ok(vec![replies::ENV_VAR_SET.to_string()]),
                Err(e) => {
                    warn!(chat_id, error = %e, "Setting env var failed");
                    Ok(vec![e.to_string()])
                }
            }
        }
    }
}
