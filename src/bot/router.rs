//! Command Router: maps a command name plus session state to exactly one
//! handler invocation, or a guard-failure message.
//!
//! Commands are declared in a static table. Each entry carries its guard
//! predicates and its input style: command-line-style arguments or a
//! conversational dialog. The dispatch path never hardcodes either style.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::dialogue::{validate_env_key, DialogKind};
use crate::session::Session;

use super::dialogue_manager::begin_dialog;
use super::{persist_selected_app, remove_credential, replies, BotDeps};

/// How a command receives its inputs.
#[derive(Clone, Copy, Debug)]
pub enum InputMode {
    /// Inputs arrive as arguments on the command line (possibly none).
    Args {
        min_args: usize,
        usage: &'static str,
    },
    /// Inputs are collected conversationally through a dialog.
    Dialog(DialogKind),
}

/// One routable command with its guards and input style.
pub struct CommandSpec {
    pub name: &'static str,
    pub requires_login: bool,
    pub requires_app: bool,
    pub input: InputMode,
}

const BARE: InputMode = InputMode::Args {
    min_args: 0,
    usage: "",
};

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "start",
        requires_login: false,
        requires_app: false,
        input: BARE,
    },
    CommandSpec {
        name: "help",
        requires_login: false,
        requires_app: false,
        input: BARE,
    },
    CommandSpec {
        name: "status",
        requires_login: false,
        requires_app: false,
        input: BARE,
    },
    CommandSpec {
        name: "cancel",
        requires_login: false,
        requires_app: false,
        input: BARE,
    },
    CommandSpec {
        name: "login",
        requires_login: false,
        requires_app: false,
        input: InputMode::Dialog(DialogKind::Login),
    },
    CommandSpec {
        name: "logout",
        requires_login: true,
        requires_app: false,
        input: BARE,
    },
    CommandSpec {
        name: "apps",
        requires_login: true,
        requires_app: false,
        input: BARE,
    },
    CommandSpec {
        name: "create_app",
        requires_login: true,
        requires_app: false,
        input: InputMode::Dialog(DialogKind::CreateApp),
    },
    CommandSpec {
        name: "select_app",
        requires_login: true,
        requires_app: false,
        input: InputMode::Dialog(DialogKind::SelectApp),
    },
    CommandSpec {
        name: "app",
        requires_login: true,
        requires_app: true,
        input: BARE,
    },
    CommandSpec {
        name: "deploy",
        requires_login: true,
        requires_app: true,
        input: BARE,
    },
    CommandSpec {
        name: "redeploy",
        requires_login: true,
        requires_app: true,
        input: BARE,
    },
    CommandSpec {
        name: "logs",
        requires_login: true,
        requires_app: true,
        input: BARE,
    },
    CommandSpec {
        name: "env_vars",
        requires_login: true,
        requires_app: true,
        input: BARE,
    },
    CommandSpec {
        name: "set_env_var",
        requires_login: true,
        requires_app: true,
        input: InputMode::Dialog(DialogKind::SetEnvVar),
    },
    CommandSpec {
        name: "get_env_var",
        requires_login: true,
        requires_app: true,
        input: InputMode::Args {
            min_args: 1,
            usage: "Usage: /get_env_var KEY",
        },
    },
    CommandSpec {
        name: "delete_env_var",
        requires_login: true,
        requires_app: true,
        input: InputMode::Args {
            min_args: 1,
            usage: "Usage: /delete_env_var KEY",
        },
    },
    CommandSpec {
        name: "delete_app",
        requires_login: true,
        requires_app: true,
        input: BARE,
    },
];

pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

/// Parse `/name@botname arg1 arg2` into a lowercase command name and args.
/// Returns `None` for anything that is not command-shaped.
pub fn parse_command(text: &str) -> Option<(String, Vec<String>)> {
    let rest = text.trim().strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    let name = head.split('@').next().unwrap_or(head).to_lowercase();
    if name.is_empty() {
        return None;
    }
    let args = parts.map(|s| s.to_string()).collect();
    Some((name, args))
}

/// Route one command. Unknown commands produce no replies; guard failures
/// produce a fixed message and no side effect.
pub async fn dispatch(
    deps: &BotDeps,
    session: &mut Session,
    chat_id: i64,
    name: &str,
    args: &[String],
) -> Result<Vec<String>> {
    let Some(spec) = find_command(name) else {
        debug!(chat_id, command = %name, "Ignoring unknown command");
        return Ok(Vec::new());
    };

    if spec.requires_login && !session.logged_in {
        debug!(chat_id, command = %name, "Guard failure: not logged in");
        return Ok(vec![replies::NOT_LOGGED_IN.to_string()]);
    }
    if spec.requires_app && session.selected_app_id.is_none() {
        debug!(chat_id, command = %name, "Guard failure: no app selected");
        return Ok(vec![replies::NO_APP_SELECTED.to_string()]);
    }

    match spec.input {
        InputMode::Dialog(kind) => {
            let prompt = begin_dialog(session, kind);
            Ok(vec![prompt.to_string()])
        }
        InputMode::Args { min_args, usage } => {
            if args.len() < min_args {
                debug!(chat_id, command = %name, "Guard failure: missing arguments");
                return Ok(vec![usage.to_string()]);
            }
            run_command(deps, session, chat_id, spec.name, args).await
        }
    }
}

/// Execute a command whose inputs (if any) arrived as arguments. Guards
/// have already passed; the token/app re-checks below only defend the
/// invariant that guarded fields are present when their flag is set.
async fn run_command(
    deps: &BotDeps,
    session: &mut Session,
    chat_id: i64,
    name: &'static str,
    args: &[String],
) -> Result<Vec<String>> {
    match name {
        "start" => Ok(vec![replies::WELCOME.to_string()]),
        "help" => Ok(vec![replies::format_help()]),
        "status" => Ok(vec![replies::format_status(session)]),
        "cancel" => {
            if session.pending_dialog.take().is_some() {
                Ok(vec![replies::DIALOG_CANCELLED.to_string()])
            } else {
                Ok(vec![replies::NOTHING_TO_CANCEL.to_string()])
            }
        }
        "logout" => {
            session.log_out();
            remove_credential(deps, chat_id).await;
            info!(chat_id, "Chat logged out");
            Ok(vec![replies::LOGOUT_OK.to_string()])
        }
        "apps" => {
            let Some(token) = session.auth_token.clone() else {
                return Ok(vec![replies::NOT_LOGGED_IN.to_string()]);
            };
            Ok(vec![relay(deps.platform.list_apps(&token).await)])
        }
        "app" => {
            let Some((token, app_id)) = session_target(session) else {
                return Ok(vec![replies::NO_APP_SELECTED.to_string()]);
            };
            Ok(vec![relay(deps.platform.get_app(&token, &app_id).await)])
        }
        "deploy" => {
            let Some((token, app_id)) = session_target(session) else {
                return Ok(vec![replies::NO_APP_SELECTED.to_string()]);
            };
            match deps.platform.deploy(&token, &app_id).await {
                Ok(()) => Ok(vec![replies::DEPLOY_STARTED.to_string()]),
                Err(e) => {
                    warn!(chat_id, error = %e, "Deploy failed");
                    Ok(vec![e.to_string()])
                }
            }
        }
        "redeploy" => {
            let Some((token, app_id)) = session_target(session) else {
                return Ok(vec![replies::NO_APP_SELECTED.to_string()]);
            };
            match deps.platform.redeploy(&token, &app_id).await {
                Ok(()) => Ok(vec![replies::REDEPLOY_STARTED.to_string()]),
                Err(e) => {
                    warn!(chat_id, error = %e, "Redeploy failed");
                    Ok(vec![e.to_string()])
                }
            }
        }
        "logs" => {
            let Some((token, app_id)) = session_target(session) else {
                return Ok(vec![replies::NO_APP_SELECTED.to_string()]);
            };
            Ok(vec![relay(deps.platform.get_logs(&token, &app_id).await)])
        }
        "env_vars" => {
            let Some((token, app_id)) = session_target(session) else {
                return Ok(vec![replies::NO_APP_SELECTED.to_string()]);
            };
            Ok(vec![relay(
                deps.platform.get_env_vars(&token, &app_id).await,
            )])
        }
        "get_env_var" => {
            let Some((token, app_id)) = session_target(session) else {
                return Ok(vec![replies::NO_APP_SELECTED.to_string()]);
            };
            let key = match validate_env_key(&args[0]) {
                Ok(key) => key,
                Err(msg) => return Ok(vec![msg.to_string()]),
            };
            Ok(vec![relay(
                deps.platform.get_env_var(&token, &app_id, &key).await,
            )])
        }
        "delete_env_var" => {
            let Some((token, app_id)) = session_target(session) else {
                return Ok(vec![replies::NO_APP_SELECTED.to_string()]);
            };
            let key = match validate_env_key(&args[0]) {
                Ok(key) => key,
                Err(msg) => return Ok(vec![msg.to_string()]),
            };
            match deps.platform.delete_env_var(&token, &app_id, &key).await {
                Ok(()) => Ok(vec![replies::ENV_VAR_DELETED.to_string()]),
                Err(e) => {
                    warn!(chat_id, error = %e, "Env var deletion failed");
                    Ok(vec![e.to_string()])
                }
            }
        }
        "delete_app" => {
            let Some((token, app_id)) = session_target(session) else {
                return Ok(vec![replies::NO_APP_SELECTED.to_string()]);
            };
            match deps.platform.delete_app(&token, &app_id).await {
                Ok(()) => {
                    session.selected_app_id = None;
                    persist_selected_app(deps, chat_id, None).await;
                    info!(chat_id, app_id = %app_id, "App deleted");
                    Ok(vec![replies::APP_DELETED.to_string()])
                }
                Err(e) => {
                    warn!(chat_id, error = %e, "App deletion failed");
                    Ok(vec![e.to_string()])
                }
            }
        }
        _ => Ok(Vec::new()),
    }
}

/// Token and selected app for commands that target one app.
fn session_target(session: &Session) -> Option<(String, String)> {
    Some((
        session.auth_token.clone()?,
        session.selected_app_id.clone()?,
    ))
}

/// Relay a text-producing remote call result to the chat as-is.
fn relay(result: Result<String, crate::koyeb_errors::KoyebError>) -> String {
    match result {
        Ok(body) if body.trim().is_empty() => "(empty)".to_string(),
        Ok(body) => body,
        Err(e) => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_basic() {
        let (name, args) = parse_command("/login").unwrap();
        assert_eq!(name, "login");
        assert!(args.is_empty());
    }

    #[test]
    fn test_parse_command_with_args_and_bot_suffix() {
        let (name, args) = parse_command("/get_env_var@koyeb_bot PORT").unwrap();
        assert_eq!(name, "get_env_var");
        assert_eq!(args, vec!["PORT"]);
    }

    #[test]
    fn test_parse_command_rejects_free_text() {
        assert!(parse_command("hello there").is_none());
        assert!(parse_command("").is_none());
        assert!(parse_command("/").is_none());
    }

    #[test]
    fn test_command_table_has_no_duplicates() {
        for (i, spec) in COMMANDS.iter().enumerate() {
            assert!(
                COMMANDS[i + 1..].iter().all(|other| other.name != spec.name),
                "duplicate command: {}",
                spec.name
            );
        }
    }

    #[test]
    fn test_app_guard_implies_login_guard() {
        for spec in COMMANDS {
            if spec.requires_app {
                assert!(spec.requires_login, "{} requires app but not login", spec.name);
            }
        }
    }
}
