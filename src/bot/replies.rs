//! Fixed reply texts and message formatting helpers.

use crate::session::Session;

pub const WELCOME: &str = "Welcome to Koyeb Bot! Use /help to see available commands.";

pub const NOT_LOGGED_IN: &str = "You are not logged in. Use /login first.";
pub const NO_APP_SELECTED: &str = "No app selected. Use /select_app or /create_app first.";

pub const LOGIN_OK: &str = "Logged in successfully!";
pub const LOGOUT_OK: &str = "Logged out.";

pub const ENV_VAR_SET: &str = "Environment variable set successfully!";
pub const ENV_VAR_DELETED: &str = "Environment variable deleted.";

pub const DEPLOY_STARTED: &str = "Deployment started.";
pub const REDEPLOY_STARTED: &str = "Redeployment started.";
pub const APP_DELETED: &str = "App deleted.";

pub const DIALOG_CANCELLED: &str = "Cancelled.";
pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";
pub const DIALOG_EXPIRED: &str =
    "Your previous prompt expired. Please run the command again.";

pub fn format_help() -> String {
    [
        "Available commands:",
        "/login - log in with your Koyeb API key",
        "/logout - log out and forget your key",
        "/apps - list your apps",
        "/create_app - create a new app",
        "/select_app - choose the app to work on",
        "/app - show the selected app",
        "/deploy - deploy the selected app",
        "/redeploy - redeploy the selected app",
        "/logs - fetch logs for the selected app",
        "/env_vars - list environment variables",
        "/set_env_var - set an environment variable",
        "/get_env_var KEY - show one environment variable",
        "/delete_env_var KEY - delete an environment variable",
        "/delete_app - delete the selected app",
        "/status - show your session state",
        "/cancel - abort the current prompt",
    ]
    .join("\n")
}

pub fn format_status(session: &Session) -> String {
    let login = if session.logged_in {
        "logged in"
    } else {
        "logged out"
    };
    let app = session
        .selected_app_id
        .as_deref()
        .unwrap_or("none selected");
    let pending = match &session.pending_dialog {
        Some(dialog) => format!("{:?}", dialog.kind),
        None => "none".to_string(),
    };
    format!("Session: {login}\nApp: {app}\nPending prompt: {pending}")
}

pub fn format_app_created(app_id: &str) -> String {
    format!("App created with ID {app_id} and selected.")
}

pub fn format_app_selected(app_id: &str) -> String {
    format!("Selected app {app_id}.")
}
