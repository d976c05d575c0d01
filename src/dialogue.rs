//! Dialog state for multi-step free-text input collection.
//!
//! Dialog kinds are closed and statically declared: each one knows how
//! many inputs it needs and what to ask at each step. The actual
//! transitions and completion actions live in `bot::dialogue_manager`.

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Pending dialogs older than this are treated as abandoned and cleared
/// when the chat's next message arrives.
pub const DIALOG_TTL: Duration = Duration::from_secs(15 * 60);

/// The fixed set of multi-step dialogs the bot supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogKind {
    Login,
    CreateApp,
    SelectApp,
    SetEnvVar,
}

impl DialogKind {
    /// Number of free-text inputs this dialog collects before its
    /// completion action runs.
    pub fn required_inputs(self) -> usize {
        match self {
            DialogKind::SetEnvVar => 2,
            _ => 1,
        }
    }

    /// Prompt sent when the dialog is waiting for input number `step`
    /// (zero-based).
    pub fn prompt(self, step: usize) -> &'static str {
        match (self, step) {
            (DialogKind::Login, _) => "Enter your Koyeb API key:",
            (DialogKind::CreateApp, _) => "Enter app name:",
            (DialogKind::SelectApp, _) => "Enter app ID:",
            (DialogKind::SetEnvVar, 0) => "Enter key:",
            (DialogKind::SetEnvVar, _) => "Enter value:",
        }
    }
}

/// A dialog in progress: which kind, plus the inputs gathered so far.
#[derive(Clone, Debug)]
pub struct PendingDialog {
    pub kind: DialogKind,
    pub collected: Vec<String>,
    started_at: Instant,
}

impl PendingDialog {
    pub fn new(kind: DialogKind) -> Self {
        Self {
            kind,
            collected: Vec::new(),
            started_at: Instant::now(),
        }
    }

    /// Store the next collected value.
    pub fn push(&mut self, value: String) {
        self.collected.push(value);
    }

    /// True once the declared input count has been reached.
    pub fn is_complete(&self) -> bool {
        self.collected.len() >= self.kind.required_inputs()
    }

    /// Index of the input the dialog is currently waiting for.
    pub fn current_step(&self) -> usize {
        self.collected.len()
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.started_at.elapsed() > ttl
    }
}

static APP_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]{1,62}$").unwrap());
static ENV_KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Validates an API key input.
pub fn validate_api_key(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("API key cannot be empty.");
    }

    if trimmed.contains(char::is_whitespace) {
        return Err("API key cannot contain spaces.");
    }

    Ok(trimmed.to_string())
}

/// Validates an app name input (Koyeb app names are DNS-label-like).
pub fn validate_app_name(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("App name cannot be empty.");
    }

    if !APP_NAME_PATTERN.is_match(trimmed) {
        return Err(
            "App name must be lowercase letters, digits and dashes, starting with a letter (2-63 characters).",
        );
    }

    Ok(trimmed.to_string())
}

/// Validates an app id input.
pub fn validate_app_id(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("App ID cannot be empty.");
    }

    if trimmed.contains(char::is_whitespace) {
        return Err("App ID cannot contain spaces.");
    }

    Ok(trimmed.to_string())
}

/// Validates an environment variable key.
pub fn validate_env_key(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("Environment variable key cannot be empty.");
    }

    if !ENV_KEY_PATTERN.is_match(trimmed) {
        return Err("Environment variable key must match [A-Za-z_][A-Za-z0-9_]*.");
    }

    Ok(trimmed.to_string())
}

/// Validates an environment variable value.
pub fn validate_env_value(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err("Environment variable value cannot be empty.");
    }

    if trimmed.len() > 4096 {
        return Err("Environment variable value is too long.");
    }

    Ok(trimmed.to_string())
}
