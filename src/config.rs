//! Environment-backed configuration for the pipeline core.
//!
//! Every budget cap is fail-closed: an absent or non-numeric value becomes
//! `None`, and the corresponding gate denies. This is logged once at load
//! time so a misconfigured deployment is visible without being noisy.

use std::env;

/// Recognized configuration surface.
///
/// The HTTP layer, CORS, and storage location are owned by the host
/// application; only the knobs the pipeline core consumes live here.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Master switch for outbound LINE sends. Off by default.
    pub line_send_enabled: bool,
    /// Monthly spend cap (yen) for the text-generation provider.
    /// `None` = deny all generation calls.
    pub generation_cap_yen: Option<i64>,
    /// Monthly spend cap (yen) for outbound LINE messages.
    /// `None` or zero = deny all sends.
    pub send_cap_yen: Option<i64>,
    /// OpenAI API key. Absent = generation falls back to template text.
    pub openai_api_key: Option<String>,
    /// LINE Messaging API channel token. Absent = sends cannot happen.
    pub line_channel_token: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        let config = Self {
            line_send_enabled: env_flag("LINE_SEND_ENABLED"),
            generation_cap_yen: env_cap("OPENAI_API_MONTHLY_LIMIT_YEN"),
            send_cap_yen: env_cap("LINE_BUDGET_YEN"),
            openai_api_key: env_secret("OPENAI_API_KEY"),
            line_channel_token: env_secret("LINE_CHANNEL_ACCESS_TOKEN"),
        };

        if config.generation_cap_yen.is_none() {
            log::warn!("OPENAI_API_MONTHLY_LIMIT_YEN not set; AI generation disabled");
        }
        if config.send_cap_yen.is_none() {
            log::warn!("LINE_BUDGET_YEN not set; LINE sends disabled");
        }

        config
    }
}

/// Boolean flag: only the literal string "true" (case-insensitive) enables.
fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Yen cap: absent, empty, or non-numeric → `None` (deny).
fn env_cap(name: &str) -> Option<i64> {
    env::var(name).ok()?.trim().parse::<i64>().ok()
}

/// Secret: absent or empty → `None`.
fn env_secret(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}
