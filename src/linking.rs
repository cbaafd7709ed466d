//! Link-token lifecycle and the gated, idempotent outbound send.
//!
//! Per-intake states, in order and never skipping backward:
//! `Unlinked → TokenIssued → LinkedAndSent` (terminal). There is no failed
//! state — a failed delivery leaves the record where it was, eligible for
//! retry on the next valid correlation event.
//!
//! The inbound webhook is untrusted and retried by the provider, so every
//! internal outcome here maps to the same benign acknowledgment. The one
//! contract that must hold under duplicates and races: at most one send is
//! ever recorded per intake. Two layers enforce it — a per-intake async
//! lock held across the delivery attempt, and a compare-and-set commit on
//! `sent_at` underneath.

use std::sync::OnceLock;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use serde::Serialize;

use crate::db::DbError;
use crate::error::{PipelineError, ProviderError};
use crate::providers::MessagingProvider;
use crate::state::AppState;
use crate::types::CorrelationEvent;

/// Fixed first message, sent before the detail narrative. May repeat if a
/// partial failure is retried; the detail text cannot, because it is gated
/// by the commit.
pub const INITIAL_REPLY: &str = "\
友だち追加ありがとうございます。\n\
ご入力いただいた問診内容の整理ができましたので、このあとのメッセージでお送りします。\n\
ご不明な点があれば、来院時にお気軽にお尋ねください。";

const TOKEN_LEN: usize = 32;

/// Internal outcome of one correlation event.
///
/// Typed for logging and tests; the transport boundary collapses every
/// variant to the same generic success via [`WebhookOutcome::ack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// No `link=` marker in the message text.
    NoToken,
    /// Marker present but the event carried no sender identity.
    NoSourceUser,
    /// Token does not match any intake.
    UnknownToken,
    /// Intake already notified; duplicate delivery absorbed.
    AlreadySent,
    /// Outbound sends are switched off.
    SendDisabled,
    /// The send budget gate denied.
    BudgetDenied,
    /// Intake has no stored detail narrative to deliver.
    NoDetailText,
    /// A delivery call failed; nothing was committed.
    DeliveryFailed,
    /// Both messages delivered and the send recorded.
    Sent { intake_id: i64 },
}

impl WebhookOutcome {
    /// The response body for the inbound transport — identical for every
    /// outcome, to avoid provider-side retry storms and probing.
    pub fn ack(&self) -> &'static str {
        "ok"
    }
}

/// Operator-facing result of a manual resend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResendStatus {
    AlreadyLinked,
    NoLinkToken,
    SendDisabled,
    BudgetExceeded,
    /// All gates pass, but no messaging identity is known yet — the user
    /// must send the `link=` message again.
    NeedsUserAction,
}

/// Issue the link token for an intake, idempotently: an existing token is
/// returned unchanged, never rotated.
pub fn issue_token(state: &AppState, intake_id: i64) -> Result<String, DbError> {
    let candidate = new_link_token();
    state
        .db
        .lock()
        .set_link_token_if_absent(intake_id, &candidate)
}

fn new_link_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Pull a token out of the fixed `link=<token>` marker, if present.
pub fn extract_link_token(text: &str) -> Option<String> {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    let re = MARKER.get_or_init(|| {
        Regex::new(r"link=([A-Za-z0-9_\-]+)").expect("static marker pattern")
    });
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Consume one inbound correlation event.
///
/// Unknown tokens, duplicates, disabled sends, and delivery failures are
/// all no-op outcomes, not errors; only storage failures propagate. Checks
/// run in a fixed order, and the sent-marker check is repeated under the
/// per-intake lock so concurrent duplicates cannot both pass it.
pub async fn handle_correlation_event(
    state: &AppState,
    event: &CorrelationEvent,
) -> Result<WebhookOutcome, PipelineError> {
    let Some(token) = extract_link_token(&event.message_text) else {
        log::info!("webhook: no link marker in message");
        return Ok(WebhookOutcome::NoToken);
    };

    let Some(user_id) = event
        .source_user_id
        .as_deref()
        .filter(|id| !id.is_empty())
    else {
        log::info!("webhook: link marker without source user");
        return Ok(WebhookOutcome::NoSourceUser);
    };

    let Some(intake) = state.db.lock().find_by_token(&token)? else {
        log::info!("webhook: token not found");
        return Ok(WebhookOutcome::UnknownToken);
    };

    if intake.sent_at.is_some() {
        log::info!("webhook: intake {} already sent", intake.id);
        return Ok(WebhookOutcome::AlreadySent);
    }

    // Critical section: one correlation event per intake at a time, held
    // across delivery and commit.
    let lock = state.send_lock(intake.id);
    let _guard = lock.lock().await;

    let intake = state
        .db
        .lock()
        .get_intake(intake.id)?
        .ok_or(PipelineError::IntakeNotFound(intake.id))?;
    if intake.sent_at.is_some() {
        log::info!("webhook: intake {} sent by a concurrent event", intake.id);
        return Ok(WebhookOutcome::AlreadySent);
    }

    if !state.config.line_send_enabled {
        log::info!("webhook: send disabled; intake {} left linkable", intake.id);
        return Ok(WebhookOutcome::SendDisabled);
    }

    let now = Utc::now();
    if !state.budget.allow_send(now) {
        log::warn!("webhook: send budget denied for intake {}", intake.id);
        return Ok(WebhookOutcome::BudgetDenied);
    }

    let Some(messaging) = state.messaging_provider() else {
        log::warn!("webhook: no messaging credential configured");
        return Ok(WebhookOutcome::SendDisabled);
    };

    let detail = match intake.detail_text.as_deref() {
        Some(text) if !text.is_empty() => text,
        _ => {
            log::warn!("webhook: intake {} has no detail text", intake.id);
            return Ok(WebhookOutcome::NoDetailText);
        }
    };

    match deliver(messaging, user_id, detail).await {
        Ok(()) => {
            // Single commit: identity + sent marker together, CAS-guarded.
            let committed = state.db.lock().mark_sent(intake.id, user_id, now)?;
            if committed {
                log::info!("webhook: intake {} linked and sent to {user_id}", intake.id);
                Ok(WebhookOutcome::Sent {
                    intake_id: intake.id,
                })
            } else {
                Ok(WebhookOutcome::AlreadySent)
            }
        }
        Err(e) => {
            // No commit — the record stays TokenIssued for a later retry.
            log::warn!("webhook: delivery failed for intake {}: {e}", intake.id);
            Ok(WebhookOutcome::DeliveryFailed)
        }
    }
}

async fn deliver(
    messaging: &dyn MessagingProvider,
    to: &str,
    detail: &str,
) -> Result<(), ProviderError> {
    messaging.push(to, INITIAL_REPLY).await?;
    messaging.push(to, detail).await
}

/// Operator-triggered resend. Runs the same gates as the webhook path, but
/// since no messaging identity exists before a correlation event, the
/// actual re-send can only happen through a fresh `link=` message. Operator
/// calls are trusted: an unknown intake id is a hard error here.
pub fn resend(state: &AppState, intake_id: i64) -> Result<ResendStatus, PipelineError> {
    let intake = state
        .db
        .lock()
        .get_intake(intake_id)?
        .ok_or(PipelineError::IntakeNotFound(intake_id))?;

    if intake.linked_user_id.is_some() {
        return Ok(ResendStatus::AlreadyLinked);
    }
    if intake.link_token.is_none() {
        return Ok(ResendStatus::NoLinkToken);
    }
    if !state.config.line_send_enabled {
        return Ok(ResendStatus::SendDisabled);
    }
    if !state.budget.allow_send(Utc::now()) {
        return Ok(ResendStatus::BudgetExceeded);
    }

    Ok(ResendStatus::NeedsUserAction)
}
