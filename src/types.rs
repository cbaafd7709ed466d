//! Shared types for the summary and notification pipeline.

use serde::{Deserialize, Serialize};

/// Structured staff-facing extract of one intake payload.
///
/// Derived on demand by the Summary Engine and embedded in admin responses;
/// never persisted as its own row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalSummary {
    /// Reported symptom labels, source order, not deduplicated.
    pub chief_complaints: Vec<String>,
    /// Fixed-vocabulary warning labels, checklist order. Existence checks
    /// only — never severity-scored.
    pub red_flags: Vec<String>,
    /// `Some(true)` iff a numeric sleep-hours figure below 5 was reported.
    /// Absence of evidence stays `None`, never `Some(false)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_trouble: Option<bool>,
    /// `low` / `middle` / `high`, or a verbatim passthrough string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<String>,
    /// Single advisory label chosen by fixed priority.
    pub clinical_focus: String,
}

impl ClinicalSummary {
    pub fn has_red_flags(&self) -> bool {
        !self.red_flags.is_empty()
    }
}

/// An inbound messaging event used to correlate an external identity with a
/// previously issued link token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationEvent {
    /// Messaging-provider user id of the sender.
    #[serde(default)]
    pub source_user_id: Option<String>,
    /// Raw message text, expected to carry a `link=<token>` marker.
    #[serde(default)]
    pub message_text: String,
}

/// Result of the user-summary pipeline run, for the completion screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub overview: String,
    pub link_token: String,
}

/// Messaging-link state of an intake, for the admin views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// No token issued yet.
    Unlinked,
    /// Token issued, waiting for a correlation event.
    TokenIssued,
    /// Terminal: identity linked and detail text delivered.
    LinkedAndSent,
}
