//! Pipeline orchestration: the operations the host endpoints call.
//!
//! Each function here is one storage round-trip plus pure computation and
//! gated external calls; HTTP wiring stays outside the crate.

use serde_json::Value;

use crate::error::PipelineError;
use crate::linking::issue_token;
use crate::narrative::{generate_detail, generate_overview};
use crate::state::AppState;
use crate::summary::{summarize, SafeNarrativeInput};
use crate::types::{ClinicalSummary, LinkState, UserSummary};

/// Staff-facing detail view of one intake.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminIntakeDetail {
    pub id: i64,
    /// The raw payload, decoded. A payload that no longer parses comes back
    /// as an empty object, not an error.
    pub raw: Value,
    pub summary: ClinicalSummary,
    pub overview_text: Option<String>,
    pub detail_text: Option<String>,
    pub link_state: LinkState,
    pub sent_at: Option<String>,
    pub created_at: String,
}

/// Store a submitted questionnaire payload verbatim; returns the new id.
pub fn ingest_intake(state: &AppState, payload: &Value) -> Result<i64, PipelineError> {
    let payload_json = payload.to_string();
    let id = state.db.lock().insert_intake(&payload_json)?;
    log::info!("intake {id} stored ({} bytes)", payload_json.len());
    Ok(id)
}

/// The user-summary flow: derive the clinical summary, generate both
/// narrative tiers (budget-gated, with deterministic fallback), issue the
/// link token, and persist the texts. Returns the overview and token for
/// the completion screen.
///
/// Safe to re-run: narratives are regenerated and overwritten, the token
/// is never rotated.
pub async fn prepare_user_summary(
    state: &AppState,
    intake_id: i64,
) -> Result<UserSummary, PipelineError> {
    let intake = state
        .db
        .lock()
        .get_intake(intake_id)?
        .ok_or(PipelineError::IntakeNotFound(intake_id))?;

    let payload = parse_payload(&intake.payload);
    let summary = summarize(&payload);
    let input = SafeNarrativeInput::from_summary(&summary);

    let overview = generate_overview(state.generation_provider(), &state.budget, &input).await;
    let detail = generate_detail(state.generation_provider(), &state.budget, &input).await;

    let link_token = issue_token(state, intake_id)?;
    state.db.lock().set_narratives(intake_id, &overview, &detail)?;

    Ok(UserSummary {
        overview,
        link_token,
    })
}

/// Staff view of one intake: raw payload plus the derived summary. The
/// summary is computed on read, never persisted.
pub fn admin_summary(
    state: &AppState,
    intake_id: i64,
) -> Result<AdminIntakeDetail, PipelineError> {
    let intake = state
        .db
        .lock()
        .get_intake(intake_id)?
        .ok_or(PipelineError::IntakeNotFound(intake_id))?;

    let raw = parse_payload(&intake.payload);
    let summary = summarize(&raw);

    Ok(AdminIntakeDetail {
        id: intake.id,
        raw,
        summary,
        overview_text: intake.overview_text.clone(),
        detail_text: intake.detail_text.clone(),
        link_state: intake.link_state(),
        sent_at: intake.sent_at.clone(),
        created_at: intake.created_at.clone(),
    })
}

/// Stored payload text → JSON value; parse failure degrades to an empty
/// object so a corrupt row cannot block summaries or narratives.
fn parse_payload(payload: &str) -> Value {
    serde_json::from_str(payload).unwrap_or_else(|_| Value::Object(Default::default()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::config::Config;
    use crate::db::IntakeDb;
    use crate::linking::{handle_correlation_event, WebhookOutcome, INITIAL_REPLY};
    use crate::narrative::fallback::{detail_fallback, overview_fallback};
    use crate::providers::MessagingProvider;
    use crate::summary::extract::{FLAG_MEDICAL_HISTORY, FOCUS_RED_FLAG};
    use crate::types::CorrelationEvent;

    fn offline_state() -> AppState {
        // No providers, no caps: generation falls back, sends denied.
        AppState::with_providers(
            Config::default(),
            IntakeDb::open_in_memory().unwrap(),
            None,
            None,
        )
    }

    fn reference_payload() -> Value {
        json!({
            "symptoms": [{"symptom": "腰痛"}],
            "sleepHours": 4,
            "medicalHistory": true
        })
    }

    #[tokio::test]
    async fn test_prepare_uses_fallbacks_when_generation_unavailable() {
        let state = offline_state();
        let id = ingest_intake(&state, &reference_payload()).unwrap();

        let result = prepare_user_summary(&state, id).await.unwrap();

        let summary = summarize(&reference_payload());
        let input = SafeNarrativeInput::from_summary(&summary);
        assert_eq!(result.overview, overview_fallback(&input));
        assert_eq!(state.budget.generation_calls(), 0);

        let intake = state.db.lock().get_intake(id).unwrap().unwrap();
        assert_eq!(intake.overview_text.as_deref(), Some(result.overview.as_str()));
        assert_eq!(intake.detail_text.as_deref(), Some(detail_fallback(&input).as_str()));
        assert_eq!(intake.link_token.as_deref(), Some(result.link_token.as_str()));
    }

    #[tokio::test]
    async fn test_prepare_rerun_regenerates_but_keeps_token() {
        let state = offline_state();
        let id = ingest_intake(&state, &reference_payload()).unwrap();

        let first = prepare_user_summary(&state, id).await.unwrap();
        let second = prepare_user_summary(&state, id).await.unwrap();
        assert_eq!(first.link_token, second.link_token);
    }

    #[tokio::test]
    async fn test_prepare_unknown_intake_errors() {
        let state = offline_state();
        assert!(matches!(
            prepare_user_summary(&state, 42).await,
            Err(PipelineError::IntakeNotFound(42))
        ));
    }

    #[test]
    fn test_admin_summary_reference_scenario() {
        let state = offline_state();
        let id = ingest_intake(&state, &reference_payload()).unwrap();

        let detail = admin_summary(&state, id).unwrap();
        assert_eq!(detail.summary.chief_complaints, vec!["腰痛"]);
        assert_eq!(detail.summary.red_flags, vec![FLAG_MEDICAL_HISTORY]);
        assert_eq!(detail.summary.sleep_trouble, Some(true));
        assert_eq!(detail.summary.clinical_focus, FOCUS_RED_FLAG);
        assert_eq!(detail.link_state, LinkState::Unlinked);
    }

    #[test]
    fn test_admin_summary_absorbs_corrupt_payload() {
        let state = offline_state();
        let id = state.db.lock().insert_intake("{not json").unwrap();

        let detail = admin_summary(&state, id).unwrap();
        assert_eq!(detail.raw, json!({}));
        assert!(detail.summary.chief_complaints.is_empty());
    }

    /// Full flow: ingest → prepare → correlation event → delivery.
    #[tokio::test]
    async fn test_end_to_end_ingest_to_send() {
        struct Recorder(parking_lot::Mutex<Vec<String>>);

        #[async_trait::async_trait]
        impl MessagingProvider for Recorder {
            async fn push(
                &self,
                _to: &str,
                text: &str,
            ) -> Result<(), crate::error::ProviderError> {
                self.0.lock().push(text.to_string());
                Ok(())
            }
        }

        let messenger = Arc::new(Recorder(parking_lot::Mutex::new(Vec::new())));
        let config = Config {
            line_send_enabled: true,
            send_cap_yen: Some(500),
            ..Default::default()
        };
        let state = AppState::with_providers(
            config,
            IntakeDb::open_in_memory().unwrap(),
            None,
            Some(messenger.clone() as Arc<dyn MessagingProvider>),
        );

        let id = ingest_intake(&state, &reference_payload()).unwrap();
        let prepared = prepare_user_summary(&state, id).await.unwrap();

        let event = CorrelationEvent {
            source_user_id: Some("U_e2e".to_string()),
            message_text: format!("link={}", prepared.link_token),
        };
        let outcome = handle_correlation_event(&state, &event).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Sent { intake_id: id });

        let sent = messenger.0.lock().clone();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], INITIAL_REPLY);
        // The delivered detail is exactly the stored narrative.
        let intake = state.db.lock().get_intake(id).unwrap().unwrap();
        assert_eq!(Some(sent[1].as_str()), intake.detail_text.as_deref());
        assert_eq!(detail_view_state(&state, id), LinkState::LinkedAndSent);
    }

    fn detail_view_state(state: &AppState, id: i64) -> LinkState {
        admin_summary(state, id).unwrap().link_state
    }
}
