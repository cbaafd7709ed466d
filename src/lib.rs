//! Intake summarization and gated LINE notification core.
//!
//! The pipeline: a raw questionnaire payload is stored verbatim, a
//! rule-based engine derives a staff-facing clinical summary, two
//! submitter-facing narratives are generated through a budget-gated
//! external model (with deterministic fallback), and — once the submitter
//! links their messaging account via a one-time token — the detail
//! narrative is delivered over LINE, at most once per intake.
//!
//! HTTP routing, CORS, and report export live in the host application;
//! this crate owns the rules, the gates, and the never-double-send
//! contract.

pub mod budget;
pub mod config;
pub mod db;
pub mod error;
pub mod linking;
pub mod narrative;
pub mod pipeline;
pub mod providers;
pub mod state;
pub mod summary;
pub mod types;

pub use budget::BudgetGovernor;
pub use config::Config;
pub use db::IntakeDb;
pub use error::{PipelineError, ProviderError};
pub use linking::{handle_correlation_event, issue_token, resend, ResendStatus, WebhookOutcome};
pub use pipeline::{admin_summary, ingest_intake, prepare_user_summary, AdminIntakeDetail};
pub use state::AppState;
pub use summary::{summarize, SafeNarrativeInput};
pub use types::{ClinicalSummary, CorrelationEvent, LinkState, UserSummary};
