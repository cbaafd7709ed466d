//! Narrative generation for the submitter-facing texts.
//!
//! Two tiers: a short overview for the completion screen and a longer
//! detail for the LINE channel. Both run through the budget gate, call the
//! external generation capability when allowed, validate the result against
//! a per-tier length floor, and otherwise fall back to deterministic
//! template text built from the same safe input. Downstream consumers treat
//! generated and fallback text as equally valid.

pub mod fallback;
pub mod generate;
pub mod prompts;

pub use generate::{generate_detail, generate_overview, MIN_DETAIL_CHARS, MIN_OVERVIEW_CHARS};
