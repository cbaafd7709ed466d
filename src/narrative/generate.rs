//! Gated narrative generation with deterministic fallback.

use crate::budget::BudgetGovernor;
use crate::providers::GenerationProvider;
use crate::summary::SafeNarrativeInput;

use super::{fallback, prompts};

/// Minimum accepted length for the overview tier, in characters.
pub const MIN_OVERVIEW_CHARS: usize = 120;

/// Minimum accepted length for the detail tier, in characters.
pub const MIN_DETAIL_CHARS: usize = 300;

/// Generate the short completion-screen overview.
pub async fn generate_overview(
    provider: Option<&dyn GenerationProvider>,
    budget: &BudgetGovernor,
    input: &SafeNarrativeInput,
) -> String {
    generate_tier(
        provider,
        budget,
        "overview",
        prompts::OVERVIEW_SYSTEM,
        &prompts::overview_user(input),
        MIN_OVERVIEW_CHARS,
        || fallback::overview_fallback(input),
    )
    .await
}

/// Generate the long LINE-channel detail.
pub async fn generate_detail(
    provider: Option<&dyn GenerationProvider>,
    budget: &BudgetGovernor,
    input: &SafeNarrativeInput,
) -> String {
    generate_tier(
        provider,
        budget,
        "detail",
        prompts::DETAIL_SYSTEM,
        &prompts::detail_user(input),
        MIN_DETAIL_CHARS,
        || fallback::detail_fallback(input),
    )
    .await
}

/// Shared tier flow: budget gate → provider call → length floor → record.
///
/// The counter only moves on a genuine success (text returned AND floor
/// met); every fallback path leaves it untouched.
async fn generate_tier(
    provider: Option<&dyn GenerationProvider>,
    budget: &BudgetGovernor,
    tier: &str,
    system: &str,
    user: &str,
    floor: usize,
    fallback: impl FnOnce() -> String,
) -> String {
    if !budget.allow_generation() {
        log::info!("{tier}: generation budget denied; using fallback text");
        return fallback();
    }

    let Some(provider) = provider else {
        log::info!("{tier}: no generation provider configured; using fallback text");
        return fallback();
    };

    match provider.generate(system, user).await {
        Ok(text) => {
            let chars = text.chars().count();
            if chars < floor {
                log::warn!(
                    "{tier}: generated text below floor ({chars} < {floor} chars); using fallback"
                );
                return fallback();
            }
            budget.record_generation_call();
            text
        }
        Err(e) => {
            log::warn!("{tier}: generation failed: {e}; using fallback text");
            fallback()
        }
    }
}
