//! Monthly spend gates for the paid external capabilities.
//!
//! Two independent gates: one for text-generation calls, one for outbound
//! LINE messages. Counters live for the process lifetime only — a restart
//! silently resets them. That is a deliberate trade: the gate exists to
//! stop runaway spend, not to be an accounting system.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};

use crate::config::Config;

/// Assumed cost of one generation call, in yen.
pub const GENERATION_COST_YEN: i64 = 5;

/// Assumed cost of one outbound message, in yen.
pub const MESSAGE_COST_YEN: i64 = 5;

/// Process-scoped budget gates. Injected wherever gating is needed; there
/// is no global instance.
pub struct BudgetGovernor {
    generation_cap_yen: Option<i64>,
    send_cap_yen: Option<i64>,
    generation_calls: AtomicU32,
}

impl BudgetGovernor {
    pub fn new(generation_cap_yen: Option<i64>, send_cap_yen: Option<i64>) -> Self {
        Self {
            generation_cap_yen,
            send_cap_yen,
            generation_calls: AtomicU32::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.generation_cap_yen, config.send_cap_yen)
    }

    /// Whether another generation call fits under the monthly cap.
    /// No cap configured → deny (fail closed).
    pub fn allow_generation(&self) -> bool {
        let Some(cap) = self.generation_cap_yen else {
            return false;
        };
        let estimated = i64::from(self.generation_calls.load(Ordering::Relaxed))
            * GENERATION_COST_YEN;
        estimated < cap
    }

    /// Record one successful generation call. Must only be invoked after a
    /// genuine provider success — fallback paths never count.
    pub fn record_generation_call(&self) {
        self.generation_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn generation_calls(&self) -> u32 {
        self.generation_calls.load(Ordering::Relaxed)
    }

    /// Whether an outbound send is allowed right now.
    ///
    /// Known gap: this gate checks only that a positive cap is configured;
    /// it does not track actual send volume. Kept as-is on purpose — see
    /// `test_allow_send_does_not_track_usage`.
    pub fn allow_send(&self, _now: DateTime<Utc>) -> bool {
        self.send_cap_yen.map(|cap| cap > 0).unwrap_or(false)
    }
}
