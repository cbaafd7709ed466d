//! Rule-based Summary Engine.
//!
//! Pure mapping from a raw intake payload to the staff-facing
//! [`ClinicalSummary`](crate::types::ClinicalSummary), plus the restricted
//! input structure handed to the narrative layer. No I/O, no diagnosis —
//! shallow keyword and existence checks only.

pub mod extract;
pub mod safe_input;

pub use extract::{summarize, RulesetVersion};
pub use safe_input::SafeNarrativeInput;
