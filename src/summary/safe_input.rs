//! Restricted input structure for the narrative layer.
//!
//! Only coarse, non-alarming material leaves this module: complaint labels,
//! a rough body-region inference, and soft context/attention labels. Never
//! raw free text, never anything that reads as a diagnosis.

use serde::Serialize;

use crate::types::ClinicalSummary;

const UPPER_KEYWORDS: [&str; 6] = ["首", "肩", "背中", "肩甲骨", "腕", "頭"];
const LOWER_KEYWORDS: [&str; 6] = ["腰", "骨盤", "股関節", "膝", "脚", "足"];

pub const AREA_WIDE: &str = "広い範囲";
pub const AREA_UPPER: &str = "上半身中心";
pub const AREA_LOWER: &str = "下半身中心";
pub const AREA_OTHER: &str = "全身・その他";

pub const CONTEXT_DAILY_LOAD: &str = "日常生活の負荷";
pub const ATTENTION_SLEEP: &str = "睡眠や休息の取りづらさ";

/// Safe material for AI narrative generation, derived from the clinical
/// summary. Serialized verbatim into the user instruction.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SafeNarrativeInput {
    pub main_complaints: Vec<String>,
    pub body_areas: Vec<String>,
    pub context_factors: Vec<String>,
    pub attention_points: Vec<String>,
    pub notes: Vec<String>,
}

impl SafeNarrativeInput {
    pub fn from_summary(summary: &ClinicalSummary) -> Self {
        let mut context_factors = Vec::new();
        // Any reported stress level, whatever its value, becomes the same
        // soft phrase — the number itself never reaches the user.
        if summary.stress_level.is_some() {
            context_factors.push(CONTEXT_DAILY_LOAD.to_string());
        }

        let mut attention_points = Vec::new();
        if summary.sleep_trouble == Some(true) {
            attention_points.push(ATTENTION_SLEEP.to_string());
        }

        Self {
            main_complaints: summary.chief_complaints.clone(),
            body_areas: infer_body_areas(&summary.chief_complaints),
            context_factors,
            attention_points,
            notes: vec![
                "これは医療的な診断ではなく、入力内容を整理したものです。".to_string(),
                "最終的な判断は来院時に状態を確認しながら行います。".to_string(),
            ],
        }
    }
}

/// Coarse body-region tendency from complaint labels. Substring matching
/// against fixed keyword lists; never more specific than a region.
fn infer_body_areas(complaints: &[String]) -> Vec<String> {
    if complaints.is_empty() {
        return Vec::new();
    }

    let has_upper = complaints
        .iter()
        .any(|c| UPPER_KEYWORDS.iter().any(|k| c.contains(k)));
    let has_lower = complaints
        .iter()
        .any(|c| LOWER_KEYWORDS.iter().any(|k| c.contains(k)));

    let area = match (has_upper, has_lower) {
        (true, true) => AREA_WIDE,
        (true, false) => AREA_UPPER,
        (false, true) => AREA_LOWER,
        (false, false) => AREA_OTHER,
    };
    vec![area.to_string()]
}
