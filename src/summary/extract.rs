//! Extraction rules: payload → ClinicalSummary.
//!
//! Total and side-effect-free: the same payload always yields the same
//! summary, and nothing here can fail. Missing or mistyped fields degrade
//! to empty/unknown, because this output feeds both the admin view and the
//! narrative generator and neither may be blocked by a malformed form.

use serde_json::Value;

use crate::types::ClinicalSummary;

// Fixed vocabulary. These strings are contract: they appear in admin views,
// CSV-era exports, and the clinical-focus keyword rules.
pub const FLAG_MEDICAL_HISTORY: &str = "既往歴あり";
pub const FLAG_NUMBNESS: &str = "しびれの訴えあり";
pub const FLAG_NIGHT_PAIN: &str = "夜間痛の訴えあり";

pub const FOCUS_RED_FLAG: &str = "注意所見あり（評価優先）";
pub const FOCUS_AUTONOMIC: &str = "自律神経アプローチ優先";
pub const FOCUS_PELVIS: &str = "骨盤・下肢連動評価";
pub const FOCUS_CERVICAL: &str = "頚肩部・姿勢評価";
pub const FOCUS_WHOLE_BODY: &str = "全身バランス評価";

/// Which generation of the questionnaire produced this payload.
///
/// The two historical rulesets are one strategy selected by payload shape:
/// the current form sends `symptoms` as an array of objects; the earlier
/// form sent plain strings and carried its own red-flag checkboxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesetVersion {
    Legacy,
    V2,
}

impl RulesetVersion {
    pub fn detect(payload: &Value) -> Self {
        match payload.get("symptoms").and_then(Value::as_array) {
            Some(items) if items.iter().any(Value::is_object) => RulesetVersion::V2,
            _ => RulesetVersion::Legacy,
        }
    }
}

/// Build the staff-facing summary from a raw payload.
pub fn summarize(payload: &Value) -> ClinicalSummary {
    let version = RulesetVersion::detect(payload);
    let chief_complaints = extract_chief_complaints(payload, version);
    let red_flags = extract_red_flags(payload, version);
    let sleep_trouble = extract_sleep_trouble(payload);
    let stress_level = normalize_stress_level(payload.get("stressLevel"));
    let clinical_focus =
        determine_clinical_focus(&chief_complaints, &red_flags, sleep_trouble);

    ClinicalSummary {
        chief_complaints,
        red_flags,
        sleep_trouble,
        stress_level,
        clinical_focus,
    }
}

/// Chief complaints in source order. Elements that don't match the expected
/// shape are skipped silently.
fn extract_chief_complaints(payload: &Value, version: RulesetVersion) -> Vec<String> {
    let Some(symptoms) = payload.get("symptoms").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut result = Vec::new();
    for entry in symptoms {
        let label = match version {
            RulesetVersion::V2 => entry.get("symptom").and_then(Value::as_str),
            RulesetVersion::Legacy => entry.as_str(),
        };
        match label {
            Some(s) if !s.is_empty() => result.push(s.to_string()),
            _ => {}
        }
    }
    result
}

/// Fixed red-flag checklist. Existence checks only; output order is
/// checklist order, not input order.
fn extract_red_flags(payload: &Value, version: RulesetVersion) -> Vec<String> {
    let mut flags = Vec::new();

    if is_truthy(payload.get("medicalHistory")) {
        flags.push(FLAG_MEDICAL_HISTORY.to_string());
    }

    // The earlier form had dedicated checkboxes for these.
    if version == RulesetVersion::Legacy {
        if is_truthy(payload.get("numbness")) {
            flags.push(FLAG_NUMBNESS.to_string());
        }
        if is_truthy(payload.get("nightPain")) {
            flags.push(FLAG_NIGHT_PAIN.to_string());
        }
    }

    flags
}

/// `Some(true)` only for a reported numeric figure strictly below 5 hours.
/// Absence of evidence is not evidence of absence, so there is no
/// `Some(false)` path.
fn extract_sleep_trouble(payload: &Value) -> Option<bool> {
    let hours = payload.get("sleepHours")?.as_f64()?;
    if hours < 5.0 {
        Some(true)
    } else {
        None
    }
}

/// Normalize a numeric or string stress level to low / middle / high.
/// Strings pass through verbatim; any other shape is unknown.
fn normalize_stress_level(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => {
            let v = n.as_i64()?;
            let level = if v <= 2 {
                "low"
            } else if v == 3 {
                "middle"
            } else {
                "high"
            };
            Some(level.to_string())
        }
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Advisory focus label, strict priority, first match wins. Rules are never
/// combined.
fn determine_clinical_focus(
    chief_complaints: &[String],
    red_flags: &[String],
    sleep_trouble: Option<bool>,
) -> String {
    if !red_flags.is_empty() {
        return FOCUS_RED_FLAG.to_string();
    }

    if sleep_trouble == Some(true) {
        return FOCUS_AUTONOMIC.to_string();
    }

    if chief_complaints.iter().any(|c| c == "腰痛") {
        return FOCUS_PELVIS.to_string();
    }

    if chief_complaints.iter().any(|c| c == "首こり" || c == "肩こり") {
        return FOCUS_CERVICAL.to_string();
    }

    FOCUS_WHOLE_BODY.to_string()
}

/// Source-compatible truthiness: null, false, 0, "" and empty containers
/// are falsy; everything else is truthy.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_payload() {
        // The canonical end-to-end scenario.
        let payload = json!({
            "symptoms": [{"symptom": "腰痛"}],
            "sleepHours": 4,
            "medicalHistory": true
        });
        let summary = summarize(&payload);
        assert_eq!(summary.chief_complaints, vec!["腰痛"]);
        assert_eq!(summary.red_flags, vec![FLAG_MEDICAL_HISTORY]);
        assert_eq!(summary.sleep_trouble, Some(true));
        assert_eq!(summary.clinical_focus, FOCUS_RED_FLAG);
    }

    #[test]
    fn test_never_fails_on_malformed_payloads() {
        let junk = [
            json!(null),
            json!([]),
            json!("not an object"),
            json!({"symptoms": "oops", "sleepHours": "eight", "stressLevel": []}),
            json!({"symptoms": [42, null, {"wrongKey": "x"}, {"symptom": ""}]}),
            json!({"medicalHistory": {}, "sleepHours": {"h": 4}}),
        ];
        for payload in &junk {
            let summary = summarize(payload);
            assert!(summary.chief_complaints.is_empty(), "payload: {payload}");
            assert!(summary.red_flags.is_empty());
            assert_eq!(summary.sleep_trouble, None);
            assert_eq!(summary.stress_level, None);
            assert_eq!(summary.clinical_focus, FOCUS_WHOLE_BODY);
        }
    }

    #[test]
    fn test_complaints_keep_source_order_and_duplicates() {
        let payload = json!({
            "symptoms": [
                {"symptom": "首こり"},
                {"symptom": "腰痛"},
                {"symptom": "首こり"}
            ]
        });
        let summary = summarize(&payload);
        assert_eq!(summary.chief_complaints, vec!["首こり", "腰痛", "首こり"]);
    }

    #[test]
    fn test_focus_priority_red_flag_beats_sleep() {
        let payload = json!({
            "symptoms": [{"symptom": "腰痛"}],
            "sleepHours": 3,
            "medicalHistory": true
        });
        assert_eq!(summarize(&payload).clinical_focus, FOCUS_RED_FLAG);
    }

    #[test]
    fn test_focus_priority_sleep_beats_complaint_keywords() {
        let payload = json!({
            "symptoms": [{"symptom": "腰痛"}],
            "sleepHours": 4
        });
        assert_eq!(summarize(&payload).clinical_focus, FOCUS_AUTONOMIC);
    }

    #[test]
    fn test_focus_complaint_keywords() {
        let pelvis = json!({"symptoms": [{"symptom": "腰痛"}]});
        assert_eq!(summarize(&pelvis).clinical_focus, FOCUS_PELVIS);

        let cervical = json!({"symptoms": [{"symptom": "肩こり"}]});
        assert_eq!(summarize(&cervical).clinical_focus, FOCUS_CERVICAL);

        let other = json!({"symptoms": [{"symptom": "頭痛"}]});
        assert_eq!(summarize(&other).clinical_focus, FOCUS_WHOLE_BODY);
    }

    #[test]
    fn test_sleep_trouble_boundary() {
        let low = json!({"sleepHours": 4.5});
        assert_eq!(summarize(&low).sleep_trouble, Some(true));

        // Exactly 5 is not trouble, and is not "false" either.
        let exact = json!({"sleepHours": 5});
        assert_eq!(summarize(&exact).sleep_trouble, None);

        let absent = json!({});
        assert_eq!(summarize(&absent).sleep_trouble, None);
    }

    #[test]
    fn test_stress_level_normalization() {
        for (input, expected) in [
            (json!({"stressLevel": 1}), Some("low")),
            (json!({"stressLevel": 2}), Some("low")),
            (json!({"stressLevel": 3}), Some("middle")),
            (json!({"stressLevel": 4}), Some("high")),
            (json!({"stressLevel": 9}), Some("high")),
            (json!({"stressLevel": "とても高い"}), Some("とても高い")),
            (json!({"stressLevel": [3]}), None),
            (json!({}), None),
        ] {
            assert_eq!(
                summarize(&input).stress_level.as_deref(),
                expected,
                "input: {input}"
            );
        }
    }

    #[test]
    fn test_legacy_ruleset_selected_by_payload_shape() {
        let legacy = json!({
            "symptoms": ["腰痛", "肩こり"],
            "numbness": true,
            "nightPain": true,
            "medicalHistory": true
        });
        assert_eq!(RulesetVersion::detect(&legacy), RulesetVersion::Legacy);

        let summary = summarize(&legacy);
        assert_eq!(summary.chief_complaints, vec!["腰痛", "肩こり"]);
        // Checklist order, not input order.
        assert_eq!(
            summary.red_flags,
            vec![FLAG_MEDICAL_HISTORY, FLAG_NUMBNESS, FLAG_NIGHT_PAIN]
        );
    }

    #[test]
    fn test_v2_ruleset_ignores_legacy_flags() {
        let payload = json!({
            "symptoms": [{"symptom": "腰痛"}],
            "numbness": true,
            "nightPain": true
        });
        assert_eq!(RulesetVersion::detect(&payload), RulesetVersion::V2);
        assert!(summarize(&payload).red_flags.is_empty());
    }

    #[test]
    fn test_truthiness_follows_source_semantics() {
        let payload = json!({"medicalHistory": 0});
        assert!(summarize(&payload).red_flags.is_empty());

        let payload = json!({"medicalHistory": ""});
        assert!(summarize(&payload).red_flags.is_empty());

        let payload = json!({"medicalHistory": "高血圧"});
        assert_eq!(summarize(&payload).red_flags, vec![FLAG_MEDICAL_HISTORY]);
    }
}
