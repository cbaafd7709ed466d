//! Deterministic fallback narratives.
//!
//! Used whenever AI generation is denied, unavailable, or fails the quality
//! floor. Templated from the same safe input as the AI path (up to three
//! complaint labels, the inferred region, up to two context labels) so the
//! result is never empty or generic-only, and always satisfies the same
//! length contract as a successful generation.

use crate::summary::SafeNarrativeInput;

use super::prompts::DETAIL_DISCLAIMER;

/// Overview fallback: completion-screen copy.
pub fn overview_fallback(input: &SafeNarrativeInput) -> String {
    let complaints = join_or(&input.main_complaints, 3, "・", "お身体のつらさ");
    let area = first_or(&input.body_areas, "体の状態");
    let context = join_or(&input.context_factors, 2, "、", "日常の負担");

    format!(
        "ご入力ありがとうございました。この画面までで問診の入力は完了しています。\n\
         今回の入力では、{complaints}など（{area}）のつらさが中心となっている可能性がうかがえます。\
         また、{context}といった観点も関係している可能性があります。\n\
         内容の整理をもう少し詳しく知りたい方には、LINEで補足をご案内できます（登録は任意です）。"
    )
}

/// Detail fallback: LINE-channel copy. Closes with the mandatory
/// non-diagnosis disclaimer, like the AI path is instructed to.
pub fn detail_fallback(input: &SafeNarrativeInput) -> String {
    let complaints = join_or(&input.main_complaints, 3, "・", "お身体のつらさ");
    let area = first_or(&input.body_areas, "体の状態");
    let context = join_or(&input.context_factors, 2, "、", "日常の負担や休息の状況");

    format!(
        "ご入力内容をもとに、状態の整理を行っています。\n\n\
         今回の入力では、{complaints}といったつらさが中心で、\
         {area}に負担がかかっている可能性が考えられます。\
         こうしたつらさは、姿勢や動きの癖だけでなく、\
         {context}などが重なって感じやすくなることがあります。\n\n\
         どの点を優先して見ていくかは、実際の状態を確認しながら整理していくことが大切です。\
         来院時には、今回ご入力いただいた内容をもとに、気になっている箇所や\
         日常で負担を感じやすい場面を一緒に確認しながら、無理のない範囲で\
         優先順位を整理していきます。わからない点や不安な点があれば、\
         その場でお気軽にお尋ねください。\n\n\
         {DETAIL_DISCLAIMER}"
    )
}

fn join_or(items: &[String], limit: usize, separator: &str, default: &str) -> String {
    if items.is_empty() {
        default.to_string()
    } else {
        items
            .iter()
            .take(limit)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

fn first_or(items: &[String], default: &str) -> String {
    items.first().cloned().unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::{MIN_DETAIL_CHARS, MIN_OVERVIEW_CHARS};
    use crate::summary::SafeNarrativeInput;
    use crate::types::ClinicalSummary;

    fn typical_input() -> SafeNarrativeInput {
        let summary = ClinicalSummary {
            chief_complaints: vec!["腰痛".to_string(), "首こり".to_string()],
            stress_level: Some("high".to_string()),
            sleep_trouble: Some(true),
            ..Default::default()
        };
        SafeNarrativeInput::from_summary(&summary)
    }

    #[test]
    fn test_fallbacks_meet_tier_floors() {
        // The contract must hold even for a completely empty input, since
        // the defaults are what fill the template then.
        for input in [SafeNarrativeInput::default(), typical_input()] {
            let overview = overview_fallback(&input);
            assert!(
                overview.chars().count() >= MIN_OVERVIEW_CHARS,
                "overview too short: {} chars",
                overview.chars().count()
            );

            let detail = detail_fallback(&input);
            assert!(
                detail.chars().count() >= MIN_DETAIL_CHARS,
                "detail too short: {} chars",
                detail.chars().count()
            );
        }
    }

    #[test]
    fn test_fallbacks_reference_the_safe_input() {
        let input = typical_input();
        let overview = overview_fallback(&input);
        assert!(overview.contains("腰痛・首こり"));
        assert!(overview.contains("広い範囲"));
        assert!(overview.contains("日常生活の負荷"));

        let detail = detail_fallback(&input);
        assert!(detail.contains("腰痛・首こり"));
        assert!(detail.ends_with(DETAIL_DISCLAIMER));
    }

    #[test]
    fn test_complaint_list_is_capped_at_three() {
        let mut input = SafeNarrativeInput::default();
        input.main_complaints = vec![
            "腰痛".to_string(),
            "首こり".to_string(),
            "肩こり".to_string(),
            "頭痛".to_string(),
        ];
        let overview = overview_fallback(&input);
        assert!(overview.contains("腰痛・首こり・肩こり"));
        assert!(!overview.contains("頭痛"));
    }
}
