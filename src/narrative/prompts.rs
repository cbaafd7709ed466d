//! Fixed prompts for the two narrative tiers.
//!
//! The system instructions forbid diagnostic, causal, and predictive
//! language; the user instructions embed only the serialized safe input
//! plus the per-tier output contract.

use crate::summary::SafeNarrativeInput;

pub const OVERVIEW_SYSTEM: &str = "\
あなたは医療判断をしない文章整理アシスタントです。
入力データから「見えている傾向」を短くまとめます。
診断・原因断定・改善予測は禁止。
不安を煽る表現や専門用語は避けてください。";

pub const DETAIL_SYSTEM: &str = "\
あなたは医療判断を行わない文章整理アシスタントです。
入力情報をもとに、状態の見方をやさしく整理します。
診断・原因断定・改善予測は禁止です。
不安を煽る表現や専門用語は避けてください。";

/// Mandatory closing line of the detail tier.
pub const DETAIL_DISCLAIMER: &str =
    "※これは医療的な診断ではなく、来院時に状態を確認しながら整理していきます。";

/// User instruction for the overview tier (completion-screen copy).
pub fn overview_user(input: &SafeNarrativeInput) -> String {
    format!(
        "【入力データ（安全に整理済み）】\n{}\n\n\
         【出力条件（必ず守る）】\n\
         ・200〜320字程度（短め〜中程度）\n\
         ・必ず次の4要素を含める\n\
         　1) この画面までで入力は完了\n\
         　2) 主なつらさ（症状名または部位傾向）に触れる\n\
         　3) 影響しそうな観点（睡眠/日常負担など）を「可能性」で示す（断定禁止）\n\
         　4) 詳細の整理はLINEで受け取れる（任意）\n\
         ・「診断」「治る」「原因は」等の断定ワードは禁止",
        serialize_input(input)
    )
}

/// User instruction for the detail tier (LINE channel copy).
pub fn detail_user(input: &SafeNarrativeInput) -> String {
    format!(
        "【入力データ（安全に整理済み）】\n{}\n\n\
         【出力条件（必ず守る）】\n\
         ・400〜700字\n\
         ・2〜4段落で構成\n\
         ・概要で触れた症状や部位の傾向を、少し噛み砕いて説明する\n\
         ・睡眠や日常負担などの観点は「可能性」「考えられる視点」で述べる\n\
         ・断定語（原因は／治る／診断）は使わない\n\
         ・最後に次の一文を必ず入れる：\n\
         　「{}」",
        serialize_input(input),
        DETAIL_DISCLAIMER
    )
}

fn serialize_input(input: &SafeNarrativeInput) -> String {
    // The safe input is plain labels; serialization cannot realistically
    // fail, but degrade to an empty object rather than panic if it does.
    serde_json::to_string_pretty(input).unwrap_or_else(|_| "{}".to_string())
}
