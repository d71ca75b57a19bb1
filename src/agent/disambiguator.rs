//! 意図ディスアンビゲータ — LLM 呼び出し前の語彙ルール
//!
//! AI API を呼ばずに適用できる 2 つのハードルールを実装する:
//!
//! 1. 修正キューワード（update / modify / change / edit）を含むリクエストでは
//!    add_new_user をカタログから除外する。これは重み付けではなく完全な除外で、
//!    create と update の混同を構造的に防ぐ。
//! 2. 挨拶・能力照会は greet_user を無条件に選択し、その固定出力を
//!    そのまま返す（return-direct）。LLM にもディスパッチャにも到達しない。
//!
//! それ以外のリクエストは、フィルタ済みカタログとともにバックエンドに渡される。

use async_openai::types::ChatCompletionTool;
use regex::Regex;
use tracing::debug;

use super::tools::registry;

/// 語彙ルールベースのディスアンビゲータ
pub struct Disambiguator {
    /// 修正キューワードの単語境界マッチ（大文字小文字を無視）
    modification_re: Regex,
}

impl Default for Disambiguator {
    fn default() -> Self {
        Self::new()
    }
}

impl Disambiguator {
    pub fn new() -> Self {
        let modification_re = Regex::new(r"(?i)\b(update|modify|change|edit)s?\b")
            .expect("invalid modification cue pattern");
        Self { modification_re }
    }

    /// リクエストに修正キューワードが含まれるかを判定する。
    pub fn has_modification_cue(&self, input: &str) -> bool {
        self.modification_re.is_match(input)
    }

    /// リクエストが挨拶または能力照会かを判定する。
    ///
    /// 誤検出を避けるため、正規化（小文字化・末尾句読点除去・空白圧縮）後の
    /// 完全一致のみを挨拶として扱う。"hi, please delete Alice" のような
    /// 挨拶で始まる実リクエストはここを素通りして通常の選択に進む。
    pub fn is_greeting(input: &str) -> bool {
        let normalized = Self::normalize(input);

        const GREETING_PHRASES: &[&str] = &[
            "hi",
            "hello",
            "hey",
            "yo",
            "howdy",
            "greetings",
            "hi there",
            "hello there",
            "hey there",
            "good morning",
            "good afternoon",
            "good evening",
            "help",
            "what can you do",
            "what do you do",
            "what can you help with",
            "what can you help me with",
            "who are you",
            "what are you",
        ];

        GREETING_PHRASES.contains(&normalized.as_str())
    }

    /// 小文字化し、末尾の句読点を除去し、空白を 1 つに圧縮する。
    fn normalize(input: &str) -> String {
        let lower = input.trim().to_lowercase();
        let stripped = lower.trim_end_matches(['!', '?', '.', ',']);
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// このリクエストで選択可能なアクションの Tool 定義を返す。
    ///
    /// 修正キューワードが含まれる場合、add_new_user は考慮対象から除外される。
    pub fn eligible_tools(&self, input: &str) -> Vec<ChatCompletionTool> {
        let exclude_add = self.has_modification_cue(input);
        if exclude_add {
            debug!(input = %input, "Modification cue detected, excluding add_new_user");
        }

        registry::all()
            .iter()
            .filter(|spec| !(exclude_add && spec.name == "add_new_user"))
            .map(|spec| spec.to_chat_tool())
            .collect()
    }
}
