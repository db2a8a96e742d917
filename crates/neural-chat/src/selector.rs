//! Keyword-based response selection.
//!
//! Classifies raw user text into a [`Category`] by substring search over
//! fixed keyword sets, then picks a canned template from the catalog.

use rand::Rng;

use neural_core::{Personality, ResponseLength, Settings};

use crate::catalog::{Category, ResponseCatalog};

// =============================================================================
// Keyword sets
// =============================================================================

/// Keyword sets in priority order. The first category with any matching
/// keyword wins, regardless of how many keywords other categories match.
static KEYWORD_RULES: &[(Category, &[&str])] = &[
    (
        Category::Greetings,
        &["こんにちは", "こんばんは", "おはよう", "はじめまして"],
    ),
    (Category::HelpRequests, &["手伝", "ヘルプ", "助け", "サポート"]),
    (
        Category::Programming,
        &["プログラム", "コード", "javascript", "python", "html", "css"],
    ),
    (
        Category::Creative,
        &["創作", "アイデア", "小説", "作品", "デザイン"],
    ),
    (Category::Questions, &["?", "？", "教え", "説明", "どう"]),
];

const CREATIVE_PREFIX: &str = "\n\n創造的な視点から考えてみると、";
const TECHNICAL_PREFIX: &str = "\n\n技術的な観点から詳しく説明すると、";
const CASUAL_PREFIX: &str = "\n\nざっくり言うと、";
const LONG_SUFFIX: &str =
    "より詳細な情報や具体例をお求めでしたら、どのような点について深く知りたいかお聞かせください。";
const SHORT_SUFFIX: &str = "簡潔にお答えいたします。";

/// A selected reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub category: Category,
    pub text: String,
}

/// Rule-based reply selector over a [`ResponseCatalog`].
#[derive(Debug, Clone, Default)]
pub struct ResponseSelector {
    catalog: ResponseCatalog,
}

impl ResponseSelector {
    pub fn new(catalog: ResponseCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ResponseCatalog {
        &self.catalog
    }

    /// Classify raw user text.
    ///
    /// Lower-cases the input, then checks keyword sets in order: greetings,
    /// help, programming, creative, questions. Falls back to `Unknown`.
    pub fn classify(&self, raw: &str) -> Category {
        let text = raw.to_lowercase();
        KEYWORD_RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Unknown)
    }

    /// Classify `raw` and pick a reply for it.
    ///
    /// Question replies get a contextual suffix derived from `settings`.
    pub fn select<R: Rng + ?Sized>(&self, raw: &str, settings: &Settings, rng: &mut R) -> Reply {
        let category = self.classify(raw);
        let mut text = self.catalog.pick(category, rng).to_string();
        if category == Category::Questions {
            text.push_str(&contextual_suffix(
                settings.personality,
                settings.response_length,
            ));
        }
        tracing::debug!(category = %category, "Reply selected");
        Reply { category, text }
    }
}

/// Suffix appended to question replies: a personality lead-in followed by a
/// length note. `Helpful` and `Medium` contribute nothing, so at defaults the
/// suffix is empty.
pub fn contextual_suffix(personality: Personality, length: ResponseLength) -> String {
    let mut suffix = String::new();

    match personality {
        Personality::Creative => suffix.push_str(CREATIVE_PREFIX),
        Personality::Technical => suffix.push_str(TECHNICAL_PREFIX),
        Personality::Casual => suffix.push_str(CASUAL_PREFIX),
        Personality::Helpful => {}
    }

    match length {
        ResponseLength::Long => suffix.push_str(LONG_SUFFIX),
        ResponseLength::Short => suffix.push_str(SHORT_SUFFIX),
        ResponseLength::Medium => {}
    }

    suffix
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn selector() -> ResponseSelector {
        ResponseSelector::default()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0)
    }

    // ---- Classification ----

    #[test]
    fn test_greeting() {
        assert_eq!(selector().classify("こんにちは"), Category::Greetings);
        assert_eq!(selector().classify("おはようございます"), Category::Greetings);
    }

    #[test]
    fn test_programming() {
        assert_eq!(
            selector().classify("コードがエラーになります"),
            Category::Programming
        );
    }

    #[test]
    fn test_programming_keyword_is_case_insensitive() {
        assert_eq!(selector().classify("I love PYTHON"), Category::Programming);
        assert_eq!(selector().classify("JavaScript help"), Category::Programming);
    }

    #[test]
    fn test_greeting_beats_programming() {
        assert_eq!(
            selector().classify("こんにちは、pythonのコードについて"),
            Category::Greetings
        );
    }

    #[test]
    fn test_priority_is_declaration_order_not_match_count() {
        // Three programming keywords, one help keyword: help still wins.
        assert_eq!(
            selector().classify("python html css を手伝って"),
            Category::HelpRequests
        );
    }

    #[test]
    fn test_creative() {
        assert_eq!(selector().classify("小説を書きたい"), Category::Creative);
    }

    #[test]
    fn test_question_markers() {
        assert_eq!(selector().classify("why?"), Category::Questions);
        assert_eq!(selector().classify("なぜ？"), Category::Questions);
        assert_eq!(selector().classify("教えてください"), Category::Questions);
        assert_eq!(selector().classify("これはどうなる"), Category::Questions);
    }

    #[test]
    fn test_creative_beats_question() {
        assert_eq!(selector().classify("デザインのコツは?"), Category::Creative);
    }

    #[test]
    fn test_fallback_unknown() {
        assert_eq!(selector().classify("天気"), Category::Unknown);
        assert_eq!(selector().classify(""), Category::Unknown);
    }

    // ---- Selection ----

    #[test]
    fn test_select_greeting_template() {
        let s = selector();
        let reply = s.select("こんにちは", &Settings::default(), &mut rng());
        assert_eq!(reply.category, Category::Greetings);
        assert!(s
            .catalog()
            .templates(Category::Greetings)
            .contains(&reply.text));
    }

    #[test]
    fn test_question_with_technical_long_appends_both_in_order() {
        let s = selector();
        let settings = Settings {
            personality: Personality::Technical,
            response_length: ResponseLength::Long,
            ..Settings::default()
        };
        let reply = s.select("これは何?", &settings, &mut rng());
        assert_eq!(reply.category, Category::Questions);

        let expected_suffix = format!("{}{}", TECHNICAL_PREFIX, LONG_SUFFIX);
        assert!(reply.text.ends_with(&expected_suffix));
        let base = reply.text.trim_end_matches(&expected_suffix);
        assert!(s.catalog().templates(Category::Questions).iter().any(|t| t == base));
    }

    #[test]
    fn test_question_at_defaults_has_no_suffix() {
        let s = selector();
        let reply = s.select("何?", &Settings::default(), &mut rng());
        assert!(s
            .catalog()
            .templates(Category::Questions)
            .contains(&reply.text));
    }

    #[test]
    fn test_non_question_ignores_personality() {
        let s = selector();
        let settings = Settings {
            personality: Personality::Casual,
            response_length: ResponseLength::Short,
            ..Settings::default()
        };
        let reply = s.select("pythonについて", &settings, &mut rng());
        assert!(!reply.text.contains(CASUAL_PREFIX));
        assert!(!reply.text.ends_with(SHORT_SUFFIX));
    }

    #[test]
    fn test_same_seed_same_reply() {
        let s = selector();
        let a = s.select("天気", &Settings::default(), &mut StdRng::seed_from_u64(9));
        let b = s.select("天気", &Settings::default(), &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    // ---- Contextual suffix ----

    #[test]
    fn test_suffix_variants() {
        assert_eq!(
            contextual_suffix(Personality::Helpful, ResponseLength::Medium),
            ""
        );
        assert_eq!(
            contextual_suffix(Personality::Creative, ResponseLength::Medium),
            CREATIVE_PREFIX
        );
        assert_eq!(
            contextual_suffix(Personality::Helpful, ResponseLength::Short),
            SHORT_SUFFIX
        );
        assert_eq!(
            contextual_suffix(Personality::Casual, ResponseLength::Short),
            format!("{}{}", CASUAL_PREFIX, SHORT_SUFFIX)
        );
    }
}
