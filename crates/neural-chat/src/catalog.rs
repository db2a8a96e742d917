//! Canned reply catalog.
//!
//! Each [`Category`] owns an ordered list of reply templates. The built-in
//! catalog is fixed at compile time and never mutated.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Reply category chosen by keyword matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Greetings,
    HelpRequests,
    Programming,
    Creative,
    Questions,
    Unknown,
}

impl Category {
    /// All categories in match-priority order; `Unknown` is the fallback.
    pub const ALL: [Category; 6] = [
        Category::Greetings,
        Category::HelpRequests,
        Category::Programming,
        Category::Creative,
        Category::Questions,
        Category::Unknown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Greetings => "greetings",
            Category::HelpRequests => "helpRequests",
            Category::Programming => "programming",
            Category::Creative => "creative",
            Category::Questions => "questions",
            Category::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static BUILTIN: LazyLock<ResponseCatalog> = LazyLock::new(|| {
    let mk = |templates: &[&str]| -> Vec<String> {
        templates.iter().map(|t| t.to_string()).collect()
    };

    let mut templates = HashMap::new();
    templates.insert(
        Category::Greetings,
        mk(&[
            "こんにちは！今日はどのようなことでお手伝いできますか？",
            "お疲れ様です！何かご質問はありますか？",
            "こんにちは！お気軽に何でもお聞きください。",
            "いらっしゃいませ！どんなお話をしましょうか？",
        ]),
    );
    templates.insert(
        Category::HelpRequests,
        mk(&[
            "もちろんです！どのような分野でお手伝いが必要ですか？具体的にお聞かせください。",
            "お手伝いできることがたくさんあります。プログラミング、文章作成、アイデア出し、問題解決など、どんなことでもお気軽にどうぞ！",
            "サポートいたします！詳細を教えていただければ、最適な回答を提供できます。",
        ]),
    );
    templates.insert(
        Category::Programming,
        mk(&[
            "プログラミングの質問ですね！どの言語や技術についてお聞きしたいですか？",
            "コードの問題解決は得意分野です。エラーメッセージや実現したい機能について詳しく教えてください。",
            "プログラミングでお困りですか？具体的なコードや問題の詳細をお聞かせください。",
        ]),
    );
    templates.insert(
        Category::Creative,
        mk(&[
            "創作活動のお手伝いですね！アイデア出しは大好きです。どんなジャンルやテーマをお考えですか？",
            "クリエイティブな作業のサポートをさせていただきます！具体的にどのような作品を作られるのでしょうか？",
            "創造性を発揮するお手伝いをいたします。どんなインスピレーションが必要ですか？",
        ]),
    );
    templates.insert(
        Category::Questions,
        mk(&[
            "興味深い質問ですね！詳しく説明させていただきます。",
            "良い質問です！私の知識の範囲でお答えいたします。",
            "お答えいたします。もし追加の詳細が必要でしたら、お気軽にお聞きください。",
        ]),
    );
    templates.insert(
        Category::Unknown,
        mk(&[
            "申し訳ございませんが、その内容については詳しい情報を持っておりません。別の角度からお聞かせいただけますか？",
            "その件について、もう少し詳細を教えていただけますでしょうか？より具体的にお答えできるかもしれません。",
            "興味深いトピックですね！私なりの見解をお話しできますが、専門的な内容でしたら他の情報源もご参照いただければと思います。",
        ]),
    );

    ResponseCatalog { templates }
});

/// Mapping from category to its reply templates.
///
/// Invariant: every category has at least one template.
#[derive(Debug, Clone)]
pub struct ResponseCatalog {
    templates: HashMap<Category, Vec<String>>,
}

impl Default for ResponseCatalog {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

impl ResponseCatalog {
    /// The built-in Japanese catalog.
    pub fn builtin() -> &'static ResponseCatalog {
        &BUILTIN
    }

    /// Replace the templates of one category.
    pub fn with_templates(
        mut self,
        category: Category,
        templates: Vec<String>,
    ) -> Result<Self, ChatError> {
        if templates.is_empty() {
            return Err(ChatError::InvalidCatalog(format!(
                "category {} has no templates",
                category
            )));
        }
        self.templates.insert(category, templates);
        Ok(self)
    }

    pub fn templates(&self, category: Category) -> &[String] {
        self.templates
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Pick one template of `category` uniformly at random.
    pub fn pick<R: Rng + ?Sized>(&self, category: Category, rng: &mut R) -> &str {
        let templates = self.templates(category);
        if templates.is_empty() {
            return "";
        }
        &templates[rng.random_range(0..templates.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_builtin_has_every_category() {
        let catalog = ResponseCatalog::builtin();
        for category in Category::ALL {
            assert!(
                !catalog.templates(category).is_empty(),
                "{} has no templates",
                category
            );
        }
        assert_eq!(catalog.templates(Category::Greetings).len(), 4);
        assert_eq!(catalog.templates(Category::Unknown).len(), 3);
    }

    #[test]
    fn test_pick_returns_member_of_category() {
        let catalog = ResponseCatalog::builtin();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let picked = catalog.pick(Category::Programming, &mut rng);
            assert!(catalog
                .templates(Category::Programming)
                .iter()
                .any(|t| t == picked));
        }
    }

    #[test]
    fn test_pick_covers_all_templates() {
        let catalog = ResponseCatalog::builtin();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(catalog.pick(Category::Greetings, &mut rng).to_string());
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_with_templates_replaces_category() {
        let catalog = ResponseCatalog::default()
            .with_templates(Category::Unknown, vec!["only".to_string()])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(catalog.pick(Category::Unknown, &mut rng), "only");
    }

    #[test]
    fn test_with_empty_templates_rejected() {
        let result = ResponseCatalog::default().with_templates(Category::Creative, vec![]);
        assert!(matches!(result, Err(ChatError::InvalidCatalog(_))));
    }

    #[test]
    fn test_category_names() {
        assert_eq!(Category::HelpRequests.to_string(), "helpRequests");
        assert_eq!(Category::Questions.name(), "questions");
    }

    #[test]
    fn test_category_serde_matches_name() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.name()));
        }
    }
}
