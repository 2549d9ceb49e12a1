//! SEO scoring rules for product listings.
//!
//! Each analyzer returns the issues it finds; [`score`] turns a set of issues
//! into a 0..=100 score. Word matching is case-insensitive. Subjective, sales
//! and craft terms match as substrings, filler words only as whole words.

use serde::{Deserialize, Serialize};

use crate::model::Product;

const SUBJECTIVE_WORDS: &[&str] = &[
    "beautiful", "perfect", "amazing", "stunning", "gorgeous", "lovely", "awesome", "fantastic", "wonderful",
    "incredible", "best", "great", "excellent", "super", "cute", "adorable", "charming", "elegant",
];

const SALES_PHRASES: &[&str] = &[
    "on sale",
    "free delivery",
    "free shipping",
    "discount",
    "bargain",
    "cheap",
    "deal",
    "offer",
    "promotion",
    "limited time",
];

const FILLER_WORDS: &[&str] =
    &["very", "really", "quite", "just", "only", "simply", "totally", "absolutely", "completely", "extremely", "incredibly"];

const CRAFT_KEYWORDS: &[&str] = &[
    "knitting", "knitted", "pattern", "yarn", "wool", "cotton", "cardigan", "sweater", "jumper", "hat", "mittens",
    "scarf", "baby", "kids", "child", "adult", "download", "pdf", "digital",
];

const VARIATION_TERMS: &[&str] = &["size", "color", "material", "custom", "personalis", "personaliz"];

const MAX_TITLE_WORDS: usize = 15;
const LONG_TITLE_WORDS: usize = 12;
const MIN_DESCRIPTION_WORDS: usize = 50;
const MIN_DESCRIPTION_KEYWORDS: usize = 3;
const MIN_TAGS: usize = 10;
const MAX_TAGS: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Length,
    Subjective,
    Sales,
    Filler,
    Clarity,
    Repetition,
    Missing,
    Keywords,
    Variations,
    Count,
    Diversity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: Severity,
    pub issue: String,
    pub suggestion: String,
}

impl Issue {
    fn new(kind: IssueKind, severity: Severity, issue: impl Into<String>, suggestion: &str) -> Self {
        Self { kind, severity, issue: issue.into(), suggestion: suggestion.to_string() }
    }
}

/// Issues and score for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoReport {
    pub product_id: String,
    pub title: String,
    pub score: u32,
    pub title_issues: Vec<Issue>,
    pub description_issues: Vec<Issue>,
    pub tag_issues: Vec<Issue>,
}

impl SeoReport {
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.title_issues.iter().chain(&self.description_issues).chain(&self.tag_issues)
    }
}

fn contains_any<'a>(haystack: &str, needles: &[&'a str]) -> Vec<&'a str> {
    needles.iter().copied().filter(|n| haystack.contains(n)).collect()
}

pub fn analyze_title(title: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    let lower = title.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    let word_count = words.len();

    if word_count > MAX_TITLE_WORDS {
        issues.push(Issue::new(
            IssueKind::Length,
            Severity::High,
            format!(
                "Title is {word_count} words ({} over recommended {MAX_TITLE_WORDS} words)",
                word_count - MAX_TITLE_WORDS
            ),
            "Reduce to under 15 words. Move extra details to tags or description.",
        ));
    } else if word_count > LONG_TITLE_WORDS {
        issues.push(Issue::new(
            IssueKind::Length,
            Severity::Medium,
            format!("Title is {word_count} words (approaching {MAX_TITLE_WORDS} word limit)"),
            "Consider shortening for better readability.",
        ));
    }

    let subjective = contains_any(&lower, SUBJECTIVE_WORDS);
    if !subjective.is_empty() {
        issues.push(Issue::new(
            IssueKind::Subjective,
            Severity::Medium,
            format!("Contains subjective words: {}", subjective.join(", ")),
            "Move subjective descriptors to tags or description. Focus on factual details.",
        ));
    }

    let sales = contains_any(&lower, SALES_PHRASES);
    if !sales.is_empty() {
        issues.push(Issue::new(
            IssueKind::Sales,
            Severity::High,
            format!("Contains sales language: {}", sales.join(", ")),
            "Remove all sales-related terms from titles completely.",
        ));
    }

    let filler: Vec<&str> = FILLER_WORDS.iter().copied().filter(|f| words.contains(f)).collect();
    if !filler.is_empty() {
        issues.push(Issue::new(
            IssueKind::Filler,
            Severity::Low,
            format!("Contains filler words: {}", filler.join(", ")),
            "Remove filler words to make title more concise and impactful.",
        ));
    }

    if contains_any(&lower, CRAFT_KEYWORDS).is_empty() {
        issues.push(Issue::new(
            IssueKind::Clarity,
            Severity::High,
            "Main item type is unclear",
            "Start title with what the item is (e.g., \"Knitting Pattern\", \"Baby Cardigan\", etc.)",
        ));
    }

    // Count in first-seen order so the message is stable.
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for word in words.iter().copied().filter(|w| w.chars().count() > 3) {
        match counts.iter_mut().find(|(w, _)| *w == word) {
            Some((_, n)) => *n += 1,
            None => counts.push((word, 1)),
        }
    }
    let repeated: Vec<&str> = counts.into_iter().filter(|(_, n)| *n > 2).map(|(w, _)| w).collect();
    if !repeated.is_empty() {
        issues.push(Issue::new(
            IssueKind::Repetition,
            Severity::Medium,
            format!("Repeated words: {}", repeated.join(", ")),
            "Avoid repeating the same words. Use synonyms or move to tags.",
        ));
    }

    issues
}

pub fn analyze_description(description: &str) -> Vec<Issue> {
    if description.trim().is_empty() {
        return vec![Issue::new(
            IssueKind::Missing,
            Severity::High,
            "Description is empty or missing",
            "Add a detailed description starting with what the item is.",
        )];
    }

    let mut issues = Vec::new();
    let lower = description.to_lowercase();
    let first_sentence = lower.split(['.', '!', '?']).find(|s| !s.trim().is_empty()).unwrap_or_default();
    let word_count = lower.split_whitespace().count();

    if contains_any(first_sentence, CRAFT_KEYWORDS).is_empty() {
        issues.push(Issue::new(
            IssueKind::Clarity,
            Severity::High,
            "First sentence doesn't clearly describe the item",
            "Start description by clearly stating what the item is (e.g., \"This is a knitting pattern for...\")",
        ));
    }

    if word_count < MIN_DESCRIPTION_WORDS {
        issues.push(Issue::new(
            IssueKind::Length,
            Severity::Medium,
            format!("Description is only {word_count} words"),
            "Expand description with details about materials, size, customization, and unique features.",
        ));
    }

    let keywords = contains_any(&lower, CRAFT_KEYWORDS);
    if keywords.len() < MIN_DESCRIPTION_KEYWORDS {
        issues.push(Issue::new(
            IssueKind::Keywords,
            Severity::Medium,
            format!("Only {} relevant keywords found", keywords.len()),
            "Include more relevant keywords naturally throughout the description.",
        ));
    }

    if contains_any(&lower, VARIATION_TERMS).is_empty() {
        issues.push(Issue::new(
            IssueKind::Variations,
            Severity::Low,
            "No mention of variations or customization options",
            "Include information about available sizes, colors, materials, or personalization options.",
        ));
    }

    issues
}

pub fn analyze_tags(tags: &[String]) -> Vec<Issue> {
    if tags.is_empty() {
        return vec![Issue::new(
            IssueKind::Missing,
            Severity::High,
            "No tags found",
            "Add up to 13 relevant tags with keywords buyers might search for.",
        )];
    }

    let mut issues = Vec::new();
    if tags.len() < MIN_TAGS {
        issues.push(Issue::new(
            IssueKind::Count,
            Severity::Medium,
            format!("Only {} tags used (out of {MAX_TAGS} allowed)", tags.len()),
            "Add more tags to maximize discoverability. Use long-tail keywords.",
        ));
    }

    let multi_word = tags.iter().filter(|t| t.contains(' ')).count();
    let single_word = tags.len() - multi_word;
    if (multi_word as f64) < single_word as f64 / 2.0 {
        issues.push(Issue::new(
            IssueKind::Diversity,
            Severity::Medium,
            "Not enough multi-word (long-tail) tags",
            "Include more specific phrases like \"knitting pattern for beginners\" rather than just \"knitting\".",
        ));
    }

    issues
}

/// `100 - 20 per high - 10 per medium - 5 per low`, floored at 0.
pub fn score<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> u32 {
    let penalty: u32 = issues
        .into_iter()
        .map(|issue| match issue.severity {
            Severity::High => 20,
            Severity::Medium => 10,
            Severity::Low => 5,
        })
        .sum();
    100u32.saturating_sub(penalty)
}

pub fn analyze_product(product: &Product) -> SeoReport {
    let title_issues = analyze_title(&product.title);
    let description_issues = analyze_description(product.description.as_deref().unwrap_or_default());
    let tag_issues = analyze_tags(&product.tags);
    let score = score(title_issues.iter().chain(&description_issues).chain(&tag_issues));

    SeoReport {
        product_id: product.id.clone(),
        title: product.title.clone(),
        score,
        title_issues,
        description_issues,
        tag_issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(issues: &[Issue]) -> Vec<(IssueKind, Severity)> {
        issues.iter().map(|i| (i.kind, i.severity)).collect()
    }

    #[test]
    fn test_twenty_word_title_is_high_length() {
        let title = vec!["word"; 19].join(" ") + " pattern";
        let issues = analyze_title(&title);
        assert!(issues.iter().any(|i| i.kind == IssueKind::Length && i.severity == Severity::High));
        assert!(issues[0].issue.contains("20 words"));
    }

    #[test]
    fn test_thirteen_word_title_is_medium_length() {
        let title = vec!["hat"; 13].join(" ");
        let issues = analyze_title(&title);
        assert!(issues.iter().any(|i| i.kind == IssueKind::Length && i.severity == Severity::Medium));
    }

    #[test]
    fn test_sales_language_is_high() {
        let issues = analyze_title("Knitted Hat On Sale");
        assert!(issues.iter().any(|i| i.kind == IssueKind::Sales && i.severity == Severity::High));
    }

    #[test]
    fn test_clean_title_has_no_issues() {
        assert!(analyze_title("Baby Cardigan Knitting Pattern").is_empty());
    }

    #[test]
    fn test_filler_matches_whole_words_only() {
        let issues = analyze_title("Really Warm Wool Hat");
        assert!(issues.iter().any(|i| i.kind == IssueKind::Filler));

        // "justify" contains "just" but is not a filler word
        assert!(!analyze_title("Justify Wool Hat").iter().any(|i| i.kind == IssueKind::Filler));
    }

    #[test]
    fn test_title_without_item_type() {
        let issues = analyze_title("Lovely Gift Idea");
        assert_eq!(
            kinds(&issues),
            vec![(IssueKind::Subjective, Severity::Medium), (IssueKind::Clarity, Severity::High)]
        );
    }

    #[test]
    fn test_repeated_title_words() {
        let issues = analyze_title("Wool Hat Wool Scarf Wool Mittens");
        let repetition = issues.iter().find(|i| i.kind == IssueKind::Repetition).unwrap();
        assert_eq!(repetition.issue, "Repeated words: wool");
    }

    #[test]
    fn test_empty_description_is_single_missing_issue() {
        for description in ["", "   \n\t"] {
            let issues = analyze_description(description);
            assert_eq!(kinds(&issues), vec![(IssueKind::Missing, Severity::High)]);
        }
    }

    #[test]
    fn test_short_description() {
        let issues = analyze_description("A lovely thing. Made with care!");
        assert_eq!(
            kinds(&issues),
            vec![
                (IssueKind::Clarity, Severity::High),
                (IssueKind::Length, Severity::Medium),
                (IssueKind::Keywords, Severity::Medium),
                (IssueKind::Variations, Severity::Low),
            ]
        );
    }

    #[test]
    fn test_description_variation_mentions() {
        let issues = analyze_description("Knitting pattern for a baby hat. Personalised colours on request.");
        assert!(!issues.iter().any(|i| i.kind == IssueKind::Variations));
        assert!(!issues.iter().any(|i| i.kind == IssueKind::Clarity));
    }

    #[test]
    fn test_tags() {
        assert_eq!(kinds(&analyze_tags(&[])), vec![(IssueKind::Missing, Severity::High)]);

        let few: Vec<String> = vec!["hat".into(), "wool".into(), "baby hat".into()];
        assert_eq!(kinds(&analyze_tags(&few)), vec![(IssueKind::Count, Severity::Medium)]);

        let flat: Vec<String> = (0..10).map(|i| format!("tag{i}")).collect();
        assert_eq!(kinds(&analyze_tags(&flat)), vec![(IssueKind::Diversity, Severity::Medium)]);
    }

    #[test]
    fn test_score() {
        let issues = vec![
            Issue::new(IssueKind::Sales, Severity::High, "", ""),
            Issue::new(IssueKind::Length, Severity::Medium, "", ""),
            Issue::new(IssueKind::Filler, Severity::Low, "", ""),
        ];
        assert_eq!(score(&issues), 65);

        let many = vec![Issue::new(IssueKind::Missing, Severity::High, "", ""); 6];
        assert_eq!(score(&many), 0);
        assert_eq!(score(&Vec::<Issue>::new()), 100);
    }

    #[test]
    fn test_analyze_product() {
        let product = Product {
            id: "123".into(),
            title: "Blue Hat".into(),
            tags: vec!["hat".into(), "wool".into()],
            ..Default::default()
        };
        let report = analyze_product(&product);
        assert_eq!(report.product_id, "123");
        assert!(report.title_issues.is_empty());
        assert_eq!(kinds(&report.description_issues), vec![(IssueKind::Missing, Severity::High)]);
        // missing description (high), tag count (medium), tag diversity (medium)
        assert_eq!(report.score, 60);
        assert_eq!(report.issues().count(), 3);
    }
}
