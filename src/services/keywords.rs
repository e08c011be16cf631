//! Keyword extraction shared by affinity building, filtering and scoring.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Tokens too common in video titles to carry any interest signal
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "this", "that", "you", "your", "are", "was", "how",
    "what", "why", "of", "to", "in", "on", "at", "is", "it", "an", "or", "by", "my", "me",
    "official", "video", "videos", "shorts", "short", "ft", "feat", "vs", "new", "full",
];

fn decoration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"【.*?】|\[.*?\]|\(.*?\)|（.*?）|「.*?」")
            .expect("decoration pattern is valid")
    })
}

/// Removes bracket-delimited decorations such as `【MV】`, `[4K]`, `(Live)`
pub fn strip_decorations(text: &str) -> String {
    decoration_pattern().replace_all(text, " ").trim().to_string()
}

/// Tokenizes free text into a normalized keyword set
///
/// Case-folds, strips bracketed decorations and splits on anything that is
/// not alphanumeric (CJK runs stay whole). Single characters, bare numbers
/// and stopwords are dropped. Empty input yields an empty set.
pub fn extract_keywords(text: &str) -> HashSet<String> {
    if text.trim().is_empty() {
        return HashSet::new();
    }

    let cleaned = strip_decorations(&text.to_lowercase());

    cleaned
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
        .filter(|token| !STOPWORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Keyword set of a candidate: title and channel name together
pub fn candidate_keywords(title: &str, channel_name: &str) -> HashSet<String> {
    let mut keywords = extract_keywords(title);
    keywords.extend(extract_keywords(channel_name));
    keywords
}
