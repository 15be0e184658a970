//! Hashtags and their extraction from free text.

use super::scope::ScopeType;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref HASHTAG_PATTERN: Regex =
        Regex::new(r"#([A-Za-z0-9_][A-Za-z0-9_-]*)").expect("hashtag pattern is valid");
}

/// A stored hashtag. `content` is normalized: `#` prefix, lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashTag {
    pub id: i64,
    pub content: String,
}

/// Association of a hashtag with the stream an activity was posted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHashTag {
    pub hashtag: HashTag,
    pub stream_unique_key: String,
    pub stream_scope_type: ScopeType,
    pub activity_id: i64,
    pub activity_date: i64,
    pub is_public: bool,
}

/// Finds hashtags in text.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashTagExtractor;

impl HashTagExtractor {
    /// Every hashtag in `text`, normalized, in first-occurrence order.
    ///
    /// A `#` directly after a word character, `&`, `/` or another `#` is
    /// not a hashtag start, which skips URL fragments and HTML entities.
    pub fn extract_all(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();

        for caps in HASHTAG_PATTERN.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(tag) = caps.get(1) else { continue };

            if let Some(prev) = text[..whole.start()].chars().next_back()
                && (prev.is_alphanumeric() || matches!(prev, '_' | '&' | '/' | '#'))
            {
                continue;
            }

            let tag = tag.as_str().trim_end_matches('-');
            let normalized = format!("#{}", tag.to_lowercase());
            if !found.contains(&normalized) {
                found.push(normalized);
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<String> {
        HashTagExtractor.extract_all(text)
    }

    #[test]
    fn finds_tags_in_order() {
        assert_eq!(extract("hi #there #potato"), vec!["#there", "#potato"]);
    }

    #[test]
    fn normalizes_and_dedupes() {
        assert_eq!(extract("#Rust is #rust and #RUST"), vec!["#rust"]);
    }

    #[test]
    fn allows_inner_hyphen_and_trims_trailing() {
        assert_eq!(extract("#open-source- rocks"), vec!["#open-source"]);
        assert_eq!(extract("(#tag), #under_score."), vec!["#tag", "#under_score"]);
    }

    #[test]
    fn skips_non_hashtag_hashes() {
        assert!(extract("http://example.com/page#anchor").is_empty());
        assert!(extract("it&#39;s fine").is_empty());
        assert!(extract("C#sharp ##double # alone #-dash").is_empty());
    }

    #[test]
    fn empty_text_has_no_tags() {
        assert!(extract("").is_empty());
        assert!(extract("no tags here").is_empty());
    }
}
