//! Keyword occurrence counting

use aho_corasick::{AhoCorasick, MatchKind};
use log::warn;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts keyword occurrences in free text.
///
/// Scoring and selection only see the returned counts, so a tokenizing or
/// stemming matcher can replace the default one without touching them.
pub trait KeywordMatcher: Send + Sync {
    /// Occurrence count per keyword. Keywords that never occur are omitted.
    fn count(&self, text: &str, keywords: &[String]) -> BTreeMap<String, usize>;

    fn name(&self) -> &'static str;
}

/// Which matcher the classifier is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    #[default]
    Substring,
    WordBoundary,
}

impl MatcherKind {
    pub fn build(self) -> Box<dyn KeywordMatcher> {
        match self {
            MatcherKind::Substring => Box::new(SubstringMatcher),
            MatcherKind::WordBoundary => Box::new(WordBoundaryMatcher),
        }
    }
}

/// Case-insensitive substring matching with no tokenization.
///
/// Each keyword is counted independently, non-overlapping, left to right;
/// "java" therefore also counts inside "javascript".
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringMatcher;

impl KeywordMatcher for SubstringMatcher {
    fn count(&self, text: &str, keywords: &[String]) -> BTreeMap<String, usize> {
        let haystack = text.to_lowercase();
        let patterns: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

        let mut counts = vec![0usize; patterns.len()];

        // Standard match kind is required for overlapping search, which keeps
        // one keyword from hiding another that shares its characters
        match AhoCorasick::builder().match_kind(MatchKind::Standard).build(&patterns) {
            Ok(automaton) => {
                let mut last_end = vec![0usize; patterns.len()];
                for mat in automaton.find_overlapping_iter(&haystack) {
                    let id = mat.pattern().as_usize();
                    if patterns[id].is_empty() {
                        continue;
                    }
                    if mat.start() >= last_end[id] {
                        counts[id] += 1;
                        last_end[id] = mat.end();
                    }
                }
            }
            Err(e) => {
                warn!("Failed to build keyword automaton, scanning keywords one by one: {}", e);
                for (id, pattern) in patterns.iter().enumerate() {
                    if !pattern.is_empty() {
                        counts[id] = haystack.matches(pattern.as_str()).count();
                    }
                }
            }
        }

        collect_counts(keywords, &counts)
    }

    fn name(&self) -> &'static str {
        "substring"
    }
}

/// Case-insensitive matching that only counts occurrences not embedded in a
/// longer alphanumeric run ("java" does not count inside "javascript").
#[derive(Debug, Default, Clone, Copy)]
pub struct WordBoundaryMatcher;

impl KeywordMatcher for WordBoundaryMatcher {
    fn count(&self, text: &str, keywords: &[String]) -> BTreeMap<String, usize> {
        let mut counts = vec![0usize; keywords.len()];

        for (id, keyword) in keywords.iter().enumerate() {
            if keyword.is_empty() {
                continue;
            }
            let regex = match RegexBuilder::new(&regex::escape(keyword))
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => regex,
                Err(e) => {
                    warn!("Skipping keyword '{}': {}", keyword, e);
                    continue;
                }
            };

            counts[id] = regex
                .find_iter(text)
                .filter(|m| {
                    let before = text[..m.start()].chars().next_back();
                    let after = text[m.end()..].chars().next();
                    !before.is_some_and(char::is_alphanumeric)
                        && !after.is_some_and(char::is_alphanumeric)
                })
                .count();
        }

        collect_counts(keywords, &counts)
    }

    fn name(&self) -> &'static str {
        "word_boundary"
    }
}

fn collect_counts(keywords: &[String], counts: &[usize]) -> BTreeMap<String, usize> {
    let mut result = BTreeMap::new();
    for (keyword, &count) in keywords.iter().zip(counts) {
        if count > 0 {
            result.insert(keyword.clone(), count);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_substring_counts_are_case_insensitive() {
        let counts = SubstringMatcher.count(
            "Kubernetes and KUBERNETES plus Docker",
            &kw(&["kubernetes", "Docker"]),
        );
        assert_eq!(counts.get("kubernetes"), Some(&2));
        assert_eq!(counts.get("Docker"), Some(&1));
    }

    #[test]
    fn test_substring_ignores_word_boundaries() {
        let counts = SubstringMatcher.count("JavaScript developer", &kw(&["java", "javascript"]));
        assert_eq!(counts.get("java"), Some(&1));
        assert_eq!(counts.get("javascript"), Some(&1));
    }

    #[test]
    fn test_substring_counts_do_not_overlap() {
        let counts = SubstringMatcher.count("aaaa", &kw(&["aa"]));
        assert_eq!(counts.get("aa"), Some(&2));
    }

    #[test]
    fn test_missing_keywords_are_omitted() {
        let counts = SubstringMatcher.count("android kotlin", &kw(&["android", "swift"]));
        assert_eq!(counts.len(), 1);
        assert!(!counts.contains_key("swift"));

        assert!(SubstringMatcher.count("", &kw(&["android"])).is_empty());
    }

    #[test]
    fn test_punctuated_keywords() {
        let text = "Own our CI/CD pipelines and Node.js services";
        let counts = SubstringMatcher.count(text, &kw(&["ci/cd", "node.js"]));
        assert_eq!(counts.get("ci/cd"), Some(&1));
        assert_eq!(counts.get("node.js"), Some(&1));

        let counts = WordBoundaryMatcher.count(text, &kw(&["ci/cd", "node.js"]));
        assert_eq!(counts.get("ci/cd"), Some(&1));
        assert_eq!(counts.get("node.js"), Some(&1));
    }

    #[test]
    fn test_word_boundary_matcher_skips_embedded_hits() {
        let counts = WordBoundaryMatcher.count("JavaScript and Java, java.", &kw(&["java"]));
        assert_eq!(counts.get("java"), Some(&2));
    }

    #[test]
    fn test_matcher_kind_builds_named_matcher() {
        assert_eq!(MatcherKind::Substring.build().name(), "substring");
        assert_eq!(MatcherKind::WordBoundary.build().name(), "word_boundary");
    }
}
