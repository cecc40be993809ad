//! Trigger matching for escalation rules
//!
//! Matching is a pluggable predicate: the engine lowercases the turn text
//! once and hands it to each rule's [`TriggerMatcher`] in table order.

use crate::config::MatchMode;
use globset::GlobBuilder;

/// A predicate deciding whether a turn's text fires a rule.
pub trait TriggerMatcher: Send + Sync + std::fmt::Debug {
    /// `text` is already lowercased.
    fn matches(&self, text: &str) -> bool;

    /// The pattern as configured.
    fn pattern(&self) -> &str;
}

/// Fires when the trigger appears anywhere in the text.
#[derive(Debug, Clone)]
pub struct SubstringMatcher {
    pattern: String,
    needle: String,
}

impl SubstringMatcher {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            needle: pattern.to_lowercase(),
        }
    }
}

impl TriggerMatcher for SubstringMatcher {
    fn matches(&self, text: &str) -> bool {
        text.contains(&self.needle)
    }

    fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Fires when the trigger appears as a whole word or phrase.
///
/// "plan" matches "which plan fits" but not "explanation".
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    pattern: String,
    needle: String,
}

impl KeywordMatcher {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            needle: pattern.to_lowercase(),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl TriggerMatcher for KeywordMatcher {
    fn matches(&self, text: &str) -> bool {
        text.match_indices(self.needle.as_str()).any(|(start, found)| {
            let end = start + found.len();
            let before = text[..start].chars().next_back();
            let after = text[end..].chars().next();
            !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
        })
    }

    fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Fires when the whole text matches a glob such as `*security*breach*`.
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    pattern: String,
    matcher: globset::GlobMatcher,
}

impl GlobMatcher {
    pub fn new(pattern: &str) -> Result<Self, globset::Error> {
        let matcher = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(false)
            .build()?
            .compile_matcher();
        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
        })
    }
}

impl TriggerMatcher for GlobMatcher {
    fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Build the matcher for a configured trigger.
pub fn build_matcher(
    pattern: &str,
    mode: MatchMode,
) -> Result<Box<dyn TriggerMatcher>, globset::Error> {
    Ok(match mode {
        MatchMode::Substring => Box::new(SubstringMatcher::new(pattern)),
        MatchMode::Keyword => Box::new(KeywordMatcher::new(pattern)),
        MatchMode::Glob => Box::new(GlobMatcher::new(pattern)?),
    })
}
