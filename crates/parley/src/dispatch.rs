//! Placeholder matching.
//!
//! A rule pattern is literal text with `#` marking the wildcard. The
//! [`WildcardMode`] decides what the wildcard may match; everything else in
//! the pattern is matched literally.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{error, trace};

use crate::context::ResolutionContext;
use crate::pipeline::Resolver;
use crate::resolvers::{self, ResolverKind};

/// Marker replaced by the wildcard sub-pattern.
pub const WILDCARD: char = '#';

/// What a `#` in a rule pattern may match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardMode {
    /// Shortest run of non-newline text. Default for parenthetical patterns.
    FreeText,
    /// Shortest run between word boundaries. Default for `$` patterns.
    WordBoundary,
    /// ASCII letters, digits and `_`.
    Identifier,
    /// One whitespace-delimited token.
    Token,
    /// Longest run of non-newline text, through the last `)` on the line.
    Greedy,
    /// Shortest run of anything but a newline.
    CommandBody,
}

impl WildcardMode {
    pub fn subpattern(self) -> &'static str {
        match self {
            WildcardMode::FreeText => r"([\S ]+?)",
            WildcardMode::WordBoundary => r"(\b.+?\b)",
            WildcardMode::Identifier => r"([a-zA-Z0-9_]+)",
            WildcardMode::Token => r"(\S+)",
            WildcardMode::Greedy => r"([\S ]+)",
            WildcardMode::CommandBody => r"(.*?)",
        }
    }

    /// The mode a pattern gets unless a stage asks for another.
    pub fn default_for(pattern: &str) -> Self {
        if pattern.starts_with('$') {
            WildcardMode::WordBoundary
        } else {
            WildcardMode::FreeText
        }
    }
}

impl Display for WildcardMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            WildcardMode::FreeText => "free-text",
            WildcardMode::WordBoundary => "word-boundary",
            WildcardMode::Identifier => "identifier",
            WildcardMode::Token => "token",
            WildcardMode::Greedy => "greedy",
            WildcardMode::CommandBody => "command-body",
        };
        f.write_str(name)
    }
}

/// What an empty resolver result does to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPolicy {
    /// A missing or empty result blanks the whole message.
    ClearMessage,
    /// A missing result leaves the placeholder in place; an empty one
    /// removes it.
    LeaveMessage,
}

impl Display for EmptyPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            EmptyPolicy::ClearMessage => "clear",
            EmptyPolicy::LeaveMessage => "leave",
        })
    }
}

/// Compile `pattern` into a regex, escaping everything but the wildcards.
pub fn compile_pattern(pattern: &str, mode: WildcardMode) -> Result<Regex, regex::Error> {
    let source = pattern
        .split(WILDCARD)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(mode.subpattern());
    Regex::new(&source)
}

/// One placeholder: its pattern, matching mode, empty policy and resolver.
#[derive(Debug)]
pub struct PlaceholderRule {
    pub pattern: &'static str,
    pub mode: WildcardMode,
    pub policy: EmptyPolicy,
    pub kind: ResolverKind,
    regex: OnceLock<Option<Regex>>,
}

impl PlaceholderRule {
    pub const fn new(
        pattern: &'static str,
        mode: WildcardMode,
        policy: EmptyPolicy,
        kind: ResolverKind,
    ) -> Self {
        Self {
            pattern,
            mode,
            policy,
            kind,
            regex: OnceLock::new(),
        }
    }

    /// The compiled pattern, built on first use.
    pub fn regex(&self) -> Option<&Regex> {
        self.regex
            .get_or_init(|| match compile_pattern(self.pattern, self.mode) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    error!(pattern = self.pattern, error = %e, "invalid placeholder pattern");
                    None
                }
            })
            .as_ref()
    }

    /// Distinct matched substrings in order of first appearance.
    pub fn matches(&self, buffer: &str) -> Vec<String> {
        let Some(regex) = self.regex() else {
            return Vec::new();
        };
        let mut found: Vec<String> = Vec::new();
        for m in regex.find_iter(buffer) {
            if !found.iter().any(|f| f == m.as_str()) {
                found.push(m.as_str().to_string());
            }
        }
        found
    }
}

/// Replace every occurrence of `matched` and trim the result.
pub fn replace_all(buffer: &str, matched: &str, replacement: &str) -> String {
    buffer.replace(matched, replacement).trim().to_string()
}

/// Apply `rules` in order to `buffer`.
pub(crate) async fn apply_rules(
    resolver: &Resolver,
    mut buffer: String,
    rules: &[PlaceholderRule],
    ctx: &ResolutionContext,
) -> String {
    for rule in rules {
        for matched in rule.matches(&buffer) {
            let result = resolvers::resolve(resolver, rule.kind, &matched, ctx).await;
            trace!(pattern = rule.pattern, matched = %matched, ?result, "placeholder resolved");
            match (rule.policy, result) {
                (EmptyPolicy::ClearMessage, None) => return String::new(),
                (EmptyPolicy::ClearMessage, Some(text)) if text.is_empty() => {
                    return String::new();
                }
                (EmptyPolicy::LeaveMessage, None) => {}
                (_, Some(text)) => buffer = replace_all(&buffer, &matched, &text),
            }
        }
    }
    buffer
}

/// Apply gate rules: a closed gate blanks the message, an open one removes
/// the token.
pub(crate) async fn apply_gates(
    resolver: &Resolver,
    mut buffer: String,
    rules: &[PlaceholderRule],
    ctx: &ResolutionContext,
) -> String {
    for rule in rules {
        for matched in rule.matches(&buffer) {
            if resolvers::resolve(resolver, rule.kind, &matched, ctx)
                .await
                .is_none()
            {
                return String::new();
            }
            buffer = replace_all(&buffer, &matched, "");
        }
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(pattern: &str, mode: WildcardMode, text: &str) -> Vec<String> {
        compile_pattern(pattern, mode)
            .unwrap()
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    #[test]
    fn pattern_text_is_escaped() {
        assert_eq!(
            find("(price)", WildcardMode::FreeText, "costs (price) now, not price"),
            vec!["(price)"]
        );
        assert_eq!(
            find("$count('#')", WildcardMode::CommandBody, "$count('!hi') $count"),
            vec!["$count('!hi')"]
        );
    }

    #[test]
    fn free_text_stops_at_first_close() {
        assert_eq!(
            find("(if #)", WildcardMode::FreeText, "(if a|b) and (if c|d)"),
            vec!["(if a|b)", "(if c|d)"]
        );
    }

    #[test]
    fn greedy_runs_to_last_close() {
        assert_eq!(
            find("(eval #)", WildcardMode::Greedy, "(eval Math.max(1, 2)) done)"),
            vec!["(eval Math.max(1, 2)) done)"]
        );
    }

    #[test]
    fn identifier_stops_at_punctuation() {
        assert_eq!(
            find("$_#", WildcardMode::Identifier, "score: $_score_1, $_x!"),
            vec!["$_score_1", "$_x"]
        );
    }

    #[test]
    fn word_boundary_segments() {
        assert_eq!(
            find("$toptip.#.#", WildcardMode::WordBoundary, "top: $toptip.stream.amount!"),
            vec!["$toptip.stream.amount"]
        );
    }

    #[test]
    fn default_modes() {
        assert_eq!(WildcardMode::default_for("$_#"), WildcardMode::WordBoundary);
        assert_eq!(WildcardMode::default_for("(list.#)"), WildcardMode::FreeText);
    }

    #[test]
    fn replacement_is_literal_and_global() {
        assert_eq!(replace_all(" a $x b $x ", "$x", "1"), "a 1 b 1");
    }
}
