//! Decomposition: runs a keyword's rules against the substituted input.

use serde::Serialize;
use tracing::trace;

use crate::error::{Result, ScriptError};
use crate::pattern::Component;
use crate::script::{DecompRule, Script};

/// The first rule that matched and what it captured.
#[derive(Debug)]
pub struct MatchResult<'a> {
    /// Rule that matched
    pub rule: &'a DecompRule,
    /// One trimmed fragment per pattern component, left to right
    pub fragments: Vec<String>,
}

impl MatchResult<'_> {
    /// Fragments captured by `0` wildcards only, left to right.
    pub fn wildcard_fragments(&self) -> Vec<&str> {
        self.rule
            .matcher()
            .components()
            .iter()
            .zip(&self.fragments)
            .filter(|(component, _)| matches!(component, Component::Wildcard))
            .map(|(_, fragment)| fragment.as_str())
            .collect()
    }
}

/// One rule tried during decomposition, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternAttempt {
    /// Original notation
    pub pattern: String,
    /// Generated regular expression
    pub expression: String,
    /// Whether this rule matched
    pub matched: bool,
}

/// Tries `keyword`'s rules in declared order against the trimmed `input` and
/// returns the first match.
///
/// `Ok(None)` is the ordinary "no rule matched" outcome. A keyword missing
/// from the script is an error.
pub fn decompose<'a>(
    keyword: &str,
    input: &str,
    script: &'a Script,
) -> Result<Option<MatchResult<'a>>> {
    decompose_with_attempts(keyword, input, script).map(|(found, _)| found)
}

/// Like [`decompose`], also listing every rule tried up to and including the
/// one that matched.
pub fn decompose_with_attempts<'a>(
    keyword: &str,
    input: &str,
    script: &'a Script,
) -> Result<(Option<MatchResult<'a>>, Vec<PatternAttempt>)> {
    let entry = script
        .keyword(keyword)
        .ok_or_else(|| ScriptError::UnknownKeyword(keyword.to_string()))?;

    let input = input.trim();
    let mut attempts = Vec::new();
    for rule in &entry.rules {
        let captured = rule.matcher().captures(input);
        trace!(
            keyword = %entry.keyword,
            rule = rule.index(),
            pattern = rule.pattern_source(),
            matched = captured.is_some(),
            "Tried decomposition rule"
        );
        attempts.push(PatternAttempt {
            pattern: rule.pattern_source().to_string(),
            expression: rule.matcher().expression().to_string(),
            matched: captured.is_some(),
        });
        if let Some(fragments) = captured {
            return Ok((Some(MatchResult { rule, fragments }), attempts));
        }
    }
    Ok((None, attempts))
}
