//! Reassembly: turns a matched rule and its fragments into a response.

use crate::error::{Result, ScriptError};
use crate::script::DecompRule;

/// The template that was used and the text it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassembly {
    /// Template selected by the rotation cursor
    pub template: String,
    /// Filled-in response
    pub text: String,
}

/// Fills the rule's current template with `fragments` and advances the
/// rule's rotation cursor.
pub fn reassemble(rule: &DecompRule, fragments: &[String]) -> Result<String> {
    reassemble_detailed(rule, fragments).map(|r| r.text)
}

/// Like [`reassemble`], also returning the template that was used.
pub fn reassemble_detailed(rule: &DecompRule, fragments: &[String]) -> Result<Reassembly> {
    let template = rule
        .take_template()
        .ok_or_else(|| ScriptError::EmptyTemplateSet {
            keyword: rule.keyword().to_string(),
            rule_index: rule.index(),
        })?;
    Ok(Reassembly {
        template: template.to_string(),
        text: fill_template(template, fragments),
    })
}

/// Replaces each whitespace-separated token that is a positive integer `n`
/// with `fragments[n - 1]`, empty fragments included. Out-of-range
/// placeholders contribute nothing. Everything else is copied as is.
pub fn fill_template(template: &str, fragments: &[String]) -> String {
    template
        .split_whitespace()
        .filter_map(|token| match placeholder(token) {
            Some(n) => fragments.get(n - 1).map(String::as_str),
            None => Some(token),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn placeholder(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // overflow can never index a fragment
    let n = token.parse::<usize>().unwrap_or(usize::MAX);
    (n > 0).then_some(n)
}
