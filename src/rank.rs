//! Keyword ranking: picks the single keyword that drives the response.

use serde::Serialize;

use crate::script::Script;

/// Characters removed before the input is tokenized for ranking.
pub const RANK_PUNCTUATION: &[char] = &[
    '#', '$', '%', '&', '(', ')', '*', '+', ',', '-', '.', '/', ':', ';', '<', '=', '>', '?', '@',
    '[', '\\', ']', '^', '_', '{', '|', '}', '~',
];

/// A token of the input that is a keyword of the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCandidate {
    /// Lowercased keyword
    pub keyword: String,
    /// Its rank in the script
    pub rank: u32,
    /// Token position in the cleaned input
    pub position: usize,
}

/// Lowercased tokens of `input` with [`RANK_PUNCTUATION`] removed.
pub fn rank_tokens(input: &str) -> Vec<String> {
    input
        .replace(RANK_PUNCTUATION, "")
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Every token that names a keyword of `script`, in input order, including
/// rank-0 keywords.
pub fn candidates(input: &str, script: &Script) -> Vec<KeywordCandidate> {
    rank_tokens(input)
        .into_iter()
        .enumerate()
        .filter_map(|(position, token)| {
            script.keyword(&token).map(|entry| KeywordCandidate {
                keyword: token,
                rank: entry.rank,
                position,
            })
        })
        .collect()
}

/// The highest-ranked keyword in `input`; the earliest token wins ties.
/// `None` when no token has a rank above zero.
pub fn rank(input: &str, script: &Script) -> Option<KeywordCandidate> {
    select(candidates(input, script))
}

/// Applies the max-rank / first-occurrence policy to candidates already in
/// input order.
pub fn select(candidates: impl IntoIterator<Item = KeywordCandidate>) -> Option<KeywordCandidate> {
    let mut best: Option<KeywordCandidate> = None;
    for candidate in candidates {
        if candidate.rank == 0 {
            continue;
        }
        match &best {
            Some(current) if current.rank >= candidate.rank => {}
            _ => best = Some(candidate),
        }
    }
    best
}
