//! Word substitution applied to raw input before ranking and matching.

use std::collections::HashMap;

/// One replacement that fired, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AppliedSubstitution {
    /// Lowercased source token
    pub from: String,
    /// Replacement text
    pub to: String,
}

/// Replaces each single-space-delimited token whose lowercased form is a
/// key of `substitutions`. Unmapped tokens keep their original casing.
pub fn substitute(input: &str, substitutions: &HashMap<String, String>) -> String {
    substitute_with_log(input, substitutions).0
}

/// Like [`substitute`], also returning the replacements that fired in input
/// order.
pub fn substitute_with_log(
    input: &str,
    substitutions: &HashMap<String, String>,
) -> (String, Vec<AppliedSubstitution>) {
    let mut applied = Vec::new();
    let words = input
        .split(' ')
        .map(|word| {
            let key = word.to_lowercase();
            match substitutions.get(&key) {
                Some(replacement) => {
                    applied.push(AppliedSubstitution {
                        from: key,
                        to: replacement.clone(),
                    });
                    replacement.as_str()
                }
                None => word,
            }
        })
        .collect::<Vec<_>>();
    (words.join(" ").trim().to_string(), applied)
}
