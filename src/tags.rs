//! Tag table: named sets of interchangeable words referenced from patterns
//! as `@name`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScriptError};

/// Tag name → member words.
///
/// Names and members are stored lowercased; lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, Vec<String>>", into = "HashMap<String, Vec<String>>")]
pub struct TagTable {
    tags: HashMap<String, Vec<String>>,
}

impl TagTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a tag. Members are lowercased, blank members are
    /// dropped and duplicates removed, keeping first-seen order.
    pub fn insert<I, S>(&mut self, name: &str, members: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words: Vec<String> = Vec::new();
        for member in members {
            let word = member.as_ref().trim().to_lowercase();
            if !word.is_empty() && !words.contains(&word) {
                words.push(word);
            }
        }
        self.tags.insert(name.trim().to_lowercase(), words);
    }

    /// Resolves a tag name to its member words.
    ///
    /// `None` means the tag is not defined at all; `Some(&[])` means it is
    /// defined but empty. Callers treat both as "matches nothing".
    pub fn resolve(&self, name: &str) -> Option<&[String]> {
        self.tags.get(&name.to_lowercase()).map(Vec::as_slice)
    }

    /// Whether `word` belongs to the tag, case-insensitively.
    pub fn contains(&self, name: &str, word: &str) -> bool {
        let word = word.to_lowercase();
        self.resolve(name)
            .map(|members| members.iter().any(|m| *m == word))
            .unwrap_or(false)
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether no tags are defined.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Fails when two names differ only in case, since map order would decide
/// which member list survives.
impl TryFrom<HashMap<String, Vec<String>>> for TagTable {
    type Error = ScriptError;

    fn try_from(raw: HashMap<String, Vec<String>>) -> Result<Self> {
        let mut table = TagTable::new();
        for (name, members) in raw {
            let key = name.trim().to_lowercase();
            if table.tags.contains_key(&key) {
                return Err(ScriptError::DuplicateTag(key));
            }
            table.insert(&name, members);
        }
        Ok(table)
    }
}

impl From<TagTable> for HashMap<String, Vec<String>> {
    fn from(table: TagTable) -> Self {
        table.tags
    }
}
