//! Script store: deserializable script shapes and the compiled, validated
//! [`Script`] the engine runs against.
//!
//! Two on-disk layouts are accepted:
//!
//! - a single document `{ "substitutions", "tags", "keywords" }`
//! - the split pair `general.json` (`{ "substitutions", "tags" }`) and
//!   `doctor.json` (an array of keyword entries)
//!
//! Rules may name their pattern `pattern` or `decomp`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScriptError};
use crate::pattern::{compile, Matcher};
use crate::tags::TagTable;

/// File name of the substitutions/tags half of a split script.
pub const GENERAL_FILE: &str = "general.json";
/// File name of the keyword half of a split script.
pub const KEYWORDS_FILE: &str = "doctor.json";

/// Whole script as supplied by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptSource {
    /// Word → replacement
    #[serde(default)]
    pub substitutions: HashMap<String, String>,
    /// Tag name → member words
    #[serde(default)]
    pub tags: HashMap<String, Vec<String>>,
    /// Keyword entries, in declared order
    #[serde(default)]
    pub keywords: Vec<KeywordSource>,
}

/// The `general.json` half of a split script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralSource {
    /// Word → replacement
    #[serde(default)]
    pub substitutions: HashMap<String, String>,
    /// Tag name → member words
    #[serde(default)]
    pub tags: HashMap<String, Vec<String>>,
}

/// One keyword entry as supplied by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSource {
    /// Keyword text
    pub keyword: String,
    /// Importance; 0 means never selected
    #[serde(default)]
    pub rank: u32,
    /// Decomposition rules, in declared order
    #[serde(default)]
    pub rules: Vec<RuleSource>,
}

/// One decomposition rule as supplied by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSource {
    /// Pattern notation, e.g. `(0 my @family 0)`
    #[serde(alias = "decomp")]
    pub pattern: String,
    /// Reassembly templates, rotated through in order
    #[serde(default)]
    pub reassembly: Vec<String>,
}

/// A compiled decomposition rule together with its rotation cursor.
#[derive(Debug)]
pub struct DecompRule {
    keyword: String,
    index: usize,
    matcher: Matcher,
    templates: Vec<String>,
    cursor: AtomicUsize,
}

impl DecompRule {
    /// Compiles `pattern` for rule `index` of `keyword`.
    ///
    /// Templates are not validated here; [`Script::from_source`] rejects
    /// rules without any.
    pub fn compile(
        keyword: &str,
        index: usize,
        pattern: &str,
        templates: Vec<String>,
        tags: &TagTable,
    ) -> Result<Self> {
        let matcher = compile(pattern, tags).map_err(|e| e.in_rule(keyword, index, pattern))?;
        Ok(Self {
            keyword: keyword.to_string(),
            index,
            matcher,
            templates,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Keyword owning this rule.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Position within the keyword's rule list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Original pattern notation.
    pub fn pattern_source(&self) -> &str {
        self.matcher.source()
    }

    /// Compiled matcher.
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Reassembly templates.
    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// Index of the template the next reassembly will use.
    pub fn rotation_cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Returns the template under the cursor and advances the cursor,
    /// wrapping. The read and the advance are one atomic step, so concurrent
    /// callers never observe the same slot twice in a row.
    ///
    /// Only the reassembler calls this.
    pub(crate) fn take_template(&self) -> Option<&str> {
        let len = self.templates.len();
        if len == 0 {
            return None;
        }
        let current = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
            .unwrap_or_else(|c| c);
        self.templates.get(current % len).map(String::as_str)
    }
}

/// A keyword with its rank and ordered rules.
#[derive(Debug)]
pub struct KeywordEntry {
    /// Lowercased keyword
    pub keyword: String,
    /// Importance
    pub rank: u32,
    /// Rules, tried in this order
    pub rules: Vec<DecompRule>,
}

/// The compiled rule database.
#[derive(Debug)]
pub struct Script {
    substitutions: HashMap<String, String>,
    tags: TagTable,
    keywords: Vec<KeywordEntry>,
    index: HashMap<String, usize>,
}

impl Script {
    /// Validates and compiles a script.
    ///
    /// Fails on duplicate or blank keywords, substitution keys or tag names
    /// that collide once lowercased, malformed patterns and rules without
    /// reassembly templates. Undefined tags only disable the rule
    /// that references them.
    pub fn from_source(source: ScriptSource) -> Result<Self> {
        let tags = TagTable::try_from(source.tags)?;
        let mut substitutions = HashMap::with_capacity(source.substitutions.len());
        for (word, replacement) in source.substitutions {
            let word = word.to_lowercase();
            if substitutions.contains_key(&word) {
                return Err(ScriptError::DuplicateSubstitution(word));
            }
            substitutions.insert(word, replacement);
        }

        let mut keywords = Vec::with_capacity(source.keywords.len());
        let mut index = HashMap::new();
        for (position, entry) in source.keywords.into_iter().enumerate() {
            let keyword = entry.keyword.trim().to_lowercase();
            if keyword.is_empty() {
                return Err(ScriptError::EmptyKeyword(position));
            }
            if index.insert(keyword.clone(), position).is_some() {
                return Err(ScriptError::DuplicateKeyword(keyword));
            }

            let mut rules = Vec::with_capacity(entry.rules.len());
            for (i, rule) in entry.rules.into_iter().enumerate() {
                if rule.reassembly.is_empty() {
                    return Err(ScriptError::EmptyTemplateSet {
                        keyword,
                        rule_index: i,
                    });
                }
                rules.push(DecompRule::compile(
                    &keyword,
                    i,
                    &rule.pattern,
                    rule.reassembly,
                    &tags,
                )?);
            }
            debug!(keyword = %keyword, rank = entry.rank, rules = rules.len(), "Compiled keyword");
            keywords.push(KeywordEntry {
                keyword,
                rank: entry.rank,
                rules,
            });
        }

        info!(
            keywords = keywords.len(),
            substitutions = substitutions.len(),
            tags = tags.len(),
            "Loaded ELIZA script"
        );

        Ok(Self {
            substitutions,
            tags,
            keywords,
            index,
        })
    }

    /// Parses and compiles a single-document script.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_source(serde_json::from_str(json)?)
    }

    /// Parses and compiles a split script: `general` holds substitutions and
    /// tags, `keywords` the keyword array.
    pub fn from_parts(general: &str, keywords: &str) -> Result<Self> {
        let general: GeneralSource = serde_json::from_str(general)?;
        let keywords: Vec<KeywordSource> = serde_json::from_str(keywords)?;
        Self::from_source(ScriptSource {
            substitutions: general.substitutions,
            tags: general.tags,
            keywords,
        })
    }

    /// Loads a script from disk. A directory is read as a split script
    /// ([`GENERAL_FILE`] + [`KEYWORDS_FILE`]), a file as a single document.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading script");
        if path.is_dir() {
            let general = std::fs::read_to_string(path.join(GENERAL_FILE))?;
            let keywords = std::fs::read_to_string(path.join(KEYWORDS_FILE))?;
            Self::from_parts(&general, &keywords)
        } else {
            Self::from_json_str(&std::fs::read_to_string(path)?)
        }
    }

    /// The bundled DOCTOR script.
    pub fn doctor() -> Result<Self> {
        Self::from_parts(
            include_str!("../data/general.json"),
            include_str!("../data/doctor.json"),
        )
    }

    /// Word substitution table (lowercased keys).
    pub fn substitutions(&self) -> &HashMap<String, String> {
        &self.substitutions
    }

    /// Tag table.
    pub fn tags(&self) -> &TagTable {
        &self.tags
    }

    /// Keyword entries in declared order.
    pub fn keywords(&self) -> &[KeywordEntry] {
        &self.keywords
    }

    /// Looks up an entry by keyword, case-insensitively.
    pub fn keyword(&self, keyword: &str) -> Option<&KeywordEntry> {
        self.index
            .get(&keyword.to_lowercase())
            .and_then(|&i| self.keywords.get(i))
    }

    /// Rank of `word`; 0 when it is not a keyword.
    pub fn rank_of(&self, word: &str) -> u32 {
        self.keyword(word).map(|e| e.rank).unwrap_or(0)
    }
}
