//! Error types for the ELIZA script engine
//!
//! Load-time problems (bad notation, duplicate keywords, rules without
//! templates) fail fast. Runtime "no match" is never an error.

use thiserror::Error;

/// Result type alias for script operations
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Script engine error types
#[derive(Debug, Error)]
pub enum ScriptError {
    /// A pattern references a tag absent from the script's tag table.
    ///
    /// The compiler does not return this; it degrades the component to one
    /// that never matches. The variant exists so diagnostics can report it.
    #[error("Unknown tag '@{tag}' in pattern {pattern}")]
    UnknownTag {
        /// Tag name without the `@` sentinel
        tag: String,
        /// Pattern source the tag appeared in
        pattern: String,
    },

    /// The ranker picked a keyword the rule table does not know.
    #[error("Unknown keyword: {0}")]
    UnknownKeyword(String),

    /// A rule has no reassembly templates.
    #[error("Rule {rule_index} of keyword '{keyword}' has no reassembly templates")]
    EmptyTemplateSet {
        /// Keyword owning the rule
        keyword: String,
        /// Position of the rule within the keyword's rule list
        rule_index: usize,
    },

    /// Pattern notation could not be parsed.
    #[error("Malformed pattern {pattern:?} (keyword '{keyword}', rule {rule_index}): {reason}")]
    MalformedPattern {
        /// Keyword owning the rule
        keyword: String,
        /// Position of the rule within the keyword's rule list
        rule_index: usize,
        /// Original notation
        pattern: String,
        /// What is wrong with it
        reason: String,
    },

    /// A keyword entry has a blank keyword (position in the keyword list).
    #[error("Keyword entry {0} has an empty keyword")]
    EmptyKeyword(usize),

    /// Two entries share the same keyword.
    #[error("Duplicate keyword: {0}")]
    DuplicateKeyword(String),

    /// Two substitution keys differ only in case.
    #[error("Duplicate substitution key: {0}")]
    DuplicateSubstitution(String),

    /// Two tag names differ only in case.
    #[error("Duplicate tag: {0}")]
    DuplicateTag(String),

    /// Configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Script JSON could not be decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Script file could not be read.
    #[error("I/O error: {0}")]
    Io(String),
}

impl ScriptError {
    /// Whether the error was raised while building a script, as opposed to
    /// while answering a message.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            ScriptError::EmptyTemplateSet { .. }
                | ScriptError::MalformedPattern { .. }
                | ScriptError::DuplicateKeyword(_)
                | ScriptError::DuplicateSubstitution(_)
                | ScriptError::DuplicateTag(_)
                | ScriptError::EmptyKeyword(_)
                | ScriptError::SerializationError(_)
                | ScriptError::Io(_)
        )
    }
}

impl From<serde_json::Error> for ScriptError {
    fn from(err: serde_json::Error) -> Self {
        ScriptError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for ScriptError {
    fn from(err: std::io::Error) -> Self {
        ScriptError::Io(err.to_string())
    }
}
