//! Decomposition pattern compiler.
//!
//! Turns Weizenbaum notation such as `(0 @be 0 like 0)` into an anchored,
//! case-insensitive regular expression with one capturing group per
//! component:
//!
//! | component | matches                                   |
//! |-----------|-------------------------------------------|
//! | `0`       | any text, possibly empty (greedy)         |
//! | `n > 0`   | exactly `n` whitespace-separated tokens   |
//! | `@tag`    | one word from the tag's member set        |
//! | other     | that literal word as a whole token        |

use regex::Regex;
use thiserror::Error;
use tracing::warn;

use crate::error::ScriptError;
use crate::tags::TagTable;

/// Prefix marking a tag reference inside a pattern.
pub const TAG_SENTINEL: char = '@';

/// Why a pattern source could not be parsed. Carries no rule context;
/// see [`NotationError::in_rule`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct NotationError(String);

impl NotationError {
    /// Attaches the owning keyword and rule position.
    pub fn in_rule(self, keyword: &str, rule_index: usize, pattern: &str) -> ScriptError {
        ScriptError::MalformedPattern {
            keyword: keyword.to_string(),
            rule_index,
            pattern: pattern.to_string(),
            reason: self.0,
        }
    }
}

/// One parsed pattern component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    /// `0`
    Wildcard,
    /// A fixed-width span of `n` tokens.
    Span(usize),
    /// `@name`. `members` is `None` when the tag is undefined.
    Tag {
        /// Lowercased tag name
        name: String,
        /// Resolved member words
        members: Option<Vec<String>>,
    },
    /// A literal word.
    Literal(String),
}

impl Component {
    /// Whether this component can match anything at all.
    pub fn is_satisfiable(&self) -> bool {
        match self {
            Component::Tag { members, .. } => members.as_ref().is_some_and(|m| !m.is_empty()),
            _ => true,
        }
    }

    fn to_regex(&self) -> String {
        match self {
            Component::Wildcard => ".*".to_string(),
            Component::Span(n) => {
                let mut expr = String::from(r"\S+");
                if *n > 1 {
                    expr.push_str(&format!(r"(?:\s+\S+){{{}}}", n - 1));
                }
                expr
            }
            Component::Tag { members, .. } => {
                let alternatives = members
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(|m| bounded(m))
                    .collect::<Vec<_>>();
                format!("(?:{})", alternatives.join("|"))
            }
            Component::Literal(word) => bounded(word),
        }
    }
}

/// Wraps an escaped word in `\b` on each side that starts or ends with a
/// word character.
fn bounded(word: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut out = String::new();
    if word.chars().next().is_some_and(is_word) {
        out.push_str(r"\b");
    }
    out.push_str(&regex::escape(word));
    if word.chars().last().is_some_and(is_word) {
        out.push_str(r"\b");
    }
    out
}

/// A compiled decomposition pattern.
#[derive(Debug, Clone)]
pub struct Matcher {
    source: String,
    components: Vec<Component>,
    expression: String,
    /// `None` when some component can never match.
    regex: Option<Regex>,
}

impl Matcher {
    /// Original notation.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed components, left to right.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Number of capturing groups; every component captures.
    pub fn capture_count(&self) -> usize {
        self.components.len()
    }

    /// The generated regular expression, for diagnostics.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Whether the matcher can match any input at all.
    pub fn is_satisfiable(&self) -> bool {
        self.regex.is_some()
    }

    /// Matches the whole trimmed `input`, returning one trimmed fragment per
    /// component.
    pub fn captures(&self, input: &str) -> Option<Vec<String>> {
        let regex = self.regex.as_ref()?;
        let caps = regex.captures(input.trim())?;
        Some(
            (1..=self.components.len())
                .map(|i| {
                    caps.get(i)
                        .map(|m| m.as_str().trim().to_string())
                        .unwrap_or_default()
                })
                .collect(),
        )
    }

    /// Whether the whole trimmed `input` matches.
    pub fn is_match(&self, input: &str) -> bool {
        self.regex
            .as_ref()
            .is_some_and(|regex| regex.is_match(input.trim()))
    }
}

/// Strips the enclosing parentheses and splits on whitespace.
fn split_components(source: &str) -> Result<Vec<&str>, NotationError> {
    let trimmed = source.trim();
    let inner = match (trimmed.starts_with('('), trimmed.ends_with(')')) {
        (true, true) if trimmed.len() >= 2 => &trimmed[1..trimmed.len() - 1],
        (false, false) => trimmed,
        _ => return Err(NotationError("unbalanced parentheses".to_string())),
    };
    if inner.contains(['(', ')']) {
        return Err(NotationError("nested parentheses".to_string()));
    }
    let parts = inner.split_whitespace().collect::<Vec<_>>();
    if parts.is_empty() {
        return Err(NotationError("empty component list".to_string()));
    }
    Ok(parts)
}

fn classify(token: &str, tags: &TagTable, source: &str) -> Result<Component, NotationError> {
    if token == "0" {
        return Ok(Component::Wildcard);
    }
    if token.bytes().all(|b| b.is_ascii_digit()) {
        let n = token
            .parse::<usize>()
            .map_err(|_| NotationError(format!("span length out of range: {token}")))?;
        if n > 0 {
            return Ok(Component::Span(n));
        }
        return Ok(Component::Literal(token.to_string()));
    }
    if let Some(name) = token.strip_prefix(TAG_SENTINEL) {
        if name.is_empty() {
            return Err(NotationError("empty tag reference".to_string()));
        }
        let name = name.to_lowercase();
        let members = tags.resolve(&name).map(<[String]>::to_vec);
        if members.is_none() {
            let err = ScriptError::UnknownTag {
                tag: name.clone(),
                pattern: source.to_string(),
            };
            warn!("{err}; component will never match");
        }
        return Ok(Component::Tag { name, members });
    }
    Ok(Component::Literal(token.to_string()))
}

/// Whitespace allowed between two adjacent components. A span only starts
/// and ends on token boundaries: input start, input end or whitespace.
fn separator(left: &Component, right: &Component) -> &'static str {
    if matches!(left, Component::Span(_)) || matches!(right, Component::Span(_)) {
        r"(?:^|\s+|$)"
    } else {
        r"\s*"
    }
}

/// Compiles `source` against `tags`.
///
/// Undefined tags do not fail compilation: the component simply never
/// matches, which disables the one rule rather than the whole script.
pub fn compile(source: &str, tags: &TagTable) -> Result<Matcher, NotationError> {
    let components = split_components(source)?
        .into_iter()
        .map(|token| classify(token, tags, source))
        .collect::<Result<Vec<_>, _>>()?;

    let mut expression = String::from(r"(?is)^\s*");
    for (i, component) in components.iter().enumerate() {
        if i > 0 {
            expression.push_str(separator(&components[i - 1], component));
        }
        expression.push('(');
        expression.push_str(&component.to_regex());
        expression.push(')');
    }
    expression.push_str(r"\s*$");

    let regex = if components.iter().all(Component::is_satisfiable) {
        let regex = Regex::new(&expression).map_err(|e| NotationError(e.to_string()))?;
        Some(regex)
    } else {
        None
    };

    Ok(Matcher {
        source: source.to_string(),
        components,
        expression,
        regex,
    })
}
