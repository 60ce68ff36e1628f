//! The response pipeline: substitute, rank, decompose, reassemble.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use tracing::debug;

use crate::config::{EngineConfig, FallbackMode};
use crate::decompose::{decompose_with_attempts, PatternAttempt};
use crate::error::Result;
use crate::rank::{candidates, select, KeywordCandidate};
use crate::reassemble::reassemble_detailed;
use crate::script::Script;
use crate::substitute::{substitute_with_log, AppliedSubstitution};

/// Every intermediate result of one [`ElizaEngine::respond_traced`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseTrace {
    /// Input as given
    pub input: String,
    /// Input after word substitution
    pub substituted: String,
    /// Substitutions that fired
    pub substitutions: Vec<AppliedSubstitution>,
    /// Keyword tokens found, in input order
    pub candidates: Vec<KeywordCandidate>,
    /// Selected keyword, if any had a nonzero rank
    pub keyword: Option<KeywordCandidate>,
    /// Rules tried for the selected keyword
    pub attempts: Vec<PatternAttempt>,
    /// Fragments captured by the matching rule
    pub fragments: Vec<String>,
    /// Template used, if a rule matched
    pub template: Option<String>,
    /// Final response
    pub response: String,
    /// Whether the generic fallback was used
    pub fallback: bool,
}

#[derive(Debug)]
struct FallbackPolicy {
    responses: Vec<String>,
    mode: FallbackMode,
    cursor: AtomicUsize,
}

impl FallbackPolicy {
    fn new(config: &EngineConfig) -> Self {
        Self {
            responses: config
                .fallback_responses
                .iter()
                .filter(|r| !r.trim().is_empty())
                .cloned()
                .collect(),
            mode: config.fallback_mode,
            cursor: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> String {
        let len = self.responses.len();
        if len == 0 {
            return String::new();
        }
        let idx = match self.mode {
            FallbackMode::Fixed => 0,
            FallbackMode::RoundRobin => self
                .cursor
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
                .unwrap_or_else(|c| c),
        };
        self.responses[idx % len].clone()
    }
}

/// A script plus the fallback policy used when it has nothing to say.
#[derive(Debug)]
pub struct ElizaEngine {
    script: Script,
    fallback: FallbackPolicy,
}

impl ElizaEngine {
    /// Creates an engine over `script`.
    pub fn new(script: Script, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            script,
            fallback: FallbackPolicy::new(config),
        })
    }

    /// Creates an engine over `script` with the default configuration.
    pub fn with_script(script: Script) -> Self {
        Self {
            script,
            fallback: FallbackPolicy::new(&EngineConfig::default()),
        }
    }

    /// Creates an engine from configuration, loading `script_path` or the
    /// bundled script.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let script = match &config.script_path {
            Some(path) => Script::from_path(path)?,
            None => Script::doctor()?,
        };
        Self::new(script, config)
    }

    /// The active script.
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Replaces the script. Rotation cursors start over with the new one.
    pub fn reload(&mut self, script: Script) {
        self.script = script;
    }

    /// Produces the response to `input`.
    ///
    /// Only script inconsistencies are errors; "no keyword" and "no rule
    /// matched" both produce the fallback response.
    pub fn respond(&self, input: &str) -> Result<String> {
        self.respond_traced(input).map(|trace| trace.response)
    }

    /// Produces the response to `input` along with every intermediate step.
    pub fn respond_traced(&self, input: &str) -> Result<ResponseTrace> {
        let (substituted, substitutions) =
            substitute_with_log(input.trim(), self.script.substitutions());
        let found = candidates(&substituted, &self.script);
        let keyword = select(found.iter().cloned());
        debug!(
            substituted = %substituted,
            keyword = keyword.as_ref().map(|k| k.keyword.as_str()),
            "Ranked input"
        );

        let mut trace = ResponseTrace {
            input: input.to_string(),
            substituted,
            substitutions,
            candidates: found,
            keyword,
            attempts: Vec::new(),
            fragments: Vec::new(),
            template: None,
            response: String::new(),
            fallback: false,
        };

        if let Some(selected) = &trace.keyword {
            let (matched, attempts) =
                decompose_with_attempts(&selected.keyword, &trace.substituted, &self.script)?;
            trace.attempts = attempts;
            if let Some(matched) = matched {
                let reassembly = reassemble_detailed(matched.rule, &matched.fragments)?;
                debug!(
                    keyword = matched.rule.keyword(),
                    rule = matched.rule.index(),
                    template = %reassembly.template,
                    "Reassembled response"
                );
                trace.fragments = matched.fragments;
                trace.template = Some(reassembly.template);
                trace.response = reassembly.text;
                return Ok(trace);
            }
        }

        trace.response = self.fallback.next();
        trace.fallback = true;
        debug!(response = %trace.response, "Using fallback response");
        Ok(trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{KeywordSource, RuleSource, ScriptSource};
    use pretty_assertions::assert_eq;

    fn mother_script() -> Script {
        Script::from_source(ScriptSource {
            keywords: vec![KeywordSource {
                keyword: "mother".to_string(),
                rank: 10,
                rules: vec![RuleSource {
                    pattern: "(0 my mother 0)".to_string(),
                    reassembly: vec!["Tell me more about your family.".to_string()],
                }],
            }],
            ..ScriptSource::default()
        })
        .unwrap()
    }

    #[test]
    fn test_end_to_end_trace() {
        let engine = ElizaEngine::with_script(mother_script());
        let trace = engine.respond_traced("my mother is nice").unwrap();
        assert_eq!(trace.substituted, "my mother is nice");
        assert_eq!(trace.keyword.unwrap().keyword, "mother");
        assert_eq!(trace.fragments, vec!["", "my", "mother", "is nice"]);
        assert_eq!(trace.template.as_deref(), Some("Tell me more about your family."));
        assert_eq!(trace.response, "Tell me more about your family.");
        assert!(!trace.fallback);
    }

    #[test]
    fn test_fixed_fallback_is_stable() {
        let engine = ElizaEngine::with_script(mother_script());
        let first = engine.respond("hello there").unwrap();
        assert_eq!(first, "Please go on.");
        for _ in 0..5 {
            assert_eq!(engine.respond("hello there").unwrap(), first);
        }
    }

    #[test]
    fn test_no_match_and_no_keyword_fall_back_identically() {
        let engine = ElizaEngine::with_script(mother_script());
        let no_keyword = engine.respond_traced("hello there").unwrap();
        let no_match = engine.respond_traced("mother knows best").unwrap();
        assert!(no_keyword.fallback && no_match.fallback);
        assert_eq!(no_keyword.response, no_match.response);
        assert_eq!(no_match.attempts.len(), 1);
    }

    #[test]
    fn test_round_robin_fallback() {
        let config = EngineConfig::default()
            .with_fallback_mode(FallbackMode::RoundRobin)
            .with_fallback_responses(["one", "two"]);
        let engine = ElizaEngine::new(mother_script(), &config).unwrap();
        let got = (0..3)
            .map(|_| engine.respond("xyzzy").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(got, vec!["one", "two", "one"]);
    }

    #[test]
    fn test_reload_resets_rotation() {
        let rotating = || {
            Script::from_json_str(
                r#"{"keywords": [{"keyword": "mother", "rank": 10, "rules": [
                    {"pattern": "(0 mother 0)", "reassembly": ["A 3", "B 3"]}
                ]}]}"#,
            )
            .unwrap()
        };
        let mut engine = ElizaEngine::with_script(rotating());
        assert_eq!(engine.respond("mother is kind").unwrap(), "A is kind");
        assert_eq!(engine.script().keyword("mother").unwrap().rules[0].rotation_cursor(), 1);

        engine.reload(rotating());
        assert_eq!(engine.respond("mother is kind").unwrap(), "A is kind");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig::default().with_fallback_responses(["  "]);
        assert!(ElizaEngine::new(mother_script(), &config).is_err());
    }
}
