//! Engine configuration.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScriptError};

/// How the generic fallback response is chosen when no keyword or rule
/// applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// Always the first fallback response.
    #[default]
    Fixed,
    /// Cycle through the fallback responses in order.
    RoundRobin,
}

impl FromStr for FallbackMode {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fixed" => Ok(FallbackMode::Fixed),
            "round_robin" | "roundrobin" => Ok(FallbackMode::RoundRobin),
            other => Err(ScriptError::InvalidConfig(format!(
                "unknown fallback mode: {other}"
            ))),
        }
    }
}

/// Configuration for [`crate::ElizaEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Generic responses used when nothing matches
    #[serde(default = "default_fallback_responses")]
    pub fallback_responses: Vec<String>,
    /// Fallback selection policy
    #[serde(default)]
    pub fallback_mode: FallbackMode,
    /// Script file or split-script directory; the bundled script when unset
    #[serde(default)]
    pub script_path: Option<PathBuf>,
}

fn default_fallback_responses() -> Vec<String> {
    vec![
        "Please go on.".to_string(),
        "I am not sure I understand you fully.".to_string(),
        "What does that suggest to you?".to_string(),
        "That is interesting. Please continue.".to_string(),
    ]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_responses: default_fallback_responses(),
            fallback_mode: FallbackMode::default(),
            script_path: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `ELIZA_FALLBACK_MODE`, `ELIZA_SCRIPT_PATH` and
    /// `ELIZA_FALLBACK_RESPONSES` (`|`-separated).
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ELIZA_FALLBACK_MODE") {
            config.fallback_mode = val.parse()?;
        }

        if let Ok(val) = std::env::var("ELIZA_SCRIPT_PATH") {
            if !val.trim().is_empty() {
                config.script_path = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = std::env::var("ELIZA_FALLBACK_RESPONSES") {
            let responses = val
                .split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>();
            if !responses.is_empty() {
                config.fallback_responses = responses;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Builder-style fallback mode override.
    pub fn with_fallback_mode(mut self, mode: FallbackMode) -> Self {
        self.fallback_mode = mode;
        self
    }

    /// Builder-style fallback responses override.
    pub fn with_fallback_responses<I, S>(mut self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_responses = responses.into_iter().map(Into::into).collect();
        self
    }

    /// Fails if there is nothing to fall back to.
    pub fn validate(&self) -> Result<()> {
        if self.fallback_responses.iter().all(|r| r.trim().is_empty()) {
            return Err(ScriptError::InvalidConfig(
                "at least one fallback response is required".to_string(),
            ));
        }
        Ok(())
    }
}
