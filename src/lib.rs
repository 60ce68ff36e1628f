//! # ELIZA Script Engine
//!
//! A script-driven implementation of Joseph Weizenbaum's ELIZA (MIT, 1966).
//! A script supplies word substitutions, tags (named word sets) and a ranked
//! list of keywords, each with ordered decomposition rules and rotating
//! reassembly templates. Answering a message runs four steps:
//!
//! 1. **Substitute** words of the input (`dont` → `do not`).
//! 2. **Rank** the keywords present; the highest rank wins, earliest first.
//! 3. **Decompose** the input with the first of the keyword's patterns
//!    (e.g. `(0 my @family 0)`) that matches it completely.
//! 4. **Reassemble** a response from the rule's next template, replacing
//!    numeric placeholders with the captured fragments.
//!
//! When no keyword is present or no pattern matches, a deterministic
//! fallback response is returned.
//!
//! ## Example
//!
//! ```rust
//! use elizaos_eliza_script::{ElizaEngine, Script};
//!
//! let script = Script::from_json_str(r#"{
//!     "keywords": [{"keyword": "mother", "rank": 10, "rules": [
//!         {"pattern": "(0 my mother 0)", "reassembly": ["Tell me more about your family."]}
//!     ]}]
//! }"#).unwrap();
//! let engine = ElizaEngine::with_script(script);
//! assert_eq!(
//!     engine.respond("my mother is nice").unwrap(),
//!     "Tell me more about your family."
//! );
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod decompose;
pub mod engine;
pub mod error;
pub mod interop;
pub mod pattern;
pub mod rank;
pub mod reassemble;
pub mod script;
pub mod substitute;
pub mod tags;

pub use config::{EngineConfig, FallbackMode};
pub use decompose::{decompose, MatchResult, PatternAttempt};
pub use engine::{ElizaEngine, ResponseTrace};
pub use error::{Result, ScriptError};
pub use pattern::{compile, Component, Matcher};
pub use rank::{rank, KeywordCandidate};
pub use reassemble::reassemble;
pub use script::{DecompRule, KeywordEntry, Script, ScriptSource};
pub use substitute::substitute;
pub use tags::TagTable;

use lazy_static::lazy_static;

/// Engine name reported to host processes
pub const ENGINE_NAME: &str = "eliza-script";
/// Version matching Cargo.toml
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Engine description
pub const ENGINE_DESCRIPTION: &str = "Script-driven ELIZA pattern matching - no LLM required";

lazy_static! {
    static ref DOCTOR: ElizaEngine =
        ElizaEngine::with_script(Script::doctor().expect("bundled doctor script must be valid"));
}

/// Responds with a shared engine running the bundled DOCTOR script.
///
/// Rotation state is shared by every caller of this function.
pub fn generate_response(input: &str) -> Result<String> {
    DOCTOR.respond(input)
}
