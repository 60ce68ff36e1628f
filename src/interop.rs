#![allow(missing_docs)]

//! JSON-lines request handling for running the engine as a subprocess.
//!
//! Each request is one JSON object per line:
//!
//! ```json
//! {"id": 1, "method": "generateResponse", "params": {"input": "Hello"}}
//! ```
//!
//! and is answered with `{"id": 1, "result": ...}` or
//! `{"id": 1, "error": "..."}`.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::engine::ElizaEngine;
use crate::error::{Result, ScriptError};
use crate::script::{Script, ScriptSource};

/// Methods understood by [`IpcHandler`].
pub const IPC_METHODS: [&str; 4] = ["getManifest", "generateResponse", "traceResponse", "reloadScript"];

/// Describes this engine to a host process.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineManifest {
    pub name: String,
    pub description: String,
    pub version: String,
    pub language: String,
    pub methods: Vec<String>,
    pub keywords: usize,
}

impl EngineManifest {
    fn for_script(script: &Script) -> Self {
        Self {
            name: crate::ENGINE_NAME.to_string(),
            description: crate::ENGINE_DESCRIPTION.to_string(),
            version: crate::ENGINE_VERSION.to_string(),
            language: "rust".to_string(),
            methods: IPC_METHODS.iter().map(|m| m.to_string()).collect(),
            keywords: script.keywords().len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcRequest {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IpcResponse {
    pub fn success(id: u64, result: serde_json::Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: u64, error: &str) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.to_string()),
        }
    }
}

/// Owns the engine a subprocess answers with.
#[derive(Debug)]
pub struct IpcHandler {
    engine: ElizaEngine,
}

impl IpcHandler {
    pub fn new(engine: ElizaEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ElizaEngine {
        &self.engine
    }

    /// Parses one line and handles it. Malformed JSON is answered with id 0.
    pub fn handle_line(&mut self, line: &str) -> IpcResponse {
        match serde_json::from_str::<IpcRequest>(line) {
            Ok(request) => self.handle(&request),
            Err(e) => {
                warn!("Invalid IPC request: {e}");
                IpcResponse::error(0, &format!("Invalid JSON: {e}"))
            }
        }
    }

    pub fn handle(&mut self, request: &IpcRequest) -> IpcResponse {
        debug!(id = request.id, method = %request.method, "IPC request");
        match self.dispatch(request) {
            Ok(result) => IpcResponse::success(request.id, result),
            Err(e) => IpcResponse::error(request.id, &e.to_string()),
        }
    }

    fn dispatch(&mut self, request: &IpcRequest) -> Result<serde_json::Value> {
        match request.method.as_str() {
            "getManifest" => Ok(serde_json::to_value(EngineManifest::for_script(
                self.engine.script(),
            ))?),
            "generateResponse" => {
                let response = self.engine.respond(input_param(request))?;
                Ok(json!({ "response": response }))
            }
            "traceResponse" => {
                let trace = self.engine.respond_traced(input_param(request))?;
                Ok(serde_json::to_value(trace)?)
            }
            "reloadScript" => {
                let raw = request
                    .params
                    .get("script")
                    .cloned()
                    .ok_or_else(|| ScriptError::InvalidConfig("missing 'script' param".to_string()))?;
                let source: ScriptSource = serde_json::from_value(raw)?;
                let script = Script::from_source(source)?;
                let keywords = script.keywords().len();
                self.engine.reload(script);
                Ok(json!({ "reloaded": true, "keywords": keywords }))
            }
            other => Err(ScriptError::InvalidConfig(format!("Unknown method: {other}"))),
        }
    }
}

fn input_param(request: &IpcRequest) -> &str {
    request
        .params
        .get("input")
        .and_then(|v| v.as_str())
        .unwrap_or("")
}
