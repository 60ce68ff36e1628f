#![allow(missing_docs)]
//! IPC server for the ELIZA script engine
//!
//! Runs as a subprocess and answers JSON-lines requests over stdin/stdout so
//! any runtime (TypeScript, Python, Go, ...) can drive the engine.
//!
//! ## Usage
//!
//! ```bash
//! cargo build --features ipc --bin eliza-script-ipc
//! ELIZA_SCRIPT_PATH=./data ./eliza-script-ipc
//! ```
//!
//! ### Example Request
//! ```json
//! {"id": 1, "method": "generateResponse", "params": {"input": "Hello"}}
//! ```
//!
//! ### Example Response
//! ```json
//! {"id": 1, "result": {"response": "How do you do. Please state your problem."}}
//! ```

use anyhow::Context;
use elizaos_eliza_script::interop::IpcHandler;
use elizaos_eliza_script::{ElizaEngine, EngineConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = EngineConfig::from_env().context("reading configuration")?;
    let engine = ElizaEngine::from_config(&config).context("loading script")?;
    let mut handler = IpcHandler::new(engine);
    info!("Server started, waiting for requests...");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Error reading input: {e}");
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = handler.handle_line(&line);
        match serde_json::to_string(&response) {
            Ok(output) => {
                stdout.write_all(output.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            Err(e) => error!("Error serializing response: {e}"),
        }
    }

    info!("Server shutting down");
    Ok(())
}
