use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::process::Command;

use crate::config::EngineConfig;
use crate::contract::{ActOptions, AutomationEngine, EngineError, EngineFactory};

const BRIDGE_ERROR_TIMEOUT: &str = "timeout";
const BRIDGE_ERROR_ELEMENT_NOT_FOUND: &str = "element_not_found";
const BRIDGE_ERROR_NAVIGATION: &str = "navigation";
const BRIDGE_ERROR_EXTRACTION: &str = "extraction";

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    status: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    code: String,
    #[serde(default)]
    detail: String,
}

#[derive(Debug)]
/// Public struct `CliBridgeEngine` used across Cartwheel components.
///
/// Drives an external automation engine executable one JSON command per
/// invocation: `<command> <subcommand> [payload-json]` on argv, a single
/// JSON object on stdout.
pub struct CliBridgeEngine {
    command_path: String,
    config: EngineConfig,
}

impl CliBridgeEngine {
    pub fn new(command_path: impl Into<String>, config: EngineConfig) -> Result<Self, EngineError> {
        let command_path = command_path.into();
        if command_path.trim().is_empty() {
            return Err(EngineError::Session(
                "engine bridge command path cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            command_path,
            config,
        })
    }

    async fn invoke(
        &self,
        subcommand: &str,
        payload: Option<Value>,
        context: &str,
    ) -> Result<Value, EngineError> {
        let mut command = Command::new(self.command_path.trim());
        command.arg(subcommand);
        if let Some(payload) = payload {
            command.arg(payload.to_string());
        }

        let output = command.output().await.map_err(|error| {
            EngineError::Session(format!(
                "failed to launch engine bridge '{}': {error}",
                self.command_path
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let detail = if !stderr.is_empty() {
                stderr
            } else if !stdout.is_empty() {
                stdout
            } else {
                "no output".to_string()
            };
            return Err(EngineError::Session(format!(
                "engine bridge subcommand '{subcommand}' failed: {detail}"
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            return Err(EngineError::Session(format!(
                "engine bridge returned empty response for '{subcommand}'"
            )));
        }

        let response = serde_json::from_str::<BridgeResponse>(&stdout).map_err(|error| {
            EngineError::Session(format!("failed to parse engine bridge response: {error}"))
        })?;

        if response.status == "ok" {
            return Ok(response.data);
        }

        Err(map_bridge_failure(
            &response.code,
            response.detail,
            context,
        ))
    }
}

fn map_bridge_failure(code: &str, detail: String, context: &str) -> EngineError {
    match code {
        BRIDGE_ERROR_TIMEOUT => EngineError::Timeout {
            instruction: context.to_string(),
        },
        BRIDGE_ERROR_ELEMENT_NOT_FOUND => EngineError::ElementNotFound {
            instruction: context.to_string(),
        },
        BRIDGE_ERROR_NAVIGATION => EngineError::Navigation {
            url: context.to_string(),
            detail,
        },
        BRIDGE_ERROR_EXTRACTION => EngineError::Extraction { detail },
        _ => EngineError::Action {
            instruction: context.to_string(),
            detail: if detail.is_empty() {
                format!("engine bridge error '{code}'")
            } else {
                detail
            },
        },
    }
}

#[async_trait::async_trait]
impl AutomationEngine for CliBridgeEngine {
    async fn launch(&self) -> Result<(), EngineError> {
        let payload = serde_json::to_value(&self.config)
            .map_err(|error| EngineError::Launch(error.to_string()))?;
        self.invoke("launch", Some(payload), "launch")
            .await
            .map_err(|error| match error {
                EngineError::Session(detail) => EngineError::Launch(detail),
                other => other,
            })?;
        Ok(())
    }

    async fn new_page(&self) -> Result<(), EngineError> {
        self.invoke("new-page", None, "new page").await?;
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), EngineError> {
        self.invoke("goto", Some(json!({ "url": url })), url).await?;
        Ok(())
    }

    async fn wait_for_network_idle(&self) -> Result<(), EngineError> {
        self.invoke("wait-network-idle", None, "network idle").await?;
        Ok(())
    }

    async fn wait_for_timeout(&self, wait_ms: u64) -> Result<(), EngineError> {
        self.invoke(
            "wait-timeout",
            Some(json!({ "wait_ms": wait_ms })),
            "wait timeout",
        )
        .await?;
        Ok(())
    }

    async fn act(
        &self,
        instruction: &str,
        options: Option<ActOptions>,
    ) -> Result<(), EngineError> {
        let payload = json!({
            "instruction": instruction,
            "options": options,
        });
        self.invoke("act", Some(payload), instruction).await?;
        Ok(())
    }

    async fn extract(&self, instruction: &str, schema: &Value) -> Result<Value, EngineError> {
        let payload = json!({
            "instruction": instruction,
            "schema": schema,
        });
        self.invoke("extract", Some(payload), instruction).await
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.invoke("close", None, "close").await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Public struct `CliBridgeEngineFactory` used across Cartwheel components.
pub struct CliBridgeEngineFactory {
    command_path: String,
}

impl CliBridgeEngineFactory {
    pub fn new(command_path: impl Into<String>) -> Self {
        Self {
            command_path: command_path.into(),
        }
    }
}

impl EngineFactory for CliBridgeEngineFactory {
    fn create(&self, config: EngineConfig) -> Result<Arc<dyn AutomationEngine>, EngineError> {
        Ok(Arc::new(CliBridgeEngine::new(
            self.command_path.clone(),
            config,
        )?))
    }
}
