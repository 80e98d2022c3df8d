use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Enumerates supported `SettlementStrategy` values.
///
/// Governs how long the engine waits before judging an action settled.
/// `Patient` tolerates slow page updates before declaring success or failure.
pub enum SettlementStrategy {
    #[default]
    Immediate,
    Patient,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Public struct `ActOptions` used across Cartwheel components.
pub struct ActOptions {
    pub max_attempts: usize,
    pub settlement_strategy: SettlementStrategy,
}

impl Default for ActOptions {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            settlement_strategy: SettlementStrategy::Immediate,
        }
    }
}

impl ActOptions {
    pub fn patient(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            settlement_strategy: SettlementStrategy::Patient,
        }
    }
}

#[derive(Debug, Error)]
/// Enumerates supported `EngineError` values.
pub enum EngineError {
    #[error("failed to launch automation engine: {0}")]
    Launch(String),
    #[error("navigation to '{url}' failed: {detail}")]
    Navigation { url: String, detail: String },
    #[error("action '{instruction}' failed: {detail}")]
    Action { instruction: String, detail: String },
    #[error("action '{instruction}' timed out")]
    Timeout { instruction: String },
    #[error("no matching element for '{instruction}'")]
    ElementNotFound { instruction: String },
    #[error("extraction failed: {detail}")]
    Extraction { detail: String },
    #[error("extracted data does not match schema: {detail}")]
    SchemaMismatch { detail: String },
    #[error("engine session error: {0}")]
    Session(String),
}

#[async_trait]
/// Trait contract for `AutomationEngine` behavior.
///
/// One engine instance backs exactly one run; the caller that constructed it
/// is responsible for seeing `close` invoked before the instance is dropped.
/// `extract` returns data conforming to the supplied JSON Schema shape or
/// fails with an extraction error.
pub trait AutomationEngine: Send + Sync {
    async fn launch(&self) -> Result<(), EngineError>;
    async fn new_page(&self) -> Result<(), EngineError>;
    async fn goto(&self, url: &str) -> Result<(), EngineError>;
    async fn wait_for_network_idle(&self) -> Result<(), EngineError>;
    async fn wait_for_timeout(&self, wait_ms: u64) -> Result<(), EngineError>;
    async fn act(&self, instruction: &str, options: Option<ActOptions>)
        -> Result<(), EngineError>;
    async fn extract(&self, instruction: &str, schema: &Value) -> Result<Value, EngineError>;
    async fn close(&self) -> Result<(), EngineError>;
}

/// Trait contract for `EngineFactory` behavior.
///
/// Each run leases a fresh engine; instances are never shared across runs.
pub trait EngineFactory: Send + Sync {
    fn create(&self, config: EngineConfig) -> Result<Arc<dyn AutomationEngine>, EngineError>;
}
