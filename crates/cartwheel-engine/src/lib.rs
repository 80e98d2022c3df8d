//! Automation engine contract and configuration for Cartwheel.
//!
//! The engine that actually drives the browser and LLM is an external
//! collaborator. This crate defines the narrow surface Cartwheel drives
//! (launch, navigate, act, extract, close), the configuration handed to the
//! engine at construction, and the subprocess bridge used by the binary.

pub mod bridge;
pub mod config;
pub mod contract;

pub use bridge::{CliBridgeEngine, CliBridgeEngineFactory};
pub use config::{
    resolve_provider, BrowserConfig, CachingConfig, EngineConfig, EngineFeatures,
    LlmProviderConfig, Viewport, ENV_ANTHROPIC_API_KEY, ENV_LLM_PROVIDER, ENV_OPENAI_API_KEY,
};
pub use contract::{ActOptions, AutomationEngine, EngineError, EngineFactory, SettlementStrategy};
