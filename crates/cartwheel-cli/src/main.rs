//! Cartwheel binary: environment-driven gateway bootstrap.
//!
//! Configuration comes from the process environment only: `LLM_PROVIDER`,
//! `OPENAI_API_KEY` / `ANTHROPIC_API_KEY`, `DEMO_HEADLESS`, `CARTWHEEL_BIND`
//! and `CARTWHEEL_ENGINE_CMD`.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use cartwheel_engine::{CliBridgeEngineFactory, LlmProviderConfig};
use cartwheel_gateway::{run_gateway_server, GatewayConfig, DEFAULT_RUN_WAIT_TIMEOUT};

const ENV_BIND: &str = "CARTWHEEL_BIND";
const ENV_ENGINE_CMD: &str = "CARTWHEEL_ENGINE_CMD";
const ENV_HEADLESS: &str = "DEMO_HEADLESS";
const DEFAULT_BIND: &str = "127.0.0.1:8787";

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn headless_from_env_value(value: Option<String>) -> bool {
    value
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let engine_command = std::env::var(ENV_ENGINE_CMD).with_context(|| {
        format!("{ENV_ENGINE_CMD} must point at the automation engine executable")
    })?;

    let llm_provider = LlmProviderConfig::resolve_from_env();
    if llm_provider.is_none() {
        tracing::warn!("no LLM API key configured; run requests will be rejected");
    }

    let config = GatewayConfig {
        bind: std::env::var(ENV_BIND).unwrap_or_else(|_| DEFAULT_BIND.to_string()),
        llm_provider,
        headless: headless_from_env_value(std::env::var(ENV_HEADLESS).ok()),
        engine_factory: Arc::new(CliBridgeEngineFactory::new(engine_command)),
        run_wait_timeout: DEFAULT_RUN_WAIT_TIMEOUT,
    };

    run_gateway_server(config).await
}
