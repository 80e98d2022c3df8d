use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use cartwheel_engine::{EngineConfig, EngineFactory, LlmProviderConfig};
use cartwheel_pipeline::{run_event_channel, MarketplaceRunner, ProgressLog, RunEvent};

use crate::wire::encode_event_line;


pub const RUN_ENDPOINT: &str = "/v1/runs";

/// Wall-clock budget the HTTP layer waits for a buffered run. Advisory: the
/// run task itself is never cancelled.
pub const DEFAULT_RUN_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

const INVALID_QUERY_MESSAGE: &str = "Invalid search query";
const NO_CREDENTIALS_MESSAGE: &str =
    "No LLM API key configured. Please set OPENAI_API_KEY or ANTHROPIC_API_KEY in your environment.";

#[derive(Clone)]
/// Public struct `GatewayConfig` used across Cartwheel components.
pub struct GatewayConfig {
    pub bind: String,
    pub llm_provider: Option<LlmProviderConfig>,
    pub headless: bool,
    pub engine_factory: Arc<dyn EngineFactory>,
    pub run_wait_timeout: Duration,
}

/// Public struct `GatewayState` used across Cartwheel components.
pub struct GatewayState {
    config: GatewayConfig,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }
}

fn default_stream() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunApiRequest {
    #[serde(default)]
    search_query: Option<String>,
    #[serde(default = "default_stream")]
    stream: bool,
}

#[derive(Debug, Clone)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn handle_run(State(state): State<Arc<GatewayState>>, body: Bytes) -> Response {
    let request = match serde_json::from_slice::<RunApiRequest>(&body) {
        Ok(request) => request,
        Err(error) => {
            return ApiError::internal(format!("failed to parse request body: {error}"))
                .into_response();
        }
    };

    let search_query = request
        .search_query
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if search_query.is_empty() {
        return ApiError::bad_request(INVALID_QUERY_MESSAGE).into_response();
    }

    let Some(provider) = state.config.llm_provider.clone() else {
        return ApiError::internal(NO_CREDENTIALS_MESSAGE).into_response();
    };

    let engine_config = EngineConfig::new(provider).with_headless(state.config.headless);
    let engine = match state.config.engine_factory.create(engine_config) {
        Ok(engine) => engine,
        Err(error) => return ApiError::internal(error.to_string()).into_response(),
    };

    let runner = MarketplaceRunner::new(engine);
    if request.stream {
        stream_run(runner, search_query)
    } else {
        buffered_run(runner, search_query, state.config.run_wait_timeout).await
    }
}

/// Launches the run as a background task and hands the response body back
/// immediately; the task and the body share only the event channel. The
/// channel closes after the terminal record, which ends the stream.
fn stream_run(runner: MarketplaceRunner, search_query: String) -> Response {
    let (events, rx) = run_event_channel();
    tokio::spawn(async move {
        let task_events = events.clone();
        let run = tokio::spawn(async move {
            let result = runner
                .execute(&search_query, task_events.progress_handler())
                .await;
            task_events.send_terminal(RunEvent::Result { data: result });
        });
        if let Err(error) = run.await {
            events.send_terminal(RunEvent::Error {
                error: format!("run task failed: {error}"),
            });
        }
    });

    let body_stream = UnboundedReceiverStream::new(rx)
        .map(|event| Ok::<_, Infallible>(encode_event_line(&event)));

    match Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(body_stream))
    {
        Ok(response) => response,
        Err(error) => {
            ApiError::internal(format!("failed to build stream response: {error}")).into_response()
        }
    }
}

/// Collect-then-return delivery: same pipeline invocation with the progress
/// side log instead of the channel encoder.
async fn buffered_run(
    runner: MarketplaceRunner,
    search_query: String,
    wait_timeout: Duration,
) -> Response {
    let progress = ProgressLog::default();
    let handler = progress.handler();
    let run = tokio::spawn(async move { runner.execute(&search_query, handler).await });

    let result = match tokio::time::timeout(wait_timeout, run).await {
        Err(_) => {
            return ApiError::internal("run did not complete within the transport wait budget")
                .into_response();
        }
        Ok(Err(error)) => {
            return ApiError::internal(format!("run task failed: {error}")).into_response();
        }
        Ok(Ok(result)) => result,
    };

    if let Some(error) = result.error.as_deref() {
        return ApiError::internal(error).into_response();
    }
    (StatusCode::OK, Json(result)).into_response()
}

pub fn build_gateway_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route(RUN_ENDPOINT, post(handle_run))
        .with_state(state)
}

pub async fn run_gateway_server(config: GatewayConfig) -> Result<()> {
    let bind_addr = config
        .bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid gateway bind address '{}'", config.bind))?;

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind cartwheel gateway on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound gateway address")?;

    println!("cartwheel gateway listening: endpoint={RUN_ENDPOINT} addr={local_addr}");

    let state = Arc::new(GatewayState::new(config));
    let app = build_gateway_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("cartwheel gateway exited unexpectedly")?;

    Ok(())
}
