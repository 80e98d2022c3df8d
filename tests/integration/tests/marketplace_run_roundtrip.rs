use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use cartwheel_engine::{ActOptions, AutomationEngine, EngineError};
use cartwheel_gateway::{collect_run_events, encode_event_line, NdjsonEventDecoder};
use cartwheel_pipeline::{
    run_event_channel, MarketplaceRunner, ProgressLog, RunEvent, CART_FAILURE_GUIDANCE,
    NO_RESULTS_MESSAGE,
};

/// Scripted engine replaying a fixed marketplace trace. The cart action
/// honors the bounded retry option by consuming every allowed attempt before
/// raising a timeout.
struct ScriptedMarketplaceEngine {
    listings: Value,
    cart_times_out: bool,
    cart_attempts: Mutex<usize>,
}

impl ScriptedMarketplaceEngine {
    fn with_three_listings(cart_times_out: bool) -> Self {
        Self {
            listings: json!([
                {
                    "title": "Nikon F3 35mm SLR Film Camera",
                    "price": "$249.99",
                    "condition": "Used - Excellent",
                    "sellerRating": "99.2%"
                },
                {
                    "title": "Canon AE-1 Program 35mm",
                    "price": "$180.00",
                    "condition": "Used"
                },
                {
                    "title": "Pentax K1000 w/ 50mm lens",
                    "price": "$139.50"
                }
            ]),
            cart_times_out,
            cart_attempts: Mutex::new(0),
        }
    }

    fn without_listings() -> Self {
        Self {
            listings: json!([]),
            cart_times_out: false,
            cart_attempts: Mutex::new(0),
        }
    }

    fn cart_attempt_count(&self) -> usize {
        *self.cart_attempts.lock().expect("lock")
    }
}

#[async_trait]
impl AutomationEngine for ScriptedMarketplaceEngine {
    async fn launch(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn new_page(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn goto(&self, _url: &str) -> Result<(), EngineError> {
        Ok(())
    }

    async fn wait_for_network_idle(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn wait_for_timeout(&self, _wait_ms: u64) -> Result<(), EngineError> {
        Ok(())
    }

    async fn act(
        &self,
        instruction: &str,
        options: Option<ActOptions>,
    ) -> Result<(), EngineError> {
        if instruction.contains("Add to cart") && self.cart_times_out {
            let allowed = options.map(|options| options.max_attempts).unwrap_or(1);
            *self.cart_attempts.lock().expect("lock") += allowed;
            return Err(EngineError::Timeout {
                instruction: instruction.to_string(),
            });
        }
        Ok(())
    }

    async fn extract(&self, instruction: &str, _schema: &Value) -> Result<Value, EngineError> {
        if instruction.contains("product listings") {
            return Ok(self.listings.clone());
        }
        if instruction.contains("product details") {
            return Ok(json!({
                "title": "Nikon F3 35mm SLR Film Camera",
                "price": "$249.99",
                "description": "Professional 35mm film camera, fully working, light seals replaced.",
                "condition": "Used - Excellent",
                "specifications": { "Mount": "Nikon F", "Shutter": "Titanium" },
                "sellerInfo": { "name": "camera_vault", "rating": "99.2%", "location": "Portland, OR" },
                "shippingOptions": [
                    { "method": "USPS Priority", "cost": "$12.50", "estimatedDelivery": "3-5 days" }
                ]
            }));
        }
        Ok(json!({ "success": true, "cartCount": 1 }))
    }

    async fn close(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

#[tokio::test]
async fn integration_vintage_camera_trace_degrades_cart_without_top_level_error() {
    let engine = Arc::new(ScriptedMarketplaceEngine::with_three_listings(true));
    let runner = MarketplaceRunner::new(engine.clone());
    let progress = ProgressLog::default();

    let result = runner.execute("vintage camera", progress.handler()).await;

    assert_eq!(result.search_query, "vintage camera");
    assert_eq!(result.search_results.len(), 3);
    assert_eq!(result.search_results[0].title, "Nikon F3 35mm SLR Film Camera");
    let detail = result.selected_product.expect("product detail");
    assert_eq!(detail.seller_info.expect("seller").name, "camera_vault");
    let cart = result.cart_status.expect("cart status");
    assert!(!cart.success);
    assert_eq!(cart.message.as_deref(), Some(CART_FAILURE_GUIDANCE));
    assert_eq!(result.error, None);
    assert_eq!(engine.cart_attempt_count(), 2);
}

#[tokio::test]
async fn integration_zero_listings_aborts_run_with_error_only() {
    let engine = Arc::new(ScriptedMarketplaceEngine::without_listings());
    let runner = MarketplaceRunner::new(engine);
    let progress = ProgressLog::default();

    let result = runner.execute("vintage camera", progress.handler()).await;

    assert_eq!(result.error.as_deref(), Some(NO_RESULTS_MESSAGE));
    assert!(result.search_results.is_empty());
    assert_eq!(result.selected_product, None);
    assert_eq!(result.cart_status, None);
}

#[tokio::test]
async fn integration_streamed_progress_matches_buffered_side_log_order() {
    let streamed_engine = Arc::new(ScriptedMarketplaceEngine::with_three_listings(true));
    let (events, mut rx) = run_event_channel();
    let runner = MarketplaceRunner::new(streamed_engine);
    let result = runner
        .execute("vintage camera", events.progress_handler())
        .await;
    events.send_terminal(RunEvent::Result { data: result });
    drop(events);

    let mut observed = Vec::new();
    while let Some(event) = rx.recv().await {
        observed.push(event);
    }
    assert!(observed.last().expect("events").is_terminal());
    let streamed = collect_run_events(observed);

    let buffered_engine = Arc::new(ScriptedMarketplaceEngine::with_three_listings(true));
    let progress = ProgressLog::default();
    MarketplaceRunner::new(buffered_engine)
        .execute("vintage camera", progress.handler())
        .await;

    assert_eq!(streamed.progress, progress.snapshot());
    assert!(streamed.result.is_some());
    assert_eq!(streamed.error, None);
}

#[tokio::test]
async fn integration_ndjson_round_trip_survives_injected_garbage_line() {
    let engine = Arc::new(ScriptedMarketplaceEngine::with_three_listings(false));
    let (events, mut rx) = run_event_channel();
    let runner = MarketplaceRunner::new(engine);
    let result = runner
        .execute("vintage camera", events.progress_handler())
        .await;
    events.send_terminal(RunEvent::Result { data: result });
    drop(events);

    let mut emitted = Vec::new();
    while let Some(event) = rx.recv().await {
        emitted.push(event);
    }
    let valid_count = emitted.len();

    let mut wire = String::new();
    for (index, event) in emitted.iter().enumerate() {
        if index == 3 {
            wire.push_str("not json at all\n");
        }
        wire.push_str(&encode_event_line(event));
    }

    let mut decoder = NdjsonEventDecoder::new();
    let mut decoded = Vec::new();
    // Feed the wire back in uneven chunks to exercise reassembly.
    for chunk in wire.as_bytes().chunks(7) {
        decoded.extend(decoder.push_chunk(chunk));
    }
    decoded.extend(decoder.finish());

    assert_eq!(decoded.len(), valid_count);
    assert_eq!(decoded, emitted);
}
