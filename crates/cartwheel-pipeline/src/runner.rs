use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::warn;

use cartwheel_engine::{ActOptions, AutomationEngine, EngineError};

use crate::progress::ProgressHandler;
use crate::schemas::{
    cart_status_schema, product_detail_schema, search_results_schema, validate_extracted,
    SEARCH_RESULT_CAP,
};
use crate::types::{CartOutcome, ListingSummary, ProductDetail, RunResult};

/// Soft-failure guidance recorded when the cart sub-step cannot complete.
pub const CART_FAILURE_GUIDANCE: &str =
    "Could not add to cart - may require sign-in or item has special conditions";

/// Fatal message recorded when search extraction yields nothing.
pub const NO_RESULTS_MESSAGE: &str = "No search results found";

const SEARCH_RESULTS_INSTRUCTION: &str = "Extract the top 5 product listings from the search results. Include title, price, condition, seller rating, shipping info, and image URL if available.";
const FIRST_LISTING_INSTRUCTION: &str =
    "Click on the first product listing in the search results";
const PRODUCT_DETAIL_INSTRUCTION: &str = "Extract comprehensive product details including title, price, description, condition, specifications, seller information, and shipping options.";
const CART_ADD_INSTRUCTION: &str = "Click the \"Add to cart\" or \"Buy It Now\" button";
const CART_STATUS_INSTRUCTION: &str = "Check if the item was successfully added to cart. Look for confirmation messages, cart count updates, or error messages.";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `RunPolicy` used across Cartwheel components.
///
/// Fixed policy constants for one run; not tunable per call.
pub struct RunPolicy {
    pub marketplace_url: String,
    pub result_cap: usize,
    pub cart_attempt_cap: usize,
    pub cart_settle_wait_ms: u64,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            marketplace_url: "https://www.ebay.com".to_string(),
            result_cap: SEARCH_RESULT_CAP,
            cart_attempt_cap: 2,
            cart_settle_wait_ms: 2_000,
        }
    }
}

/// Public struct `MarketplaceRunner` used across Cartwheel components.
///
/// Runs the fixed ordered step sequence against a leased engine. Early-step
/// failures abort the run and are recorded into the result; the cart
/// sub-step alone degrades into a soft failure. Teardown happens exactly
/// once on every path and never overrides the already-determined outcome.
pub struct MarketplaceRunner {
    engine: Arc<dyn AutomationEngine>,
    policy: RunPolicy,
}

impl MarketplaceRunner {
    pub fn new(engine: Arc<dyn AutomationEngine>) -> Self {
        Self::with_policy(engine, RunPolicy::default())
    }

    pub fn with_policy(engine: Arc<dyn AutomationEngine>, policy: RunPolicy) -> Self {
        Self { engine, policy }
    }

    pub async fn execute(&self, search_query: &str, on_progress: ProgressHandler) -> RunResult {
        let mut result = RunResult::new(search_query);

        if let Err(error) = self.run_steps(search_query, &on_progress, &mut result).await {
            result.error = Some(error.to_string());
        }

        on_progress("Closing browser...".to_string());
        if let Err(error) = self.engine.close().await {
            warn!("engine teardown failed: {error}");
        }

        result
    }

    async fn run_steps(
        &self,
        search_query: &str,
        on_progress: &ProgressHandler,
        result: &mut RunResult,
    ) -> Result<()> {
        on_progress("Launching browser...".to_string());
        self.engine.launch().await?;
        self.engine.new_page().await?;

        on_progress("Navigating to the marketplace...".to_string());
        self.engine.goto(&self.policy.marketplace_url).await?;
        self.engine.wait_for_network_idle().await?;

        on_progress(format!("Searching for \"{search_query}\"..."));
        self.engine
            .act(
                &format!("Search for \"{search_query}\" using the search bar"),
                None,
            )
            .await?;
        self.engine.wait_for_network_idle().await?;

        on_progress("Extracting search results...".to_string());
        let schema = search_results_schema();
        let raw = self
            .engine
            .extract(SEARCH_RESULTS_INSTRUCTION, &schema)
            .await?;
        validate_extracted(&schema, &raw)?;
        let mut listings: Vec<ListingSummary> =
            serde_json::from_value(raw).map_err(|error| EngineError::Extraction {
                detail: format!("listing payload did not deserialize: {error}"),
            })?;
        listings.truncate(self.policy.result_cap);

        on_progress(format!("Found {} products", listings.len()));
        if listings.is_empty() {
            bail!(NO_RESULTS_MESSAGE);
        }
        result.search_results = listings;

        on_progress("Clicking on the first product...".to_string());
        self.engine.act(FIRST_LISTING_INSTRUCTION, None).await?;
        self.engine.wait_for_network_idle().await?;

        on_progress("Extracting product details...".to_string());
        let schema = product_detail_schema();
        let raw = self
            .engine
            .extract(PRODUCT_DETAIL_INSTRUCTION, &schema)
            .await?;
        validate_extracted(&schema, &raw)?;
        let detail: ProductDetail =
            serde_json::from_value(raw).map_err(|error| EngineError::Extraction {
                detail: format!("product detail payload did not deserialize: {error}"),
            })?;
        result.selected_product = Some(detail);

        on_progress("Attempting to add product to cart...".to_string());
        result.cart_status = Some(self.attempt_cart_add(on_progress).await);

        on_progress("Run completed successfully!".to_string());
        Ok(())
    }

    /// Cart failures never abort the run; they collapse into a soft-failure
    /// outcome with fixed guidance.
    async fn attempt_cart_add(&self, on_progress: &ProgressHandler) -> CartOutcome {
        match self.cart_add_and_verify(on_progress).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!("cart step degraded to soft failure: {error}");
                CartOutcome {
                    success: false,
                    cart_count: None,
                    message: Some(CART_FAILURE_GUIDANCE.to_string()),
                }
            }
        }
    }

    async fn cart_add_and_verify(
        &self,
        on_progress: &ProgressHandler,
    ) -> Result<CartOutcome, EngineError> {
        self.engine
            .act(
                CART_ADD_INSTRUCTION,
                Some(ActOptions::patient(self.policy.cart_attempt_cap)),
            )
            .await?;
        self.engine
            .wait_for_timeout(self.policy.cart_settle_wait_ms)
            .await?;

        on_progress("Checking cart status...".to_string());
        let schema = cart_status_schema();
        let raw = self
            .engine
            .extract(CART_STATUS_INSTRUCTION, &schema)
            .await?;
        validate_extracted(&schema, &raw)?;
        serde_json::from_value(raw).map_err(|error| EngineError::Extraction {
            detail: format!("cart status payload did not deserialize: {error}"),
        })
    }
}
