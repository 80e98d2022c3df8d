//! Marketplace run pipeline for Cartwheel.
//!
//! Holds the run data model, the extraction schemas, the ordered step
//! pipeline that drives the automation engine, and the progress conduit the
//! transport layer consumes.

pub mod progress;
pub mod runner;
pub mod schemas;
pub mod types;

pub use progress::{run_event_channel, ProgressHandler, ProgressLog, RunEventSender};
pub use runner::{MarketplaceRunner, RunPolicy, CART_FAILURE_GUIDANCE, NO_RESULTS_MESSAGE};
pub use schemas::{
    cart_status_schema, product_detail_schema, search_results_schema, validate_extracted,
};
pub use types::{
    CartOutcome, ListingSummary, ProductDetail, RunEvent, RunRequest, RunResult, SellerInfo,
    ShippingOption,
};
