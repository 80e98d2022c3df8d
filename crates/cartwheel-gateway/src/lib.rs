//! HTTP surface and progress transport for Cartwheel.
//!
//! One run endpoint, two deliveries: an incremental NDJSON event stream or a
//! single buffered result body. The codec side also carries the consumer
//! half (incremental decoder plus buffered fallback).

pub mod server;
pub mod wire;

pub use server::{
    build_gateway_router, run_gateway_server, GatewayConfig, GatewayState,
    DEFAULT_RUN_WAIT_TIMEOUT, RUN_ENDPOINT,
};
pub use wire::{
    collect_run_events, decode_buffered_response, encode_event_line, NdjsonEventDecoder,
    StreamedRunOutcome,
};
