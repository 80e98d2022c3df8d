//! Extraction schemas handed to the automation engine.
//!
//! Plain JSON Schema documents; extracted payloads are checked against them
//! before deserializing into the run data model.

use jsonschema::validator_for;
use serde_json::{json, Value};

use cartwheel_engine::EngineError;

/// Listing extraction is bounded to the top results.
pub const SEARCH_RESULT_CAP: usize = 5;

pub fn search_results_schema() -> Value {
    json!({
        "type": "array",
        "maxItems": SEARCH_RESULT_CAP,
        "items": {
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "price": { "type": "string" },
                "condition": { "type": "string" },
                "sellerRating": { "type": "string" },
                "shippingInfo": { "type": "string" },
                "imageUrl": { "type": "string", "format": "uri" }
            },
            "required": ["title", "price"]
        }
    })
}

pub fn product_detail_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "price": { "type": "string" },
            "description": { "type": "string" },
            "condition": { "type": "string" },
            "specifications": {
                "type": "object",
                "additionalProperties": { "type": "string" }
            },
            "sellerInfo": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "rating": { "type": "string" },
                    "location": { "type": "string" }
                },
                "required": ["name"]
            },
            "shippingOptions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "method": { "type": "string" },
                        "cost": { "type": "string" },
                        "estimatedDelivery": { "type": "string" }
                    },
                    "required": ["method", "cost"]
                }
            }
        },
        "required": ["title", "price", "description"]
    })
}

pub fn cart_status_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "success": { "type": "boolean" },
            "cartCount": { "type": "number" },
            "message": { "type": "string" }
        },
        "required": ["success"]
    })
}

/// Checks an extracted payload against its schema, reporting the first
/// violation.
pub fn validate_extracted(schema: &Value, payload: &Value) -> Result<(), EngineError> {
    let validator = validator_for(schema).map_err(|error| EngineError::SchemaMismatch {
        detail: format!("invalid extraction schema: {error}"),
    })?;

    let mut errors = validator.iter_errors(payload);
    if let Some(first) = errors.next() {
        return Err(EngineError::SchemaMismatch {
            detail: first.to_string(),
        });
    }

    Ok(())
}
