use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Public struct `RunRequest` used across Cartwheel components.
pub struct RunRequest {
    pub search_query: String,
}

impl RunRequest {
    /// The query must be non-empty after trimming; rejected before any
    /// engine resource is allocated.
    pub fn validate(&self) -> Result<(), String> {
        if self.search_query.trim().is_empty() {
            return Err("Invalid search query".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Public struct `ListingSummary` used across Cartwheel components.
///
/// Extraction output is trusted as-is; only the optional/required shape is
/// enforced against the extraction schema.
pub struct ListingSummary {
    pub title: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Public struct `SellerInfo` used across Cartwheel components.
pub struct SellerInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Public struct `ShippingOption` used across Cartwheel components.
pub struct ShippingOption {
    pub method: String,
    pub cost: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Public struct `ProductDetail` used across Cartwheel components.
pub struct ProductDetail {
    pub title: String,
    pub price: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_info: Option<SellerInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_options: Option<Vec<ShippingOption>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Public struct `CartOutcome` used across Cartwheel components.
pub struct CartOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Public struct `RunResult` used across Cartwheel components.
///
/// `selected_product` and `cart_status` serialize as explicit nulls while
/// absent; `error` is omitted entirely until a fatal step records it.
pub struct RunResult {
    pub search_query: String,
    pub search_results: Vec<ListingSummary>,
    #[serde(default)]
    pub selected_product: Option<ProductDetail>,
    #[serde(default)]
    pub cart_status: Option<CartOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    pub fn new(search_query: impl Into<String>) -> Self {
        Self {
            search_query: search_query.into(),
            search_results: Vec::new(),
            selected_product: None,
            cart_status: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Enumerates supported `RunEvent` values.
///
/// Zero or more `Progress` records precede exactly one terminal record
/// (`Result` or `Error`); nothing follows the terminal.
pub enum RunEvent {
    Progress { message: String },
    Result { data: RunResult },
    Error { error: String },
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result { .. } | Self::Error { .. })
    }
}
