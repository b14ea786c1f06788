use serde::Deserialize;

use shopdesk_core::ProductId;
use shopdesk_inventory::{Direction, MovementFilter};
use shopdesk_sales::OrderStatus;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Manual or scan-and-sell stock change.
#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub product_id: String,
    pub direction: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct TransitionStatusRequest {
    pub status: String,
}

// -------------------------
// Query parameters
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct MovementQuery {
    pub product_id: Option<String>,
    pub direction: Option<String>,
    pub limit: Option<usize>,
}

impl MovementQuery {
    pub fn into_filter(self) -> Result<MovementFilter, axum::response::Response> {
        let product_id = self
            .product_id
            .map(|raw| parse_product_id(&raw))
            .transpose()?;
        let direction = self
            .direction
            .map(|raw| parse_direction(&raw))
            .transpose()?;
        Ok(MovementFilter {
            product_id,
            direction,
            limit: self.limit,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncQuery {
    /// Look-back window in days; the configured default when absent.
    pub days: Option<u32>,
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id("product"))
}

pub fn parse_direction(raw: &str) -> Result<Direction, axum::response::Response> {
    raw.parse().map_err(|e: shopdesk_core::DomainError| {
        errors::json_error(axum::http::StatusCode::BAD_REQUEST, "invalid_input", e.to_string())
    })
}

pub fn parse_status(raw: &str) -> Result<OrderStatus, axum::response::Response> {
    raw.parse().map_err(|e: shopdesk_core::DomainError| {
        errors::json_error(axum::http::StatusCode::BAD_REQUEST, "invalid_input", e.to_string())
    })
}
