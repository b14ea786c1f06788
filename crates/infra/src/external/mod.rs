//! External service clients/adapters.
//!
//! The marketplace collaborator is modelled by [`OrderSource`]; the Kaspi shop
//! API client in [`kaspi`] is the production implementation. Credentials are
//! supplied through an injected [`token::TokenProvider`].

pub mod kaspi;
pub mod token;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopdesk_sales::OrderStatus;

use crate::error::LedgerError;

pub use kaspi::KaspiClient;
pub use token::{StaticToken, TokenProvider};

/// Failure talking to an external service.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Decode(err.to_string())
        } else {
            SourceError::Transport(err.to_string())
        }
    }
}

impl From<SourceError> for LedgerError {
    fn from(err: SourceError) -> Self {
        LedgerError::UpstreamUnavailable(err.to_string())
    }
}

/// Creation-time window of orders to pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ImportWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// The `days` days up to `now`; `None` when the start falls outside the
    /// representable calendar.
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Option<Self> {
        let from = Duration::try_days(i64::from(days)).and_then(|d| now.checked_sub_signed(d))?;
        Some(Self { from, to: now })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl Buyer {
    /// "First Last", or `None` when both parts are blank.
    pub fn full_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!name.is_empty()).then_some(name)
    }
}

/// One product entry of an external order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalEntry {
    pub sku: String,
    pub name: Option<String>,
    pub quantity: i64,
    pub unit_price: Decimal,
}

/// An order as reported by the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalOrder {
    /// Marketplace-unique id; used for deduplication.
    pub external_id: String,
    /// Human-facing order code.
    pub code: String,
    pub state: String,
    pub total_price: Option<Decimal>,
    pub shipping_mode: Option<String>,
    pub buyer: Buyer,
    /// `None` when the listing did not inline entries; fetch them separately.
    pub entries: Option<Vec<ExternalEntry>>,
}

/// Marketplace order feed.
#[async_trait::async_trait]
pub trait OrderSource: Send + Sync {
    async fn fetch_orders(&self, window: ImportWindow) -> Result<Vec<ExternalOrder>, SourceError>;

    async fn fetch_entries(&self, external_id: &str) -> Result<Vec<ExternalEntry>, SourceError>;
}

/// Map a Kaspi order state onto the local status machine.
///
/// Returns `None` for states outside the fixed table.
pub fn map_external_state(state: &str) -> Option<OrderStatus> {
    match state.trim().to_ascii_uppercase().as_str() {
        "NEW" => Some(OrderStatus::Pending),
        "SIGN_REQUIRED" | "PICKUP" => Some(OrderStatus::Processing),
        "DELIVERY" | "KASPI_DELIVERY" => Some(OrderStatus::Shipped),
        "ARCHIVE" | "COMPLETED" => Some(OrderStatus::Delivered),
        "CANCELLED" | "CANCELLING" | "RETURNED" => Some(OrderStatus::Cancelled),
        _ => None,
    }
}
