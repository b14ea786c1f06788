//! Service-level error taxonomy.

use thiserror::Error;

use shopdesk_core::{DomainError, OrderId, ProductId};
use shopdesk_inventory::PlanError;

use crate::store::StoreError;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Error returned by the ledger, catalog, order and import services.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("product not found: {0}")]
    ProductNotFound(String),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("{}", insufficient_stock_message(*product_id, *line, *requested, *available))]
    InsufficientStock {
        product_id: ProductId,
        /// Order line that triggered the shortage, when the batch came from an order.
        line: Option<u32>,
        requested: i64,
        available: i64,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Row lock not acquired in time; the caller may retry.
    #[error("transient lock timeout: {0}")]
    TransientLockTimeout(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("storage error: {0}")]
    Storage(String),
}

fn insufficient_stock_message(
    product_id: ProductId,
    line: Option<u32>,
    requested: i64,
    available: i64,
) -> String {
    match line {
        Some(line) => format!(
            "line {line}: insufficient stock for product {product_id} (requested {requested}, available {available})"
        ),
        None => format!(
            "insufficient stock for product {product_id} (requested {requested}, available {available})"
        ),
    }
}

impl LedgerError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    /// Attach an order line number to a stock shortage.
    pub fn at_line(self, line_no: u32) -> Self {
        match self {
            LedgerError::InsufficientStock {
                product_id,
                requested,
                available,
                ..
            } => LedgerError::InsufficientStock {
                product_id,
                line: Some(line_no),
                requested,
                available,
            },
            LedgerError::ProductNotFound(what) => {
                LedgerError::ProductNotFound(format!("{what} (line {line_no})"))
            }
            other => other,
        }
    }

    /// Short machine-readable code, used by the HTTP layer and import reports.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::ProductNotFound(_) => "product_not_found",
            LedgerError::OrderNotFound(_) => "order_not_found",
            LedgerError::InsufficientStock { .. } => "insufficient_stock",
            LedgerError::InvalidInput(_) => "invalid_input",
            LedgerError::Conflict(_) => "conflict",
            LedgerError::TransientLockTimeout(_) => "lock_timeout",
            LedgerError::UpstreamUnavailable(_) => "upstream_unavailable",
            LedgerError::Storage(_) => "storage_error",
        }
    }
}

impl From<DomainError> for LedgerError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                LedgerError::InvalidInput(msg)
            }
            DomainError::NotFound(what) => LedgerError::ProductNotFound(what),
            DomainError::InsufficientStock {
                product_id,
                requested,
                available,
            } => LedgerError::InsufficientStock {
                product_id,
                line: None,
                requested,
                available,
            },
            DomainError::Conflict(msg) => LedgerError::Conflict(msg),
            DomainError::InvariantViolation(msg) => LedgerError::Storage(msg),
        }
    }
}

impl From<PlanError> for LedgerError {
    fn from(err: PlanError) -> Self {
        err.error.into()
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(plan) => plan.into(),
            StoreError::Domain(domain) => domain.into(),
            StoreError::ProductNotFound(id) => LedgerError::ProductNotFound(id.to_string()),
            StoreError::OrderNotFound(id) => LedgerError::OrderNotFound(id),
            err @ (StoreError::DuplicateSku(_)
            | StoreError::DuplicateExternalId(_)
            | StoreError::StatusConflict { .. }) => LedgerError::Conflict(err.to_string()),
            StoreError::LockTimeout(msg) => LedgerError::TransientLockTimeout(msg),
            StoreError::Backend(msg) => LedgerError::Storage(msg),
        }
    }
}
