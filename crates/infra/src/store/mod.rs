//! Storage boundary for the catalog, the stock ledger and orders.
//!
//! Every write method is one atomic unit of work: either everything it
//! describes is persisted or nothing is. Quantity changes go exclusively
//! through [`LedgerStore::apply_movements`], [`LedgerStore::place_order`],
//! [`LedgerStore::create_product`] (opening balance) and
//! [`LedgerStore::restock_product`], all of which plan the batch with
//! [`shopdesk_inventory::plan_batch`] while holding the affected rows.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use shopdesk_auth::PrincipalId;
use shopdesk_core::{DomainError, OrderId, ProductId};
use shopdesk_inventory::{Movement, MovementFilter, PlanError, StockAdjustment};
use shopdesk_products::{Product, ProductPatch};
use shopdesk_sales::{Order, OrderStatus};

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operation error.
///
/// Infrastructure-level failures plus the deterministic rejections a store
/// detects while holding its locks (batch planning, uniqueness, stale status).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A stock batch was rejected by the planner.
    #[error("stock batch rejected: {0}")]
    Rejected(PlanError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("product with SKU '{0}' already exists")]
    DuplicateSku(String),

    #[error("order with external id '{0}' already exists")]
    DuplicateExternalId(String),

    /// Compare-and-set on order status lost against a concurrent change.
    #[error("order {order_id} status is {found}, expected {expected}")]
    StatusConflict {
        order_id: OrderId,
        expected: OrderStatus,
        found: OrderStatus,
    },

    /// Row lock not acquired in time (or serialization/deadlock abort).
    #[error("lock timeout: {0}")]
    LockTimeout(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result of creating a product with an optional opening balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProduct {
    pub product: Product,
    pub opening: Option<Movement>,
}

/// Persistence seam used by every service in this crate.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a product (quantity 0) and book `opening` units as an IN movement.
    async fn create_product(
        &self,
        product: Product,
        opening: i64,
        actor: Option<PrincipalId>,
    ) -> StoreResult<CreatedProduct>;

    /// Metadata-only update.
    async fn update_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        at: DateTime<Utc>,
    ) -> StoreResult<Product>;

    /// Metadata update plus an IN movement of `quantity`, atomically.
    async fn restock_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        quantity: i64,
        actor: Option<PrincipalId>,
        at: DateTime<Utc>,
    ) -> StoreResult<(Product, Movement)>;

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    async fn product_by_sku(&self, sku: &str) -> StoreResult<Option<Product>>;

    /// All products, most recently updated first.
    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    /// Apply a batch of adjustments all-or-nothing.
    async fn apply_movements(
        &self,
        batch: &[StockAdjustment],
        actor: Option<PrincipalId>,
        at: DateTime<Utc>,
    ) -> StoreResult<Vec<Movement>>;

    /// Persist `order` with its lines and apply `batch` in the same unit of work.
    ///
    /// Movements are attributed to `order.created_by`.
    async fn place_order(
        &self,
        order: &Order,
        batch: &[StockAdjustment],
    ) -> StoreResult<Vec<Movement>>;

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    async fn order_by_external_id(&self, external_id: &str) -> StoreResult<Option<Order>>;

    /// Orders newest first, optionally filtered by status.
    async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>>;

    /// Set the status to `next` only if it is currently `expected`.
    async fn set_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> StoreResult<Order>;

    /// Movement log, newest first.
    async fn movements(&self, filter: &MovementFilter) -> StoreResult<Vec<Movement>>;

    /// Σ IN − Σ OUT over every movement of `product_id`.
    async fn ledger_balance(&self, product_id: ProductId) -> StoreResult<i64>;
}

#[async_trait::async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn create_product(
        &self,
        product: Product,
        opening: i64,
        actor: Option<PrincipalId>,
    ) -> StoreResult<CreatedProduct> {
        (**self).create_product(product, opening, actor).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        at: DateTime<Utc>,
    ) -> StoreResult<Product> {
        (**self).update_product(id, patch, at).await
    }

    async fn restock_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        quantity: i64,
        actor: Option<PrincipalId>,
        at: DateTime<Utc>,
    ) -> StoreResult<(Product, Movement)> {
        (**self).restock_product(id, patch, quantity, actor, at).await
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        (**self).product(id).await
    }

    async fn product_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
        (**self).product_by_sku(sku).await
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        (**self).list_products().await
    }

    async fn apply_movements(
        &self,
        batch: &[StockAdjustment],
        actor: Option<PrincipalId>,
        at: DateTime<Utc>,
    ) -> StoreResult<Vec<Movement>> {
        (**self).apply_movements(batch, actor, at).await
    }

    async fn place_order(
        &self,
        order: &Order,
        batch: &[StockAdjustment],
    ) -> StoreResult<Vec<Movement>> {
        (**self).place_order(order, batch).await
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        (**self).order(id).await
    }

    async fn order_by_external_id(&self, external_id: &str) -> StoreResult<Option<Order>> {
        (**self).order_by_external_id(external_id).await
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>> {
        (**self).list_orders(status).await
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> StoreResult<Order> {
        (**self).set_order_status(id, expected, next).await
    }

    async fn movements(&self, filter: &MovementFilter) -> StoreResult<Vec<Movement>> {
        (**self).movements(filter).await
    }

    async fn ledger_balance(&self, product_id: ProductId) -> StoreResult<i64> {
        (**self).ledger_balance(product_id).await
    }
}
