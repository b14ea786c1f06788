use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use shopdesk_auth::PrincipalId;
use shopdesk_core::{OrderId, ProductId};
use shopdesk_inventory::{Movement, MovementFilter, StockAdjustment, plan_batch};
use shopdesk_products::{Product, ProductPatch};
use shopdesk_sales::{Order, OrderStatus};

use super::{CreatedProduct, LedgerStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct State {
    products: HashMap<ProductId, Product>,
    skus: HashMap<String, ProductId>,
    /// Insertion order; newest last.
    movements: Vec<Movement>,
    orders: HashMap<OrderId, Order>,
    /// Insertion order of `orders`; newest last.
    order_seq: Vec<OrderId>,
    external_ids: HashMap<String, OrderId>,
}

impl State {
    /// Plan and apply `batch` against current levels. Mutates nothing on error.
    fn apply(
        &mut self,
        batch: &[StockAdjustment],
        actor: Option<PrincipalId>,
        at: DateTime<Utc>,
    ) -> StoreResult<Vec<Movement>> {
        let levels: HashMap<ProductId, i64> = batch
            .iter()
            .filter_map(|a| self.products.get(&a.product_id).map(|p| (p.id, p.quantity)))
            .collect();

        let plan = plan_batch(&levels, batch).map_err(StoreError::Rejected)?;

        for (product_id, level) in &plan.levels {
            if let Some(product) = self.products.get_mut(product_id) {
                product.quantity = *level;
                product.updated_at = at;
            }
        }

        let movements: Vec<Movement> = plan
            .movements
            .iter()
            .map(|planned| Movement::record(&planned.adjustment, actor, at))
            .collect();
        self.movements.extend(movements.iter().cloned());
        Ok(movements)
    }
}

/// In-memory catalog, ledger and order store.
///
/// Intended for tests/dev. A single lock guards all state, so every write is
/// atomic with respect to every other operation.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<State>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_product(
        &self,
        product: Product,
        opening: i64,
        actor: Option<PrincipalId>,
    ) -> StoreResult<CreatedProduct> {
        let mut state = self.write()?;
        if state.skus.contains_key(&product.sku) {
            return Err(StoreError::DuplicateSku(product.sku));
        }

        let id = product.id;
        let at = product.created_at;
        state.skus.insert(product.sku.clone(), id);
        state.products.insert(id, product);

        let opening = if opening > 0 {
            match state.apply(&[StockAdjustment::inbound(id, opening)], actor, at) {
                Ok(mut movements) => movements.pop(),
                Err(err) => {
                    if let Some(p) = state.products.remove(&id) {
                        state.skus.remove(&p.sku);
                    }
                    return Err(err);
                }
            }
        } else {
            None
        };

        let product = state
            .products
            .get(&id)
            .cloned()
            .ok_or(StoreError::ProductNotFound(id))?;
        Ok(CreatedProduct { product, opening })
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        at: DateTime<Utc>,
    ) -> StoreResult<Product> {
        let mut state = self.write()?;
        let product = state
            .products
            .get_mut(&id)
            .ok_or(StoreError::ProductNotFound(id))?;
        product.apply_patch(patch, at);
        Ok(product.clone())
    }

    async fn restock_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        quantity: i64,
        actor: Option<PrincipalId>,
        at: DateTime<Utc>,
    ) -> StoreResult<(Product, Movement)> {
        let mut state = self.write()?;
        if !state.products.contains_key(&id) {
            return Err(StoreError::ProductNotFound(id));
        }

        let mut movements = state.apply(&[StockAdjustment::inbound(id, quantity)], actor, at)?;
        let movement = movements
            .pop()
            .ok_or_else(|| StoreError::Backend("restock produced no movement".to_string()))?;

        let product = state
            .products
            .get_mut(&id)
            .ok_or(StoreError::ProductNotFound(id))?;
        product.apply_patch(patch, at);
        Ok((product.clone(), movement))
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn product_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
        let state = self.read()?;
        Ok(state
            .skus
            .get(sku)
            .and_then(|id| state.products.get(id))
            .cloned())
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self.read()?.products.values().cloned().collect();
        products.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(products)
    }

    async fn apply_movements(
        &self,
        batch: &[StockAdjustment],
        actor: Option<PrincipalId>,
        at: DateTime<Utc>,
    ) -> StoreResult<Vec<Movement>> {
        self.write()?.apply(batch, actor, at)
    }

    async fn place_order(
        &self,
        order: &Order,
        batch: &[StockAdjustment],
    ) -> StoreResult<Vec<Movement>> {
        let mut state = self.write()?;

        if let Some(external_id) = &order.external_id {
            if state.external_ids.contains_key(external_id) {
                return Err(StoreError::DuplicateExternalId(external_id.clone()));
            }
        }
        if state.orders.contains_key(&order.id) {
            return Err(StoreError::Backend(format!("order {} already stored", order.id)));
        }
        for line in &order.lines {
            if let Some(product_id) = line.product_id {
                if !state.products.contains_key(&product_id) {
                    return Err(StoreError::ProductNotFound(product_id));
                }
            }
        }

        let movements = state.apply(batch, order.created_by, order.created_at)?;

        if let Some(external_id) = &order.external_id {
            state.external_ids.insert(external_id.clone(), order.id);
        }
        state.order_seq.push(order.id);
        state.orders.insert(order.id, order.clone());
        Ok(movements)
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn order_by_external_id(&self, external_id: &str) -> StoreResult<Option<Order>> {
        let state = self.read()?;
        Ok(state
            .external_ids
            .get(external_id)
            .and_then(|id| state.orders.get(id))
            .cloned())
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>> {
        let state = self.read()?;
        Ok(state
            .order_seq
            .iter()
            .rev()
            .filter_map(|id| state.orders.get(id))
            .filter(|o| status.is_none_or(|s| o.status == s))
            .cloned()
            .collect())
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> StoreResult<Order> {
        let mut state = self.write()?;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or(StoreError::OrderNotFound(id))?;
        if order.status != expected {
            return Err(StoreError::StatusConflict {
                order_id: id,
                expected,
                found: order.status,
            });
        }
        order.status = next;
        Ok(order.clone())
    }

    async fn movements(&self, filter: &MovementFilter) -> StoreResult<Vec<Movement>> {
        let state = self.read()?;
        Ok(state
            .movements
            .iter()
            .rev()
            .filter(|m| filter.matches(m))
            .take(filter.effective_limit())
            .cloned()
            .collect())
    }

    async fn ledger_balance(&self, product_id: ProductId) -> StoreResult<i64> {
        let state = self.read()?;
        Ok(shopdesk_inventory::ledger_balance(
            state.movements.iter().filter(|m| m.product_id == product_id),
        ))
    }
}
