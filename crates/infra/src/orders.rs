//! Order assembler: priced orders committed together with their stock decrements.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use shopdesk_auth::Principal;
use shopdesk_core::OrderId;
use shopdesk_inventory::{Movement, StockAdjustment};
use shopdesk_sales::{ClientInfo, LineRequest, Order, OrderHeader, OrderLine, OrderStatus};

use crate::error::{LedgerError, LedgerResult};
use crate::store::{LedgerStore, StoreError};

/// Cart submitted for a local order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    #[serde(default)]
    pub client: ClientInfo,
    #[serde(default)]
    pub shipping_method: Option<String>,
    #[serde(default)]
    pub shipping_city_code: Option<String>,
    pub lines: Vec<LineRequest>,
}

#[derive(Debug, Clone)]
pub struct OrderAssembler<S> {
    store: S,
}

impl<S: LedgerStore> OrderAssembler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Snapshot the cart, persist the order and decrement stock for catalog
    /// lines, all in one unit of work.
    #[instrument(skip(self, request, actor), fields(lines = request.lines.len()), err)]
    pub async fn create_order(
        &self,
        request: CreateOrder,
        actor: Option<&Principal>,
    ) -> LedgerResult<Order> {
        if request.lines.is_empty() {
            return Err(LedgerError::invalid_input("order must have at least one line"));
        }
        for (idx, line) in request.lines.iter().enumerate() {
            if line.quantity() <= 0 {
                return Err(LedgerError::invalid_input(format!(
                    "line {}: quantity must be positive",
                    idx + 1
                )));
            }
        }

        let mut lines = Vec::with_capacity(request.lines.len());
        for (idx, line) in request.lines.iter().enumerate() {
            let line_no = idx as u32 + 1;
            let snapshot = match line {
                LineRequest::Catalog {
                    product_id,
                    quantity,
                } => {
                    let product = self.store.product(*product_id).await?.ok_or_else(|| {
                        LedgerError::ProductNotFound(format!("{product_id} (line {line_no})"))
                    })?;
                    OrderLine::catalog(line_no, &product, *quantity)?
                }
                LineRequest::Custom {
                    name,
                    price,
                    size,
                    image,
                    quantity,
                } => OrderLine::free_form(
                    line_no,
                    name,
                    None,
                    *price,
                    size.clone(),
                    image.clone(),
                    *quantity,
                )?,
            };
            lines.push(snapshot);
        }

        let order = Order::assemble(
            OrderId::new(),
            OrderHeader::local(
                request.client,
                request.shipping_method,
                request.shipping_city_code,
            ),
            lines,
            actor.map(|p| p.id),
            Utc::now(),
        )?;

        let movements = place_order(&self.store, &order).await?;
        info!(
            order_id = %order.id,
            total = %order.total,
            movements = movements.len(),
            "order created"
        );
        Ok(order)
    }

    /// Move an order along the status machine with a compare-and-set.
    #[instrument(skip(self), err)]
    pub async fn transition_status(&self, id: OrderId, next: OrderStatus) -> LedgerResult<Order> {
        let current = self.order(id).await?;
        current.status.ensure_transition(next)?;
        let updated = self.store.set_order_status(id, current.status, next).await?;
        info!(order_id = %id, from = %current.status, to = %next, "order status changed");
        Ok(updated)
    }

    pub async fn order(&self, id: OrderId) -> LedgerResult<Order> {
        self.store
            .order(id)
            .await?
            .ok_or(LedgerError::OrderNotFound(id))
    }

    pub async fn list_orders(&self, status: Option<OrderStatus>) -> LedgerResult<Vec<Order>> {
        Ok(self.store.list_orders(status).await?)
    }
}

/// Persist `order` with the OUT batch its catalog lines demand.
///
/// Ledger rejections are tagged with the order line that caused them.
pub(crate) async fn place_order<S: LedgerStore>(
    store: &S,
    order: &Order,
) -> LedgerResult<Vec<Movement>> {
    let demand = order.stock_demand();
    let batch: Vec<StockAdjustment> = demand.iter().map(|d| d.adjustment).collect();

    match store.place_order(order, &batch).await {
        Ok(movements) => Ok(movements),
        Err(StoreError::Rejected(plan)) => {
            let line = demand.get(plan.index).map(|d| d.line_no);
            let err = LedgerError::from(plan.error);
            if let LedgerError::InsufficientStock { product_id, .. } = &err {
                warn!(order_id = %order.id, %product_id, ?line, "order rejected: insufficient stock");
            }
            Err(match line {
                Some(line_no) => err.at_line(line_no),
                None => err,
            })
        }
        Err(StoreError::ProductNotFound(product_id)) => {
            let err = LedgerError::ProductNotFound(product_id.to_string());
            let line = order
                .lines
                .iter()
                .find(|l| l.product_id == Some(product_id))
                .map(|l| l.line_no);
            Err(match line {
                Some(line_no) => err.at_line(line_no),
                None => err,
            })
        }
        Err(err) => Err(err.into()),
    }
}
