//! Stock ledger service: the single choke point for quantity changes.

use chrono::Utc;
use tracing::{info, instrument, warn};

use shopdesk_auth::Principal;
use shopdesk_core::ProductId;
use shopdesk_inventory::{Direction, Movement, MovementFilter, Reconciliation, StockAdjustment};

use crate::error::{LedgerError, LedgerResult};
use crate::store::LedgerStore;

/// Atomic adjust / adjust-many primitives plus ledger reads.
#[derive(Debug, Clone)]
pub struct StockLedger<S> {
    store: S,
}

impl<S: LedgerStore> StockLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Append one movement and update on-hand atomically.
    #[instrument(skip(self, actor), fields(actor = ?actor.map(|p| p.id)), err)]
    pub async fn adjust(
        &self,
        product_id: ProductId,
        direction: Direction,
        quantity: i64,
        actor: Option<&Principal>,
    ) -> LedgerResult<Movement> {
        let mut movements = self
            .adjust_many(&[StockAdjustment::new(product_id, direction, quantity)], actor)
            .await?;
        movements
            .pop()
            .ok_or_else(|| LedgerError::Storage("adjustment produced no movement".to_string()))
    }

    /// Apply every adjustment or none. Same-product adjustments run in order
    /// against the running balance.
    #[instrument(skip(self, batch, actor), fields(batch_len = batch.len()), err)]
    pub async fn adjust_many(
        &self,
        batch: &[StockAdjustment],
        actor: Option<&Principal>,
    ) -> LedgerResult<Vec<Movement>> {
        for adjustment in batch {
            adjustment.validate()?;
        }

        match self
            .store
            .apply_movements(batch, actor.map(|p| p.id), Utc::now())
            .await
        {
            Ok(movements) => {
                info!(movements = movements.len(), "stock batch committed");
                Ok(movements)
            }
            Err(err) => {
                let err = LedgerError::from(err);
                if let LedgerError::InsufficientStock {
                    product_id,
                    requested,
                    available,
                    ..
                } = &err
                {
                    warn!(%product_id, requested, available, "stock batch rejected");
                }
                Err(err)
            }
        }
    }

    pub async fn on_hand(&self, product_id: ProductId) -> LedgerResult<i64> {
        self.store
            .product(product_id)
            .await?
            .map(|p| p.quantity)
            .ok_or_else(|| LedgerError::ProductNotFound(product_id.to_string()))
    }

    pub async fn movements(&self, filter: &MovementFilter) -> LedgerResult<Vec<Movement>> {
        Ok(self.store.movements(filter).await?)
    }

    /// Compare stored on-hand with Σ IN − Σ OUT from the log.
    #[instrument(skip(self), err)]
    pub async fn reconcile(&self, product_id: ProductId) -> LedgerResult<Reconciliation> {
        let on_hand = self.on_hand(product_id).await?;
        let balance = self.store.ledger_balance(product_id).await?;
        let reconciliation = Reconciliation::new(product_id, on_hand, balance);
        if !reconciliation.consistent {
            warn!(%product_id, on_hand, balance, "ledger drift detected");
        }
        Ok(reconciliation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rust_decimal_macros::dec;
    use shopdesk_auth::{PrincipalId, Role};
    use shopdesk_products::NewProduct;

    use crate::store::InMemoryLedgerStore;

    fn test_principal() -> Principal {
        Principal::new(PrincipalId::new(), Role::new("staff"))
    }

    async fn seed(store: &InMemoryLedgerStore, sku: &str, quantity: i64) -> ProductId {
        let (product, opening) = NewProduct {
            name: format!("Item {sku}"),
            sku: sku.to_string(),
            size: None,
            price: dec!(1000),
            quantity,
            image: None,
        }
        .into_product(ProductId::new(), Utc::now())
        .unwrap();
        store
            .create_product(product, opening, None)
            .await
            .unwrap()
            .product
            .id
    }

    #[tokio::test]
    async fn out_then_in_records_two_movements_in_order() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let p = seed(&store, "P", 10).await;
        let ledger = StockLedger::new(store.clone());
        let (a, b) = (test_principal(), test_principal());

        ledger.adjust(p, Direction::Out, 3, Some(&a)).await.unwrap();
        ledger.adjust(p, Direction::In, 5, Some(&b)).await.unwrap();

        assert_eq!(ledger.on_hand(p).await.unwrap(), 12);
        let log = ledger.movements(&MovementFilter::for_product(p)).await.unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].actor, Some(b.id));
        assert_eq!(log[0].direction, Direction::In);
        assert_eq!(log[1].actor, Some(a.id));
        assert_eq!(log[1].direction, Direction::Out);
        assert!(ledger.reconcile(p).await.unwrap().consistent);
    }

    #[tokio::test]
    async fn adjust_validates_input_and_existence() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let p = seed(&store, "P", 1).await;
        let ledger = StockLedger::new(store);

        match ledger.adjust(p, Direction::In, 0, None).await {
            Err(LedgerError::InvalidInput(_)) => {}
            other => panic!("expected InvalidInput, got {other:?}"),
        }
        match ledger.adjust(ProductId::new(), Direction::In, 1, None).await {
            Err(LedgerError::ProductNotFound(_)) => {}
            other => panic!("expected ProductNotFound, got {other:?}"),
        }
        match ledger.adjust(p, Direction::Out, 2, None).await {
            Err(LedgerError::InsufficientStock {
                requested,
                available,
                line,
                ..
            }) => {
                assert_eq!((requested, available, line), (2, 1, None));
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(ledger.on_hand(p).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_last_unit_is_sold_once() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let p = seed(&store, "LAST", 1).await;
        let ledger = Arc::new(StockLedger::new(store.clone()));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.adjust(p, Direction::Out, 1, None).await })
            })
            .collect();

        let mut ok = 0;
        let mut short = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(LedgerError::InsufficientStock { .. }) => short += 1,
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
        assert_eq!((ok, short), (1, 1));
        assert_eq!(ledger.on_hand(p).await.unwrap(), 0);
        assert!(ledger.reconcile(p).await.unwrap().consistent);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn many_concurrent_writers_keep_ledger_consistent() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let p = seed(&store, "HOT", 50).await;
        let ledger = Arc::new(StockLedger::new(store.clone()));

        let handles: Vec<_> = (0..40)
            .map(|i| {
                let ledger = ledger.clone();
                let direction = if i % 3 == 0 { Direction::In } else { Direction::Out };
                tokio::spawn(async move { ledger.adjust(p, direction, 2, None).await })
            })
            .collect();
        for handle in handles {
            let _ = handle.await.unwrap();
        }

        let on_hand = ledger.on_hand(p).await.unwrap();
        assert!(on_hand >= 0);
        let r = ledger.reconcile(p).await.unwrap();
        assert!(r.consistent, "{r:?}");
    }
}
