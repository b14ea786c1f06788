//! Postgres store tests. Run with a scratch database:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/shopdesk_test cargo test -p shopdesk-infra -- --ignored
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal_macros::dec;

use shopdesk_core::ProductId;
use shopdesk_inventory::{Direction, MovementFilter};
use shopdesk_products::NewProduct;
use shopdesk_sales::{LineRequest, OrderStatus};
use shopdesk_infra::external::{
    Buyer, ExternalEntry, ExternalOrder, ImportWindow, OrderSource, SourceError,
};
use shopdesk_infra::{
    Catalog, CreateOrder, LedgerError, LedgerStore, OrderAssembler, OrderImporter,
    PostgresLedgerStore, StockLedger,
};

async fn store() -> Arc<PostgresLedgerStore> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = PostgresLedgerStore::connect(&url, 8, Duration::from_secs(2))
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");
    Arc::new(store)
}

async fn seed(store: &Arc<PostgresLedgerStore>, quantity: i64) -> ProductId {
    let sku = format!("PG-{}", ProductId::new());
    Catalog::new(store.clone())
        .create_product(
            NewProduct {
                name: format!("Item {sku}"),
                sku,
                size: None,
                price: dec!(990.50),
                quantity,
                image: None,
            },
            None,
        )
        .await
        .expect("seed product")
        .product
        .id
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn adjustments_round_trip_through_postgres() {
    let store = store().await;
    let p = seed(&store, 10).await;
    let ledger = StockLedger::new(store.clone());

    ledger.adjust(p, Direction::Out, 3, None).await.unwrap();
    ledger.adjust(p, Direction::In, 5, None).await.unwrap();
    assert_eq!(ledger.on_hand(p).await.unwrap(), 12);

    let log = ledger.movements(&MovementFilter::for_product(p)).await.unwrap();
    assert_eq!(log.len(), 3);
    assert_eq!(log[0].direction, Direction::In);
    assert_eq!(log[1].direction, Direction::Out);
    assert!(ledger.reconcile(p).await.unwrap().consistent);

    let product = store.product(p).await.unwrap().unwrap();
    assert_eq!(product.price, dec!(990.50));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_sku_is_a_conflict() {
    let store = store().await;
    let p = seed(&store, 0).await;
    let sku = store.product(p).await.unwrap().unwrap().sku;

    let result = Catalog::new(store.clone())
        .create_product(
            NewProduct {
                name: "Duplicate".to_string(),
                sku,
                size: None,
                price: dec!(1),
                quantity: 0,
                image: None,
            },
            None,
        )
        .await;
    match result {
        Err(LedgerError::Conflict(_)) => {}
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn last_unit_is_sold_once_under_contention() {
    let store = store().await;
    let p = seed(&store, 1).await;
    let ledger = Arc::new(StockLedger::new(store.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.adjust(p, Direction::Out, 1, None).await })
        })
        .collect();

    let mut sold = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => sold += 1,
            Err(LedgerError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
    assert_eq!(sold, 1);
    assert_eq!(ledger.on_hand(p).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn failed_order_leaves_no_rows() {
    let store = store().await;
    let (a, b) = (seed(&store, 5).await, seed(&store, 1).await);
    let assembler = OrderAssembler::new(store.clone());
    let before = store.list_orders(None).await.unwrap().len();

    let err = assembler
        .create_order(
            CreateOrder {
                lines: vec![
                    LineRequest::Catalog {
                        product_id: a,
                        quantity: 2,
                    },
                    LineRequest::Catalog {
                        product_id: b,
                        quantity: 2,
                    },
                ],
                ..CreateOrder::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientStock { line: Some(2), .. }));

    assert_eq!(store.list_orders(None).await.unwrap().len(), before);
    assert_eq!(store.product(a).await.unwrap().unwrap().quantity, 5);
    assert_eq!(
        store
            .movements(&MovementFilter::for_product(a))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn status_compare_and_set_rejects_stale_expectation() {
    let store = store().await;
    let p = seed(&store, 3).await;
    let assembler = OrderAssembler::new(store.clone());
    let order = assembler
        .create_order(
            CreateOrder {
                lines: vec![LineRequest::Catalog {
                    product_id: p,
                    quantity: 1,
                }],
                ..CreateOrder::default()
            },
            None,
        )
        .await
        .unwrap();

    store
        .set_order_status(order.id, OrderStatus::Pending, OrderStatus::Processing)
        .await
        .unwrap();
    let stale = store
        .set_order_status(order.id, OrderStatus::Pending, OrderStatus::Shipped)
        .await;
    assert!(stale.is_err());

    let loaded = assembler.order(order.id).await.unwrap();
    assert_eq!(loaded.status, OrderStatus::Processing);
    assert_eq!(loaded.lines.len(), 1);
    assert!(loaded.created_at <= Utc::now());
}

/// Marketplace that always reports the same single-entry order.
struct SameOrder {
    external_id: String,
    sku: String,
}

#[async_trait::async_trait]
impl OrderSource for SameOrder {
    async fn fetch_orders(&self, _window: ImportWindow) -> Result<Vec<ExternalOrder>, SourceError> {
        Ok(vec![ExternalOrder {
            external_id: self.external_id.clone(),
            code: "500100".to_string(),
            state: "NEW".to_string(),
            total_price: Some(dec!(1981)),
            shipping_mode: None,
            buyer: Buyer::default(),
            entries: Some(vec![ExternalEntry {
                sku: self.sku.clone(),
                name: None,
                quantity: 2,
                unit_price: dec!(990.50),
            }]),
        }])
    }

    async fn fetch_entries(&self, _external_id: &str) -> Result<Vec<ExternalEntry>, SourceError> {
        Ok(Vec::new())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_imports_of_one_order_commit_once() {
    const IMPORTERS: usize = 6;

    let store = store().await;
    let p = seed(&store, 10).await;
    let source: Arc<dyn OrderSource> = Arc::new(SameOrder {
        external_id: format!("KX-{}", ProductId::new()),
        sku: store.product(p).await.unwrap().unwrap().sku,
    });

    let handles: Vec<_> = (0..IMPORTERS)
        .map(|_| {
            let importer = OrderImporter::new(store.clone(), source.clone());
            tokio::spawn(async move {
                let window = ImportWindow::last_days(1, Utc::now()).unwrap();
                importer.import_batch(window).await
            })
        })
        .collect();

    let (mut imported, mut skipped) = (0, 0);
    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        assert!(report.failures.is_empty(), "unexpected failures: {:?}", report.failures);
        imported += report.imported.len();
        skipped += report.skipped_existing.len();
    }
    assert_eq!(imported, 1);
    assert_eq!(skipped, IMPORTERS - 1);

    assert_eq!(store.product(p).await.unwrap().unwrap().quantity, 8);
    let outbound = store
        .movements(&MovementFilter {
            direction: Some(Direction::Out),
            ..MovementFilter::for_product(p)
        })
        .await
        .unwrap();
    assert_eq!(outbound.len(), 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn order_codes_round_trip() {
    let store = store().await;
    let p = seed(&store, 2).await;
    let order = OrderAssembler::new(store.clone())
        .create_order(
            CreateOrder {
                shipping_city_code: Some("4961".to_string()),
                lines: vec![LineRequest::Catalog {
                    product_id: p,
                    quantity: 1,
                }],
                ..CreateOrder::default()
            },
            None,
        )
        .await
        .unwrap();

    let loaded = store.order(order.id).await.unwrap().unwrap();
    assert_eq!(loaded.shipping_city_code.as_deref(), Some("4961"));
    assert_eq!(loaded.external_code, None);
    assert_eq!(loaded.total, order.total);
}
