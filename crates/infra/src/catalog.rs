//! Catalog service: product metadata and bulk assortment receive.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use shopdesk_auth::Principal;
use shopdesk_core::ProductId;
use shopdesk_products::{AssortmentItem, NewProduct, Product, ProductPatch, infer_size};

use crate::error::{LedgerError, LedgerResult};
use crate::store::{CreatedProduct, LedgerStore, StoreError};

/// Per-item failure during an assortment receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub sku: String,
    pub reason: String,
}

/// Outcome of [`Catalog::receive_assortment`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReceiveReport {
    /// New products created with their quantity as opening stock.
    pub created: usize,
    /// Existing products restocked by SKU.
    pub restocked: usize,
    /// Items with quantity <= 0.
    pub skipped: usize,
    pub failures: Vec<ItemFailure>,
}

#[derive(Debug, Clone)]
pub struct Catalog<S> {
    store: S,
}

impl<S: LedgerStore> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self, request, actor), fields(sku = %request.sku), err)]
    pub async fn create_product(
        &self,
        request: NewProduct,
        actor: Option<&Principal>,
    ) -> LedgerResult<CreatedProduct> {
        let (product, opening) = request.into_product(ProductId::new(), Utc::now())?;
        let created = self
            .store
            .create_product(product, opening, actor.map(|p| p.id))
            .await?;
        info!(product_id = %created.product.id, opening, "product created");
        Ok(created)
    }

    #[instrument(skip(self, patch), err)]
    pub async fn update_product(&self, id: ProductId, patch: ProductPatch) -> LedgerResult<Product> {
        patch.validate()?;
        Ok(self.store.update_product(id, &patch, Utc::now()).await?)
    }

    pub async fn product(&self, id: ProductId) -> LedgerResult<Product> {
        self.store
            .product(id)
            .await?
            .ok_or_else(|| LedgerError::ProductNotFound(id.to_string()))
    }

    pub async fn product_by_sku(&self, sku: &str) -> LedgerResult<Product> {
        self.store
            .product_by_sku(sku.trim())
            .await?
            .ok_or_else(|| LedgerError::ProductNotFound(format!("sku {sku}")))
    }

    pub async fn list_products(&self) -> LedgerResult<Vec<Product>> {
        Ok(self.store.list_products().await?)
    }

    /// Upsert products by SKU, booking each item's quantity as an IN movement.
    ///
    /// Item failures are collected; only a storage outage aborts the run.
    #[instrument(skip(self, items, actor), fields(items = items.len()), err)]
    pub async fn receive_assortment(
        &self,
        items: Vec<AssortmentItem>,
        actor: Option<&Principal>,
    ) -> LedgerResult<ReceiveReport> {
        let mut report = ReceiveReport::default();
        let actor_id = actor.map(|p| p.id);

        for mut item in items {
            item.sku = item.sku.trim().to_string();
            if item.quantity <= 0 {
                report.skipped += 1;
                continue;
            }
            if item.size.is_none() {
                item.size = infer_size(&item.name);
            }

            match self.receive_one(&item, actor_id).await {
                Ok(Received::Created) => report.created += 1,
                Ok(Received::Restocked) => report.restocked += 1,
                Err(LedgerError::Storage(msg)) => return Err(LedgerError::Storage(msg)),
                Err(err) => {
                    warn!(sku = %item.sku, error = %err, "assortment item failed");
                    report.failures.push(ItemFailure {
                        sku: item.sku.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            created = report.created,
            restocked = report.restocked,
            skipped = report.skipped,
            failed = report.failures.len(),
            "assortment received"
        );
        Ok(report)
    }

    async fn receive_one(
        &self,
        item: &AssortmentItem,
        actor: Option<shopdesk_auth::PrincipalId>,
    ) -> LedgerResult<Received> {
        if let Some(existing) = self.store.product_by_sku(&item.sku).await? {
            self.restock(existing.id, item, actor).await?;
            return Ok(Received::Restocked);
        }

        let (product, opening) = item.to_new_product().into_product(ProductId::new(), Utc::now())?;
        match self.store.create_product(product, opening, actor).await {
            Ok(_) => Ok(Received::Created),
            // Lost a race with another receive of the same new SKU.
            Err(StoreError::DuplicateSku(_)) => {
                let existing = self
                    .store
                    .product_by_sku(&item.sku)
                    .await?
                    .ok_or_else(|| LedgerError::ProductNotFound(format!("sku {}", item.sku)))?;
                self.restock(existing.id, item, actor).await?;
                Ok(Received::Restocked)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn restock(
        &self,
        id: ProductId,
        item: &AssortmentItem,
        actor: Option<shopdesk_auth::PrincipalId>,
    ) -> LedgerResult<()> {
        let patch = item.refresh_patch();
        patch.validate()?;
        self.store
            .restock_product(id, &patch, item.quantity, actor, Utc::now())
            .await?;
        Ok(())
    }
}

enum Received {
    Created,
    Restocked,
}
