//! Marketplace order import.
//!
//! Each external order is committed on its own: a failure leaves no state
//! for that order and the batch moves on. Only an unreachable source or a
//! storage outage aborts the run.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use shopdesk_core::OrderId;
use shopdesk_sales::{ClientInfo, Order, OrderHeader, OrderLine, OrderSource as Channel, OrderStatus};

use crate::error::{LedgerError, LedgerResult};
use crate::external::{ExternalEntry, ExternalOrder, ImportWindow, OrderSource, map_external_state};
use crate::orders::place_order;
use crate::store::LedgerStore;

/// Line name used when the marketplace gives neither a name nor a SKU.
pub const UNKNOWN_ITEM_NAME: &str = "Unknown Kaspi item";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedOrder {
    pub external_id: String,
    pub order_id: OrderId,
}

/// Non-fatal note about an imported order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineWarning {
    pub external_id: String,
    /// `None` for order-level warnings such as a total mismatch.
    pub line_no: Option<u32>,
    pub sku: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    pub external_id: String,
    pub code: String,
    pub reason: String,
}

/// Outcome of one [`OrderImporter::import_batch`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: Vec<ImportedOrder>,
    /// External ids already present locally.
    pub skipped_existing: Vec<String>,
    pub line_warnings: Vec<LineWarning>,
    pub failures: Vec<ImportFailure>,
    /// Distinct marketplace states that fell back to PENDING.
    pub unmapped_states: Vec<String>,
}

pub struct OrderImporter<S> {
    store: S,
    source: Arc<dyn OrderSource>,
}

impl<S: LedgerStore> OrderImporter<S> {
    pub fn new(store: S, source: Arc<dyn OrderSource>) -> Self {
        Self { store, source }
    }

    /// Pull every order created in `window` and record the new ones.
    #[instrument(skip(self), fields(from = %window.from, to = %window.to), err)]
    pub async fn import_batch(&self, window: ImportWindow) -> LedgerResult<ImportReport> {
        let orders = self.source.fetch_orders(window).await?;
        let mut report = ImportReport::default();

        for external in orders {
            if self
                .store
                .order_by_external_id(&external.external_id)
                .await?
                .is_some()
            {
                report.skipped_existing.push(external.external_id);
                continue;
            }

            let status = match map_external_state(&external.state) {
                Some(status) => status,
                None => {
                    warn!(
                        external_id = %external.external_id,
                        state = %external.state,
                        "unmapped marketplace state, defaulting to pending"
                    );
                    if !report.unmapped_states.contains(&external.state) {
                        report.unmapped_states.push(external.state.clone());
                    }
                    OrderStatus::Pending
                }
            };

            let entries = match &external.entries {
                Some(entries) => entries.clone(),
                None => self.source.fetch_entries(&external.external_id).await?,
            };
            if entries.is_empty() {
                warn!(external_id = %external.external_id, "marketplace order has no entries");
                report.failures.push(ImportFailure {
                    external_id: external.external_id.clone(),
                    code: external.code.clone(),
                    reason: format!("Order {} has no items.", external.code),
                });
                continue;
            }

            match self.import_one(&external, status, &entries).await {
                Ok((order_id, warnings)) => {
                    report.line_warnings.extend(warnings);
                    report.imported.push(ImportedOrder {
                        external_id: external.external_id,
                        order_id,
                    });
                }
                // Lost the insert race against a concurrent import.
                Err(LedgerError::Conflict(_)) => {
                    report.skipped_existing.push(external.external_id);
                }
                Err(err @ LedgerError::Storage(_)) => return Err(err),
                Err(err) => {
                    warn!(
                        external_id = %external.external_id,
                        error = %err,
                        "marketplace order failed to import"
                    );
                    report.failures.push(ImportFailure {
                        external_id: external.external_id,
                        code: external.code,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            imported = report.imported.len(),
            skipped = report.skipped_existing.len(),
            failed = report.failures.len(),
            warnings = report.line_warnings.len(),
            "marketplace import finished"
        );
        Ok(report)
    }

    async fn import_one(
        &self,
        external: &ExternalOrder,
        status: OrderStatus,
        entries: &[ExternalEntry],
    ) -> LedgerResult<(OrderId, Vec<LineWarning>)> {
        let mut warnings = Vec::new();
        let mut lines = Vec::with_capacity(entries.len());

        for (idx, entry) in entries.iter().enumerate() {
            let line_no = idx as u32 + 1;
            let product = if entry.sku.is_empty() {
                None
            } else {
                self.store.product_by_sku(&entry.sku).await?
            };

            let line = match product {
                Some(product) => {
                    OrderLine::from_product(line_no, &product, entry.quantity, entry.unit_price)?
                }
                None => {
                    let name = [entry.name.as_deref(), Some(entry.sku.as_str())]
                        .into_iter()
                        .flatten()
                        .find(|n| !n.trim().is_empty())
                        .unwrap_or(UNKNOWN_ITEM_NAME);
                    let line = OrderLine::free_form(
                        line_no,
                        name,
                        Some(&entry.sku),
                        entry.unit_price,
                        None,
                        None,
                        entry.quantity,
                    )?;
                    warnings.push(LineWarning {
                        external_id: external.external_id.clone(),
                        line_no: Some(line_no),
                        sku: Some(entry.sku.clone()),
                        message: format!(
                            "SKU '{}' is not in the catalog; recorded without a stock decrement",
                            entry.sku
                        ),
                    });
                    line
                }
            };
            lines.push(line);
        }

        let header = OrderHeader {
            source: Channel::Kaspi,
            external_id: Some(external.external_id.clone()),
            external_code: Some(external.code.clone()).filter(|c| !c.trim().is_empty()),
            shipping_method: external.shipping_mode.clone(),
            shipping_city_code: None,
            status,
            client: ClientInfo {
                name: external.buyer.full_name(),
                phone: external.buyer.phone.clone(),
                ..ClientInfo::default()
            },
        };
        let order = Order::assemble(OrderId::new(), header, lines, None, Utc::now())?;

        if let Some(reported) = external.total_price {
            if reported != order.total {
                warnings.push(LineWarning {
                    external_id: external.external_id.clone(),
                    line_no: None,
                    sku: None,
                    message: format!(
                        "marketplace total {reported} differs from line sum {}; line sum stored",
                        order.total
                    ),
                });
            }
        }

        place_order(&self.store, &order).await?;
        for warning in &warnings {
            warn!(
                external_id = %warning.external_id,
                line_no = ?warning.line_no,
                "{}",
                warning.message
            );
        }
        info!(order_id = %order.id, external_id = %external.external_id, "marketplace order imported");
        Ok((order.id, warnings))
    }
}
