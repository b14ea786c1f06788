use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopdesk_auth::PrincipalId;
use shopdesk_core::{DomainError, DomainResult, OrderId, ProductId};
use shopdesk_inventory::StockAdjustment;
use shopdesk_products::Product;
use shopdesk_products::money::{checked_total, line_amount, validate_price};

use crate::status::OrderStatus;

/// SKU recorded on lines that have no catalog backing.
pub const CUSTOM_SKU: &str = "CUSTOM";

/// Where an order came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSource {
    Local,
    Kaspi,
}

impl OrderSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSource::Local => "LOCAL",
            OrderSource::Kaspi => "KASPI",
        }
    }
}

impl core::fmt::Display for OrderSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOCAL" => Ok(OrderSource::Local),
            "KASPI" => Ok(OrderSource::Kaspi),
            _ => Err(DomainError::validation(format!("unknown order source '{s}'"))),
        }
    }
}

/// Buyer contact details. All fields are free text and optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub flat: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A cart line as requested by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineRequest {
    /// Priced and described from the catalog at creation time.
    Catalog { product_id: ProductId, quantity: i64 },
    /// Ad hoc item with caller-supplied values; no stock effect.
    Custom {
        name: String,
        price: Decimal,
        #[serde(default)]
        size: Option<String>,
        #[serde(default)]
        image: Option<String>,
        quantity: i64,
    },
}

impl LineRequest {
    pub fn quantity(&self) -> i64 {
        match self {
            LineRequest::Catalog { quantity, .. } | LineRequest::Custom { quantity, .. } => {
                *quantity
            }
        }
    }
}

/// Immutable snapshot of one order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// 1-based position within the order.
    pub line_no: u32,
    pub product_id: Option<ProductId>,
    pub name: String,
    pub sku: String,
    pub size: Option<String>,
    pub image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i64,
}

impl OrderLine {
    /// Snapshot a catalog product at `unit_price`.
    pub fn from_product(
        line_no: u32,
        product: &Product,
        quantity: i64,
        unit_price: Decimal,
    ) -> DomainResult<Self> {
        ensure_quantity(line_no, quantity)?;
        ensure_price(line_no, unit_price)?;
        Ok(Self {
            line_no,
            product_id: Some(product.id),
            name: product.name.clone(),
            sku: product.sku.clone(),
            size: product.size.clone(),
            image: product.image.clone(),
            unit_price,
            quantity,
        })
    }

    /// Snapshot a catalog product at its current catalog price.
    pub fn catalog(line_no: u32, product: &Product, quantity: i64) -> DomainResult<Self> {
        Self::from_product(line_no, product, quantity, product.price)
    }

    /// Free-form line with no catalog backing.
    pub fn free_form(
        line_no: u32,
        name: &str,
        sku: Option<&str>,
        unit_price: Decimal,
        size: Option<String>,
        image: Option<String>,
        quantity: i64,
    ) -> DomainResult<Self> {
        ensure_quantity(line_no, quantity)?;
        ensure_price(line_no, unit_price)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation(format!(
                "line {line_no}: name cannot be empty"
            )));
        }
        let sku = sku
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(CUSTOM_SKU);
        Ok(Self {
            line_no,
            product_id: None,
            name: name.to_string(),
            sku: sku.to_string(),
            size,
            image,
            unit_price,
            quantity,
        })
    }

    pub fn is_catalog(&self) -> bool {
        self.product_id.is_some()
    }

    pub fn line_total(&self) -> DomainResult<Decimal> {
        line_amount(self.unit_price, self.quantity)
            .map_err(|e| prefix_line(self.line_no, e))
    }
}

fn ensure_quantity(line_no: u32, quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation(format!(
            "line {line_no}: quantity must be positive"
        )));
    }
    Ok(())
}

fn ensure_price(line_no: u32, price: Decimal) -> DomainResult<()> {
    validate_price(price).map_err(|e| prefix_line(line_no, e))
}

fn prefix_line(line_no: u32, err: DomainError) -> DomainError {
    match err {
        DomainError::Validation(msg) => DomainError::validation(format!("line {line_no}: {msg}")),
        other => other,
    }
}

/// Order attributes other than lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHeader {
    pub source: OrderSource,
    pub external_id: Option<String>,
    /// Human-facing marketplace order code.
    pub external_code: Option<String>,
    pub shipping_method: Option<String>,
    /// Courier city code for the delivery address.
    pub shipping_city_code: Option<String>,
    pub status: OrderStatus,
    pub client: ClientInfo,
}

impl OrderHeader {
    pub fn local(
        client: ClientInfo,
        shipping_method: Option<String>,
        shipping_city_code: Option<String>,
    ) -> Self {
        Self {
            source: OrderSource::Local,
            external_id: None,
            external_code: None,
            shipping_method,
            shipping_city_code,
            status: OrderStatus::Pending,
            client,
        }
    }
}

/// Stock the ledger must take out for one catalog line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDemand {
    pub line_no: u32,
    pub adjustment: StockAdjustment,
}

/// Sales order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub external_id: Option<String>,
    pub external_code: Option<String>,
    pub source: OrderSource,
    pub shipping_method: Option<String>,
    pub shipping_city_code: Option<String>,
    pub status: OrderStatus,
    pub client: ClientInfo,
    /// Always Σ(unit_price × quantity) over `lines`.
    pub total: Decimal,
    pub created_by: Option<PrincipalId>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Build an order from already-snapshotted lines.
    ///
    /// Lines must be numbered 1..=n in order; the total is derived from them.
    pub fn assemble(
        id: OrderId,
        header: OrderHeader,
        lines: Vec<OrderLine>,
        created_by: Option<PrincipalId>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("order must have at least one line"));
        }
        for (idx, line) in lines.iter().enumerate() {
            if line.line_no as usize != idx + 1 {
                return Err(DomainError::invariant(format!(
                    "line numbers must be sequential, found {} at position {}",
                    line.line_no,
                    idx + 1
                )));
            }
        }
        if let Some(external_id) = &header.external_id {
            if external_id.trim().is_empty() {
                return Err(DomainError::validation("external id cannot be blank"));
            }
        }

        let amounts = lines
            .iter()
            .map(OrderLine::line_total)
            .collect::<DomainResult<Vec<_>>>()?;
        let total = checked_total(amounts)?;
        Ok(Self {
            id,
            external_id: header.external_id,
            external_code: header.external_code,
            source: header.source,
            shipping_method: header.shipping_method,
            shipping_city_code: header.shipping_city_code,
            status: header.status,
            client: header.client,
            total,
            created_by,
            created_at,
            lines,
        })
    }

    /// OUT adjustments for every catalog line, in line order.
    pub fn stock_demand(&self) -> Vec<LineDemand> {
        self.lines
            .iter()
            .filter_map(|line| {
                line.product_id.map(|product_id| LineDemand {
                    line_no: line.line_no,
                    adjustment: StockAdjustment::outbound(product_id, line.quantity),
                })
            })
            .collect()
    }
}
