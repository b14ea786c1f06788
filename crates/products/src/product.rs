use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopdesk_core::{DomainError, DomainResult, ProductId};

use crate::money::validate_price;
use crate::size::infer_size;

/// Catalog product.
///
/// `quantity` mirrors the stock ledger's running balance for this product. It is
/// written only by the ledger (movement inserts); catalog edits go through
/// [`ProductPatch`] which has no quantity field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unique, externally meaningful code (barcode or generated).
    pub sku: String,
    pub size: Option<String>,
    pub price: Decimal,
    pub quantity: i64,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// Apply a metadata edit. Quantity is never touched.
    pub fn apply_patch(&mut self, patch: &ProductPatch, at: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(size) = &patch.size {
            self.size = normalize_optional(size);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(image) = &patch.image {
            self.image = normalize_optional(image);
        }
        self.updated_at = at;
    }
}

/// Request to create a product, optionally with an opening stock balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub size: Option<String>,
    pub price: Decimal,
    /// Opening quantity, booked as an IN movement when the product is created.
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.sku.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }
        validate_price(self.price)?;
        if self.quantity < 0 {
            return Err(DomainError::validation("opening quantity cannot be negative"));
        }
        Ok(())
    }

    /// Build the catalog row (with zero quantity) and return the opening
    /// balance separately so the caller can book it through the ledger.
    pub fn into_product(self, id: ProductId, at: DateTime<Utc>) -> DomainResult<(Product, i64)> {
        self.validate()?;

        let size = self
            .size
            .as_deref()
            .and_then(normalize_optional)
            .or_else(|| infer_size(&self.name));

        let product = Product {
            id,
            name: self.name.trim().to_string(),
            sku: self.sku.trim().to_string(),
            size,
            price: self.price,
            quantity: 0,
            image: self.image.as_deref().and_then(normalize_optional),
            created_at: at,
            updated_at: at,
        };
        Ok((product, self.quantity))
    }
}

/// Metadata-only edit of a product. `None` leaves a field unchanged; an empty
/// string clears `size` / `image`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
}

impl ProductPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.size.is_none() && self.price.is_none() && self.image.is_none()
    }
}

/// One row of an external stock-system assortment (bulk receive by SKU).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssortmentItem {
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: i64,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl AssortmentItem {
    /// Metadata refresh applied to an existing product with the same SKU:
    /// price only when positive, image only when provided.
    pub fn refresh_patch(&self) -> ProductPatch {
        ProductPatch {
            name: None,
            size: None,
            price: (self.price > Decimal::ZERO).then_some(self.price),
            image: self.image.clone().filter(|i| !i.trim().is_empty()),
        }
    }

    pub fn to_new_product(&self) -> NewProduct {
        NewProduct {
            name: self.name.clone(),
            sku: self.sku.clone(),
            size: self.size.clone(),
            price: self.price.max(Decimal::ZERO),
            quantity: self.quantity,
            image: self.image.clone(),
        }
    }
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
