//! Product catalog domain module.
//!
//! Catalog metadata (name, sku, size, price, image) and its validation rules.
//! The on-hand quantity lives on the product row but is owned by the stock
//! ledger: nothing in this crate changes it.

pub mod money;
pub mod product;
pub mod size;

pub use money::{MAX_PRICE, MAX_TOTAL, validate_price};
pub use product::{AssortmentItem, NewProduct, Product, ProductPatch};
pub use size::infer_size;
