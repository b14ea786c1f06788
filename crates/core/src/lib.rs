//! `shopdesk-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers and the domain error model shared by the catalog,
//! inventory and sales crates.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{MovementId, OrderId, ProductId};
