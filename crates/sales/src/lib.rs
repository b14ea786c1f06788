//! Sales orders domain module.
//!
//! This crate contains business rules for orders, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage): line snapshots,
//! totals, the stock demand an order places on the ledger and the status
//! state machine.

pub mod order;
pub mod status;

pub use order::{
    CUSTOM_SKU, ClientInfo, LineDemand, LineRequest, Order, OrderHeader, OrderLine, OrderSource,
};
pub use status::OrderStatus;
