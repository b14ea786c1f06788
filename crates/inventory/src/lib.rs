//! Stock ledger domain.
//!
//! Movement records and the pure decision logic behind the ledger's atomic
//! primitives: planning a batch of adjustments against current on-hand levels
//! and reconciling a product's quantity against its movement log. No IO here;
//! stores call into this crate while holding their locks.

pub mod movement;
pub mod plan;
pub mod reconcile;

pub use movement::{Direction, Movement, MovementFilter, StockAdjustment};
pub use plan::{BatchPlan, PlanError, PlannedMovement, lock_order, plan_batch};
pub use reconcile::{Reconciliation, ledger_balance};
