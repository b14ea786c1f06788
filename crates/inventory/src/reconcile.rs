use serde::{Deserialize, Serialize};

use shopdesk_core::ProductId;

use crate::movement::Movement;

/// Σ IN − Σ OUT over a product's movements.
pub fn ledger_balance<'a>(movements: impl IntoIterator<Item = &'a Movement>) -> i64 {
    movements.into_iter().map(Movement::delta).sum()
}

/// Result of checking a product's stored quantity against its movement log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub product_id: ProductId,
    pub on_hand: i64,
    pub ledger_balance: i64,
    pub consistent: bool,
}

impl Reconciliation {
    pub fn new(product_id: ProductId, on_hand: i64, ledger_balance: i64) -> Self {
        Self {
            product_id,
            on_hand,
            ledger_balance,
            consistent: on_hand == ledger_balance,
        }
    }

    pub fn compute<'a>(
        product_id: ProductId,
        on_hand: i64,
        movements: impl IntoIterator<Item = &'a Movement>,
    ) -> Self {
        let balance = ledger_balance(
            movements
                .into_iter()
                .filter(|m| m.product_id == product_id),
        );
        Self::new(product_id, on_hand, balance)
    }
}
