//! Batch planning.
//!
//! Given the on-hand levels of every product a batch touches (read under lock),
//! decide whether the whole batch can be applied and what the resulting levels
//! are. Adjustments to the same product are applied in order against the
//! running balance. The batch is all-or-nothing: the first adjustment that would
//! drive a balance negative rejects everything.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use thiserror::Error;

use shopdesk_core::{DomainError, ProductId};

use crate::movement::StockAdjustment;

/// Rejection of a batch, pointing at the adjustment that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("adjustment #{index}: {error}")]
pub struct PlanError {
    /// Zero-based position of the failing adjustment in the batch.
    pub index: usize,
    pub error: DomainError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedMovement {
    pub adjustment: StockAdjustment,
    /// Product balance right after this adjustment.
    pub balance_after: i64,
}

/// An accepted batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub movements: Vec<PlannedMovement>,
    /// Final on-hand level for each touched product.
    pub levels: BTreeMap<ProductId, i64>,
}

impl BatchPlan {
    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }
}

/// Product ids a batch touches, deduplicated, in the order rows must be locked.
pub fn lock_order(batch: &[StockAdjustment]) -> Vec<ProductId> {
    batch
        .iter()
        .map(|a| a.product_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Plan `batch` against `levels` (current on-hand per product).
///
/// A product missing from `levels` does not exist.
pub fn plan_batch(
    levels: &HashMap<ProductId, i64>,
    batch: &[StockAdjustment],
) -> Result<BatchPlan, PlanError> {
    let mut running: BTreeMap<ProductId, i64> = BTreeMap::new();
    let mut movements = Vec::with_capacity(batch.len());

    for (index, adjustment) in batch.iter().enumerate() {
        adjustment
            .validate()
            .map_err(|error| PlanError { index, error })?;

        let current = match running.get(&adjustment.product_id) {
            Some(level) => *level,
            None => *levels.get(&adjustment.product_id).ok_or_else(|| PlanError {
                index,
                error: DomainError::not_found(format!("product {}", adjustment.product_id)),
            })?,
        };

        let next = current
            .checked_add(adjustment.delta())
            .ok_or_else(|| PlanError {
                index,
                error: DomainError::validation("quantity overflow"),
            })?;

        if next < 0 {
            return Err(PlanError {
                index,
                error: DomainError::insufficient_stock(
                    adjustment.product_id,
                    adjustment.quantity,
                    current,
                ),
            });
        }

        running.insert(adjustment.product_id, next);
        movements.push(PlannedMovement {
            adjustment: *adjustment,
            balance_after: next,
        });
    }

    Ok(BatchPlan {
        movements,
        levels: running,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn levels(entries: &[(ProductId, i64)]) -> HashMap<ProductId, i64> {
        entries.iter().copied().collect()
    }

    #[test]
    fn sequential_adjustments_use_running_balance() {
        let p = ProductId::new();
        let batch = [
            StockAdjustment::outbound(p, 3),
            StockAdjustment::inbound(p, 5),
        ];
        let plan = plan_batch(&levels(&[(p, 10)]), &batch).unwrap();
        assert_eq!(plan.movements[0].balance_after, 7);
        assert_eq!(plan.movements[1].balance_after, 12);
        assert_eq!(plan.levels[&p], 12);
    }

    #[test]
    fn same_product_twice_can_exhaust_stock() {
        let p = ProductId::new();
        let batch = [
            StockAdjustment::outbound(p, 1),
            StockAdjustment::outbound(p, 1),
        ];
        let err = plan_batch(&levels(&[(p, 1)]), &batch).unwrap_err();
        assert_eq!(err.index, 1);
        match err.error {
            DomainError::InsufficientStock {
                product_id,
                requested,
                available,
            } => {
                assert_eq!(product_id, p);
                assert_eq!(requested, 1);
                assert_eq!(available, 0);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn third_adjustment_failing_rejects_whole_batch() {
        let (a, b, c) = (ProductId::new(), ProductId::new(), ProductId::new());
        let batch = [
            StockAdjustment::outbound(a, 1),
            StockAdjustment::outbound(b, 1),
            StockAdjustment::outbound(c, 5),
        ];
        let err = plan_batch(&levels(&[(a, 3), (b, 3), (c, 2)]), &batch).unwrap_err();
        assert_eq!(err.index, 2);
    }

    #[test]
    fn unknown_product_is_not_found() {
        let p = ProductId::new();
        let err = plan_batch(&HashMap::new(), &[StockAdjustment::inbound(p, 1)]).unwrap_err();
        match err.error {
            DomainError::NotFound(_) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn empty_batch_plans_nothing() {
        let plan = plan_batch(&HashMap::new(), &[]).unwrap();
        assert!(plan.is_empty());
        assert!(plan.levels.is_empty());
    }

    #[test]
    fn lock_order_is_sorted_and_deduplicated() {
        let ids: Vec<ProductId> = (0..4).map(|_| ProductId::new()).collect();
        let batch: Vec<StockAdjustment> = ids
            .iter()
            .rev()
            .chain(ids.iter())
            .map(|id| StockAdjustment::inbound(*id, 1))
            .collect();
        let order = lock_order(&batch);
        let mut expected = ids.clone();
        expected.sort();
        assert_eq!(order, expected);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: an accepted plan never leaves a balance negative and its
        /// final level equals the opening level plus the signed deltas.
        #[test]
        fn accepted_plans_conserve_quantity(
            opening in 0i64..50,
            ops in prop::collection::vec((any::<bool>(), 1i64..20), 0..20)
        ) {
            let p = ProductId::new();
            let batch: Vec<StockAdjustment> = ops
                .iter()
                .map(|(inbound, q)| if *inbound {
                    StockAdjustment::inbound(p, *q)
                } else {
                    StockAdjustment::outbound(p, *q)
                })
                .collect();

            match plan_batch(&levels(&[(p, opening)]), &batch) {
                Ok(plan) => {
                    let expected: i64 = opening + batch.iter().map(StockAdjustment::delta).sum::<i64>();
                    prop_assert!(plan.movements.iter().all(|m| m.balance_after >= 0));
                    prop_assert_eq!(plan.levels.get(&p).copied().unwrap_or(opening), expected);
                }
                Err(err) => {
                    // The failing prefix is exactly where the running balance first dips below zero.
                    let mut balance = opening;
                    let mut first_negative = None;
                    for (i, a) in batch.iter().enumerate() {
                        balance += a.delta();
                        if balance < 0 {
                            first_negative = Some(i);
                            break;
                        }
                    }
                    prop_assert_eq!(Some(err.index), first_negative);
                }
            }
        }
    }
}
