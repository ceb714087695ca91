//! Stock adjustment planning.
//!
//! An adjustment batch is a list of signed deltas against ledger rows. Before
//! anything is written, the batch is checked against a snapshot of the rows it
//! touches; the resulting [`LedgerOp`]s are what the storage layer applies
//! inside a single transaction.
//!
//! The snapshot check is a plausibility filter only. The authoritative guard
//! is the conditional decrement the storage layer executes for every
//! [`LedgerOp::Decrease`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockflow_core::{
    DomainError, DomainResult, ProductId, RequestValidator, Validate, WarehouseId, distinct,
    index_by_id,
};

use crate::stock::{StockKey, WarehouseStock};
use crate::warehouse::Warehouse;

/// A single signed delta: positive adds stock, negative removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub stock: i64,
}

impl StockAdjustment {
    pub fn new(warehouse_id: WarehouseId, product_id: ProductId, stock: i64) -> Self {
        Self {
            warehouse_id,
            product_id,
            stock,
        }
    }

    pub fn key(&self) -> StockKey {
        StockKey::new(self.warehouse_id, self.product_id)
    }
}

impl Validate for StockAdjustment {
    fn validate(&self, v: &RequestValidator) -> DomainResult<()> {
        v.required_id("warehouse_id", self.warehouse_id.get())?;
        v.required_id("product_id", self.product_id.get())?;
        v.non_zero("stock", self.stock)
    }
}

/// Wire envelope of an adjustment batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustmentRequest {
    pub warehouse_stocks: Vec<StockAdjustment>,
}

impl StockAdjustmentRequest {
    pub fn new(warehouse_stocks: Vec<StockAdjustment>) -> Self {
        Self { warehouse_stocks }
    }
}

impl Validate for StockAdjustmentRequest {
    fn validate(&self, v: &RequestValidator) -> DomainResult<()> {
        v.non_empty("warehouse_stocks", &self.warehouse_stocks)?;
        v.check(&self.warehouse_stocks[..])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProduct {
    pub product_id: ProductId,
    pub stock: i64,
}

impl Validate for TransferProduct {
    fn validate(&self, v: &RequestValidator) -> DomainResult<()> {
        v.required_id("product_id", self.product_id.get())?;
        v.positive("stock", self.stock)
    }
}

/// Move stock of one or more products between two warehouses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub original_warehouse_id: WarehouseId,
    pub destination_warehouse_id: WarehouseId,
    pub products: Vec<TransferProduct>,
}

impl TransferRequest {
    /// The adjustment batch equivalent to this transfer: for each product, in
    /// request order, a decrement at the origin followed by an increment at
    /// the destination.
    pub fn to_adjustments(&self) -> Vec<StockAdjustment> {
        self.products
            .iter()
            .flat_map(|p| {
                let qty = p.stock.saturating_abs();
                [
                    StockAdjustment::new(self.original_warehouse_id, p.product_id, -qty),
                    StockAdjustment::new(self.destination_warehouse_id, p.product_id, qty),
                ]
            })
            .collect()
    }
}

impl Validate for TransferRequest {
    fn validate(&self, v: &RequestValidator) -> DomainResult<()> {
        v.required_id("original_warehouse_id", self.original_warehouse_id.get())?;
        v.required_id("destination_warehouse_id", self.destination_warehouse_id.get())?;
        v.non_empty("products", &self.products)?;
        v.check(&self.products[..])
    }
}

/// One write against the ledger. `amount` is always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOp {
    Increase { key: StockKey, amount: i64 },
    /// Must be applied with the `stock >= amount` guard.
    Decrease { key: StockKey, amount: i64 },
}

impl LedgerOp {
    pub fn key(&self) -> StockKey {
        match self {
            LedgerOp::Increase { key, .. } | LedgerOp::Decrease { key, .. } => *key,
        }
    }

    pub fn amount(&self) -> i64 {
        match self {
            LedgerOp::Increase { amount, .. } | LedgerOp::Decrease { amount, .. } => *amount,
        }
    }

    /// Signed effect of the op on the row's quantity.
    pub fn delta(&self) -> i64 {
        match self {
            LedgerOp::Increase { amount, .. } => *amount,
            LedgerOp::Decrease { amount, .. } => -*amount,
        }
    }
}

/// Distinct warehouses referenced by a batch, in first-seen order.
pub fn referenced_warehouses(adjustments: &[StockAdjustment]) -> Vec<WarehouseId> {
    distinct(adjustments.iter().map(|a| a.warehouse_id))
}

/// Distinct products referenced by a batch, in first-seen order.
pub fn referenced_products(adjustments: &[StockAdjustment]) -> Vec<ProductId> {
    distinct(adjustments.iter().map(|a| a.product_id))
}

/// Fails with `WarehouseNotFound` unless every requested id is present in
/// `found`. Active and inactive warehouses both count.
pub fn ensure_warehouses_exist(requested: &[WarehouseId], found: &[Warehouse]) -> DomainResult<()> {
    let found = index_by_id(found);
    if requested.iter().all(|id| found.contains_key(id)) {
        Ok(())
    } else {
        Err(DomainError::WarehouseNotFound)
    }
}

/// Check every delta against the snapshot and turn the batch into ledger ops.
///
/// Each entry is checked independently against the snapshot value, so two
/// decrements of the same row can both pass here; the guarded write catches
/// the second one.
pub fn plan_adjustment(
    adjustments: &[StockAdjustment],
    snapshot: &[WarehouseStock],
) -> DomainResult<Vec<LedgerOp>> {
    let current: HashMap<StockKey, i64> = snapshot.iter().map(|s| (s.key(), s.stock)).collect();

    adjustments
        .iter()
        .map(|adj| {
            let key = adj.key();
            let on_hand = *current.get(&key).ok_or(DomainError::StockRowNotFound)?;

            if adj.stock >= 0 {
                if on_hand.checked_add(adj.stock).is_none() {
                    return Err(DomainError::invalid(format!("stock for {key} would overflow")));
                }
                return Ok(LedgerOp::Increase {
                    key,
                    amount: adj.stock,
                });
            }

            let amount = adj.stock.checked_neg().ok_or(DomainError::OutOfStock)?;
            if on_hand < amount {
                return Err(DomainError::OutOfStock);
            }
            Ok(LedgerOp::Decrease { key, amount })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use stockflow_core::{ShopId, WarehouseStockId};

    fn w(id: i64) -> WarehouseId {
        WarehouseId::new(id)
    }

    fn p(id: i64) -> ProductId {
        ProductId::new(id)
    }

    fn row(warehouse: i64, product: i64, stock: i64) -> WarehouseStock {
        let now = Utc::now();
        WarehouseStock {
            id: WarehouseStockId::new(warehouse * 1000 + product),
            warehouse_id: w(warehouse),
            product_id: p(product),
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    fn warehouse(id: i64, active: bool) -> Warehouse {
        let now = Utc::now();
        Warehouse {
            id: w(id),
            shop_id: ShopId::new(1),
            name: format!("wh-{id}"),
            active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn negative_delta_plans_guarded_decrease() {
        let ops = plan_adjustment(
            &[StockAdjustment::new(w(1), p(1), -3)],
            &[row(1, 1, 10)],
        )
        .unwrap();

        assert_eq!(
            ops,
            vec![LedgerOp::Decrease {
                key: StockKey::new(w(1), p(1)),
                amount: 3
            }]
        );
    }

    #[test]
    fn first_failing_entry_decides_the_error() {
        let err = plan_adjustment(
            &[
                StockAdjustment::new(w(1), p(1), -100),
                StockAdjustment::new(w(1), p(2), 1),
            ],
            &[row(1, 1, 10)],
        )
        .unwrap_err();
        assert_eq!(err, DomainError::OutOfStock);

        let err = plan_adjustment(&[StockAdjustment::new(w(1), p(2), 1)], &[row(1, 1, 10)])
            .unwrap_err();
        assert_eq!(err, DomainError::StockRowNotFound);
    }

    #[test]
    fn draining_to_exactly_zero_is_allowed() {
        let ops =
            plan_adjustment(&[StockAdjustment::new(w(1), p(1), -10)], &[row(1, 1, 10)]).unwrap();
        assert_eq!(ops[0].delta(), -10);

        let err = plan_adjustment(&[StockAdjustment::new(w(1), p(1), -11)], &[row(1, 1, 10)])
            .unwrap_err();
        assert_eq!(err, DomainError::OutOfStock);
    }

    #[test]
    fn repeated_pair_passes_snapshot_check_individually() {
        let ops = plan_adjustment(
            &[
                StockAdjustment::new(w(1), p(1), -6),
                StockAdjustment::new(w(1), p(1), -6),
            ],
            &[row(1, 1, 10)],
        )
        .unwrap();
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn overflowing_increase_is_invalid() {
        let err = plan_adjustment(
            &[StockAdjustment::new(w(1), p(1), 1)],
            &[row(1, 1, i64::MAX)],
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRequest(_)));
    }

    #[test]
    fn minimum_delta_does_not_panic() {
        let err = plan_adjustment(
            &[StockAdjustment::new(w(1), p(1), i64::MIN)],
            &[row(1, 1, i64::MAX)],
        )
        .unwrap_err();
        assert_eq!(err, DomainError::OutOfStock);
    }

    #[test]
    fn unknown_warehouse_is_rejected_inactive_is_not() {
        let found = [warehouse(1, true), warehouse(2, false)];
        assert!(ensure_warehouses_exist(&[w(1), w(2)], &found).is_ok());
        assert_eq!(
            ensure_warehouses_exist(&[w(1), w(3)], &found),
            Err(DomainError::WarehouseNotFound)
        );
    }

    #[test]
    fn transfer_interleaves_origin_and_destination_per_product() {
        let req = TransferRequest {
            original_warehouse_id: w(1),
            destination_warehouse_id: w(2),
            products: vec![
                TransferProduct {
                    product_id: p(7),
                    stock: 4,
                },
                TransferProduct {
                    product_id: p(8),
                    stock: 1,
                },
            ],
        };

        assert_eq!(
            req.to_adjustments(),
            vec![
                StockAdjustment::new(w(1), p(7), -4),
                StockAdjustment::new(w(2), p(7), 4),
                StockAdjustment::new(w(1), p(8), -1),
                StockAdjustment::new(w(2), p(8), 1),
            ]
        );
    }

    #[test]
    fn adjustment_request_validation() {
        let v = RequestValidator::new();
        assert!(v.check(&StockAdjustmentRequest::default()).is_err());
        assert!(v
            .check(&StockAdjustmentRequest::new(vec![StockAdjustment::new(w(1), p(1), 0)]))
            .is_err());
        assert!(v
            .check(&StockAdjustmentRequest::new(vec![StockAdjustment::new(w(0), p(1), 2)]))
            .is_err());
        assert!(v
            .check(&StockAdjustmentRequest::new(vec![StockAdjustment::new(w(1), p(1), -2)]))
            .is_ok());
    }

    #[test]
    fn transfer_rejects_non_positive_quantities() {
        let v = RequestValidator::new();
        let mut req = TransferRequest {
            original_warehouse_id: w(1),
            destination_warehouse_id: w(2),
            products: vec![TransferProduct {
                product_id: p(1),
                stock: 0,
            }],
        };
        assert!(v.check(&req).is_err());
        req.products[0].stock = 3;
        assert!(v.check(&req).is_ok());
        req.products.clear();
        assert!(v.check(&req).is_err());
    }

    #[test]
    fn wire_shape_uses_warehouse_stocks_envelope() {
        let req: StockAdjustmentRequest = serde_json::from_str(
            r#"{"warehouse_stocks":[{"warehouse_id":1,"product_id":2,"stock":-3}]}"#,
        )
        .unwrap();
        assert_eq!(req.warehouse_stocks, vec![StockAdjustment::new(w(1), p(2), -3)]);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// A transfer never creates or destroys stock.
        #[test]
        fn transfer_deltas_sum_to_zero_per_product(
            qtys in prop::collection::vec(1i64..1_000_000i64, 1..10)
        ) {
            let req = TransferRequest {
                original_warehouse_id: w(1),
                destination_warehouse_id: w(2),
                products: qtys
                    .iter()
                    .enumerate()
                    .map(|(i, q)| TransferProduct { product_id: p(i as i64 + 1), stock: *q })
                    .collect(),
            };

            let adjustments = req.to_adjustments();
            prop_assert_eq!(adjustments.len(), qtys.len() * 2);
            let total: i64 = adjustments.iter().map(|a| a.stock).sum();
            prop_assert_eq!(total, 0);
        }

        /// Planned ops preserve order and carry each delta unchanged.
        #[test]
        fn planned_ops_mirror_deltas(
            deltas in prop::collection::vec(-50i64..50i64, 1..20)
        ) {
            let deltas: Vec<i64> = deltas.into_iter().filter(|d| *d != 0).collect();
            let batch: Vec<StockAdjustment> = deltas
                .iter()
                .map(|d| StockAdjustment::new(w(1), p(1), *d))
                .collect();

            let ops = plan_adjustment(&batch, &[row(1, 1, 50)]).unwrap();
            let planned: Vec<i64> = ops.iter().map(LedgerOp::delta).collect();
            prop_assert_eq!(planned, deltas);
            prop_assert!(ops.iter().all(|op| op.amount() > 0));
        }
    }
}
