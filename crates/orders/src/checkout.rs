//! Checkout planning.
//!
//! Given a validated request and the product and active-stock snapshots
//! fetched for it, [`plan_checkout`] decides whether the order may be placed
//! and produces everything the orchestrator needs to persist and reserve it.
//! Snapshot checks here are early rejection only; the warehouse's guarded
//! decrement has the final say.

use std::collections::HashMap;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockflow_core::{
    DomainError, DomainResult, Entity, ProductId, RequestValidator, ShopId, UserId, Validate,
    WarehouseId, distinct, index_by_id,
};
use stockflow_inventory::{ActiveStockView, StockAdjustment};

use crate::order::{NewOrder, NewOrderDetail, OrderDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderProduct {
    #[serde(alias = "id")]
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub stock: i64,
}

impl Validate for CreateOrderProduct {
    fn validate(&self, v: &RequestValidator) -> DomainResult<()> {
        v.required_id("product_id", self.product_id.get())?;
        v.required_id("warehouse_id", self.warehouse_id.get())?;
        v.positive("stock", self.stock)
    }
}

/// Checkout request as received from the client. The user comes from the
/// authenticated request, not the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub shop_id: ShopId,
    pub products: Vec<CreateOrderProduct>,
}

impl CreateOrderRequest {
    pub fn product_ids(&self) -> Vec<ProductId> {
        distinct(self.products.iter().map(|p| p.product_id))
    }
}

impl Validate for CreateOrderRequest {
    fn validate(&self, v: &RequestValidator) -> DomainResult<()> {
        v.required_id("shop_id", self.shop_id.get())?;
        v.non_empty("products", &self.products)?;
        v.check(&self.products[..])
    }
}

/// Product record as served by the product catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

/// Stock of one product in one active warehouse, joined with the owning shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveStock {
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub stock: i64,
    pub shop_id: ShopId,
    pub warehouse_name: String,
}

impl ActiveStock {
    /// Join the rows of an active-stock view with their warehouses. Rows whose
    /// warehouse is missing from the view are dropped.
    pub fn from_view(view: &ActiveStockView) -> Vec<ActiveStock> {
        let warehouses = index_by_id(&view.warehouses);
        view.warehouse_stocks
            .iter()
            .filter_map(|row| {
                let warehouse = warehouses.get(&row.warehouse_id)?;
                Some(ActiveStock {
                    warehouse_id: row.warehouse_id,
                    product_id: row.product_id,
                    stock: row.stock,
                    shop_id: warehouse.shop_id,
                    warehouse_name: warehouse.name.clone(),
                })
            })
            .collect()
    }
}

/// Everything needed to place one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub order: NewOrder,
    pub details: Vec<NewOrderDetail>,
    /// One negative delta per line, in request order.
    pub reservation: Vec<StockAdjustment>,
}

/// `now` truncated to whole seconds, plus the expiration window.
pub fn expiry_for(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now.trunc_subsecs(0) + window
}

/// Check a validated request against its snapshots and build the order.
///
/// Errors are reported for the first failing check, in this order: missing
/// product, then per line: missing active stock, foreign shop, insufficient
/// stock.
pub fn plan_checkout(
    request: &CreateOrderRequest,
    user_id: UserId,
    products: &[Product],
    active_stock: &[ActiveStock],
    now: DateTime<Utc>,
    window: Duration,
) -> DomainResult<CheckoutPlan> {
    let catalog = index_by_id(products);
    if !request.product_ids().iter().all(|id| catalog.contains_key(id)) {
        return Err(DomainError::ProductNotFound);
    }

    let stock: HashMap<(ProductId, WarehouseId), &ActiveStock> = active_stock
        .iter()
        .map(|s| ((s.product_id, s.warehouse_id), s))
        .collect();

    for line in &request.products {
        let entry = stock
            .get(&(line.product_id, line.warehouse_id))
            .ok_or(DomainError::StockNotFound)?;
        if entry.shop_id != request.shop_id {
            return Err(DomainError::MultiShopViolation);
        }
        if entry.stock < line.stock {
            return Err(DomainError::InsufficientStock);
        }
    }

    let mut total_stock: i64 = 0;
    let mut total_price = Decimal::ZERO;
    let mut details = Vec::with_capacity(request.products.len());

    for line in &request.products {
        let price = catalog
            .get(&line.product_id)
            .map(|p| p.price)
            .ok_or(DomainError::ProductNotFound)?;

        total_stock = total_stock
            .checked_add(line.stock)
            .ok_or_else(|| DomainError::invalid("total stock overflows"))?;
        total_price = price
            .checked_mul(Decimal::from(line.stock))
            .and_then(|line_total| total_price.checked_add(line_total))
            .ok_or_else(|| DomainError::invalid("total price overflows"))?;

        details.push(NewOrderDetail {
            product_id: line.product_id,
            warehouse_id: line.warehouse_id,
            stock: line.stock,
            price,
        });
    }

    let reservation = request
        .products
        .iter()
        .map(|line| StockAdjustment::new(line.warehouse_id, line.product_id, -line.stock))
        .collect();

    Ok(CheckoutPlan {
        order: NewOrder {
            user_id,
            shop_id: request.shop_id,
            total_stock,
            total_price,
            expired_at: expiry_for(now, window),
        },
        details,
        reservation,
    })
}

/// Positive deltas mirroring the reservation recorded in `details`.
pub fn release_adjustments(details: &[OrderDetail]) -> Vec<StockAdjustment> {
    details
        .iter()
        .map(|d| StockAdjustment::new(d.warehouse_id, d.product_id, d.stock))
        .collect()
}
