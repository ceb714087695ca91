//! Order creation orchestrator (order service).
//!
//! Checkout is a two-store saga without two-phase commit:
//!
//! 1. validate the request
//! 2. fetch products and active stock, then plan the order
//! 3. insert the order and its details inside an open local transaction
//! 4. reserve stock with the warehouse service while that transaction is open
//! 5. commit only if the reservation succeeded, otherwise roll back
//!
//! A failure between a successful reservation and the local commit leaves an
//! orphaned reservation (stock decremented, no durable order). Nothing here
//! compensates for it.

use chrono::{Duration, Utc};
use tracing::{error, info, instrument};

use stockflow_core::{DomainError, OrderId, RequestValidator, UserId};
use stockflow_orders::{CheckoutPlan, CreateOrderRequest, OrderWithDetails, plan_checkout};

use crate::error::ServiceError;
use crate::gateway::{ProductCatalog, WarehouseGateway};
use crate::order_store::OrderStore;

/// Order-side application service for checkout and order lookup.
pub struct OrderCreationOrchestrator<O, P, W> {
    orders: O,
    products: P,
    warehouse: W,
    validator: RequestValidator,
    expiration: Duration,
}

impl<O, P, W> OrderCreationOrchestrator<O, P, W>
where
    O: OrderStore,
    P: ProductCatalog,
    W: WarehouseGateway,
{
    pub fn new(
        orders: O,
        products: P,
        warehouse: W,
        validator: RequestValidator,
        expiration: Duration,
    ) -> Self {
        Self {
            orders,
            products,
            warehouse,
            validator,
            expiration,
        }
    }

    pub fn orders(&self) -> &O {
        &self.orders
    }

    /// Place an order for `user_id` and reserve its stock.
    #[instrument(
        skip(self, request),
        fields(user_id = %user_id, shop_id = %request.shop_id, lines = request.products.len()),
        err
    )]
    pub async fn checkout(
        &self,
        user_id: UserId,
        request: &CreateOrderRequest,
    ) -> Result<OrderWithDetails, ServiceError> {
        self.validator.check(request)?;

        let product_ids = request.product_ids();
        let products = self.products.list_by_ids(&product_ids).await?;
        let active_stock = self.warehouse.active_stock(&product_ids).await?;
        let plan = plan_checkout(
            request,
            user_id,
            &products,
            &active_stock,
            Utc::now(),
            self.expiration,
        )?;

        let mut tx = self.orders.begin().await?;
        match self.place(&mut tx, &plan).await {
            Ok(placed) => {
                self.orders.commit(tx).await?;
                info!(
                    order_id = %placed.order.id,
                    total_stock = placed.order.total_stock,
                    "order created"
                );
                Ok(placed)
            }
            Err(e) => {
                if let Err(rollback_err) = self.orders.rollback(tx).await {
                    error!(error = %rollback_err, "failed to roll back order creation");
                }
                Err(e)
            }
        }
    }

    /// Insert the order and its details, then reserve. Runs inside `tx`.
    async fn place(&self, tx: &mut O::Tx, plan: &CheckoutPlan) -> Result<OrderWithDetails, ServiceError> {
        let order = self.orders.insert_order(tx, &plan.order).await?;

        let mut order_details = Vec::with_capacity(plan.details.len());
        for detail in &plan.details {
            order_details.push(self.orders.insert_detail(tx, order.id, detail).await?);
        }

        self.warehouse.adjust(&plan.reservation).await?;

        Ok(OrderWithDetails {
            order,
            order_details,
        })
    }

    /// An order with its details.
    #[instrument(skip(self), err)]
    pub async fn find_order(&self, order_id: OrderId) -> Result<OrderWithDetails, ServiceError> {
        let order = self
            .orders
            .find(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound)?;
        let order_details = self.orders.details_of(order_id).await?;
        Ok(OrderWithDetails {
            order,
            order_details,
        })
    }
}
