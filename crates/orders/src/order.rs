use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockflow_core::{
    DomainError, DomainResult, Entity, OrderDetailId, OrderId, ProductId, ShopId, UserId,
    WarehouseId,
};

/// Order lifecycle. The only transition is `Created -> Expired`.
///
/// Stored and serialized as a small integer: `Created = 1`, `Expired = 2`.
/// `0` is the unspecified value and never loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum OrderState {
    Created,
    Expired,
}

impl OrderState {
    pub const fn as_i16(self) -> i16 {
        match self {
            OrderState::Created => 1,
            OrderState::Expired => 2,
        }
    }
}

impl From<OrderState> for i16 {
    fn from(state: OrderState) -> Self {
        state.as_i16()
    }
}

impl TryFrom<i16> for OrderState {
    type Error = DomainError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(OrderState::Created),
            2 => Ok(OrderState::Expired),
            other => Err(DomainError::invalid(format!("unknown order state {other}"))),
        }
    }
}

/// Persisted order header.
///
/// `total_stock` and `total_price` are fixed at creation from the details and
/// never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub shop_id: ShopId,
    pub state: OrderState,
    pub total_stock: i64,
    pub total_price: Decimal,
    pub expired_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether the reconciler should pick this order up at `now`.
    pub fn is_due_for_expiry(&self, now: DateTime<Utc>) -> bool {
        self.state == OrderState::Created && self.expired_at < now
    }

    /// Apply the `Created -> Expired` transition.
    pub fn expire(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        match self.state {
            OrderState::Created => {
                self.state = OrderState::Expired;
                self.updated_at = now;
                Ok(())
            }
            OrderState::Expired => Err(DomainError::conflict(format!(
                "order {} is already expired",
                self.id
            ))),
        }
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }
}

/// One reserved line of an order; immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: OrderDetailId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub stock: i64,
    /// Unit price copied from the product at checkout.
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order header before the store has assigned an id. Always inserted as `Created`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub shop_id: ShopId,
    pub total_stock: i64,
    pub total_price: Decimal,
    pub expired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderDetail {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub stock: i64,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithDetails {
    pub order: Order,
    pub order_details: Vec<OrderDetail>,
}
