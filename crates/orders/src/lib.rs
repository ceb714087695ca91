//! Orders domain module.
//!
//! This crate contains business rules for checkout orders, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage): the order state
//! machine, the checkout plan that turns a request plus its snapshots into an
//! order and a reservation, and the release that mirrors it on expiry.

pub mod checkout;
pub mod order;

pub use checkout::{
    ActiveStock, CheckoutPlan, CreateOrderProduct, CreateOrderRequest, Product, expiry_for,
    plan_checkout, release_adjustments,
};
pub use order::{NewOrder, NewOrderDetail, Order, OrderDetail, OrderState, OrderWithDetails};
