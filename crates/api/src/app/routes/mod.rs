use axum::{
    Router,
    routing::{get, post},
};

pub mod orders;
pub mod system;
pub mod warehouse_stocks;
pub mod warehouses;

/// Internal warehouse endpoints (basic-auth protected by the caller).
pub fn warehouse_router() -> Router {
    Router::new()
        .route("/adjustment-stocks", post(warehouse_stocks::adjust))
        .route("/transfer-stocks", post(warehouse_stocks::transfer))
        .route("/active-stocks", get(warehouse_stocks::active_stocks))
        .route("/warehouse-stocks", post(warehouse_stocks::create_stock_row))
        .route("/warehouses", post(warehouses::create_warehouse))
        .route("/warehouse-actives", post(warehouses::set_active))
}

/// Buyer-facing order endpoints (user context required).
pub fn order_router() -> Router {
    Router::new()
        .route("/checkout-orders", post(orders::checkout))
        .route("/orders/:id", get(orders::get_order))
}
