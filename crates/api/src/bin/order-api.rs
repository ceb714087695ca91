use std::sync::Arc;

use anyhow::Context;

use stockflow_api::app::{
    OrderServices, build_order_app,
    services::{product_client, warehouse_client},
};
use stockflow_infra::{
    OrderServiceConfig, db,
    gateway::{HttpProductCatalog, HttpWarehouseGateway},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    stockflow_observability::init();

    let config = OrderServiceConfig::from_env()?;
    let pool = db::connect(&config.database_url, config.database_max_connections).await?;
    db::apply_schema(&pool).await?;

    let products = Arc::new(HttpProductCatalog::new(product_client(&config)?));
    let warehouse = Arc::new(HttpWarehouseGateway::new(warehouse_client(&config)?));
    let services = OrderServices::postgres(pool, products, warehouse, config.expiration_window()?);

    let listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.http_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "order service listening");

    axum::serve(listener, build_order_app(services)).await?;
    Ok(())
}
