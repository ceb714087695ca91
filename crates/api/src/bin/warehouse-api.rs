use anyhow::Context;

use stockflow_api::app::{WarehouseServices, build_warehouse_app};
use stockflow_infra::{WarehouseServiceConfig, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    stockflow_observability::init();

    let config = WarehouseServiceConfig::from_env()?;
    let pool = db::connect(&config.database_url, config.database_max_connections).await?;
    db::apply_schema(&pool).await?;

    let app = build_warehouse_app(WarehouseServices::postgres(pool), config.basic_auth);

    let listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.http_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "warehouse service listening");

    axum::serve(listener, app).await?;
    Ok(())
}
