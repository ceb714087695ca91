//! One reconciliation pass over expired orders. Scheduling is external.

use stockflow_api::app::services::warehouse_client;
use stockflow_infra::{
    CronRunner, ExpirationReconciler, OrderServiceConfig, db, gateway::HttpWarehouseGateway,
    order_store::PostgresOrderStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    stockflow_observability::init();

    let config = OrderServiceConfig::from_env()?;
    let pool = db::connect(&config.database_url, config.database_max_connections).await?;

    let reconciler = ExpirationReconciler::new(
        PostgresOrderStore::new(pool),
        HttpWarehouseGateway::new(warehouse_client(&config)?),
    );

    let report = CronRunner::new("expired-order")
        .with_args(std::env::args())
        .run(reconciler.run_once())
        .await?;

    tracing::info!(
        scanned = report.scanned,
        expired = report.expired,
        failed = report.failed,
        "expired order cron done"
    );
    Ok(())
}
