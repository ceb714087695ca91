//! Expiration reconciler (order service, cron-triggered).
//!
//! One pass scans every `Created` order whose expiry has passed and, per
//! order, marks it expired and releases its reserved stock inside one local
//! transaction. Each order is its own unit of work: a failure is logged, the
//! order stays `Created` and the next pass picks it up again.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use stockflow_orders::{Order, release_adjustments};

use crate::error::ServiceError;
use crate::gateway::WarehouseGateway;
use crate::order_store::OrderStore;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    /// Orders found due for expiry.
    pub scanned: usize,
    pub expired: usize,
    pub failed: usize,
}

enum Outcome {
    Expired,
    /// Another pass got there first.
    Skipped,
}

pub struct ExpirationReconciler<O, W> {
    orders: O,
    warehouse: W,
}

impl<O, W> ExpirationReconciler<O, W>
where
    O: OrderStore,
    W: WarehouseGateway,
{
    pub fn new(orders: O, warehouse: W) -> Self {
        Self { orders, warehouse }
    }

    pub async fn run_once(&self) -> Result<ReconciliationReport, ServiceError> {
        self.run_at(Utc::now()).await
    }

    /// Reconcile every order due at `now`. Only the initial scan can fail the
    /// pass; per-order failures are counted in the report.
    #[instrument(skip(self), err)]
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<ReconciliationReport, ServiceError> {
        let due = self.orders.list_expired(now).await?;
        let mut report = ReconciliationReport {
            scanned: due.len(),
            ..Default::default()
        };

        for order in &due {
            info!(order_id = %order.id, expired_at = %order.expired_at, "expiring order");
            match self.expire(order).await {
                Ok(Outcome::Expired) => report.expired += 1,
                Ok(Outcome::Skipped) => {}
                Err(_) => report.failed += 1,
            }
        }

        info!(
            scanned = report.scanned,
            expired = report.expired,
            failed = report.failed,
            "expiration pass finished"
        );
        Ok(report)
    }

    async fn expire(&self, order: &Order) -> Result<Outcome, ServiceError> {
        let order_id = order.id;

        let details = self.orders.details_of(order_id).await.map_err(|e| {
            error!(order_id = %order_id, error = %e, "failed to fetch order details");
            e
        })?;

        let mut tx = self.orders.begin().await.map_err(|e| {
            error!(order_id = %order_id, error = %e, "failed to begin transaction");
            e
        })?;

        match self.orders.mark_expired(&mut tx, order_id).await {
            Ok(0) => {
                warn!(order_id = %order_id, "order no longer created, skipping release");
                self.abandon(order, tx).await;
                return Ok(Outcome::Skipped);
            }
            Ok(_) => {}
            Err(e) => {
                error!(order_id = %order_id, error = %e, "failed to mark order expired");
                self.abandon(order, tx).await;
                return Err(e.into());
            }
        }

        let release = release_adjustments(&details);
        if !release.is_empty() {
            if let Err(e) = self.warehouse.adjust(&release).await {
                error!(order_id = %order_id, error = %e, "failed to release order stock");
                self.abandon(order, tx).await;
                return Err(e.into());
            }
        }

        self.orders.commit(tx).await.map_err(|e| {
            error!(order_id = %order_id, error = %e, "failed to commit order expiration");
            e
        })?;

        Ok(Outcome::Expired)
    }

    async fn abandon(&self, order: &Order, tx: O::Tx) {
        if let Err(e) = self.orders.rollback(tx).await {
            error!(order_id = %order.id, error = %e, "failed to roll back order expiration");
        }
    }
}
