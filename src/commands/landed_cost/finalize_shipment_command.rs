use super::{load_shipment_records, locked, not_found, ShipmentRecords};
use crate::{
    commands::Command,
    db::DbPool,
    dto::landed_cost::{FinalizationReport, ProductCostFailure},
    entities::{shipment, shipment_item, ShipmentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    middleware_helpers::retry::{with_retry, CostSinkRetryPolicy, RetryConfig},
    services::product_costs::{ProductCostSink, ProductCostUpdate},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use std::{sync::Arc, time::Duration};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Pushes every item's landed cost per unit to the product cost sink and
/// locks the shipment.
///
/// The shipment is claimed by moving it from `draft` to `finalizing` with a
/// conditional update, so concurrent callers cannot both push. A claim older
/// than `claim_timeout` is considered abandoned and may be taken over. If any
/// push fails the claim is released and the report lists the failures.
pub struct FinalizeLandedCostShipmentCommand {
    pub shipment_id: Uuid,
    pub sink: Arc<dyn ProductCostSink>,
    pub retry: RetryConfig,
    pub claim_timeout: Duration,
}

#[async_trait]
impl Command for FinalizeLandedCostShipmentCommand {
    type Result = FinalizationReport;

    #[instrument(skip(self, db_pool, event_sender), fields(shipment_id = %self.shipment_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let claimed_at = Utc::now();
        self.claim(&db_pool, claimed_at).await?;

        let report = match self.push_costs(&db_pool).await {
            Ok(report) => report,
            Err(e) => {
                error!(shipment_id = %self.shipment_id, "Finalize aborted: {}", e);
                self.release(&db_pool).await?;
                return Err(e);
            }
        };

        if report.failures.is_empty() {
            self.complete(&db_pool).await?;
            info!(
                shipment_id = %self.shipment_id,
                updated_products = report.updated_products_count,
                "Landed cost shipment finalized"
            );
            if let Err(e) = event_sender
                .send(Event::LandedCostShipmentFinalized {
                    shipment_id: self.shipment_id,
                    updated_products: report.updated_products_count + report.already_applied_count,
                })
                .await
            {
                error!(shipment_id = %self.shipment_id, "Failed to send finalized event: {}", e);
            }
            return Ok(FinalizationReport {
                finalized: true,
                status: ShipmentStatus::Finalized,
                ..report
            });
        }

        self.release(&db_pool).await?;
        counter!("landed_cost.finalize.incomplete", 1);
        warn!(
            shipment_id = %self.shipment_id,
            failed = report.failures.len(),
            "Finalize incomplete; shipment returned to draft"
        );
        if let Err(e) = event_sender
            .send(Event::LandedCostFinalizationIncomplete {
                shipment_id: self.shipment_id,
                failed_products: report.failed_products(),
            })
            .await
        {
            error!(shipment_id = %self.shipment_id, "Failed to send finalization incomplete event: {}", e);
        }

        Ok(FinalizationReport {
            status: ShipmentStatus::Draft,
            ..report
        })
    }
}

impl FinalizeLandedCostShipmentCommand {
    async fn claim(&self, db: &DbPool, claimed_at: DateTime<Utc>) -> Result<(), ServiceError> {
        let timeout = chrono::Duration::from_std(self.claim_timeout)
            .map_err(|e| ServiceError::InternalError(format!("invalid claim timeout: {}", e)))?;
        let stale_before = claimed_at - timeout;

        let claimable = Condition::any()
            .add(shipment::Column::Status.eq(ShipmentStatus::Draft))
            .add(
                Condition::all()
                    .add(shipment::Column::Status.eq(ShipmentStatus::Finalizing))
                    .add(shipment::Column::FinalizationStartedAt.lt(stale_before)),
            );

        let claimed = shipment::Entity::update_many()
            .set(shipment::ActiveModel {
                status: Set(ShipmentStatus::Finalizing),
                finalization_started_at: Set(Some(claimed_at)),
                updated_at: Set(claimed_at),
                ..Default::default()
            })
            .filter(shipment::Column::Id.eq(self.shipment_id))
            .filter(claimable)
            .exec(db)
            .await?;

        if claimed.rows_affected > 0 {
            return Ok(());
        }

        let current = shipment::Entity::find_by_id(self.shipment_id)
            .one(db)
            .await?
            .ok_or_else(|| not_found(self.shipment_id))?;
        Err(match current.status {
            ShipmentStatus::Finalized => ServiceError::Conflict(format!(
                "Shipment {} has already been finalized",
                self.shipment_id
            )),
            ShipmentStatus::Finalizing => ServiceError::Conflict(format!(
                "Finalization of shipment {} is already in progress",
                self.shipment_id
            )),
            status => locked(self.shipment_id, status),
        })
    }

    async fn push_costs(&self, db: &DbPool) -> Result<FinalizationReport, ServiceError> {
        let records = load_shipment_records(db, self.shipment_id).await?;
        let ShipmentRecords { shipment, items, .. } = records;

        let mut report = FinalizationReport {
            shipment_id: self.shipment_id,
            finalized: false,
            status: ShipmentStatus::Finalizing,
            updated_products_count: 0,
            already_applied_count: 0,
            failures: Vec::new(),
        };

        for item in &items {
            if item.cost_applied_at.is_some() {
                report.already_applied_count += 1;
                continue;
            }

            let update = ProductCostUpdate {
                product_id: item.product_id,
                landed_cost_per_unit: item.landed_cost_per_unit.into(),
                currency: shipment.base_currency.clone(),
                shipment_id: shipment.id,
                shipment_date: shipment.shipment_date,
                created_by: shipment.created_by,
            };
            let sink = self.sink.as_ref();
            let update_ref = &update;
            let pushed = with_retry(&self.retry, CostSinkRetryPolicy, move || {
                sink.record_landed_cost(update_ref)
            })
            .await;

            match pushed {
                Ok(()) => {
                    mark_applied(db, item.id).await?;
                    report.updated_products_count += 1;
                }
                Err(e) => {
                    warn!(
                        shipment_id = %shipment.id,
                        product_id = %item.product_id,
                        "Failed to record landed cost: {}",
                        e
                    );
                    report.failures.push(ProductCostFailure {
                        product_id: item.product_id,
                        item_name: item.item_name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        counter!(
            "landed_cost.finalize.product_costs_recorded",
            report.updated_products_count as u64
        );
        Ok(report)
    }

    async fn complete(&self, db: &DbPool) -> Result<(), ServiceError> {
        let now = Utc::now();
        let done = shipment::Entity::update_many()
            .set(shipment::ActiveModel {
                status: Set(ShipmentStatus::Finalized),
                is_finalized: Set(true),
                finalized_at: Set(Some(now)),
                finalization_started_at: Set(None),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(shipment::Column::Id.eq(self.shipment_id))
            .filter(shipment::Column::Status.eq(ShipmentStatus::Finalizing))
            .exec(db)
            .await?;
        if done.rows_affected == 0 {
            return Err(ServiceError::ConcurrentModification(self.shipment_id));
        }
        Ok(())
    }

    /// Returns a claimed shipment to draft so finalize can be retried.
    async fn release(&self, db: &DbPool) -> Result<(), ServiceError> {
        shipment::Entity::update_many()
            .set(shipment::ActiveModel {
                status: Set(ShipmentStatus::Draft),
                finalization_started_at: Set(None),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(shipment::Column::Id.eq(self.shipment_id))
            .filter(shipment::Column::Status.eq(ShipmentStatus::Finalizing))
            .exec(db)
            .await?;
        Ok(())
    }
}

async fn mark_applied(db: &DbPool, item_id: Uuid) -> Result<(), ServiceError> {
    shipment_item::Entity::update_many()
        .set(shipment_item::ActiveModel {
            cost_applied_at: Set(Some(Utc::now())),
            ..Default::default()
        })
        .filter(shipment_item::Column::Id.eq(item_id))
        .exec(db)
        .await?;
    Ok(())
}
