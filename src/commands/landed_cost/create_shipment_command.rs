use super::{insert_children, RecordIds, ShipmentRecords};
use crate::{
    commands::Command,
    db::{DatabaseAccess, DbPool},
    entities::shipment,
    errors::ServiceError,
    events::{Event, EventSender},
    services::landed_cost::{calculate, ManualAllocationPolicy, ShipmentDraft},
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Calculates a shipment and persists it with its items, shared costs and
/// allocation ledger in a single transaction.
#[derive(Debug, Clone)]
pub struct CreateLandedCostShipmentCommand {
    pub draft: ShipmentDraft,
    pub policy: ManualAllocationPolicy,
}

#[async_trait]
impl Command for CreateLandedCostShipmentCommand {
    type Result = ShipmentRecords;

    #[instrument(skip(self, db_pool, event_sender), fields(shipment_name = %self.draft.name))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let breakdown = calculate(&self.draft, self.policy)?;
        let ids = RecordIds::fresh(self.draft.items.len(), self.draft.shared_costs.len());
        let records = ShipmentRecords::build(&ids, &self.draft, &breakdown, Utc::now())?;

        let to_insert = records.clone();
        DatabaseAccess::new(db_pool)
            .transaction::<_, (), ServiceError>("create_shipment", move |txn| {
                Box::pin(async move {
                    shipment::Entity::insert(
                        shipment::ActiveModel::from(to_insert.shipment.clone()).reset_all(),
                    )
                    .exec_without_returning(txn)
                    .await?;
                    insert_children(txn, &to_insert).await
                })
            })
            .await
            .map_err(|e| {
                error!("Transaction failed for creating shipment: {}", e);
                e
            })?;

        info!(
            shipment_id = %records.shipment.id,
            items = records.items.len(),
            shared_costs = records.shared_costs.len(),
            total_landed_cost = %records.shipment.total_landed_cost,
            "Landed cost shipment created"
        );

        if let Err(e) = event_sender
            .send(Event::LandedCostShipmentCreated {
                shipment_id: records.shipment.id,
                total_landed_cost: records.shipment.total_landed_cost.into(),
            })
            .await
        {
            error!(shipment_id = %records.shipment.id, "Failed to send shipment created event: {}", e);
        }

        Ok(records)
    }
}
