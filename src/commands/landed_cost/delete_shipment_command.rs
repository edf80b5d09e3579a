use super::{ensure_no_applied_costs, load_shipment_records, locked};
use crate::{
    commands::Command,
    db::{DatabaseAccess, DbPool},
    entities::{shared_cost, shared_cost_allocation, shipment, shipment_item, ShipmentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Removes a draft shipment together with its items, shared costs and ledger.
#[derive(Debug, Clone, Copy)]
pub struct DeleteLandedCostShipmentCommand {
    pub shipment_id: Uuid,
}

#[async_trait]
impl Command for DeleteLandedCostShipmentCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, event_sender), fields(shipment_id = %self.shipment_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let shipment_id = self.shipment_id;
        DatabaseAccess::new(db_pool)
            .transaction::<_, (), ServiceError>("delete_shipment", move |txn| {
                Box::pin(async move { delete_shipment(txn, shipment_id).await })
            })
            .await?;

        info!(shipment_id = %shipment_id, "Landed cost shipment deleted");

        if let Err(e) = event_sender
            .send(Event::LandedCostShipmentDeleted(shipment_id))
            .await
        {
            error!(shipment_id = %shipment_id, "Failed to send shipment deleted event: {}", e);
        }
        Ok(())
    }
}

async fn delete_shipment(txn: &DatabaseTransaction, shipment_id: Uuid) -> Result<(), ServiceError> {
    let records = load_shipment_records(txn, shipment_id).await?;
    if !records.shipment.is_editable() {
        return Err(locked(shipment_id, records.shipment.status));
    }
    ensure_no_applied_costs(&records)?;

    let cost_ids: Vec<Uuid> = records.shared_costs.iter().map(|cost| cost.id).collect();
    remove_children(txn, shipment_id, cost_ids).await?;

    // A finalize claim taken since the read rolls the whole delete back.
    let deleted = shipment::Entity::delete_many()
        .filter(shipment::Column::Id.eq(shipment_id))
        .filter(shipment::Column::Status.eq(ShipmentStatus::Draft))
        .exec(txn)
        .await?;
    if deleted.rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification(shipment_id));
    }
    Ok(())
}

async fn remove_children(
    txn: &DatabaseTransaction,
    shipment_id: Uuid,
    cost_ids: Vec<Uuid>,
) -> Result<(), ServiceError> {
    if !cost_ids.is_empty() {
        shared_cost_allocation::Entity::delete_many()
            .filter(shared_cost_allocation::Column::SharedCostId.is_in(cost_ids))
            .exec(txn)
            .await?;
    }
    shared_cost::Entity::delete_many()
        .filter(shared_cost::Column::ShipmentId.eq(shipment_id))
        .exec(txn)
        .await?;
    shipment_item::Entity::delete_many()
        .filter(shipment_item::Column::ShipmentId.eq(shipment_id))
        .exec(txn)
        .await?;
    Ok(())
}
