use super::{
    ensure_no_applied_costs, insert_allocations, load_shipment_records, locked, ShipmentRecords,
};
use crate::{
    commands::Command,
    db::{DatabaseAccess, DbPool},
    entities::{shared_cost_allocation, shipment, shipment_item, ShipmentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        landed_cost::{calculate, ManualAllocationPolicy},
        shipments::ShipmentHeaderChanges,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, Set,
};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Applies header changes to a draft shipment and reruns the allocation.
///
/// Items, shared costs and manual overrides are kept; derived item columns,
/// shipment totals and the ledger are rewritten. With no changes this is a
/// plain rerun.
#[derive(Debug, Clone)]
pub struct RecalculateLandedCostShipmentCommand {
    pub shipment_id: Uuid,
    pub changes: ShipmentHeaderChanges,
    pub policy: ManualAllocationPolicy,
}

#[async_trait]
impl Command for RecalculateLandedCostShipmentCommand {
    type Result = ShipmentRecords;

    #[instrument(skip(self, db_pool, event_sender), fields(shipment_id = %self.shipment_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let command = self.clone();
        let records = DatabaseAccess::new(db_pool)
            .transaction::<_, ShipmentRecords, ServiceError>("recalculate_shipment", move |txn| {
                Box::pin(async move { command.recalculate(txn).await })
            })
            .await
            .map_err(|e| {
                error!(shipment_id = %self.shipment_id, "Recalculation failed: {}", e);
                e
            })?;

        info!(
            shipment_id = %self.shipment_id,
            calculation_method = %records.shipment.calculation_method,
            total_landed_cost = %records.shipment.total_landed_cost,
            "Landed cost shipment recalculated"
        );

        if let Err(e) = event_sender
            .send(Event::LandedCostShipmentRecalculated {
                shipment_id: self.shipment_id,
                total_landed_cost: records.shipment.total_landed_cost.into(),
            })
            .await
        {
            error!(shipment_id = %self.shipment_id, "Failed to send recalculated event: {}", e);
        }

        Ok(records)
    }
}

impl RecalculateLandedCostShipmentCommand {
    async fn recalculate(&self, txn: &DatabaseTransaction) -> Result<ShipmentRecords, ServiceError> {
        let current = load_shipment_records(txn, self.shipment_id).await?;
        if !current.shipment.is_editable() {
            return Err(locked(self.shipment_id, current.shipment.status));
        }
        ensure_no_applied_costs(&current)?;

        let mut draft = current.to_draft();
        self.changes.apply_to(&mut draft);
        let breakdown = calculate(&draft, self.policy)?;

        let now = Utc::now();
        let mut next = ShipmentRecords::build(&current.ids(), &draft, &breakdown, now)?;
        next.shipment.created_at = current.shipment.created_at;
        for (item, previous) in next.items.iter_mut().zip(&current.items) {
            item.created_at = previous.created_at;
        }
        for (cost, previous) in next.shared_costs.iter_mut().zip(&current.shared_costs) {
            cost.created_at = previous.created_at;
        }

        let header = shipment::ActiveModel {
            name: Set(next.shipment.name.clone()),
            shipment_date: Set(next.shipment.shipment_date),
            calculation_method: Set(next.shipment.calculation_method),
            base_currency: Set(next.shipment.base_currency.clone()),
            exchange_rate: Set(next.shipment.exchange_rate),
            total_base_cost: Set(next.shipment.total_base_cost),
            total_shared_cost: Set(next.shipment.total_shared_cost),
            total_landed_cost: Set(next.shipment.total_landed_cost),
            total_landed_cost_converted: Set(next.shipment.total_landed_cost_converted),
            updated_at: Set(now),
            ..Default::default()
        };
        let updated = shipment::Entity::update_many()
            .set(header)
            .filter(shipment::Column::Id.eq(self.shipment_id))
            .filter(shipment::Column::Status.eq(ShipmentStatus::Draft))
            .exec(txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(ServiceError::ConcurrentModification(self.shipment_id));
        }

        let cost_ids: Vec<Uuid> = next.shared_costs.iter().map(|cost| cost.id).collect();
        if !cost_ids.is_empty() {
            shared_cost_allocation::Entity::delete_many()
                .filter(shared_cost_allocation::Column::SharedCostId.is_in(cost_ids))
                .exec(txn)
                .await?;
        }

        for item in &next.items {
            shipment_item::ActiveModel {
                id: Unchanged(item.id),
                percentage_share: Set(item.percentage_share),
                allocated_shared_cost: Set(item.allocated_shared_cost),
                total_landed_cost: Set(item.total_landed_cost),
                landed_cost_per_unit: Set(item.landed_cost_per_unit),
                updated_at: Set(now),
                ..Default::default()
            }
            .update(txn)
            .await?;
        }

        insert_allocations(txn, &next.allocations).await?;

        next.shipment.status = current.shipment.status;
        Ok(next)
    }
}
