//! Persistence side of the landed cost lifecycle.
//!
//! The engine produces a [`LandedCostBreakdown`]; [`ShipmentRecords::build`]
//! maps it onto table rows, and the commands in this module write those rows.

pub mod create_shipment_command;
pub mod delete_shipment_command;
pub mod finalize_shipment_command;
pub mod recalculate_shipment_command;

use crate::dto::landed_cost::ShipmentDetail;
use crate::entities::{
    shared_cost, shared_cost_allocation, shipment, shipment_item, DecimalText, ShipmentStatus,
};
use crate::errors::ServiceError;
use crate::services::landed_cost::{
    ItemDraft, LandedCostBreakdown, SharedCostDraft, ShipmentDraft,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

pub use create_shipment_command::CreateLandedCostShipmentCommand;
pub use delete_shipment_command::DeleteLandedCostShipmentCommand;
pub use finalize_shipment_command::FinalizeLandedCostShipmentCommand;
pub use recalculate_shipment_command::RecalculateLandedCostShipmentCommand;

/// Primary keys for a shipment and its children, in position order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIds {
    pub shipment_id: Uuid,
    pub item_ids: Vec<Uuid>,
    pub shared_cost_ids: Vec<Uuid>,
}

impl RecordIds {
    pub fn fresh(items: usize, shared_costs: usize) -> Self {
        Self {
            shipment_id: Uuid::new_v4(),
            item_ids: (0..items).map(|_| Uuid::new_v4()).collect(),
            shared_cost_ids: (0..shared_costs).map(|_| Uuid::new_v4()).collect(),
        }
    }
}

/// A shipment and every row hanging off it.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentRecords {
    pub shipment: shipment::Model,
    pub items: Vec<shipment_item::Model>,
    pub shared_costs: Vec<shared_cost::Model>,
    pub allocations: Vec<shared_cost_allocation::Model>,
}

impl ShipmentRecords {
    /// Maps a draft and its breakdown onto rows with the given keys.
    ///
    /// Produces one ledger row per (shared cost, item) pair.
    pub fn build(
        ids: &RecordIds,
        draft: &ShipmentDraft,
        breakdown: &LandedCostBreakdown,
        now: DateTime<Utc>,
    ) -> Result<Self, ServiceError> {
        if ids.item_ids.len() != breakdown.items.len()
            || ids.shared_cost_ids.len() != breakdown.shared_costs.len()
        {
            return Err(ServiceError::InternalError(format!(
                "record keys do not match breakdown for shipment {}",
                ids.shipment_id
            )));
        }

        let shipment = shipment::Model {
            id: ids.shipment_id,
            name: draft.name.clone(),
            shipment_date: draft.shipment_date,
            calculation_method: draft.calculation_method,
            base_currency: draft.base_currency.clone(),
            exchange_rate: draft.exchange_rate.into(),
            status: ShipmentStatus::Draft,
            is_finalized: false,
            total_base_cost: breakdown.totals.total_base_cost.into(),
            total_shared_cost: breakdown.totals.total_shared_cost.into(),
            total_landed_cost: breakdown.totals.total_landed_cost.into(),
            total_landed_cost_converted: breakdown.totals.total_landed_cost_converted.into(),
            created_by: draft.created_by,
            finalization_started_at: None,
            finalized_at: None,
            created_at: now,
            updated_at: now,
        };

        let items = breakdown
            .items
            .iter()
            .zip(&ids.item_ids)
            .map(|(costing, id)| shipment_item::Model {
                id: *id,
                shipment_id: ids.shipment_id,
                position: costing.position as i32,
                product_id: costing.product_id,
                item_name: costing.item_name.clone(),
                quantity: costing.quantity.into(),
                unit_cost: costing.unit_cost.into(),
                weight: costing.weight.map(DecimalText::from),
                total_item_cost: costing.total_item_cost.into(),
                percentage_share: costing.percentage_share.into(),
                allocated_shared_cost: costing.allocated_shared_cost.into(),
                total_landed_cost: costing.total_landed_cost.into(),
                landed_cost_per_unit: costing.landed_cost_per_unit.into(),
                cost_applied_at: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let shared_costs = breakdown
            .shared_costs
            .iter()
            .zip(&ids.shared_cost_ids)
            .map(|(cost, id)| shared_cost::Model {
                id: *id,
                shipment_id: ids.shipment_id,
                position: cost.position as i32,
                expense_category_id: cost.expense_category_id,
                description: cost.description.clone(),
                amount: cost.amount.into(),
                created_at: now,
            })
            .collect();

        let allocations = breakdown
            .shared_costs
            .iter()
            .zip(&ids.shared_cost_ids)
            .flat_map(|(cost, cost_id)| {
                cost.allocations.iter().map(move |allocation| {
                    (cost_id, allocation)
                })
            })
            .map(|(cost_id, allocation)| shared_cost_allocation::Model {
                id: Uuid::new_v4(),
                shared_cost_id: *cost_id,
                shipment_item_id: ids.item_ids[allocation.item_position],
                allocated_amount: allocation.allocated_amount.into(),
                is_manual_override: allocation.is_manual_override,
                created_at: now,
            })
            .collect();

        Ok(Self {
            shipment,
            items,
            shared_costs,
            allocations,
        })
    }

    pub fn ids(&self) -> RecordIds {
        RecordIds {
            shipment_id: self.shipment.id,
            item_ids: self.items.iter().map(|item| item.id).collect(),
            shared_cost_ids: self.shared_costs.iter().map(|cost| cost.id).collect(),
        }
    }

    /// Rebuilds the engine input from stored rows. Manual maps come from the
    /// ledger rows flagged as manual overrides.
    pub fn to_draft(&self) -> ShipmentDraft {
        let item_positions: HashMap<Uuid, usize> = self
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id, position))
            .collect();

        let shared_costs = self
            .shared_costs
            .iter()
            .map(|cost| {
                let manual: BTreeMap<usize, Decimal> = self
                    .allocations
                    .iter()
                    .filter(|row| row.shared_cost_id == cost.id && row.is_manual_override)
                    .filter_map(|row| {
                        item_positions
                            .get(&row.shipment_item_id)
                            .map(|position| (*position, Decimal::from(row.allocated_amount)))
                    })
                    .collect();

                SharedCostDraft {
                    expense_category_id: cost.expense_category_id,
                    description: cost.description.clone(),
                    amount: cost.amount.into(),
                    manual_allocations: (!manual.is_empty()).then_some(manual),
                }
            })
            .collect();

        ShipmentDraft {
            name: self.shipment.name.clone(),
            shipment_date: self.shipment.shipment_date,
            calculation_method: self.shipment.calculation_method,
            base_currency: self.shipment.base_currency.clone(),
            exchange_rate: self.shipment.exchange_rate.into(),
            created_by: self.shipment.created_by,
            items: self
                .items
                .iter()
                .map(|item| ItemDraft {
                    product_id: item.product_id,
                    item_name: item.item_name.clone(),
                    quantity: item.quantity.into(),
                    unit_cost: item.unit_cost.into(),
                    weight: item.weight.map(Decimal::from),
                })
                .collect(),
            shared_costs,
        }
    }

    pub fn detail(&self) -> ShipmentDetail {
        ShipmentDetail::from_models(
            &self.shipment,
            &self.items,
            &self.shared_costs,
            &self.allocations,
        )
    }
}

/// Loads a shipment with its items, shared costs and ledger, children in position order.
pub async fn load_shipment_records<C: ConnectionTrait>(
    db: &C,
    shipment_id: Uuid,
) -> Result<ShipmentRecords, ServiceError> {
    let shipment = shipment::Entity::find_by_id(shipment_id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(shipment_id))?;

    let items = shipment_item::Entity::find()
        .filter(shipment_item::Column::ShipmentId.eq(shipment_id))
        .order_by_asc(shipment_item::Column::Position)
        .all(db)
        .await?;

    let shared_costs = shared_cost::Entity::find()
        .filter(shared_cost::Column::ShipmentId.eq(shipment_id))
        .order_by_asc(shared_cost::Column::Position)
        .all(db)
        .await?;

    let cost_ids: Vec<Uuid> = shared_costs.iter().map(|cost| cost.id).collect();
    let mut allocations = if cost_ids.is_empty() {
        Vec::new()
    } else {
        shared_cost_allocation::Entity::find()
            .filter(shared_cost_allocation::Column::SharedCostId.is_in(cost_ids))
            .all(db)
            .await?
    };

    let cost_order: HashMap<Uuid, i32> = shared_costs.iter().map(|c| (c.id, c.position)).collect();
    let item_order: HashMap<Uuid, i32> = items.iter().map(|i| (i.id, i.position)).collect();
    allocations.sort_by_key(|row| {
        (
            cost_order.get(&row.shared_cost_id).copied().unwrap_or(i32::MAX),
            item_order.get(&row.shipment_item_id).copied().unwrap_or(i32::MAX),
        )
    });

    Ok(ShipmentRecords {
        shipment,
        items,
        shared_costs,
        allocations,
    })
}

/// Inserts the children of a shipment: items, shared costs, then the ledger.
pub(crate) async fn insert_children<C: ConnectionTrait>(
    db: &C,
    records: &ShipmentRecords,
) -> Result<(), ServiceError> {
    if !records.items.is_empty() {
        shipment_item::Entity::insert_many(
            records
                .items
                .iter()
                .cloned()
                .map(|item| shipment_item::ActiveModel::from(item).reset_all()),
        )
        .exec_without_returning(db)
        .await?;
    }
    if !records.shared_costs.is_empty() {
        shared_cost::Entity::insert_many(
            records
                .shared_costs
                .iter()
                .cloned()
                .map(|cost| shared_cost::ActiveModel::from(cost).reset_all()),
        )
        .exec_without_returning(db)
        .await?;
    }
    insert_allocations(db, &records.allocations).await
}

pub(crate) async fn insert_allocations<C: ConnectionTrait>(
    db: &C,
    allocations: &[shared_cost_allocation::Model],
) -> Result<(), ServiceError> {
    if allocations.is_empty() {
        return Ok(());
    }
    shared_cost_allocation::Entity::insert_many(
        allocations
            .iter()
            .cloned()
            .map(|row| shared_cost_allocation::ActiveModel::from(row).reset_all()),
    )
    .exec_without_returning(db)
    .await?;
    Ok(())
}

pub(crate) fn not_found(shipment_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Shipment {} not found", shipment_id))
}

/// Conflict explaining why a shipment in `status` can no longer be changed.
pub(crate) fn locked(shipment_id: Uuid, status: ShipmentStatus) -> ServiceError {
    match status {
        ShipmentStatus::Finalized => ServiceError::Conflict(format!(
            "Shipment {} has been finalized and can no longer be changed",
            shipment_id
        )),
        ShipmentStatus::Finalizing => ServiceError::Conflict(format!(
            "Shipment {} is being finalized",
            shipment_id
        )),
        ShipmentStatus::Draft => ServiceError::ConcurrentModification(shipment_id),
    }
}

/// Once any unit cost has reached the product ledger the shipment can only be
/// finalized; changing it would leave the pushed costs out of step.
pub(crate) fn ensure_no_applied_costs(records: &ShipmentRecords) -> Result<(), ServiceError> {
    let applied = records
        .items
        .iter()
        .filter(|item| item.cost_applied_at.is_some())
        .count();
    if applied > 0 {
        return Err(ServiceError::Conflict(format!(
            "Shipment {} has {} item cost(s) already applied; finalize it again to complete",
            records.shipment.id, applied
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::landed_cost::{
        calculate, CalculationMethod, ManualAllocationPolicy,
    };
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn draft() -> ShipmentDraft {
        ShipmentDraft {
            name: "April pallets".into(),
            shipment_date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            calculation_method: CalculationMethod::Proportional,
            base_currency: "EUR".into(),
            exchange_rate: dec!(0.9),
            created_by: None,
            items: vec![
                ItemDraft {
                    product_id: Uuid::new_v4(),
                    item_name: "Desk".into(),
                    quantity: dec!(2),
                    unit_cost: dec!(150),
                    weight: Some(dec!(40)),
                },
                ItemDraft {
                    product_id: Uuid::new_v4(),
                    item_name: "Shelf".into(),
                    quantity: dec!(4),
                    unit_cost: dec!(25),
                    weight: Some(dec!(10)),
                },
            ],
            shared_costs: vec![
                SharedCostDraft {
                    expense_category_id: Uuid::new_v4(),
                    description: "Freight".into(),
                    amount: dec!(80),
                    manual_allocations: None,
                },
                SharedCostDraft {
                    expense_category_id: Uuid::new_v4(),
                    description: "Customs".into(),
                    amount: dec!(30),
                    manual_allocations: Some(BTreeMap::from([(1, dec!(30))])),
                },
            ],
        }
    }

    #[test]
    fn build_creates_one_ledger_row_per_cost_item_pair() {
        let input = draft();
        let breakdown = calculate(&input, ManualAllocationPolicy::default()).unwrap();
        let ids = RecordIds::fresh(2, 2);
        let records = ShipmentRecords::build(&ids, &input, &breakdown, Utc::now()).unwrap();

        assert_eq!(records.allocations.len(), 4);
        assert_eq!(records.shipment.total_landed_cost, dec!(510));
        assert_eq!(records.items[1].position, 1);
        assert_eq!(records.allocations[3].shipment_item_id, ids.item_ids[1]);
        assert!(records.allocations[2].is_manual_override);
        assert_eq!(records.allocations[2].allocated_amount, dec!(0));
    }

    #[test]
    fn draft_round_trips_through_records_with_manual_overrides() {
        let input = draft();
        let breakdown = calculate(&input, ManualAllocationPolicy::default()).unwrap();
        let records =
            ShipmentRecords::build(&RecordIds::fresh(2, 2), &input, &breakdown, Utc::now())
                .unwrap();

        let rebuilt = records.to_draft();
        assert_eq!(rebuilt.shared_costs[0].manual_allocations, None);
        let manual = rebuilt.shared_costs[1].manual_allocations.as_ref().unwrap();
        assert_eq!(manual.get(&0), Some(&dec!(0)));
        assert_eq!(manual.get(&1), Some(&dec!(30)));

        let rerun = calculate(&rebuilt, ManualAllocationPolicy::default()).unwrap();
        assert_eq!(rerun, breakdown);
    }

    #[test]
    fn mismatched_keys_are_rejected() {
        let input = draft();
        let breakdown = calculate(&input, ManualAllocationPolicy::default()).unwrap();
        let result =
            ShipmentRecords::build(&RecordIds::fresh(1, 2), &input, &breakdown, Utc::now());
        assert!(result.is_err());
    }
}
