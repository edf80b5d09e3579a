use chrono::{DateTime, Utc};
use super::DecimalText;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger row: the share of one shared cost charged to one shipment item.
/// Rows are never updated; a rerun deletes and recreates them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shared_cost_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub shared_cost_id: Uuid,
    pub shipment_item_id: Uuid,
    pub allocated_amount: DecimalText,
    pub is_manual_override: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shared_cost::Entity",
        from = "Column::SharedCostId",
        to = "super::shared_cost::Column::Id",
        on_delete = "Cascade"
    )]
    SharedCost,

    #[sea_orm(
        belongs_to = "super::shipment_item::Entity",
        from = "Column::ShipmentItemId",
        to = "super::shipment_item::Column::Id",
        on_delete = "Cascade"
    )]
    ShipmentItem,
}

impl Related<super::shared_cost::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SharedCost.def()
    }
}

impl Related<super::shipment_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShipmentItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
