use chrono::{DateTime, Utc};
use super::DecimalText;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipment_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub shipment_id: Uuid,
    /// Submission order; manual allocation keys refer to it
    pub position: i32,
    pub product_id: Uuid,
    pub item_name: String,
    pub quantity: DecimalText,
    pub unit_cost: DecimalText,
    pub weight: Option<DecimalText>,
    pub total_item_cost: DecimalText,
    pub percentage_share: DecimalText,
    pub allocated_shared_cost: DecimalText,
    pub total_landed_cost: DecimalText,
    pub landed_cost_per_unit: DecimalText,
    /// Set once this item's unit cost has reached the product cost sink
    pub cost_applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shipment::Entity",
        from = "Column::ShipmentId",
        to = "super::shipment::Column::Id",
        on_delete = "Cascade"
    )]
    Shipment,

    #[sea_orm(has_many = "super::shared_cost_allocation::Entity")]
    Allocations,
}

impl Related<super::shipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shipment.def()
    }
}

impl Related<super::shared_cost_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
