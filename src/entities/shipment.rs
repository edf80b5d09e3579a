use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use super::DecimalText;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Rule used to split a shared cost across the items of a shipment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CalculationMethod {
    /// By share of total item value
    #[sea_orm(string_value = "proportional")]
    Proportional,
    /// Evenly across items
    #[sea_orm(string_value = "equal")]
    Equal,
    /// By declared weight; items without a weight count as zero
    #[sea_orm(string_value = "weight_based")]
    WeightBased,
    /// By unit count
    #[sea_orm(string_value = "quantity_based")]
    QuantityBased,
}

/// Lifecycle state. `Finalizing` is held by the single finalize call in flight.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShipmentStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "finalizing")]
    Finalizing,
    #[sea_orm(string_value = "finalized")]
    Finalized,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub shipment_date: NaiveDate,
    pub calculation_method: CalculationMethod,
    pub base_currency: String,
    pub exchange_rate: DecimalText,
    pub status: ShipmentStatus,
    pub is_finalized: bool,
    pub total_base_cost: DecimalText,
    pub total_shared_cost: DecimalText,
    pub total_landed_cost: DecimalText,
    /// `total_landed_cost` divided by `exchange_rate`
    pub total_landed_cost_converted: DecimalText,
    pub created_by: Option<Uuid>,
    pub finalization_started_at: Option<DateTime<Utc>>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::shipment_item::Entity")]
    ShipmentItems,

    #[sea_orm(has_many = "super::shared_cost::Entity")]
    SharedCosts,
}

impl Related<super::shipment_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShipmentItems.def()
    }
}

impl Related<super::shared_cost::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SharedCosts.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.updated_at {
            active_model.updated_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}

impl Model {
    /// Edits and reruns are only allowed before finalize has claimed the shipment.
    pub fn is_editable(&self) -> bool {
        self.status == ShipmentStatus::Draft
    }
}
