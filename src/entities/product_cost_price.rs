use chrono::{DateTime, NaiveDate, Utc};
use super::DecimalText;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Cost history row. The newest row per product is that product's reference cost.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "product_cost_prices")]
#[schema(as = ProductCostPrice)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    #[schema(value_type = String, example = "24")]
    pub cost_price: DecimalText,
    pub currency: String,
    pub shipment_id: Option<Uuid>,
    pub shipment_received_date: NaiveDate,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
