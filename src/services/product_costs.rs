use crate::{db::DbPool, entities::product_cost_price, errors::ServiceError};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// A finalized per-unit landed cost for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCostUpdate {
    pub product_id: Uuid,
    pub landed_cost_per_unit: Decimal,
    pub currency: String,
    pub shipment_id: Uuid,
    pub shipment_date: NaiveDate,
    pub created_by: Option<Uuid>,
}

/// Destination for finalized unit costs. Each call succeeds or fails on its own.
#[async_trait]
pub trait ProductCostSink: Send + Sync {
    async fn record_landed_cost(&self, update: &ProductCostUpdate) -> Result<(), ServiceError>;
}

/// Sink that appends to the `product_cost_prices` history table.
#[derive(Clone)]
pub struct DbProductCostSink {
    db_pool: Arc<DbPool>,
}

impl DbProductCostSink {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Most recent cost row for a product; that row is the product's reference cost.
    #[instrument(skip(self))]
    pub async fn latest_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Option<product_cost_price::Model>, ServiceError> {
        product_cost_price::Entity::find()
            .filter(product_cost_price::Column::ProductId.eq(product_id))
            .order_by_desc(product_cost_price::Column::CreatedAt)
            .order_by_desc(product_cost_price::Column::ShipmentReceivedDate)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}

#[async_trait]
impl ProductCostSink for DbProductCostSink {
    #[instrument(skip(self), fields(product_id = %update.product_id))]
    async fn record_landed_cost(&self, update: &ProductCostUpdate) -> Result<(), ServiceError> {
        let row = product_cost_price::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(update.product_id),
            cost_price: Set(update.landed_cost_per_unit.into()),
            currency: Set(update.currency.clone()),
            shipment_id: Set(Some(update.shipment_id)),
            shipment_received_date: Set(update.shipment_date),
            notes: Set(Some(format!(
                "Landed cost from shipment {}",
                update.shipment_id
            ))),
            created_by: Set(update.created_by),
            created_at: Set(Utc::now()),
        };
        row.insert(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(
            product_id = %update.product_id,
            cost_price = %update.landed_cost_per_unit,
            "product cost price recorded"
        );
        Ok(())
    }
}
