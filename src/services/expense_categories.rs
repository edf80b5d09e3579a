use crate::{db::DbPool, entities::expense_category, errors::ServiceError};
use async_trait::async_trait;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// What the engine needs to know about an expense category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: Uuid,
    pub name: String,
    pub allows_item_override: bool,
    pub is_active: bool,
}

impl From<expense_category::Model> for ExpenseCategory {
    fn from(model: expense_category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            allows_item_override: model.allows_item_override,
            is_active: model.is_active,
        }
    }
}

/// Read-only lookup of expense categories owned by another part of the system.
#[async_trait]
pub trait ExpenseCategoryDirectory: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<ExpenseCategory>, ServiceError>;
}

/// Directory backed by the `expense_categories` table.
#[derive(Clone)]
pub struct DbExpenseCategoryDirectory {
    db_pool: Arc<DbPool>,
}

impl DbExpenseCategoryDirectory {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ExpenseCategoryDirectory for DbExpenseCategoryDirectory {
    #[instrument(skip(self))]
    async fn find(&self, id: Uuid) -> Result<Option<ExpenseCategory>, ServiceError> {
        let found = expense_category::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;
        Ok(found.map(ExpenseCategory::from))
    }
}
