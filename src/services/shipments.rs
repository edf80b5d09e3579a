use crate::{
    commands::{
        landed_cost::{
            load_shipment_records, CreateLandedCostShipmentCommand,
            DeleteLandedCostShipmentCommand, FinalizeLandedCostShipmentCommand,
            RecalculateLandedCostShipmentCommand,
        },
        Command,
    },
    config::AppConfig,
    db::DbPool,
    dto::landed_cost::{
        FinalizationReport, LandedCostPreview, LandedCostRequest, ShipmentDetail,
        ShipmentSummary,
    },
    entities::{shipment, CalculationMethod},
    errors::{FieldViolation, ServiceError},
    events::EventSender,
    middleware_helpers::retry::RetryConfig,
    services::{
        expense_categories::ExpenseCategoryDirectory,
        landed_cost::{calculate, ManualAllocationPolicy, ShipmentDraft},
        product_costs::ProductCostSink,
    },
    tracing::with_metrics,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder};
use slog::Logger;
use std::{sync::Arc, time::Duration};
use tracing::{instrument, warn};
use uuid::Uuid;

/// Header fields that may change on a draft shipment. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentHeaderChanges {
    pub name: Option<String>,
    pub shipment_date: Option<NaiveDate>,
    pub calculation_method: Option<CalculationMethod>,
    pub base_currency: Option<String>,
    pub exchange_rate: Option<Decimal>,
}

impl ShipmentHeaderChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply_to(&self, draft: &mut ShipmentDraft) {
        if let Some(name) = &self.name {
            draft.name = name.clone();
        }
        if let Some(date) = self.shipment_date {
            draft.shipment_date = date;
        }
        if let Some(method) = self.calculation_method {
            draft.calculation_method = method;
        }
        if let Some(currency) = &self.base_currency {
            draft.base_currency = currency.clone();
        }
        if let Some(rate) = self.exchange_rate {
            draft.exchange_rate = rate;
        }
    }
}

/// Tunables of the shipment lifecycle.
#[derive(Debug, Clone)]
pub struct ShipmentSettings {
    pub allocation_policy: ManualAllocationPolicy,
    pub finalize_retry: RetryConfig,
    pub claim_timeout: Duration,
}

impl Default for ShipmentSettings {
    fn default() -> Self {
        Self {
            allocation_policy: ManualAllocationPolicy::default(),
            finalize_retry: RetryConfig::default(),
            claim_timeout: Duration::from_secs(300),
        }
    }
}

impl From<&AppConfig> for ShipmentSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            allocation_policy: config.allocation_policy(),
            finalize_retry: config.finalize_retry(),
            claim_timeout: config.finalize_claim_timeout(),
        }
    }
}

/// Landed cost shipment lifecycle: preview, create, read, edit, finalize, delete.
#[derive(Clone)]
pub struct ShipmentService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    categories: Arc<dyn ExpenseCategoryDirectory>,
    cost_sink: Arc<dyn ProductCostSink>,
    settings: ShipmentSettings,
    logger: Logger,
}

impl ShipmentService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        categories: Arc<dyn ExpenseCategoryDirectory>,
        cost_sink: Arc<dyn ProductCostSink>,
        settings: ShipmentSettings,
        logger: Logger,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            categories,
            cost_sink,
            settings,
            logger,
        }
    }

    pub fn settings(&self) -> &ShipmentSettings {
        &self.settings
    }

    /// Computes the full allocation without persisting anything.
    #[instrument(skip(self, request))]
    pub async fn calculate(
        &self,
        request: LandedCostRequest,
    ) -> Result<LandedCostPreview, ServiceError> {
        with_metrics("calculate", async {
            let draft = request.into_draft()?;
            self.check_categories(&draft).await?;
            let breakdown = calculate(&draft, self.settings.allocation_policy)?;
            Ok::<_, ServiceError>(LandedCostPreview::new(&draft, breakdown))
        })
        .await
    }

    /// Calculates and stores a new draft shipment.
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: LandedCostRequest) -> Result<ShipmentDetail, ServiceError> {
        with_metrics("create_shipment", async {
            let draft = request.into_draft()?;
            self.check_categories(&draft).await?;

            let records = CreateLandedCostShipmentCommand {
                draft,
                policy: self.settings.allocation_policy,
            }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await?;

            slog::info!(
                self.logger,
                "landed cost shipment created";
                "shipment_id" => records.shipment.id.to_string(),
                "items" => records.items.len(),
                "total_landed_cost" => records.shipment.total_landed_cost.to_string(),
            );
            Ok::<_, ServiceError>(records.detail())
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, shipment_id: Uuid) -> Result<ShipmentDetail, ServiceError> {
        let records = load_shipment_records(&*self.db_pool, shipment_id).await?;
        Ok(records.detail())
    }

    /// One page of shipments, newest first. `page` is 1-based.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<ShipmentSummary>, u64), ServiceError> {
        let paginator = shipment::Entity::find()
            .order_by_desc(shipment::Column::CreatedAt)
            .order_by_desc(shipment::Column::Id)
            .paginate(&*self.db_pool, limit.max(1));

        let total = paginator.num_items().await.map_err(ServiceError::DatabaseError)?;
        let shipments = paginator
            .fetch_page(page.max(1) - 1)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((
            shipments.into_iter().map(ShipmentSummary::from).collect(),
            total,
        ))
    }

    /// Applies header changes to a draft shipment and recalculates it.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        shipment_id: Uuid,
        changes: ShipmentHeaderChanges,
    ) -> Result<ShipmentDetail, ServiceError> {
        with_metrics("update_shipment", self.rerun(shipment_id, changes)).await
    }

    /// Reruns the allocation of a draft shipment from its stored inputs.
    #[instrument(skip(self))]
    pub async fn recalculate(&self, shipment_id: Uuid) -> Result<ShipmentDetail, ServiceError> {
        with_metrics(
            "recalculate_shipment",
            self.rerun(shipment_id, ShipmentHeaderChanges::default()),
        )
        .await
    }

    /// Pushes unit costs to the product cost ledger and locks the shipment.
    ///
    /// A report with `finalized == false` means some pushes failed and the
    /// shipment is back in draft; calling again resumes with the remaining items.
    #[instrument(skip(self))]
    pub async fn finalize(&self, shipment_id: Uuid) -> Result<FinalizationReport, ServiceError> {
        with_metrics("finalize_shipment", async {
            let report = FinalizeLandedCostShipmentCommand {
                shipment_id,
                sink: self.cost_sink.clone(),
                retry: self.settings.finalize_retry.clone(),
                claim_timeout: self.settings.claim_timeout,
            }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await?;

            if report.finalized {
                slog::info!(
                    self.logger,
                    "landed cost shipment finalized";
                    "shipment_id" => shipment_id.to_string(),
                    "updated_products" => report.updated_products_count,
                    "already_applied" => report.already_applied_count,
                );
            } else {
                slog::warn!(
                    self.logger,
                    "landed cost finalization incomplete";
                    "shipment_id" => shipment_id.to_string(),
                    "failed_products" => report.failures.len(),
                );
            }
            Ok::<_, ServiceError>(report)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, shipment_id: Uuid) -> Result<(), ServiceError> {
        with_metrics("delete_shipment", async {
            DeleteLandedCostShipmentCommand { shipment_id }
                .execute(self.db_pool.clone(), self.event_sender.clone())
                .await?;
            slog::info!(
                self.logger,
                "landed cost shipment deleted";
                "shipment_id" => shipment_id.to_string(),
            );
            Ok::<_, ServiceError>(())
        })
        .await
    }

    async fn rerun(
        &self,
        shipment_id: Uuid,
        changes: ShipmentHeaderChanges,
    ) -> Result<ShipmentDetail, ServiceError> {
        let changed = !changes.is_empty();
        let records = RecalculateLandedCostShipmentCommand {
            shipment_id,
            changes,
            policy: self.settings.allocation_policy,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await?;

        slog::info!(
            self.logger,
            "landed cost shipment recalculated";
            "shipment_id" => shipment_id.to_string(),
            "header_changed" => changed,
            "calculation_method" => records.shipment.calculation_method.to_string(),
            "total_landed_cost" => records.shipment.total_landed_cost.to_string(),
        );
        Ok(records.detail())
    }

    /// Every shared cost must reference an active category. Manual splits on a
    /// category that does not allow item overrides are kept but logged.
    async fn check_categories(&self, draft: &ShipmentDraft) -> Result<(), ServiceError> {
        let mut violations = Vec::new();

        for (index, cost) in draft.shared_costs.iter().enumerate() {
            let field = format!("shared_costs[{}].expense_category_id", index);
            match self.categories.find(cost.expense_category_id).await? {
                None => violations.push(FieldViolation::new(
                    field,
                    format!("expense category {} does not exist", cost.expense_category_id),
                )),
                Some(category) if !category.is_active => violations.push(FieldViolation::new(
                    field,
                    format!("expense category '{}' is inactive", category.name),
                )),
                Some(category) if !category.allows_item_override && cost.manual().is_some() => {
                    warn!(
                        expense_category_id = %category.id,
                        shared_cost = index,
                        "manual allocation on a category that does not allow item overrides"
                    );
                    slog::warn!(
                        self.logger,
                        "manual allocation on non-overridable category";
                        "expense_category" => category.name,
                        "shared_cost" => index,
                    );
                }
                Some(_) => {}
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::InvalidFields(violations))
        }
    }
}
