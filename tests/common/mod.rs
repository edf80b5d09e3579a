#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use landed_cost_api::{
    config::AppConfig,
    db::{self, DbConfig, DbPool},
    entities::expense_category,
    errors::ServiceError,
    events::{self, EventSender},
    handlers::AppServices,
    logging::discard_logger,
    middleware_helpers::retry::RetryConfig,
    services::{
        expense_categories::DbExpenseCategoryDirectory,
        landed_cost::ManualAllocationPolicy,
        product_costs::{DbProductCostSink, ProductCostSink, ProductCostUpdate},
        shipments::{ShipmentService, ShipmentSettings},
    },
    AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Expense categories seeded into every test database.
#[derive(Debug, Clone, Copy)]
pub struct Categories {
    /// Active, allows per-item overrides
    pub freight: Uuid,
    /// Active, does not allow per-item overrides
    pub customs: Uuid,
    /// Inactive
    pub retired: Uuid,
}

/// Product cost sink that records every call and fails on demand for
/// selected products before delegating to the database sink.
pub struct FlakySink {
    inner: DbProductCostSink,
    failing: Mutex<HashSet<Uuid>>,
    calls: Mutex<Vec<Uuid>>,
}

impl FlakySink {
    pub fn new(inner: DbProductCostSink) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_for(&self, product_id: Uuid) {
        self.failing.lock().unwrap().insert(product_id);
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Product ids of every call, failed attempts included.
    pub fn calls(&self) -> Vec<Uuid> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, product_id: Uuid) -> usize {
        self.calls().iter().filter(|id| **id == product_id).count()
    }
}

#[async_trait]
impl ProductCostSink for FlakySink {
    async fn record_landed_cost(&self, update: &ProductCostUpdate) -> Result<(), ServiceError> {
        self.calls.lock().unwrap().push(update.product_id);
        let fails = self.failing.lock().unwrap().contains(&update.product_id);
        if fails {
            return Err(ServiceError::ExternalServiceError(format!(
                "cost ledger unavailable for {}",
                update.product_id
            )));
        }
        self.inner.record_landed_cost(update).await
    }
}

/// Helper harness for spinning up an application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub pool: Arc<DbPool>,
    pub sink: Arc<FlakySink>,
    pub categories: Categories,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_policy(ManualAllocationPolicy::default()).await
    }

    pub async fn with_policy(policy: ManualAllocationPolicy) -> Self {
        let pool = db::establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let pool = Arc::new(pool);

        let categories = Categories {
            freight: seed_category(&pool, "Freight", true, true).await,
            customs: seed_category(&pool, "Customs duty", false, true).await,
            retired: seed_category(&pool, "Legacy surcharge", true, false).await,
        };

        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = false;

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let settings = ShipmentSettings {
            allocation_policy: policy,
            finalize_retry: RetryConfig {
                max_attempts: 2,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
                backoff_factor: 2.0,
            },
            claim_timeout: Duration::from_secs(300),
        };

        let product_costs = Arc::new(DbProductCostSink::new(pool.clone()));
        let sink = Arc::new(FlakySink::new(DbProductCostSink::new(pool.clone())));
        let services = AppServices::with_collaborators(
            pool.clone(),
            Arc::new(event_sender.clone()),
            Arc::new(DbExpenseCategoryDirectory::new(pool.clone())),
            sink.clone(),
            product_costs,
            settings,
            discard_logger(),
        );

        let state = AppState {
            db: pool.clone(),
            config: cfg,
            event_sender,
            services,
        };
        let router = landed_cost_api::app_router(state.clone(), discard_logger());

        Self {
            router,
            state,
            pool,
            sink,
            categories,
            _event_task: event_task,
        }
    }

    pub fn shipments(&self) -> Arc<ShipmentService> {
        self.state.shipment_service()
    }

    /// Send a request against the router.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Two items (chair 10 x 20, lamp 5 x 10) with freight 40 and customs 10.
    ///
    /// Proportional shares are 0.8 / 0.2, so the chair lands at 240 (24 per
    /// unit) and the lamp at 60 (12 per unit).
    pub fn shipment_payload(&self, chair: Uuid, lamp: Uuid) -> Value {
        json!({
            "shipment_name": "March container",
            "shipment_date": "2025-03-14",
            "calculation_method": "proportional",
            "base_currency": "usd",
            "exchange_rate": "1.25",
            "items": [
                {"product_id": chair, "item_name": "Chair", "quantity": "10", "unit_cost": "20", "weight": "30"},
                {"product_id": lamp, "item_name": "Lamp", "quantity": "5", "unit_cost": "10", "weight": "10"}
            ],
            "shared_costs": [
                {"expense_category_id": self.categories.freight, "description": "Ocean freight", "amount": "40"},
                {"expense_category_id": self.categories.customs, "description": "Import duty", "amount": "10"}
            ]
        })
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Reads a decimal that was serialized as a JSON string.
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {}", value))
        .parse()
        .expect("decimal string")
}

async fn seed_category(pool: &DbPool, name: &str, allows_item_override: bool, is_active: bool) -> Uuid {
    let id = Uuid::new_v4();
    expense_category::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        allows_item_override: Set(allows_item_override),
        is_active: Set(is_active),
        created_at: Set(Utc::now()),
    }
    .insert(pool)
    .await
    .expect("failed to seed expense category");
    id
}
