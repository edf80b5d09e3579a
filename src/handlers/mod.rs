pub mod landed_cost;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        expense_categories::{DbExpenseCategoryDirectory, ExpenseCategoryDirectory},
        product_costs::{DbProductCostSink, ProductCostSink},
        shipments::{ShipmentService, ShipmentSettings},
    },
};
use slog::Logger;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub shipments: Arc<ShipmentService>,
    pub product_costs: Arc<DbProductCostSink>,
}

impl AppServices {
    /// Wires the shipment service to the database-backed category directory
    /// and product cost ledger.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        settings: ShipmentSettings,
        base_logger: Logger,
    ) -> Self {
        let product_costs = Arc::new(DbProductCostSink::new(db_pool.clone()));
        Self::with_collaborators(
            db_pool.clone(),
            event_sender,
            Arc::new(DbExpenseCategoryDirectory::new(db_pool)),
            product_costs.clone(),
            product_costs,
            settings,
            base_logger,
        )
    }

    /// Same as [`AppServices::new`] with the collaborators supplied by the caller.
    pub fn with_collaborators(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        categories: Arc<dyn ExpenseCategoryDirectory>,
        cost_sink: Arc<dyn ProductCostSink>,
        product_costs: Arc<DbProductCostSink>,
        settings: ShipmentSettings,
        base_logger: Logger,
    ) -> Self {
        let shipments_logger = base_logger.new(slog::o!("component" => "shipments_service"));
        let shipments = Arc::new(ShipmentService::new(
            db_pool,
            event_sender,
            categories,
            cost_sink,
            settings,
            shipments_logger,
        ));

        Self {
            shipments,
            product_costs,
        }
    }
}
