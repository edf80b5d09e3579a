//! Landed Cost API Library
//!
//! Apportions the shared costs of an inbound shipment (freight, duty,
//! insurance, brokerage) across its items and records the resulting per-unit
//! cost basis for every product.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod commands;
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod logging;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use slog::Logger;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn shipment_service(&self) -> Arc<services::shipments::ShipmentService> {
        self.services.shipments.clone()
    }
}

// Common query parameters for list endpoints
#[derive(Debug, Default, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page number (default 1)
    pub page: Option<u64>,
    /// Page size (default and maximum come from configuration)
    pub limit: Option<u64>,
}

// Common response wrappers
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let limit = limit.max(1);
        Self {
            items,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    /// A failed operation that still has a result worth returning.
    pub fn failure_with(data: T, message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: Some(data),
            message: Some(message.into()),
            errors: (!errors.is_empty()).then_some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}


/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Routes mounted under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    let landed_cost = Router::new()
        .route("/calculate", post(handlers::landed_cost::calculate_landed_cost))
        .route(
            "/shipments",
            post(handlers::landed_cost::create_shipment).get(handlers::landed_cost::list_shipments),
        )
        .route(
            "/shipments/:id",
            get(handlers::landed_cost::get_shipment)
                .patch(handlers::landed_cost::update_shipment)
                .delete(handlers::landed_cost::delete_shipment),
        )
        .route(
            "/shipments/:id/recalculate",
            post(handlers::landed_cost::recalculate_shipment),
        )
        .route(
            "/shipments/:id/finalize",
            post(handlers::landed_cost::finalize_shipment),
        );

    Router::new().nest("/landed-cost", landed_cost).route(
        "/products/:id/latest-cost-price",
        get(handlers::landed_cost::latest_cost_price),
    )
}

/// Full application router without CORS, which depends on deployment settings.
pub fn app_router(state: AppState, audit_logger: Logger) -> Router {
    let access_log = Arc::new(logging::LoggingState::new(audit_logger));

    Router::new()
        .nest("/api/v1", api_v1_routes())
        .with_state(state.clone())
        .nest("/health", health::health_routes(state.db.clone()))
        .merge(openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(axum::middleware::from_fn_with_state(
            access_log,
            logging::logging_middleware,
        ))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}

pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::db::*;
    pub use crate::dto::landed_cost::*;
    pub use crate::errors::*;
    pub use crate::events::*;
    pub use crate::services::landed_cost::*;
    pub use crate::services::shipments::{ShipmentHeaderChanges, ShipmentService, ShipmentSettings};
}
