use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use uuid::Uuid;

use crate::dto::landed_cost::{
    FinalizationReport, LandedCostPreview, LandedCostRequest, ShipmentDetail, ShipmentSummary,
    UpdateShipmentRequest,
};
use crate::entities::product_cost_price;
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse};

/// Preview a landed cost allocation
#[utoipa::path(
    post,
    path = "/api/v1/landed-cost/calculate",
    summary = "Calculate landed cost",
    description = "Allocate shared costs across the items of a shipment without saving anything",
    request_body = LandedCostRequest,
    responses(
        (status = 200, description = "Allocation computed", body = ApiResponse<LandedCostPreview>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Manual allocation references a missing item", body = crate::errors::ErrorResponse),
    ),
    tag = "Landed Cost"
)]
pub async fn calculate_landed_cost(
    State(state): State<AppState>,
    Json(request): Json<LandedCostRequest>,
) -> ApiResult<LandedCostPreview> {
    let preview = state.services.shipments.calculate(request).await?;
    Ok(Json(ApiResponse::success(preview)))
}

/// Create a landed cost shipment
#[utoipa::path(
    post,
    path = "/api/v1/landed-cost/shipments",
    summary = "Create shipment",
    description = "Calculate and save a draft shipment with its items, shared costs and allocation ledger",
    request_body = LandedCostRequest,
    responses(
        (status = 201, description = "Shipment created", body = ApiResponse<ShipmentDetail>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Manual allocation references a missing item", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Landed Cost"
)]
pub async fn create_shipment(
    State(state): State<AppState>,
    Json(request): Json<LandedCostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ShipmentDetail>>), ServiceError> {
    let detail = state.services.shipments.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(detail))))
}

/// List landed cost shipments
#[utoipa::path(
    get,
    path = "/api/v1/landed-cost/shipments",
    summary = "List shipments",
    description = "Newest shipments first",
    params(ListQuery),
    responses(
        (status = 200, description = "Shipments retrieved", body = ApiResponse<PaginatedResponse<ShipmentSummary>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Landed Cost"
)]
pub async fn list_shipments(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<ShipmentSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = state.config.page_size(query.limit);
    let (items, total) = state.services.shipments.list(page, limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Get a landed cost shipment
#[utoipa::path(
    get,
    path = "/api/v1/landed-cost/shipments/{id}",
    summary = "Get shipment",
    params(("id" = Uuid, Path, description = "Shipment ID")),
    responses(
        (status = 200, description = "Shipment retrieved", body = ApiResponse<ShipmentDetail>),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Landed Cost"
)]
pub async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ShipmentDetail> {
    let detail = state.services.shipments.get(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Update a draft shipment
#[utoipa::path(
    patch,
    path = "/api/v1/landed-cost/shipments/{id}",
    summary = "Update shipment",
    description = "Change header fields of a draft shipment and recalculate it",
    params(("id" = Uuid, Path, description = "Shipment ID")),
    request_body = UpdateShipmentRequest,
    responses(
        (status = 200, description = "Shipment updated", body = ApiResponse<ShipmentDetail>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Shipment is finalized or being finalized", body = crate::errors::ErrorResponse),
    ),
    tag = "Landed Cost"
)]
pub async fn update_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateShipmentRequest>,
) -> ApiResult<ShipmentDetail> {
    let changes = request.into_changes()?;
    let detail = state.services.shipments.update(id, changes).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Recalculate a draft shipment
#[utoipa::path(
    post,
    path = "/api/v1/landed-cost/shipments/{id}/recalculate",
    summary = "Recalculate shipment",
    description = "Rerun the allocation from the stored items, shared costs and manual overrides",
    params(("id" = Uuid, Path, description = "Shipment ID")),
    responses(
        (status = 200, description = "Shipment recalculated", body = ApiResponse<ShipmentDetail>),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Shipment is finalized or being finalized", body = crate::errors::ErrorResponse),
    ),
    tag = "Landed Cost"
)]
pub async fn recalculate_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ShipmentDetail> {
    let detail = state.services.shipments.recalculate(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Finalize a shipment
#[utoipa::path(
    post,
    path = "/api/v1/landed-cost/shipments/{id}/finalize",
    summary = "Finalize shipment",
    description = "Record every item's landed cost per unit as the product's cost price and lock the shipment",
    params(("id" = Uuid, Path, description = "Shipment ID")),
    responses(
        (status = 200, description = "Shipment finalized", body = ApiResponse<FinalizationReport>),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Shipment already finalized or finalize in progress", body = crate::errors::ErrorResponse),
        (status = 502, description = "Some product costs could not be recorded; shipment left in draft", body = ApiResponse<FinalizationReport>),
    ),
    tag = "Landed Cost"
)]
pub async fn finalize_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let report = state.services.shipments.finalize(id).await?;
    if report.finalized {
        return Ok((StatusCode::OK, Json(ApiResponse::success(report))).into_response());
    }

    let errors = report
        .failures
        .iter()
        .map(|failure| format!("{}: {}", failure.product_id, failure.error))
        .collect();
    let message = format!(
        "{} of {} product cost(s) could not be recorded; shipment returned to draft",
        report.failures.len(),
        report.failures.len() + report.updated_products_count + report.already_applied_count
    );
    Ok((
        StatusCode::BAD_GATEWAY,
        Json(ApiResponse::failure_with(report, message, errors)),
    )
        .into_response())
}

/// Delete a draft shipment
#[utoipa::path(
    delete,
    path = "/api/v1/landed-cost/shipments/{id}",
    summary = "Delete shipment",
    params(("id" = Uuid, Path, description = "Shipment ID")),
    responses(
        (status = 200, description = "Shipment deleted", body = ApiResponse<String>),
        (status = 404, description = "Shipment not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Finalized shipments cannot be deleted", body = crate::errors::ErrorResponse),
    ),
    tag = "Landed Cost"
)]
pub async fn delete_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<String> {
    state.services.shipments.delete(id).await?;
    Ok(Json(ApiResponse::success_with_message(
        id.to_string(),
        "Shipment deleted",
    )))
}

/// Latest recorded cost price of a product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/latest-cost-price",
    summary = "Latest product cost price",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Latest cost price", body = ApiResponse<product_cost_price::Model>),
        (status = 404, description = "No cost price recorded for the product", body = crate::errors::ErrorResponse),
    ),
    tag = "Products"
)]
pub async fn latest_cost_price(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<product_cost_price::Model> {
    let latest = state
        .services
        .product_costs
        .latest_for_product(product_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("No cost price recorded for product {}", product_id))
        })?;
    Ok(Json(ApiResponse::success(latest)))
}
