use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Landed Cost API",
        version = "1.0.0",
        description = r#"
# Landed Cost API

Apportions the shared costs of an inbound shipment (freight, customs duty,
insurance, brokerage) across the items it carries and records each product's
landed cost per unit.

## Calculation methods

- `proportional`: by each item's share of the shipment base cost
- `equal`: the same amount for every item
- `weight_based`: by item weight; items without a weight receive nothing
- `quantity_based`: by item quantity

A shared cost may instead carry `manual_allocations`, a map from item index to
amount. Manual amounts must add up to the shared cost amount.

## Lifecycle

Shipments are created as drafts. Drafts can be updated, recalculated and
deleted. Finalizing records every item's unit cost as the product's cost price
and locks the shipment. If some cost prices cannot be recorded, finalize
returns `502` with a per-item report and the shipment stays a draft; calling
finalize again resumes with the remaining items.

## Error Handling

```json
{
  "error": "Bad Request",
  "message": "Validation failed",
  "errors": [{"field": "items[1].quantity", "message": "must be greater than zero"}],
  "timestamp": "2025-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Landed Cost", description = "Shipment landed cost allocation and finalization"),
        (name = "Products", description = "Product cost price lookups")
    ),
    paths(
        crate::handlers::landed_cost::calculate_landed_cost,
        crate::handlers::landed_cost::create_shipment,
        crate::handlers::landed_cost::list_shipments,
        crate::handlers::landed_cost::get_shipment,
        crate::handlers::landed_cost::update_shipment,
        crate::handlers::landed_cost::recalculate_shipment,
        crate::handlers::landed_cost::finalize_shipment,
        crate::handlers::landed_cost::delete_shipment,
        crate::handlers::landed_cost::latest_cost_price,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::ListQuery,

            // Requests
            crate::dto::landed_cost::LandedCostRequest,
            crate::dto::landed_cost::ShipmentItemRequest,
            crate::dto::landed_cost::SharedCostRequest,
            crate::dto::landed_cost::UpdateShipmentRequest,

            // Results
            crate::dto::landed_cost::LandedCostPreview,
            crate::dto::landed_cost::PreviewHeader,
            crate::dto::landed_cost::CalculationSummary,
            crate::dto::landed_cost::ShipmentDetail,
            crate::dto::landed_cost::ShipmentView,
            crate::dto::landed_cost::ShipmentItemView,
            crate::dto::landed_cost::SharedCostView,
            crate::dto::landed_cost::AllocationView,
            crate::dto::landed_cost::ShipmentSummary,
            crate::dto::landed_cost::FinalizationReport,
            crate::dto::landed_cost::ProductCostFailure,
            crate::services::landed_cost::ItemCosting,
            crate::services::landed_cost::SharedCostDistribution,
            crate::services::landed_cost::CostAllocation,
            crate::entities::CalculationMethod,
            crate::entities::ShipmentStatus,
            crate::entities::product_cost_price::Model,

            // Error types
            crate::errors::ErrorResponse,
            crate::errors::FieldViolation
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_landed_cost_route() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Landed Cost API"));
        for path in [
            "/api/v1/landed-cost/calculate",
            "/api/v1/landed-cost/shipments",
            "/api/v1/landed-cost/shipments/{id}",
            "/api/v1/landed-cost/shipments/{id}/recalculate",
            "/api/v1/landed-cost/shipments/{id}/finalize",
            "/api/v1/products/{id}/latest-cost-price",
        ] {
            assert!(openapi.paths.paths.contains_key(path), "missing {}", path);
        }
        assert!(json.contains("FinalizationReport"));
    }
}
