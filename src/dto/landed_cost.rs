use crate::dto::violations_from;
use crate::entities::{
    shared_cost, shared_cost_allocation, shipment, shipment_item, CalculationMethod,
    ShipmentStatus,
};
use crate::errors::{FieldViolation, ServiceError};
use crate::services::landed_cost::{
    ItemCosting, ItemDraft, LandedCostBreakdown, SharedCostDistribution, SharedCostDraft,
    ShipmentDraft, ShipmentTotals, MONEY_SCALE,
};
use crate::services::shipments::ShipmentHeaderChanges;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Upper bound on any single monetary or quantity input.
const MAX_INPUT_VALUE: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Most decimal places accepted on an exchange rate.
const RATE_SCALE: u32 = 10;

const METHOD_HINT: &str = "must be one of proportional, equal, weight_based, quantity_based";

fn bounded(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(bounded("positive", "must be greater than zero"));
    }
    validate_magnitude(value, MONEY_SCALE, "must have at most 4 decimal places")
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(bounded("non_negative", "must not be negative"));
    }
    validate_magnitude(value, MONEY_SCALE, "must have at most 4 decimal places")
}

fn validate_exchange_rate(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(bounded("positive", "must be greater than zero"));
    }
    validate_magnitude(value, RATE_SCALE, "must have at most 10 decimal places")
}

fn validate_magnitude(
    value: &Decimal,
    max_scale: u32,
    scale_message: &'static str,
) -> Result<(), ValidationError> {
    if *value > MAX_INPUT_VALUE {
        return Err(bounded("range", "must not exceed 1000000000000"));
    }
    if value.normalize().scale() > max_scale {
        return Err(bounded("scale", scale_message));
    }
    Ok(())
}

fn validate_currency(value: &str) -> Result<(), ValidationError> {
    if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(bounded("currency", "must be a 3-letter currency code"));
    }
    Ok(())
}

fn parse_method(value: &str) -> Option<CalculationMethod> {
    CalculationMethod::from_str(value.trim()).ok()
}

/// Body of `POST /landed-cost/calculate` and `POST /landed-cost/shipments`.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct LandedCostRequest {
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    #[schema(example = "March container, Shenzhen")]
    pub shipment_name: String,
    pub shipment_date: NaiveDate,
    /// One of `proportional`, `equal`, `weight_based`, `quantity_based`
    #[schema(example = "proportional")]
    pub calculation_method: String,
    #[validate(custom = "validate_currency")]
    #[schema(example = "USD")]
    pub base_currency: String,
    #[validate(custom = "validate_exchange_rate")]
    #[schema(value_type = String, example = "1")]
    pub exchange_rate: Decimal,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<ShipmentItemRequest>,
    #[validate(length(min = 1, message = "at least one shared cost is required"))]
    pub shared_costs: Vec<SharedCostRequest>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct ShipmentItemRequest {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub item_name: String,
    #[validate(custom = "validate_positive")]
    #[schema(value_type = String, example = "10")]
    pub quantity: Decimal,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = String, example = "20.00")]
    pub unit_cost: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = Option<String>, example = "12.5")]
    pub weight: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct SharedCostRequest {
    pub expense_category_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    #[schema(example = "Ocean freight")]
    pub description: String,
    #[validate(custom = "validate_positive")]
    #[schema(value_type = String, example = "50.00")]
    pub amount: Decimal,
    /// Item index (submission order) to allocated amount
    #[serde(default)]
    #[schema(value_type = Option<Object>, example = json!({"0": "70.00", "1": "20.00"}))]
    pub manual_allocations: Option<BTreeMap<usize, Decimal>>,
}

impl LandedCostRequest {
    /// Every problem with the request, addressed by JSON path.
    pub fn violations(&self) -> Vec<FieldViolation> {
        let mut violations = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => violations_from(None, &errors),
        };

        if parse_method(&self.calculation_method).is_none() {
            violations.push(FieldViolation::new("calculation_method", METHOD_HINT));
        }

        for (index, item) in self.items.iter().enumerate() {
            if let Err(errors) = item.validate() {
                violations.extend(violations_from(Some(&format!("items[{}]", index)), &errors));
            }
        }

        for (index, cost) in self.shared_costs.iter().enumerate() {
            let prefix = format!("shared_costs[{}]", index);
            if let Err(errors) = cost.validate() {
                violations.extend(violations_from(Some(&prefix), &errors));
            }
            for (item_index, amount) in cost.manual_allocations.iter().flatten() {
                if let Err(error) = validate_non_negative(amount) {
                    violations.push(FieldViolation::new(
                        format!("{}.manual_allocations.{}", prefix, item_index),
                        error.message.unwrap_or(Cow::Borrowed("is invalid")),
                    ));
                }
            }
        }

        violations
    }

    /// Validates the request and converts it into an engine draft.
    pub fn into_draft(self) -> Result<ShipmentDraft, ServiceError> {
        let violations = self.violations();
        if !violations.is_empty() {
            return Err(ServiceError::InvalidFields(violations));
        }
        let calculation_method = parse_method(&self.calculation_method)
            .ok_or_else(|| ServiceError::invalid_field("calculation_method", METHOD_HINT))?;

        Ok(ShipmentDraft {
            name: self.shipment_name.trim().to_string(),
            shipment_date: self.shipment_date,
            calculation_method,
            base_currency: self.base_currency.to_ascii_uppercase(),
            exchange_rate: self.exchange_rate,
            created_by: self.created_by,
            items: self
                .items
                .into_iter()
                .map(|item| ItemDraft {
                    product_id: item.product_id,
                    item_name: item.item_name,
                    quantity: item.quantity,
                    unit_cost: item.unit_cost,
                    weight: item.weight,
                })
                .collect(),
            shared_costs: self
                .shared_costs
                .into_iter()
                .map(|cost| SharedCostDraft {
                    expense_category_id: cost.expense_category_id,
                    description: cost.description,
                    amount: cost.amount,
                    manual_allocations: cost.manual_allocations,
                })
                .collect(),
        })
    }
}

/// Body of `PATCH /landed-cost/shipments/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateShipmentRequest {
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub shipment_name: Option<String>,
    pub shipment_date: Option<NaiveDate>,
    pub calculation_method: Option<String>,
    #[validate(custom = "validate_currency")]
    pub base_currency: Option<String>,
    #[validate(custom = "validate_exchange_rate")]
    #[schema(value_type = Option<String>)]
    pub exchange_rate: Option<Decimal>,
}

impl UpdateShipmentRequest {
    pub fn into_changes(self) -> Result<ShipmentHeaderChanges, ServiceError> {
        let mut violations = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => violations_from(None, &errors),
        };

        let calculation_method = match self.calculation_method.as_deref() {
            Some(raw) => match parse_method(raw) {
                Some(method) => Some(method),
                None => {
                    violations.push(FieldViolation::new("calculation_method", METHOD_HINT));
                    None
                }
            },
            None => None,
        };

        if !violations.is_empty() {
            return Err(ServiceError::InvalidFields(violations));
        }

        Ok(ShipmentHeaderChanges {
            name: self.shipment_name.map(|name| name.trim().to_string()),
            shipment_date: self.shipment_date,
            calculation_method,
            base_currency: self.base_currency.map(|c| c.to_ascii_uppercase()),
            exchange_rate: self.exchange_rate,
        })
    }
}

/// Shipment-level totals plus the secondary-currency view of the grand total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CalculationSummary {
    #[schema(value_type = String)]
    pub total_shipment_base_cost: Decimal,
    #[schema(value_type = String)]
    pub total_shared_costs: Decimal,
    #[schema(value_type = String)]
    pub grand_total_landed_cost: Decimal,
    pub calculation_method: CalculationMethod,
    pub base_currency: String,
    #[schema(value_type = String)]
    pub exchange_rate: Decimal,
    /// Grand total divided by the exchange rate
    #[schema(value_type = String)]
    pub grand_total_landed_cost_converted: Decimal,
}

impl CalculationSummary {
    pub fn new(
        totals: &ShipmentTotals,
        calculation_method: CalculationMethod,
        base_currency: &str,
        exchange_rate: Decimal,
    ) -> Self {
        Self {
            total_shipment_base_cost: totals.total_base_cost,
            total_shared_costs: totals.total_shared_cost,
            grand_total_landed_cost: totals.total_landed_cost,
            calculation_method,
            base_currency: base_currency.to_string(),
            exchange_rate,
            grand_total_landed_cost_converted: totals.total_landed_cost_converted,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreviewHeader {
    /// Always absent for previews
    pub id: Option<Uuid>,
    pub name: String,
    pub shipment_date: NaiveDate,
    pub calculation_method: CalculationMethod,
    pub base_currency: String,
    #[schema(value_type = String)]
    pub exchange_rate: Decimal,
    pub is_finalized: bool,
    pub created_by: Option<Uuid>,
    #[schema(value_type = String)]
    pub total_base_cost: Decimal,
    #[schema(value_type = String)]
    pub total_shared_cost: Decimal,
    #[schema(value_type = String)]
    pub total_landed_cost: Decimal,
}

/// Response of `POST /landed-cost/calculate`; nothing behind it is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LandedCostPreview {
    pub shipment: PreviewHeader,
    pub calculation_summary: CalculationSummary,
    pub items: Vec<ItemCosting>,
    pub shared_costs: Vec<SharedCostDistribution>,
}

impl LandedCostPreview {
    pub fn new(draft: &ShipmentDraft, breakdown: LandedCostBreakdown) -> Self {
        let totals = breakdown.totals;
        Self {
            shipment: PreviewHeader {
                id: None,
                name: draft.name.clone(),
                shipment_date: draft.shipment_date,
                calculation_method: draft.calculation_method,
                base_currency: draft.base_currency.clone(),
                exchange_rate: draft.exchange_rate,
                is_finalized: false,
                created_by: draft.created_by,
                total_base_cost: totals.total_base_cost,
                total_shared_cost: totals.total_shared_cost,
                total_landed_cost: totals.total_landed_cost,
            },
            calculation_summary: CalculationSummary::new(
                &totals,
                draft.calculation_method,
                &draft.base_currency,
                draft.exchange_rate,
            ),
            items: breakdown.items,
            shared_costs: breakdown.shared_costs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShipmentView {
    pub id: Uuid,
    pub name: String,
    pub shipment_date: NaiveDate,
    pub calculation_method: CalculationMethod,
    pub base_currency: String,
    #[schema(value_type = String)]
    pub exchange_rate: Decimal,
    pub status: ShipmentStatus,
    pub is_finalized: bool,
    #[schema(value_type = String)]
    pub total_base_cost: Decimal,
    #[schema(value_type = String)]
    pub total_shared_cost: Decimal,
    #[schema(value_type = String)]
    pub total_landed_cost: Decimal,
    pub created_by: Option<Uuid>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&shipment::Model> for ShipmentView {
    fn from(model: &shipment::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            shipment_date: model.shipment_date,
            calculation_method: model.calculation_method,
            base_currency: model.base_currency.clone(),
            exchange_rate: model.exchange_rate.into(),
            status: model.status,
            is_finalized: model.is_finalized,
            total_base_cost: model.total_base_cost.into(),
            total_shared_cost: model.total_shared_cost.into(),
            total_landed_cost: model.total_landed_cost.into(),
            created_by: model.created_by,
            finalized_at: model.finalized_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShipmentItemView {
    pub id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub item_name: String,
    #[schema(value_type = String)]
    pub quantity: Decimal,
    #[schema(value_type = String)]
    pub unit_cost: Decimal,
    #[schema(value_type = Option<String>)]
    pub weight: Option<Decimal>,
    #[schema(value_type = String)]
    pub total_item_cost: Decimal,
    #[schema(value_type = String)]
    pub percentage_share: Decimal,
    #[schema(value_type = String)]
    pub allocated_shared_cost: Decimal,
    #[schema(value_type = String)]
    pub total_landed_cost: Decimal,
    #[schema(value_type = String)]
    pub landed_cost_per_unit: Decimal,
    pub cost_applied_at: Option<DateTime<Utc>>,
}

impl From<&shipment_item::Model> for ShipmentItemView {
    fn from(model: &shipment_item::Model) -> Self {
        Self {
            id: model.id,
            position: model.position,
            product_id: model.product_id,
            item_name: model.item_name.clone(),
            quantity: model.quantity.into(),
            unit_cost: model.unit_cost.into(),
            weight: model.weight.map(Decimal::from),
            total_item_cost: model.total_item_cost.into(),
            percentage_share: model.percentage_share.into(),
            allocated_shared_cost: model.allocated_shared_cost.into(),
            total_landed_cost: model.total_landed_cost.into(),
            landed_cost_per_unit: model.landed_cost_per_unit.into(),
            cost_applied_at: model.cost_applied_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SharedCostView {
    pub id: Uuid,
    pub position: i32,
    pub expense_category_id: Uuid,
    pub description: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

impl From<&shared_cost::Model> for SharedCostView {
    fn from(model: &shared_cost::Model) -> Self {
        Self {
            id: model.id,
            position: model.position,
            expense_category_id: model.expense_category_id,
            description: model.description.clone(),
            amount: model.amount.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AllocationView {
    pub id: Uuid,
    pub shared_cost_id: Uuid,
    pub shipment_item_id: Uuid,
    #[schema(value_type = String)]
    pub allocated_amount: Decimal,
    pub is_manual_override: bool,
}

impl From<&shared_cost_allocation::Model> for AllocationView {
    fn from(model: &shared_cost_allocation::Model) -> Self {
        Self {
            id: model.id,
            shared_cost_id: model.shared_cost_id,
            shipment_item_id: model.shipment_item_id,
            allocated_amount: model.allocated_amount.into(),
            is_manual_override: model.is_manual_override,
        }
    }
}

/// A persisted shipment with everything hanging off it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShipmentDetail {
    pub shipment: ShipmentView,
    pub calculation_summary: CalculationSummary,
    pub items: Vec<ShipmentItemView>,
    pub shared_costs: Vec<SharedCostView>,
    pub allocations: Vec<AllocationView>,
}

impl ShipmentDetail {
    pub fn from_models(
        shipment: &shipment::Model,
        items: &[shipment_item::Model],
        shared_costs: &[shared_cost::Model],
        allocations: &[shared_cost_allocation::Model],
    ) -> Self {
        let totals = ShipmentTotals {
            total_base_cost: shipment.total_base_cost.into(),
            total_shared_cost: shipment.total_shared_cost.into(),
            total_landed_cost: shipment.total_landed_cost.into(),
            total_landed_cost_converted: shipment.total_landed_cost_converted.into(),
        };
        Self {
            shipment: ShipmentView::from(shipment),
            calculation_summary: CalculationSummary::new(
                &totals,
                shipment.calculation_method,
                &shipment.base_currency,
                shipment.exchange_rate.into(),
            ),
            items: items.iter().map(ShipmentItemView::from).collect(),
            shared_costs: shared_costs.iter().map(SharedCostView::from).collect(),
            allocations: allocations.iter().map(AllocationView::from).collect(),
        }
    }
}

/// Row of the shipment listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShipmentSummary {
    pub id: Uuid,
    pub name: String,
    pub shipment_date: NaiveDate,
    pub calculation_method: CalculationMethod,
    pub base_currency: String,
    pub status: ShipmentStatus,
    pub is_finalized: bool,
    #[schema(value_type = String)]
    pub total_landed_cost: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<shipment::Model> for ShipmentSummary {
    fn from(model: shipment::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            shipment_date: model.shipment_date,
            calculation_method: model.calculation_method,
            base_currency: model.base_currency,
            status: model.status,
            is_finalized: model.is_finalized,
            total_landed_cost: model.total_landed_cost.into(),
            created_at: model.created_at,
        }
    }
}

/// A product whose unit cost could not be recorded during finalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductCostFailure {
    pub product_id: Uuid,
    pub item_name: String,
    pub error: String,
}

/// Outcome of a finalize attempt.
///
/// When `finalized` is false the shipment is back in draft; items already
/// pushed are skipped on the next attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FinalizationReport {
    pub shipment_id: Uuid,
    pub finalized: bool,
    pub status: ShipmentStatus,
    /// Products whose cost was recorded by this attempt
    pub updated_products_count: usize,
    /// Products recorded by an earlier, incomplete attempt
    pub already_applied_count: usize,
    pub failures: Vec<ProductCostFailure>,
}

impl FinalizationReport {
    pub fn failed_products(&self) -> Vec<Uuid> {
        self.failures.iter().map(|f| f.product_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn request_json() -> serde_json::Value {
        json!({
            "shipment_name": "March container",
            "shipment_date": "2025-03-14",
            "calculation_method": "proportional",
            "base_currency": "usd",
            "exchange_rate": "1.25",
            "items": [
                {"product_id": Uuid::new_v4(), "item_name": "Chair", "quantity": "10", "unit_cost": "20"},
                {"product_id": Uuid::new_v4(), "item_name": "Lamp", "quantity": "5", "unit_cost": "10", "weight": "3"}
            ],
            "shared_costs": [
                {"expense_category_id": Uuid::new_v4(), "description": "Freight", "amount": "50",
                 "manual_allocations": {"0": "30", "1": "20"}}
            ]
        })
    }

    #[test]
    fn valid_request_converts_to_draft() {
        let request: LandedCostRequest = serde_json::from_value(request_json()).unwrap();
        let draft = request.into_draft().unwrap();

        assert_eq!(draft.calculation_method, CalculationMethod::Proportional);
        assert_eq!(draft.base_currency, "USD");
        assert_eq!(draft.items[1].weight, Some(dec!(3)));
        let manual = draft.shared_costs[0].manual_allocations.as_ref().unwrap();
        assert_eq!(manual.get(&1), Some(&dec!(20)));
    }

    #[test]
    fn violations_are_addressed_by_path() {
        let mut body = request_json();
        body["items"][1]["quantity"] = json!("0");
        body["exchange_rate"] = json!("-1");
        body["calculation_method"] = json!("by_volume");
        body["shared_costs"][0]["manual_allocations"]["1"] = json!("-5");

        let request: LandedCostRequest = serde_json::from_value(body).unwrap();
        let violations = request.violations();
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();

        assert!(fields.contains(&"items[1].quantity"));
        assert!(fields.contains(&"exchange_rate"));
        assert!(fields.contains(&"calculation_method"));
        assert!(fields.contains(&"shared_costs[0].manual_allocations.1"));
        let quantity = violations
            .iter()
            .find(|v| v.field == "items[1].quantity")
            .unwrap();
        assert_eq!(quantity.message, "must be greater than zero");
    }

    #[test]
    fn empty_item_and_cost_lists_are_rejected() {
        let mut body = request_json();
        body["items"] = json!([]);
        body["shared_costs"] = json!([]);

        let request: LandedCostRequest = serde_json::from_value(body).unwrap();
        let err = request.into_draft().unwrap_err();
        let fields: Vec<String> = err
            .violations()
            .unwrap()
            .iter()
            .map(|v| v.field.clone())
            .collect();
        assert_eq!(fields, vec!["items".to_string(), "shared_costs".to_string()]);
    }

    #[test]
    fn update_rejects_unknown_method() {
        let request = UpdateShipmentRequest {
            calculation_method: Some("volumetric".into()),
            ..Default::default()
        };
        let err = request.into_changes().unwrap_err();
        assert_eq!(err.violations().unwrap()[0].field, "calculation_method");
    }

    #[test]
    fn summary_reports_the_converted_total() {
        let totals = ShipmentTotals {
            total_base_cost: dec!(250),
            total_shared_cost: dec!(50),
            total_landed_cost: dec!(300),
            total_landed_cost_converted: dec!(200),
        };
        let summary = CalculationSummary::new(&totals, CalculationMethod::Equal, "USD", dec!(1.5));
        assert_eq!(summary.grand_total_landed_cost, dec!(300));
        assert_eq!(summary.grand_total_landed_cost_converted, dec!(200));
    }

    #[test]
    fn inputs_beyond_four_decimal_places_are_rejected() {
        let mut body = request_json();
        body["items"][0]["quantity"] = json!("0.0000000000000000000000000001");
        body["items"][1]["unit_cost"] = json!("10.00005");
        body["shared_costs"][0]["manual_allocations"]["0"] = json!("29.99999");

        let request: LandedCostRequest = serde_json::from_value(body).unwrap();
        let violations = request.violations();
        let scale_fields: Vec<&str> = violations
            .iter()
            .filter(|v| v.message == "must have at most 4 decimal places")
            .map(|v| v.field.as_str())
            .collect();

        assert_eq!(
            scale_fields,
            vec![
                "items[0].quantity",
                "items[1].unit_cost",
                "shared_costs[0].manual_allocations.0"
            ]
        );
    }

    #[test]
    fn trailing_zeros_do_not_count_towards_scale() {
        let mut body = request_json();
        body["items"][0]["unit_cost"] = json!("20.000000");
        body["exchange_rate"] = json!("0.8512345678");

        let request: LandedCostRequest = serde_json::from_value(body).unwrap();
        assert!(request.violations().is_empty());
    }
}
