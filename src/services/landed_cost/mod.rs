//! Landed cost engine.
//!
//! Everything under this module is pure: it turns a [`ShipmentDraft`] into a
//! [`LandedCostBreakdown`] without touching storage, so the preview endpoint,
//! the persisted create/recalculate paths and the offline CLI all share one
//! computation.

pub mod calculator;
pub mod distributor;
pub mod strategy;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

pub use crate::entities::CalculationMethod;
pub use calculator::calculate;
pub use distributor::{distribute, Distribution, ManualAllocationPolicy};
pub use strategy::fractions;

/// Decimal places kept for every amount the engine produces.
pub const MONEY_SCALE: u32 = 4;

/// Decimal places kept for an item's share of the shipment value.
pub const SHARE_SCALE: u32 = 6;

/// Rounds an amount to [`MONEY_SCALE`], half away from zero.
pub fn money(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Validated shipment input, ready for allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentDraft {
    pub name: String,
    pub shipment_date: NaiveDate,
    pub calculation_method: CalculationMethod,
    pub base_currency: String,
    pub exchange_rate: Decimal,
    pub created_by: Option<Uuid>,
    pub items: Vec<ItemDraft>,
    pub shared_costs: Vec<SharedCostDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub product_id: Uuid,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub weight: Option<Decimal>,
}

impl ItemDraft {
    pub fn total_item_cost(&self) -> Decimal {
        money(self.quantity * self.unit_cost)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SharedCostDraft {
    pub expense_category_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    /// Item position -> amount. An empty map means "use the strategy".
    pub manual_allocations: Option<BTreeMap<usize, Decimal>>,
}

impl SharedCostDraft {
    pub fn manual(&self) -> Option<&BTreeMap<usize, Decimal>> {
        self.manual_allocations.as_ref().filter(|m| !m.is_empty())
    }
}

/// Derived figures for one shipment item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemCosting {
    pub position: usize,
    pub product_id: Uuid,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub weight: Option<Decimal>,
    pub total_item_cost: Decimal,
    /// Share of the shipment's base value, in `[0, 1]`
    pub percentage_share: Decimal,
    pub allocated_shared_cost: Decimal,
    pub total_landed_cost: Decimal,
    pub landed_cost_per_unit: Decimal,
}

/// One shared cost's share charged to one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CostAllocation {
    pub item_position: usize,
    pub allocated_amount: Decimal,
    pub is_manual_override: bool,
}

/// A shared cost as submitted, with one allocation per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SharedCostDistribution {
    pub position: usize,
    pub expense_category_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub is_manual: bool,
    pub allocations: Vec<CostAllocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShipmentTotals {
    pub total_base_cost: Decimal,
    pub total_shared_cost: Decimal,
    pub total_landed_cost: Decimal,
    /// `total_landed_cost` divided by the shipment's exchange rate
    pub total_landed_cost_converted: Decimal,
}

/// Full result of running a draft through the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LandedCostBreakdown {
    pub calculation_method: CalculationMethod,
    pub items: Vec<ItemCosting>,
    pub shared_costs: Vec<SharedCostDistribution>,
    pub totals: ShipmentTotals,
}
