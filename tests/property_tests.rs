//! Allocation invariants checked over generated shipments.

use chrono::NaiveDate;
use landed_cost_api::services::landed_cost::{
    calculate, fractions, CalculationMethod, ItemDraft, ManualAllocationPolicy, SharedCostDraft,
    ShipmentDraft, MONEY_SCALE,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn cents(max: i64) -> impl Strategy<Value = Decimal> {
    (1..=max).prop_map(|value| Decimal::new(value, 2))
}

fn item_strategy() -> impl Strategy<Value = ItemDraft> {
    (1i64..=500, cents(100_000), cents(50_000)).prop_map(|(quantity, unit_cost, weight)| ItemDraft {
        product_id: Uuid::new_v4(),
        item_name: "item".to_string(),
        quantity: Decimal::from(quantity),
        unit_cost,
        weight: Some(weight),
    })
}

fn method_strategy() -> impl Strategy<Value = CalculationMethod> {
    prop_oneof![
        Just(CalculationMethod::Proportional),
        Just(CalculationMethod::Equal),
        Just(CalculationMethod::WeightBased),
        Just(CalculationMethod::QuantityBased),
    ]
}

fn draft(
    items: Vec<ItemDraft>,
    amounts: Vec<Decimal>,
    calculation_method: CalculationMethod,
) -> ShipmentDraft {
    ShipmentDraft {
        name: "generated".to_string(),
        shipment_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
        calculation_method,
        base_currency: "USD".to_string(),
        exchange_rate: dec!(1),
        created_by: None,
        items,
        shared_costs: amounts
            .into_iter()
            .map(|amount| SharedCostDraft {
                expense_category_id: Uuid::new_v4(),
                description: "cost".to_string(),
                amount,
                manual_allocations: None,
            })
            .collect(),
    }
}

const EPSILON: Decimal = dec!(0.000000001);

proptest! {
    #[test]
    fn fractions_are_non_negative_and_sum_to_one(
        items in prop::collection::vec(item_strategy(), 1..40),
        method in method_strategy(),
    ) {
        let shares = fractions(&items, method);
        prop_assert_eq!(shares.len(), items.len());
        prop_assert!(shares.iter().all(|share| *share >= Decimal::ZERO));
        let total: Decimal = shares.iter().sum();
        prop_assert!((total - Decimal::ONE).abs() < EPSILON, "shares summed to {}", total);
    }

    #[test]
    fn every_shared_cost_is_fully_allocated(
        items in prop::collection::vec(item_strategy(), 1..25),
        amounts in prop::collection::vec(cents(1_000_000), 0..6),
        method in method_strategy(),
    ) {
        let shared_total: Decimal = amounts.iter().sum();
        let draft = draft(items, amounts, method);
        let breakdown = calculate(&draft, ManualAllocationPolicy::default())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        for cost in &breakdown.shared_costs {
            let allocated: Decimal = cost.allocations.iter().map(|a| a.allocated_amount).sum();
            prop_assert_eq!(allocated, cost.amount);
            prop_assert!(cost.allocations.iter().all(|a| a.allocated_amount.scale() <= MONEY_SCALE));
        }

        let allocated: Decimal = breakdown.items.iter().map(|item| item.allocated_shared_cost).sum();
        prop_assert_eq!(allocated, shared_total);

        let landed: Decimal = breakdown.items.iter().map(|item| item.total_landed_cost).sum();
        prop_assert_eq!(landed, breakdown.totals.total_landed_cost);
        prop_assert!(breakdown
            .items
            .iter()
            .all(|item| item.landed_cost_per_unit.scale() <= MONEY_SCALE));
        prop_assert_eq!(
            breakdown.totals.total_landed_cost,
            breakdown.totals.total_base_cost + breakdown.totals.total_shared_cost
        );
    }

    #[test]
    fn manual_allocations_are_used_verbatim(
        items in prop::collection::vec(item_strategy(), 2..10),
        first in cents(10_000),
        second in cents(10_000),
    ) {
        let mut draft = draft(items, vec![first + second], CalculationMethod::Proportional);
        draft.shared_costs[0].manual_allocations =
            Some([(0, first), (1, second)].into_iter().collect());

        let breakdown = calculate(&draft, ManualAllocationPolicy::default())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let allocations = &breakdown.shared_costs[0].allocations;
        prop_assert_eq!(allocations[0].allocated_amount, first);
        prop_assert_eq!(allocations[1].allocated_amount, second);
        prop_assert!(allocations[2..].iter().all(|a| a.allocated_amount.is_zero()));
        prop_assert!(allocations.iter().all(|a| a.is_manual_override));
    }
}
