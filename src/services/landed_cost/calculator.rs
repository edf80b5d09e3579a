use super::{
    distributor, money, ItemCosting, LandedCostBreakdown, ManualAllocationPolicy, ShipmentDraft,
    ShipmentTotals, SHARE_SCALE,
};
use crate::errors::ServiceError;
use rust_decimal::{Decimal, RoundingStrategy};

/// Runs a draft through distribution and folds the result into per-item and
/// shipment-level figures, every amount rounded to the money scale.
pub fn calculate(
    draft: &ShipmentDraft,
    policy: ManualAllocationPolicy,
) -> Result<LandedCostBreakdown, ServiceError> {
    let distribution = distributor::distribute(
        &draft.items,
        &draft.shared_costs,
        draft.calculation_method,
        policy,
    )?;

    let total_base_cost: Decimal = draft.items.iter().map(|item| item.total_item_cost()).sum();
    let total_shared_cost: Decimal = draft.shared_costs.iter().map(|cost| cost.amount).sum();

    let items = draft
        .items
        .iter()
        .zip(distribution.allocated_per_item.iter())
        .enumerate()
        .map(|(position, (item, allocated))| -> Result<ItemCosting, ServiceError> {
            let total_item_cost = item.total_item_cost();
            let total_landed_cost = total_item_cost + *allocated;
            let percentage_share = if total_base_cost.is_zero() {
                Decimal::ZERO
            } else {
                (total_item_cost / total_base_cost)
                    .round_dp_with_strategy(SHARE_SCALE, RoundingStrategy::MidpointAwayFromZero)
            };
            let landed_cost_per_unit = total_landed_cost
                .checked_div(item.quantity)
                .map(money)
                .ok_or_else(|| {
                    ServiceError::invalid_field(
                        format!("items[{}].quantity", position),
                        "landed cost per unit is out of range",
                    )
                })?;

            Ok(ItemCosting {
                position,
                product_id: item.product_id,
                item_name: item.item_name.clone(),
                quantity: item.quantity,
                unit_cost: item.unit_cost,
                weight: item.weight,
                total_item_cost,
                percentage_share: percentage_share.normalize(),
                allocated_shared_cost: allocated.normalize(),
                total_landed_cost: total_landed_cost.normalize(),
                landed_cost_per_unit,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let total_landed_cost = total_base_cost + total_shared_cost;
    let total_landed_cost_converted = total_landed_cost
        .checked_div(draft.exchange_rate)
        .map(money)
        .ok_or_else(|| {
            ServiceError::invalid_field("exchange_rate", "converted landed cost is out of range")
        })?;

    Ok(LandedCostBreakdown {
        calculation_method: draft.calculation_method,
        items,
        shared_costs: distribution.shared_costs,
        totals: ShipmentTotals {
            total_base_cost: total_base_cost.normalize(),
            total_shared_cost: total_shared_cost.normalize(),
            total_landed_cost: total_landed_cost.normalize(),
            total_landed_cost_converted,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::landed_cost::{CalculationMethod, ItemDraft, SharedCostDraft, MONEY_SCALE};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn draft(method: CalculationMethod, shared: Vec<SharedCostDraft>) -> ShipmentDraft {
        ShipmentDraft {
            name: "March container".into(),
            shipment_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            calculation_method: method,
            base_currency: "USD".into(),
            exchange_rate: dec!(1),
            created_by: None,
            items: vec![
                ItemDraft {
                    product_id: Uuid::new_v4(),
                    item_name: "Chair".into(),
                    quantity: dec!(10),
                    unit_cost: dec!(20),
                    weight: None,
                },
                ItemDraft {
                    product_id: Uuid::new_v4(),
                    item_name: "Lamp".into(),
                    quantity: dec!(5),
                    unit_cost: dec!(10),
                    weight: None,
                },
            ],
            shared_costs: shared,
        }
    }

    fn freight(amount: Decimal) -> SharedCostDraft {
        SharedCostDraft {
            expense_category_id: Uuid::new_v4(),
            description: "Freight".into(),
            amount,
            manual_allocations: None,
        }
    }

    #[test]
    fn proportional_freight_scenario() {
        let result = calculate(
            &draft(CalculationMethod::Proportional, vec![freight(dec!(50))]),
            ManualAllocationPolicy::default(),
        )
        .unwrap();

        assert_eq!(result.items[0].allocated_shared_cost, dec!(40));
        assert_eq!(result.items[0].total_landed_cost, dec!(240));
        assert_eq!(result.items[0].landed_cost_per_unit, dec!(24));
        assert_eq!(result.items[0].percentage_share, dec!(0.8));
        assert_eq!(result.items[1].allocated_shared_cost, dec!(10));
        assert_eq!(result.items[1].total_landed_cost, dec!(60));
        assert_eq!(result.items[1].landed_cost_per_unit, dec!(12));
        assert_eq!(result.totals.total_base_cost, dec!(250));
        assert_eq!(result.totals.total_shared_cost, dec!(50));
        assert_eq!(result.totals.total_landed_cost, dec!(300));
    }

    #[test]
    fn equal_split_scenario() {
        let result = calculate(
            &draft(CalculationMethod::Equal, vec![freight(dec!(100))]),
            ManualAllocationPolicy::default(),
        )
        .unwrap();

        assert_eq!(result.items[0].allocated_shared_cost, dec!(50));
        assert_eq!(result.items[1].allocated_shared_cost, dec!(50));
    }

    #[test]
    fn manual_override_scenario() {
        let mut cost = freight(dec!(90));
        cost.manual_allocations = Some(BTreeMap::from([(0, dec!(70)), (1, dec!(20))]));

        let result = calculate(
            &draft(CalculationMethod::Proportional, vec![cost]),
            ManualAllocationPolicy::default(),
        )
        .unwrap();

        assert_eq!(result.items[0].allocated_shared_cost, dec!(70));
        assert_eq!(result.items[1].allocated_shared_cost, dec!(20));
        assert!(result.shared_costs[0]
            .allocations
            .iter()
            .all(|a| a.is_manual_override));
    }

    #[test]
    fn weight_based_without_weights_allocates_nothing() {
        let result = calculate(
            &draft(CalculationMethod::WeightBased, vec![freight(dec!(50))]),
            ManualAllocationPolicy::default(),
        )
        .unwrap();

        assert!(result
            .items
            .iter()
            .all(|item| item.allocated_shared_cost.is_zero()));
        assert_eq!(result.items[0].landed_cost_per_unit, dec!(20));
        assert_eq!(result.totals.total_shared_cost, dec!(50));
        assert_eq!(result.totals.total_landed_cost, dec!(300));
    }

    #[test]
    fn zero_value_shipment_has_zero_shares() {
        let mut input = draft(CalculationMethod::Equal, vec![freight(dec!(10))]);
        for item in &mut input.items {
            item.unit_cost = Decimal::ZERO;
        }

        let result = calculate(&input, ManualAllocationPolicy::default()).unwrap();
        assert!(result.items.iter().all(|i| i.percentage_share.is_zero()));
        assert_eq!(result.items[0].landed_cost_per_unit, dec!(0.5));
        assert_eq!(result.items[1].landed_cost_per_unit, dec!(1));
    }

    #[test]
    fn calculation_is_deterministic() {
        let input = draft(CalculationMethod::QuantityBased, vec![freight(dec!(33.33))]);
        let first = calculate(&input, ManualAllocationPolicy::default()).unwrap();
        let second = calculate(&input, ManualAllocationPolicy::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn two_products_sharing_freight_by_value() {
        let mut input = draft(CalculationMethod::Proportional, vec![freight(dec!(50))]);
        input.items[0].quantity = dec!(2);
        input.items[0].unit_cost = dec!(100);
        input.items[1].quantity = dec!(1);
        input.items[1].unit_cost = dec!(50);

        let result = calculate(&input, ManualAllocationPolicy::default()).unwrap();

        assert_eq!(result.items[0].allocated_shared_cost, dec!(40));
        assert_eq!(result.items[0].landed_cost_per_unit, dec!(120));
        assert_eq!(result.items[1].allocated_shared_cost, dec!(10));
        assert_eq!(result.items[1].landed_cost_per_unit, dec!(60));
        assert_eq!(result.totals.total_landed_cost, dec!(300));
    }

    #[test]
    fn uneven_split_is_rounded_to_money_scale() {
        let mut input = draft(CalculationMethod::Equal, vec![freight(dec!(100))]);
        input.items.push(ItemDraft {
            product_id: Uuid::new_v4(),
            item_name: "Rug".into(),
            quantity: dec!(3),
            unit_cost: dec!(7),
            weight: None,
        });

        let result = calculate(&input, ManualAllocationPolicy::default()).unwrap();

        let allocated: Vec<_> = result
            .items
            .iter()
            .map(|item| item.allocated_shared_cost)
            .collect();
        assert_eq!(allocated, vec![dec!(33.3334), dec!(33.3333), dec!(33.3333)]);
        assert_eq!(result.items[2].total_landed_cost, dec!(54.3333));
        assert_eq!(result.items[2].landed_cost_per_unit, dec!(18.1111));
        assert_eq!(result.items[0].percentage_share, dec!(0.738007));
        assert!(result
            .items
            .iter()
            .all(|item| item.landed_cost_per_unit.scale() <= MONEY_SCALE));
    }

    #[test]
    fn converted_total_uses_exchange_rate() {
        let mut input = draft(CalculationMethod::Proportional, vec![freight(dec!(50))]);
        input.exchange_rate = dec!(0.9);

        let result = calculate(&input, ManualAllocationPolicy::default()).unwrap();
        assert_eq!(result.totals.total_landed_cost_converted, dec!(333.3333));
    }

    #[test]
    fn per_unit_overflow_is_reported_instead_of_panicking() {
        let mut input = draft(CalculationMethod::Equal, vec![freight(dec!(50))]);
        input.items[0].quantity = Decimal::new(1, 28);

        let err = calculate(&input, ManualAllocationPolicy::default()).unwrap_err();
        let violations = err.violations().expect("field violations");
        assert_eq!(violations[0].field, "items[0].quantity");
    }
}
