use super::{CalculationMethod, ItemDraft};
use rust_decimal::Decimal;

/// Per-item fractions of a shared cost under `method`.
///
/// The result always has one entry per item, every entry is non-negative, and
/// the entries sum to one whenever the method's base is non-zero. A zero base
/// (all values zero, no weights) yields all zeros rather than dividing by zero.
pub fn fractions(items: &[ItemDraft], method: CalculationMethod) -> Vec<Decimal> {
    match method {
        CalculationMethod::Proportional => {
            normalize(items.iter().map(ItemDraft::total_item_cost).collect())
        }
        CalculationMethod::Equal => {
            if items.is_empty() {
                return Vec::new();
            }
            let share = Decimal::ONE / Decimal::from(items.len());
            vec![share; items.len()]
        }
        CalculationMethod::WeightBased => normalize(
            items
                .iter()
                .map(|item| item.weight.unwrap_or(Decimal::ZERO))
                .collect(),
        ),
        CalculationMethod::QuantityBased => {
            normalize(items.iter().map(|item| item.quantity).collect())
        }
    }
}

fn normalize(bases: Vec<Decimal>) -> Vec<Decimal> {
    let total: Decimal = bases.iter().sum();
    if total <= Decimal::ZERO {
        return vec![Decimal::ZERO; bases.len()];
    }
    bases
        .into_iter()
        .map(|base| (base.max(Decimal::ZERO) / total).normalize())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn item(quantity: Decimal, unit_cost: Decimal, weight: Option<Decimal>) -> ItemDraft {
        ItemDraft {
            product_id: Uuid::new_v4(),
            item_name: "widget".into(),
            quantity,
            unit_cost,
            weight,
        }
    }

    #[test]
    fn proportional_follows_item_value() {
        let items = vec![item(dec!(10), dec!(20), None), item(dec!(5), dec!(10), None)];
        assert_eq!(
            fractions(&items, CalculationMethod::Proportional),
            vec![dec!(0.8), dec!(0.2)]
        );
    }

    #[test]
    fn equal_splits_evenly() {
        let items = vec![item(dec!(1), dec!(500), None), item(dec!(3), dec!(1), None)];
        assert_eq!(
            fractions(&items, CalculationMethod::Equal),
            vec![dec!(0.5), dec!(0.5)]
        );
    }

    #[test]
    fn quantity_based_ignores_price() {
        let items = vec![item(dec!(3), dec!(100), None), item(dec!(1), dec!(1), None)];
        assert_eq!(
            fractions(&items, CalculationMethod::QuantityBased),
            vec![dec!(0.75), dec!(0.25)]
        );
    }

    #[test]
    fn weight_based_treats_missing_weight_as_zero() {
        let items = vec![
            item(dec!(1), dec!(1), Some(dec!(30))),
            item(dec!(1), dec!(1), None),
            item(dec!(1), dec!(1), Some(dec!(10))),
        ];
        assert_eq!(
            fractions(&items, CalculationMethod::WeightBased),
            vec![dec!(0.75), dec!(0), dec!(0.25)]
        );
    }

    #[rstest]
    #[case(CalculationMethod::Proportional, vec![item(dec!(2), dec!(0), None), item(dec!(1), dec!(0), None)])]
    #[case(CalculationMethod::WeightBased, vec![item(dec!(2), dec!(5), None), item(dec!(1), dec!(5), Some(dec!(0)))])]
    fn zero_base_yields_zero_fractions(#[case] method: CalculationMethod, #[case] items: Vec<ItemDraft>) {
        let result = fractions(&items, method);
        assert_eq!(result.len(), items.len());
        assert!(result.iter().all(|f| f.is_zero()));
    }

    #[test]
    fn equal_with_no_items_is_empty() {
        assert!(fractions(&[], CalculationMethod::Equal).is_empty());
    }

    #[test]
    fn thirds_sum_to_one_within_decimal_precision() {
        let items = vec![
            item(dec!(1), dec!(1), None),
            item(dec!(1), dec!(1), None),
            item(dec!(1), dec!(1), None),
        ];
        let total: Decimal = fractions(&items, CalculationMethod::Equal).iter().sum();
        assert!((total - Decimal::ONE).abs() < dec!(0.000000000001));
    }
}
