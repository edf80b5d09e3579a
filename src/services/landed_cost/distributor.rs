use super::{
    strategy, CalculationMethod, CostAllocation, ItemDraft, SharedCostDistribution,
    SharedCostDraft, MONEY_SCALE,
};
use crate::errors::{FieldViolation, ServiceError};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// How manual allocations that do not add up to their cost's amount are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ManualAllocationPolicy {
    /// Reject a cost whose manual amounts differ from its amount by more than `tolerance`.
    Reject { tolerance: Decimal },
    /// Keep manual amounts as submitted.
    Accept,
}

impl ManualAllocationPolicy {
    pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
}

impl Default for ManualAllocationPolicy {
    fn default() -> Self {
        Self::Reject {
            tolerance: Self::DEFAULT_TOLERANCE,
        }
    }
}

/// Per-cost allocations plus each item's running total of allocated shared cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub shared_costs: Vec<SharedCostDistribution>,
    pub allocated_per_item: Vec<Decimal>,
}

/// Splits every shared cost across `items`.
///
/// Costs carrying a non-empty manual map use it verbatim (unmapped items get
/// zero); all other costs use the strategy fractions for `method`, rounded to
/// [`MONEY_SCALE`] so that each cost's allocations add up to its amount exactly.
pub fn distribute(
    items: &[ItemDraft],
    shared_costs: &[SharedCostDraft],
    method: CalculationMethod,
    policy: ManualAllocationPolicy,
) -> Result<Distribution, ServiceError> {
    let fractions = strategy::fractions(items, method);
    let mut allocated_per_item = vec![Decimal::ZERO; items.len()];
    let mut distributed = Vec::with_capacity(shared_costs.len());
    let mut violations = Vec::new();

    for (position, cost) in shared_costs.iter().enumerate() {
        let allocations: Vec<CostAllocation> = match cost.manual() {
            Some(manual) => {
                if let Some(out_of_range) = manual.keys().find(|&&idx| idx >= items.len()) {
                    return Err(ServiceError::Conflict(format!(
                        "shared_costs[{}].manual_allocations references item {} but the shipment has {} items",
                        position,
                        out_of_range,
                        items.len()
                    )));
                }

                if let ManualAllocationPolicy::Reject { tolerance } = policy {
                    let manual_total: Decimal = manual.values().sum();
                    if (manual_total - cost.amount).abs() > tolerance {
                        violations.push(FieldViolation::new(
                            format!("shared_costs[{}].manual_allocations", position),
                            format!(
                                "manual allocations total {} but the cost amount is {}",
                                manual_total.normalize(),
                                cost.amount.normalize()
                            ),
                        ));
                    }
                }

                (0..items.len())
                    .map(|item_position| CostAllocation {
                        item_position,
                        allocated_amount: manual
                            .get(&item_position)
                            .copied()
                            .unwrap_or(Decimal::ZERO),
                        is_manual_override: true,
                    })
                    .collect()
            }
            None => split(cost.amount, &fractions)
                .into_iter()
                .enumerate()
                .map(|(item_position, allocated_amount)| CostAllocation {
                    item_position,
                    allocated_amount,
                    is_manual_override: false,
                })
                .collect(),
        };

        for allocation in &allocations {
            allocated_per_item[allocation.item_position] += allocation.allocated_amount;
        }

        distributed.push(SharedCostDistribution {
            position,
            expense_category_id: cost.expense_category_id,
            description: cost.description.clone(),
            amount: cost.amount,
            is_manual: cost.manual().is_some(),
            allocations,
        });
    }

    if !violations.is_empty() {
        return Err(ServiceError::InvalidFields(violations));
    }

    Ok(Distribution {
        shared_costs: distributed,
        allocated_per_item,
    })
}

/// Truncates every share to the money scale and gives what is left over to the
/// item with the largest fraction (the first one on a tie). Nothing is handed
/// out when every fraction is zero.
fn split(amount: Decimal, fractions: &[Decimal]) -> Vec<Decimal> {
    let mut shares: Vec<Decimal> = fractions
        .iter()
        .map(|fraction| {
            (*fraction * amount)
                .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero)
                .normalize()
        })
        .collect();

    let mut largest: Option<usize> = None;
    for (idx, fraction) in fractions.iter().enumerate() {
        if fraction.is_zero() {
            continue;
        }
        if largest.map_or(true, |best| *fraction > fractions[best]) {
            largest = Some(idx);
        }
    }

    if let Some(idx) = largest {
        let remainder = amount - shares.iter().copied().sum::<Decimal>();
        shares[idx] = (shares[idx] + remainder).normalize();
    }
    shares
}
