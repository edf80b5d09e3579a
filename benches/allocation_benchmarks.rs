use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use landed_cost_api::services::landed_cost::{
    calculate, CalculationMethod, ItemDraft, ManualAllocationPolicy, SharedCostDraft,
    ShipmentDraft,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use uuid::Uuid;

fn shipment(items: usize, method: CalculationMethod, manual: bool) -> ShipmentDraft {
    let items: Vec<ItemDraft> = (0..items)
        .map(|i| ItemDraft {
            product_id: Uuid::new_v4(),
            item_name: format!("item-{}", i),
            quantity: Decimal::from(1 + i % 7),
            unit_cost: Decimal::new(1_000 + (i as i64 * 37) % 5_000, 2),
            weight: (i % 5 != 0).then(|| Decimal::new(10 + i as i64 % 90, 1)),
        })
        .collect();

    let mut shared_costs = vec![
        SharedCostDraft {
            expense_category_id: Uuid::new_v4(),
            description: "Ocean freight".into(),
            amount: Decimal::new(125_000, 2),
            manual_allocations: None,
        },
        SharedCostDraft {
            expense_category_id: Uuid::new_v4(),
            description: "Insurance".into(),
            amount: Decimal::new(8_750, 2),
            manual_allocations: None,
        },
    ];
    if manual {
        let share = Decimal::new(30_000, 2) / Decimal::from(items.len());
        let map: BTreeMap<usize, Decimal> = (0..items.len()).map(|i| (i, share)).collect();
        shared_costs.push(SharedCostDraft {
            expense_category_id: Uuid::new_v4(),
            description: "Customs duty".into(),
            amount: share * Decimal::from(items.len()),
            manual_allocations: Some(map),
        });
    }

    ShipmentDraft {
        name: "bench".into(),
        shipment_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default(),
        calculation_method: method,
        base_currency: "USD".into(),
        exchange_rate: Decimal::ONE,
        created_by: None,
        items,
        shared_costs,
    }
}

fn calculation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("landed_cost_calculate");

    for method in [
        CalculationMethod::Proportional,
        CalculationMethod::Equal,
        CalculationMethod::WeightBased,
        CalculationMethod::QuantityBased,
    ] {
        for size in [10usize, 100, 1_000] {
            let draft = shipment(size, method, false);
            group.bench_with_input(
                BenchmarkId::new(method.to_string(), size),
                &draft,
                |b, draft| {
                    b.iter(|| calculate(black_box(draft), ManualAllocationPolicy::default()))
                },
            );
        }
    }

    group.finish();
}

fn manual_override_benchmark(c: &mut Criterion) {
    let draft = shipment(250, CalculationMethod::Proportional, true);
    c.bench_function("landed_cost_calculate_manual_250", |b| {
        b.iter(|| calculate(black_box(&draft), ManualAllocationPolicy::Accept))
    });
}

criterion_group!(benches, calculation_benchmark, manual_override_benchmark);
criterion_main!(benches);
