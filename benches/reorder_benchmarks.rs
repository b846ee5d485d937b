use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use posabit_reorder::{
    models::{InventoryLevel, ProductRecord, ReorderParams, SalesLine},
    services::{
        demand::aggregate_demand, normalizer::normalize_event, ranking::rank,
        reorder::compute_reorder_rows,
    },
};
use rust_decimal::Decimal;
use serde_json::json;

fn catalog(skus: usize) -> (Vec<SalesLine>, Vec<InventoryLevel>, Vec<ProductRecord>) {
    let sales = (0..skus * 8)
        .map(|i| SalesLine {
            sku: Some(format!("SKU-{}", i % skus)),
            qty: Some(Decimal::from(1 + (i % 5) as i64)),
        })
        .collect();
    let inventory = (0..skus)
        .map(|i| InventoryLevel::new(format!("SKU-{}", i), Decimal::from((i % 40) as i64)))
        .collect();
    let products = (0..skus)
        .map(|i| ProductRecord::new(format!("SKU-{}", i)).with_cost(Decimal::new(1999, 2)))
        .collect();
    (sales, inventory, products)
}

// Benchmark for the full aggregate, compute and rank pipeline
fn reorder_report_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder_report");
    let params = ReorderParams::default();

    for skus in [100usize, 1_000, 10_000].iter() {
        let (sales, inventory, products) = catalog(*skus);
        group.bench_with_input(BenchmarkId::from_parameter(skus), skus, |b, _| {
            b.iter(|| {
                let demand = aggregate_demand(black_box(&sales));
                let mut rows = compute_reorder_rows(&demand, &inventory, &products, &params);
                rank(&mut rows);
                black_box(rows)
            });
        });
    }

    group.finish();
}

// Benchmark for webhook normalization
fn normalization_benchmark(c: &mut Criterion) {
    let items: Vec<_> = (0..25)
        .map(|i| {
            json!({
                "quantity": i % 4,
                "product": {"sku": format!("SKU-{}", i), "name": "Blue Dream 3.5g", "brand": "Green Co"}
            })
        })
        .collect();
    let event = json!({"sale": {"id": 98123, "line_items": items}});

    c.bench_function("normalize_event_25_lines", |b| {
        b.iter(|| black_box(normalize_event(black_box(&event))))
    });
}

criterion_group!(benches, reorder_report_benchmark, normalization_benchmark);
criterion_main!(benches);
