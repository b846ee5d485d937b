//! Property-based tests for normalization and the reorder arithmetic.
//!
//! These tests use proptest to verify invariants across a wide range of inputs,
//! helping to catch edge cases that unit tests might miss.

use posabit_reorder::{
    models::{InventoryLevel, ReorderParams, ReorderRow},
    services::{
        normalizer::{normalize_event, normalize_line},
        ranking::rank,
        reorder::reorder_row,
    },
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Map, Value};

// Strategies for generating test data
fn sku_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{1,4}-[0-9]{1,5}".prop_map(|s| s)
}

fn quantity_strategy() -> impl Strategy<Value = i64> {
    -50i64..500
}

fn params_strategy() -> impl Strategy<Value = ReorderParams> {
    (1i64..120, 0i64..60, 0i64..30)
        .prop_map(|(lookback, lead, safety)| ReorderParams::clamped(lookback, lead, safety))
}

/// Builds an object with the given entries inserted in the given order
fn object_in_order(entries: &[(String, Value)]) -> Value {
    let mut map = Map::new();
    for (key, value) in entries {
        map.insert(key.clone(), value.clone());
    }
    Value::Object(map)
}

// Property: field resolution does not depend on key order
proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn key_order_does_not_change_the_result(
        sku in sku_strategy(),
        other_sku in sku_strategy(),
        qty in 1i64..1000,
        shuffle in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
    ) {
        let entries = vec![
            ("SKU".to_string(), json!(other_sku)),
            ("product".to_string(), json!({"sku": sku, "name": "Named"})),
            ("qty".to_string(), json!(qty + 1)),
            ("quantity".to_string(), json!(qty)),
        ];
        let reordered: Vec<_> = shuffle.iter().map(|&i| entries[i].clone()).collect();

        let expected = normalize_line(&object_in_order(&entries));
        let actual = normalize_line(&object_in_order(&reordered));

        prop_assert_eq!(&actual, &expected);
        let line = actual.unwrap();
        prop_assert_eq!(line.sku, sku);
        prop_assert_eq!(line.qty, Decimal::from(qty));
    }

    #[test]
    fn lines_are_kept_exactly_when_sku_and_positive_qty(
        sku in prop_oneof![Just(String::new()), Just("   ".to_string()), sku_strategy()],
        qty in quantity_strategy(),
    ) {
        let line = normalize_line(&json!({"sku": sku, "quantity": qty}));
        let should_keep = !sku.trim().is_empty() && qty > 0;
        prop_assert_eq!(line.is_some(), should_keep);
        if let Some(line) = line {
            prop_assert!(line.qty > Decimal::ZERO);
            prop_assert!(!line.sku.is_empty());
        }
    }

    #[test]
    fn normalized_plus_rejected_covers_every_item(
        items in prop::collection::vec((sku_strategy(), quantity_strategy()), 0..20),
    ) {
        let payload: Vec<Value> = items
            .iter()
            .map(|(sku, qty)| json!({"sku": sku, "qty": qty}))
            .collect();
        let sale = normalize_event(&json!({"sale": {"id": "S", "line_items": payload}}));
        prop_assert_eq!(sale.lines.len() + sale.rejected, items.len());
        prop_assert_eq!(sale.lines.len(), items.iter().filter(|(_, qty)| *qty > 0).count());
    }
}

// Property: reorder arithmetic invariants
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn order_qty_is_the_shortfall_against_target(
        total in 0i64..5_000,
        on_hand in -100i64..5_000,
        params in params_strategy(),
    ) {
        let inventory = InventoryLevel::new("A", Decimal::from(on_hand));
        let row = reorder_row("A", Decimal::from(total), Some(&inventory), None, &params);

        prop_assert!(row.order_qty >= 0);
        prop_assert!(row.target_stock >= 0);
        prop_assert_eq!(row.order_qty, (row.target_stock - on_hand).max(0));
        prop_assert_eq!(row.reorder_point_days, params.lead_time_days + params.safety_days);
    }

    #[test]
    fn supply_is_null_exactly_without_sales(
        total in 0i64..1_000,
        on_hand in 0i64..1_000,
        params in params_strategy(),
    ) {
        let inventory = InventoryLevel::new("A", Decimal::from(on_hand));
        let row = reorder_row("A", Decimal::from(total), Some(&inventory), None, &params);
        prop_assert_eq!(row.days_of_supply.is_none(), total == 0);
        if total == 0 {
            prop_assert_eq!(row.order_qty, 0);
            prop_assert_eq!(row.target_stock, 0);
        }
    }

    #[test]
    fn ranking_is_ordered_by_supply_then_quantity(
        specs in prop::collection::vec((prop::option::of(0u32..200), 0i64..100), 0..30),
    ) {
        let mut rows: Vec<ReorderRow> = specs
            .iter()
            .enumerate()
            .map(|(i, (dos, qty))| ReorderRow {
                sku: format!("S{}", i),
                name: None,
                vendor: None,
                on_hand: Decimal::ZERO,
                daily_rate: Decimal::ZERO,
                days_of_supply: dos.map(|d| Decimal::new(i64::from(d), 1)),
                reorder_point_days: 10,
                target_stock: 0,
                order_qty: *qty,
                unit_cost: None,
                est_cost: None,
                last_inventory_update: None,
            })
            .collect();
        rank(&mut rows);

        for pair in rows.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            match (a.days_of_supply, b.days_of_supply) {
                (Some(x), Some(y)) => {
                    prop_assert!(x <= y);
                    if x == y {
                        prop_assert!(a.order_qty >= b.order_qty);
                    }
                }
                (None, Some(_)) => prop_assert!(false, "null supply ranked before a number"),
                (None, None) => prop_assert!(a.order_qty >= b.order_qty),
                (Some(_), None) => {}
            }
        }
    }
}

#[test]
fn ranking_example_from_the_report_contract() {
    let specs = [(None, 5), (Some(dec!(2.0)), 10), (Some(dec!(2.0)), 20), (Some(dec!(0.5)), 1)];
    let mut rows: Vec<ReorderRow> = specs
        .iter()
        .enumerate()
        .map(|(i, (dos, qty))| ReorderRow {
            sku: format!("R{}", i),
            name: None,
            vendor: None,
            on_hand: Decimal::ZERO,
            daily_rate: Decimal::ZERO,
            days_of_supply: *dos,
            reorder_point_days: 10,
            target_stock: 0,
            order_qty: *qty,
            unit_cost: None,
            est_cost: None,
            last_inventory_update: None,
        })
        .collect();

    rank(&mut rows);
    let order: Vec<(Option<Decimal>, i64)> =
        rows.iter().map(|r| (r.days_of_supply, r.order_qty)).collect();
    assert_eq!(
        order,
        vec![
            (Some(dec!(0.5)), 1),
            (Some(dec!(2.0)), 20),
            (Some(dec!(2.0)), 10),
            (None, 5)
        ]
    );
}
