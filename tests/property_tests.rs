//! Property-based tests for the planning engines.
//!
//! These verify the engine-wide invariants across a wide range of generated
//! snapshots: allocation never oversells, input order never changes the
//! outcome, and timeline balances always close.

use std::collections::HashMap;

use chrono::{NaiveDate, TimeZone, Utc};
use fabplan_api::services::fulfillment::{
    forecast_allocation, DemandLineSnapshot, DemandOrderSnapshot, Priority,
};
use fabplan_api::services::material_timeline::{
    project_timeline, ConsumptionCommitment, TieBreak,
};
use fabplan_api::services::supply_ledger::IncomingSupplyEntry;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap() + chrono::Duration::days(d as i64)
}

fn priority_from_index(index: u8) -> Priority {
    match index % 3 {
        0 => Priority::High,
        1 => Priority::Medium,
        _ => Priority::Low,
    }
}

// Strategies for generating snapshots

fn on_hand_strategy() -> impl Strategy<Value = HashMap<i64, Decimal>> {
    prop::collection::hash_map(1i64..=8, 0i64..=100, 0..8)
        .prop_map(|m| m.into_iter().map(|(k, v)| (k, Decimal::from(v))).collect())
}

fn orders_strategy() -> impl Strategy<Value = Vec<DemandOrderSnapshot>> {
    prop::collection::vec(
        (
            0u8..3,
            0u32..60,
            prop::collection::hash_map(1i64..=8, 1i64..=60, 0..5),
        ),
        0..8,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(index, (priority, minute, lines))| {
                let mut lines: Vec<(i64, i64)> = lines.into_iter().collect();
                lines.sort();
                DemandOrderSnapshot {
                    order_id: index as i64 + 1,
                    order_number: format!("SO-{:04}", index + 1),
                    customer_name: None,
                    priority: priority_from_index(priority),
                    created_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, minute, 0).unwrap(),
                    lines: lines
                        .into_iter()
                        .map(|(item_id, quantity)| DemandLineSnapshot {
                            item_id,
                            required_quantity: Decimal::from(quantity),
                            unit_price: None,
                        })
                        .collect(),
                }
            })
            .collect()
    })
}

fn supply_strategy() -> impl Strategy<Value = Vec<IncomingSupplyEntry>> {
    prop::collection::vec((1i64..=8, 1i64..=80, prop::option::of(0u32..40)), 0..6).prop_map(
        |raw| {
            raw.into_iter()
                .enumerate()
                .map(|(index, (item_id, pending, arrival))| IncomingSupplyEntry {
                    item_id,
                    po_header_id: 1,
                    po_line_id: index as i64 + 1,
                    po_number: "PO-0001".to_string(),
                    vendor_id: None,
                    pending_quantity: Decimal::from(pending),
                    unit_price: None,
                    expected_arrival_date: arrival.map(day),
                    line_created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
                })
                .collect()
        },
    )
}

/// Allocated quantity per item, reconstructed from inputs and shortages.
fn allocated_per_item(
    orders: &[DemandOrderSnapshot],
    results: &[fabplan_api::services::fulfillment::OrderFulfillment],
) -> HashMap<i64, Decimal> {
    let mut allocated: HashMap<i64, Decimal> = HashMap::new();
    for order in orders {
        let result = results
            .iter()
            .find(|r| r.order_id == order.order_id)
            .expect("every order yields a result");
        for line in &order.lines {
            let short = result
                .shortages
                .iter()
                .find(|s| s.item_id == line.item_id)
                .map(|s| s.shortage_quantity)
                .unwrap_or(Decimal::ZERO);
            *allocated.entry(line.item_id).or_insert(Decimal::ZERO) +=
                line.required_quantity - short;
        }
    }
    allocated
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // The central invariant: no item is ever allocated beyond its starting
    // on-hand quantity, whatever the demand mix looks like.
    #[test]
    fn allocation_never_oversells(
        on_hand in on_hand_strategy(),
        orders in orders_strategy(),
        supply in supply_strategy(),
    ) {
        let results = forecast_allocation(on_hand.clone(), orders.clone(), &supply, day(0));
        prop_assert_eq!(results.len(), orders.len());

        for (item_id, allocated) in allocated_per_item(&orders, &results) {
            let initial = on_hand.get(&item_id).copied().unwrap_or(Decimal::ZERO)
                .max(Decimal::ZERO);
            prop_assert!(
                allocated <= initial,
                "item {} allocated {} of {}",
                item_id,
                allocated,
                initial
            );
            prop_assert!(allocated >= Decimal::ZERO);
        }
    }

    // Feeding the allocator the same snapshot in any input order produces
    // identical output: ordering comes from the priority policy, not the vec.
    #[test]
    fn input_order_does_not_change_the_forecast(
        on_hand in on_hand_strategy(),
        orders in orders_strategy(),
        supply in supply_strategy(),
    ) {
        let forward = forecast_allocation(on_hand.clone(), orders.clone(), &supply, day(0));
        let mut reversed_input = orders;
        reversed_input.reverse();
        let reversed = forecast_allocation(on_hand, reversed_input, &supply, day(0));

        prop_assert_eq!(
            serde_json::to_string(&forward).unwrap(),
            serde_json::to_string(&reversed).unwrap()
        );
    }

    #[test]
    fn ready_percentage_stays_within_bounds(
        on_hand in on_hand_strategy(),
        orders in orders_strategy(),
    ) {
        let results = forecast_allocation(on_hand, orders, &[], day(0));
        for result in results {
            prop_assert!(result.ready_percentage <= 100);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Timeline closure: every balance is the opening balance plus the signed
    // prefix sum, and the final balance is the total.
    #[test]
    fn timeline_balances_close(
        start in -20i64..=100,
        supply in supply_strategy(),
        consumption in prop::collection::vec((1i64..=50, 0u32..40), 0..8),
    ) {
        let start = Decimal::from(start);
        let consumption: Vec<ConsumptionCommitment> = consumption
            .into_iter()
            .enumerate()
            .map(|(index, (quantity, date))| ConsumptionCommitment {
                production_order_id: index as i64 + 1,
                order_number: format!("WO-{:04}", index + 1),
                quantity: Decimal::from(quantity),
                planned_date: Some(day(date)),
            })
            .collect();

        let timeline = project_timeline(
            3,
            "MAT-3",
            None,
            start,
            None,
            &supply,
            &consumption,
            day(0),
            60,
            TieBreak::default(),
        );

        let mut running = Decimal::ZERO;
        for event in &timeline.events {
            running += event.quantity;
            prop_assert_eq!(event.balance_after, running);
        }

        let expected_total: Decimal = start
            + supply
                .iter()
                .filter(|e| e.item_id == 3 && e.expected_arrival_date.is_some())
                .map(|e| e.pending_quantity)
                .sum::<Decimal>()
            - consumption.iter().map(|c| c.quantity).sum::<Decimal>();
        prop_assert_eq!(timeline.events.last().unwrap().balance_after, expected_total);
    }

    // Whenever both dates exist, reordering is never suggested after the
    // projected stockout.
    #[test]
    fn reorder_precedes_stockout(
        start in 0i64..=60,
        threshold in 0i64..=30,
        supply in supply_strategy(),
        consumption in prop::collection::vec((1i64..=50, 0u32..40), 0..8),
    ) {
        let consumption: Vec<ConsumptionCommitment> = consumption
            .into_iter()
            .enumerate()
            .map(|(index, (quantity, date))| ConsumptionCommitment {
                production_order_id: index as i64 + 1,
                order_number: format!("WO-{:04}", index + 1),
                quantity: Decimal::from(quantity),
                planned_date: Some(day(date)),
            })
            .collect();

        let timeline = project_timeline(
            3,
            "MAT-3",
            None,
            Decimal::from(start),
            Some(Decimal::from(threshold)),
            &supply,
            &consumption,
            day(0),
            60,
            TieBreak::default(),
        );

        if let (Some(reorder), Some(stockout)) =
            (timeline.suggested_reorder_date, timeline.projected_stockout)
        {
            prop_assert!(reorder <= stockout);
        }
    }
}
