//! Timeline projection tests: running-balance closure, stockout and reorder
//! detection, and the same-day ordering policy.

use chrono::{NaiveDate, TimeZone, Utc};
use fabplan_api::services::material_timeline::{
    project_timeline, ConsumptionCommitment, TieBreak, TimelineEventKind,
};
use fabplan_api::services::supply_ledger::IncomingSupplyEntry;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn incoming(pending: Decimal, arrival: NaiveDate) -> IncomingSupplyEntry {
    IncomingSupplyEntry {
        item_id: 7,
        po_header_id: 1,
        po_line_id: 11,
        po_number: "PO-0001".to_string(),
        vendor_id: None,
        pending_quantity: pending,
        unit_price: None,
        expected_arrival_date: Some(arrival),
        line_created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
    }
}

fn consuming(id: i64, quantity: Decimal, date: NaiveDate) -> ConsumptionCommitment {
    ConsumptionCommitment {
        production_order_id: id,
        order_number: format!("WO-{:04}", id),
        quantity,
        planned_date: Some(date),
    }
}

#[test]
fn stockout_lands_on_first_nonpositive_balance() {
    // current 10, consume 3 on day 2 and 8 on day 5: 10 -> 7 -> -1
    let timeline = project_timeline(
        7,
        "MAT-7",
        Some("EA".to_string()),
        dec!(10),
        None,
        &[],
        &[consuming(1, dec!(3), day(2)), consuming(2, dec!(8), day(5))],
        day(1),
        30,
        TieBreak::default(),
    );

    assert_eq!(timeline.projected_stockout, Some(day(5)));
    let balances: Vec<Decimal> = timeline.events.iter().map(|e| e.balance_after).collect();
    assert_eq!(balances, vec![dec!(10), dec!(7), dec!(-1)]);
}

#[test]
fn reorder_date_never_follows_stockout() {
    // Whenever both dates exist, the reorder suggestion must not come later
    // than the projected stockout.
    let cases: Vec<(Decimal, Option<Decimal>)> = vec![
        (dec!(10), Some(dec!(8))),
        (dec!(10), Some(dec!(2))),
        (dec!(5), Some(dec!(5))),
        (dec!(3), Some(dec!(0))),
    ];

    for (start, threshold) in cases {
        let timeline = project_timeline(
            7,
            "MAT-7",
            None,
            start,
            threshold,
            &[incoming(dec!(2), day(4))],
            &[consuming(1, dec!(6), day(3)), consuming(2, dec!(9), day(6))],
            day(1),
            30,
            TieBreak::default(),
        );
        if let (Some(reorder), Some(stockout)) =
            (timeline.suggested_reorder_date, timeline.projected_stockout)
        {
            assert!(
                reorder <= stockout,
                "reorder {} after stockout {} (start {}, threshold {:?})",
                reorder,
                stockout,
                start,
                threshold
            );
        }
    }
}

#[test]
fn reorder_uses_min_stock_when_reorder_point_unset() {
    // The service passes reorder_point.or(min_stock); at this layer the
    // threshold is whatever that fallback produced.
    let timeline = project_timeline(
        7,
        "MAT-7",
        None,
        dec!(10),
        Some(dec!(7)), // min_stock standing in for the unset reorder point
        &[],
        &[consuming(1, dec!(4), day(3))],
        day(1),
        30,
        TieBreak::default(),
    );
    assert_eq!(timeline.suggested_reorder_date, Some(day(3)));
}

#[test]
fn balance_already_below_threshold_suggests_reordering_today() {
    let timeline = project_timeline(
        7,
        "MAT-7",
        None,
        dec!(3),
        Some(dec!(5)),
        &[],
        &[],
        day(1),
        30,
        TieBreak::default(),
    );
    assert_eq!(timeline.suggested_reorder_date, Some(day(1)));
    assert_eq!(timeline.projected_stockout, None);
}

#[test]
fn depleted_item_stocks_out_now() {
    let timeline = project_timeline(
        7,
        "MAT-7",
        None,
        dec!(0),
        None,
        &[incoming(dec!(5), day(9))],
        &[],
        day(1),
        30,
        TieBreak::default(),
    );
    assert_eq!(timeline.projected_stockout, Some(day(1)));
}

#[test]
fn quiet_horizon_returns_only_the_current_event() {
    let timeline = project_timeline(
        7,
        "MAT-7",
        None,
        dec!(20),
        Some(dec!(5)),
        &[],
        &[],
        day(1),
        30,
        TieBreak::default(),
    );
    assert_eq!(timeline.events.len(), 1);
    assert_eq!(timeline.events[0].kind, TimelineEventKind::Current);
    assert!(timeline.projected_stockout.is_none());
    assert!(timeline.suggested_reorder_date.is_none());
}

// The same-day INCOMING/CONSUMPTION order is an explicit policy assumption
// (the upstream system never documented one); both orders must stay
// internally consistent.
#[rstest]
#[case(TieBreak::IncomingBeforeConsumption, vec![dec!(2), dec!(7), dec!(2)], None)]
#[case(TieBreak::ConsumptionBeforeIncoming, vec![dec!(2), dec!(-3), dec!(2)], Some(3))]
fn same_day_tie_break_is_a_configurable_policy(
    #[case] tie_break: TieBreak,
    #[case] expected_balances: Vec<Decimal>,
    #[case] stockout_day: Option<u32>,
) {
    let timeline = project_timeline(
        7,
        "MAT-7",
        None,
        dec!(2),
        None,
        &[incoming(dec!(5), day(3))],
        &[consuming(1, dec!(5), day(3))],
        day(1),
        30,
        tie_break,
    );

    let balances: Vec<Decimal> = timeline.events.iter().map(|e| e.balance_after).collect();
    assert_eq!(balances, expected_balances);
    assert_eq!(timeline.projected_stockout, stockout_day.map(day));
}

#[test]
fn final_balance_equals_start_plus_signed_sum() {
    let supply = vec![incoming(dec!(6), day(4)), incoming(dec!(2), day(10))];
    let consumption = vec![
        consuming(1, dec!(5), day(2)),
        consuming(2, dec!(3), day(7)),
        consuming(3, dec!(4), day(12)),
    ];
    let timeline = project_timeline(
        7,
        "MAT-7",
        None,
        dec!(9),
        None,
        &supply,
        &consumption,
        day(1),
        30,
        TieBreak::default(),
    );

    let signed_sum: Decimal = timeline.events.iter().skip(1).map(|e| e.quantity).sum();
    assert_eq!(
        timeline.events.last().unwrap().balance_after,
        dec!(9) + signed_sum
    );
    assert_eq!(signed_sum, dec!(6) + dec!(2) - dec!(5) - dec!(3) - dec!(4));
}

#[test]
fn event_descriptions_reference_their_sources() {
    let timeline = project_timeline(
        7,
        "MAT-7",
        None,
        dec!(10),
        None,
        &[incoming(dec!(6), day(4))],
        &[consuming(41, dec!(5), day(6))],
        day(1),
        30,
        TieBreak::default(),
    );

    assert_eq!(timeline.events[1].source_ref.as_deref(), Some("po_line:11"));
    assert_eq!(
        timeline.events[2].source_ref.as_deref(),
        Some("production_order:41")
    );
}
