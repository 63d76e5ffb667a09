//! Material timeline projection: merges the current balance, pending inbound
//! supply, and scheduled production consumption for one item into a single
//! chronological ledger, then derives the first projected stockout and the
//! first reorder-threshold breach.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::instrument;

use crate::db::DbPool;
use crate::entities::item_master;
use crate::errors::ServiceError;
use crate::queries::planning_queries::{GetConsumptionForItemQuery, GetItemQuery, GetOnHandBalancesQuery};
use crate::queries::Query;
use crate::services::supply_ledger::{IncomingSupplyEntry, SupplyFilters, SupplyLedgerService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineEventKind {
    Current,
    Incoming,
    Consumption,
}

/// Ordering policy for an arrival and a consumption falling on the same day.
///
/// The projector defaults to booking arrivals first, which is the
/// conservative reading for stockout projection: a same-day arrival is
/// assumed usable by that day's consumption. Callers modeling end-of-day
/// receiving can flip it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TieBreak {
    #[default]
    IncomingBeforeConsumption,
    ConsumptionBeforeIncoming,
}

impl TieBreak {
    fn rank(self, kind: TimelineEventKind) -> u8 {
        match (self, kind) {
            (_, TimelineEventKind::Current) => 0,
            (TieBreak::IncomingBeforeConsumption, TimelineEventKind::Incoming) => 1,
            (TieBreak::IncomingBeforeConsumption, TimelineEventKind::Consumption) => 2,
            (TieBreak::ConsumptionBeforeIncoming, TimelineEventKind::Consumption) => 1,
            (TieBreak::ConsumptionBeforeIncoming, TimelineEventKind::Incoming) => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub date: NaiveDate,
    pub kind: TimelineEventKind,
    /// Signed quantity: positive for arrivals, negative for consumption. The
    /// CURRENT seed carries the opening balance.
    pub quantity: Decimal,
    pub balance_after: Decimal,
    pub description: String,
    /// Reference to the row behind the event, e.g. `po_line:42`.
    pub source_ref: Option<String>,
}

/// A scheduled production order's draw on one material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionCommitment {
    pub production_order_id: i64,
    pub order_number: String,
    pub quantity: Decimal,
    pub planned_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialTimeline {
    pub item_id: i64,
    pub item_number: String,
    pub unit_of_measure: Option<String>,
    pub current_balance: Decimal,
    /// Reorder point, falling back to minimum stock; None disables reorder
    /// suggestions entirely.
    pub reorder_threshold: Option<Decimal>,
    pub events: Vec<TimelineEvent>,
    /// Date of the first event leaving the balance at or below zero.
    pub projected_stockout: Option<NaiveDate>,
    /// Date of the first event leaving the balance at or below the threshold.
    pub suggested_reorder_date: Option<NaiveDate>,
}

/// Projects the timeline for one material.
///
/// Events dated beyond `today + horizon_days` are ignored. Overdue events
/// (dated before today) are booked as happening today: a late arrival is
/// still expected, and a late production start still consumes.
#[allow(clippy::too_many_arguments)]
pub fn project_timeline(
    item_id: i64,
    item_number: &str,
    unit_of_measure: Option<String>,
    on_hand: Decimal,
    reorder_threshold: Option<Decimal>,
    supply: &[IncomingSupplyEntry],
    consumption: &[ConsumptionCommitment],
    today: NaiveDate,
    horizon_days: i64,
    tie_break: TieBreak,
) -> MaterialTimeline {
    let cutoff = today + Duration::days(horizon_days);

    let mut events = vec![TimelineEvent {
        date: today,
        kind: TimelineEventKind::Current,
        quantity: on_hand,
        balance_after: on_hand,
        description: "Current on-hand balance".to_string(),
        source_ref: None,
    }];

    let mut pending: Vec<TimelineEvent> = Vec::new();

    for entry in supply {
        if entry.item_id != item_id {
            continue;
        }
        let Some(date) = entry.expected_arrival_date else {
            // Undated arrivals have no position on a timeline.
            continue;
        };
        if date > cutoff {
            continue;
        }
        pending.push(TimelineEvent {
            date: date.max(today),
            kind: TimelineEventKind::Incoming,
            quantity: entry.pending_quantity,
            balance_after: Decimal::ZERO,
            description: format!("Arrival from {}", entry.po_number),
            source_ref: Some(format!("po_line:{}", entry.po_line_id)),
        });
    }

    for commitment in consumption {
        let Some(date) = commitment.planned_date else {
            continue;
        };
        if date > cutoff || commitment.quantity <= Decimal::ZERO {
            continue;
        }
        pending.push(TimelineEvent {
            date: date.max(today),
            kind: TimelineEventKind::Consumption,
            quantity: -commitment.quantity,
            balance_after: Decimal::ZERO,
            description: format!("Consumed by {}", commitment.order_number),
            source_ref: Some(format!(
                "production_order:{}",
                commitment.production_order_id
            )),
        });
    }

    // Stable sort: same-day events keep ledger insertion order within a kind.
    pending.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(tie_break.rank(a.kind).cmp(&tie_break.rank(b.kind)))
    });

    let mut balance = on_hand;
    for mut event in pending {
        balance += event.quantity;
        event.balance_after = balance;
        events.push(event);
    }

    // The CURRENT seed participates in both scans: an already-depleted item
    // stocks out today, and a balance already at the threshold reorders today.
    let projected_stockout = events
        .iter()
        .find(|e| e.balance_after <= Decimal::ZERO)
        .map(|e| e.date);
    let suggested_reorder_date = reorder_threshold.and_then(|threshold| {
        events
            .iter()
            .find(|e| e.balance_after <= threshold)
            .map(|e| e.date)
    });

    MaterialTimeline {
        item_id,
        item_number: item_number.to_string(),
        unit_of_measure,
        current_balance: on_hand,
        reorder_threshold,
        events,
        projected_stockout,
        suggested_reorder_date,
    }
}

/// Service projecting per-item material timelines.
#[derive(Clone)]
pub struct MaterialTimelineService {
    db_pool: Arc<DbPool>,
    supply_ledger: SupplyLedgerService,
    tie_break: TieBreak,
}

impl MaterialTimelineService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        let supply_ledger = SupplyLedgerService::new(db_pool.clone());
        Self {
            db_pool,
            supply_ledger,
            tie_break: TieBreak::default(),
        }
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Projects the timeline for `item_id` over the next `horizon_days`.
    #[instrument(skip(self))]
    pub async fn project_material_timeline(
        &self,
        item_id: i64,
        horizon_days: i64,
    ) -> Result<MaterialTimeline, ServiceError> {
        if horizon_days < 0 {
            return Err(ServiceError::InvalidInput(format!(
                "horizon_days must be non-negative, got {}",
                horizon_days
            )));
        }

        let item: item_master::Model = GetItemQuery { item_id }.execute(&self.db_pool).await?;

        let balances = GetOnHandBalancesQuery {
            item_ids: Some(vec![item_id]),
        }
        .execute(&self.db_pool)
        .await?;
        let on_hand = balances.get(&item_id).copied().unwrap_or(Decimal::ZERO);

        let supply = self
            .supply_ledger
            .full_ledger(SupplyFilters {
                item_ids: Some(vec![item_id]),
                ..Default::default()
            })
            .await?;

        let consumption: Vec<ConsumptionCommitment> = GetConsumptionForItemQuery { item_id }
            .execute(&self.db_pool)
            .await?
            .into_iter()
            .map(|row| {
                let quantity = row.quantity_per_assembly * row.order.outstanding_quantity();
                ConsumptionCommitment {
                    production_order_id: row.order.production_order_id,
                    order_number: row.order.order_number.clone(),
                    quantity,
                    planned_date: row.order.planned_date(),
                }
            })
            .collect();

        Ok(project_timeline(
            item.inventory_item_id,
            &item.item_number,
            item.primary_uom_code.clone(),
            on_hand,
            item.reorder_threshold(),
            &supply,
            &consumption,
            Utc::now().date_naive(),
            horizon_days,
            self.tie_break,
        ))
    }
}
