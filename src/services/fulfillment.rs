//! Order fulfillment forecast: a greedy, single-pass allocation of the shared
//! on-hand pool across open sales orders.
//!
//! Allocation order is the whole contract: priority descending, then order
//! creation time ascending, then header id. Whoever comes first consumes the
//! pool; later orders see only what is left. Re-running the same snapshot
//! yields byte-identical results.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::instrument;

use crate::db::DbPool;
use crate::entities::{sales_order_headers, sales_order_lines};
use crate::errors::ServiceError;
use crate::queries::planning_queries::{GetOnHandBalancesQuery, GetOpenDemandOrdersQuery};
use crate::queries::Query;
use crate::services::supply_ledger::{IncomingSupplyEntry, SupplyLedgerService};

/// Scheduling priority derived from the order's priority code.
/// Variant order doubles as allocation order: High allocates first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// URGENT and HIGH map high, LOW maps low, anything else (including
    /// absent or unrecognized codes) is MEDIUM.
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(|c| c.trim().to_ascii_uppercase()).as_deref() {
            Some("URGENT") | Some("HIGH") => Priority::High,
            Some("LOW") => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    /// Every line fully coverable from on-hand stock
    Ready,
    /// Some lines covered, at least one shortage with no known arrival
    Partial,
    /// Every shortage has a known inbound arrival date
    WaitingMaterials,
    /// Nothing covered and at least one shortage with no known arrival
    Blocked,
}

/// Snapshot of one open sales order entering the allocator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandOrderSnapshot {
    pub order_id: i64,
    pub order_number: String,
    pub customer_name: Option<String>,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<DemandLineSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandLineSnapshot {
    pub item_id: i64,
    pub required_quantity: Decimal,
    pub unit_price: Option<Decimal>,
}

/// One unmet (or partially met) line of a demand order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineShortage {
    pub item_id: i64,
    pub required_quantity: Decimal,
    pub available_quantity: Decimal,
    pub shortage_quantity: Decimal,
    /// Earliest single inbound arrival large enough to cover the whole
    /// shortage (first-fit); None when no dated arrival covers it.
    pub expected_arrival_date: Option<NaiveDate>,
}

/// Allocation outcome for one sales order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFulfillment {
    pub order_id: i64,
    pub order_number: String,
    pub customer_name: Option<String>,
    pub priority: Priority,
    pub status: FulfillmentStatus,
    /// Fully covered lines over total lines, rounded to the nearest percent.
    /// An order with no lines is 100% ready: there is nothing unmet.
    pub ready_percentage: u8,
    pub shortages: Vec<LineShortage>,
    pub estimated_fulfillment_date: Option<NaiveDate>,
    /// Line-value total of the order, for dashboard rollups.
    pub total_value: Decimal,
}

/// Allocates one order against the pool, returning the depleted pool and the
/// order's outcome. The pool is taken and returned by value so the caller
/// folds it through the demand sequence one step at a time.
fn allocate_order(
    mut pool: HashMap<i64, Decimal>,
    order: DemandOrderSnapshot,
    supply: &[IncomingSupplyEntry],
    today: NaiveDate,
) -> (HashMap<i64, Decimal>, OrderFulfillment) {
    let total_lines = order.lines.len();
    let mut covered_lines = 0usize;
    let mut shortages = Vec::new();
    let mut total_value = Decimal::ZERO;

    for line in &order.lines {
        total_value += line.required_quantity * line.unit_price.unwrap_or(Decimal::ZERO);

        // An item the warehouse has never stocked is simply fully short.
        let available = pool.get(&line.item_id).copied().unwrap_or(Decimal::ZERO);

        if available >= line.required_quantity {
            covered_lines += 1;
            pool.insert(line.item_id, available - line.required_quantity);
        } else {
            let covered = available.max(Decimal::ZERO);
            let shortage = line.required_quantity - covered;
            pool.insert(line.item_id, Decimal::ZERO);

            let expected_arrival_date = supply
                .iter()
                .find(|entry| {
                    entry.item_id == line.item_id
                        && entry.expected_arrival_date.is_some()
                        && entry.pending_quantity >= shortage
                })
                .and_then(|entry| entry.expected_arrival_date);

            shortages.push(LineShortage {
                item_id: line.item_id,
                required_quantity: line.required_quantity,
                available_quantity: covered,
                shortage_quantity: shortage,
                expected_arrival_date,
            });
        }
    }

    let status = if shortages.is_empty() {
        FulfillmentStatus::Ready
    } else if shortages.iter().all(|s| s.expected_arrival_date.is_some()) {
        FulfillmentStatus::WaitingMaterials
    } else if covered_lines > 0 {
        FulfillmentStatus::Partial
    } else {
        FulfillmentStatus::Blocked
    };

    let ready_percentage = if total_lines == 0 {
        100
    } else {
        ((covered_lines as f64 / total_lines as f64) * 100.0).round() as u8
    };

    let estimated_fulfillment_date = match status {
        FulfillmentStatus::Ready => Some(today),
        // The order cannot ship before its slowest-arriving shortfall.
        FulfillmentStatus::WaitingMaterials => shortages
            .iter()
            .filter_map(|s| s.expected_arrival_date)
            .max(),
        FulfillmentStatus::Partial | FulfillmentStatus::Blocked => None,
    };

    let result = OrderFulfillment {
        order_id: order.order_id,
        order_number: order.order_number,
        customer_name: order.customer_name,
        priority: order.priority,
        status,
        ready_percentage,
        shortages,
        estimated_fulfillment_date,
        total_value,
    };
    (pool, result)
}

/// Runs the greedy allocation over all demand orders.
///
/// Sorts the orders into allocation order, then folds the on-hand pool
/// through them. The pool only ever shrinks and never goes negative, so no
/// item can be allocated beyond its starting balance.
pub fn forecast_allocation(
    on_hand: HashMap<i64, Decimal>,
    mut orders: Vec<DemandOrderSnapshot>,
    supply: &[IncomingSupplyEntry],
    today: NaiveDate,
) -> Vec<OrderFulfillment> {
    orders.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.order_id.cmp(&b.order_id))
    });

    let (_, results) = orders.into_iter().fold(
        (on_hand, Vec::new()),
        |(pool, mut out), order| {
            let (pool, fulfillment) = allocate_order(pool, order, supply, today);
            out.push(fulfillment);
            (pool, out)
        },
    );
    results
}

/// Maps a sales order header plus its lines into an allocator snapshot.
pub fn demand_snapshot(
    header: sales_order_headers::Model,
    lines: Vec<sales_order_lines::Model>,
) -> DemandOrderSnapshot {
    DemandOrderSnapshot {
        order_id: header.header_id,
        order_number: header.order_number,
        customer_name: header.customer_name,
        priority: Priority::from_code(header.priority_code.as_deref()),
        created_at: header.created_at,
        lines: lines
            .into_iter()
            .filter_map(|line| {
                Some(DemandLineSnapshot {
                    item_id: line.inventory_item_id?,
                    required_quantity: line.ordered_quantity.unwrap_or(Decimal::ZERO),
                    unit_price: line.unit_selling_price,
                })
            })
            .collect(),
    }
}

/// Service forecasting fulfillment for all open sales orders.
#[derive(Clone)]
pub struct FulfillmentService {
    db_pool: Arc<DbPool>,
    supply_ledger: SupplyLedgerService,
}

impl FulfillmentService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        let supply_ledger = SupplyLedgerService::new(db_pool.clone());
        Self {
            db_pool,
            supply_ledger,
        }
    }

    /// Forecasts every open sales order against current stock and the supply
    /// ledger. Results come back in allocation order.
    #[instrument(skip(self))]
    pub async fn forecast_fulfillment(
        &self,
        statuses: Option<Vec<String>>,
    ) -> Result<Vec<OrderFulfillment>, ServiceError> {
        let demand = GetOpenDemandOrdersQuery { statuses }
            .execute(&self.db_pool)
            .await?;

        let orders: Vec<DemandOrderSnapshot> = demand
            .into_iter()
            .map(|(header, lines)| demand_snapshot(header, lines))
            .collect();

        let on_hand = GetOnHandBalancesQuery { item_ids: None }
            .execute(&self.db_pool)
            .await?;

        let supply = self.supply_ledger.full_ledger(Default::default()).await?;

        Ok(forecast_allocation(
            on_hand,
            orders,
            &supply,
            Utc::now().date_naive(),
        ))
    }
}
