//! Supply ledger: open purchase commitments netted against posted receipts,
//! ordered by expected arrival. This is the single source of "incoming
//! quantity" truth for the allocator, the timeline projector, and the
//! dashboard.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::queries::planning_queries::{GetOpenPurchaseCommitmentsQuery, OpenPurchaseLine};
use crate::queries::Query;

/// Optional narrowing of the ledger to a vendor, an item set, or explicit
/// purchase order statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupplyFilters {
    pub vendor_id: Option<i64>,
    pub item_ids: Option<Vec<i64>>,
    pub statuses: Option<Vec<String>>,
}

/// One pending inbound quantity: a purchase order line that still has
/// quantity on order after netting receipts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingSupplyEntry {
    pub item_id: i64,
    pub po_header_id: i64,
    pub po_line_id: i64,
    pub po_number: String,
    pub vendor_id: Option<i64>,
    pub pending_quantity: Decimal,
    pub unit_price: Option<Decimal>,
    /// None means the supplier has not confirmed a date; such entries sort
    /// last and never satisfy "due within N days" questions.
    pub expected_arrival_date: Option<NaiveDate>,
    pub line_created_at: DateTime<Utc>,
}

impl IncomingSupplyEntry {
    /// Monetary value of the quantity still on order.
    pub fn pending_value(&self) -> Decimal {
        self.pending_quantity * self.unit_price.unwrap_or(Decimal::ZERO)
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.expected_arrival_date, Some(date) if date < today)
    }

    pub fn is_due_within(&self, today: NaiveDate, days: i64) -> bool {
        matches!(
            self.expected_arrival_date,
            Some(date) if date >= today && date <= today + Duration::days(days)
        )
    }
}

/// Nets ordered quantity against received quantity per line and returns the
/// pending entries, ascending by arrival date with undated entries last, then
/// by line creation order.
///
/// `horizon_days` caps how far ahead dated entries may arrive; undated entries
/// are always included.
pub fn build_supply_ledger(
    rows: Vec<OpenPurchaseLine>,
    today: NaiveDate,
    horizon_days: Option<i64>,
) -> Vec<IncomingSupplyEntry> {
    let cutoff = horizon_days.map(|days| today + Duration::days(days));

    let mut entries: Vec<IncomingSupplyEntry> = rows
        .into_iter()
        .filter_map(|row| {
            let item_id = row.line.item_id?;
            let ordered = row.line.quantity_ordered.unwrap_or(Decimal::ZERO);
            // Over-receipts clamp to zero rather than producing negative supply.
            let pending = (ordered - row.quantity_received).max(Decimal::ZERO);
            if pending <= Decimal::ZERO {
                return None;
            }
            if let (Some(cutoff), Some(date)) = (cutoff, row.line.expected_arrival_date) {
                if date > cutoff {
                    return None;
                }
            }
            Some(IncomingSupplyEntry {
                item_id,
                po_header_id: row.header.po_header_id,
                po_line_id: row.line.po_line_id,
                po_number: row.header.po_number.clone(),
                vendor_id: row.header.vendor_id,
                pending_quantity: pending,
                unit_price: row.line.unit_price,
                expected_arrival_date: row.line.expected_arrival_date,
                line_created_at: row.line.created_at,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        match (a.expected_arrival_date, b.expected_arrival_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then(a.line_created_at.cmp(&b.line_created_at))
        .then(a.po_line_id.cmp(&b.po_line_id))
    });
    entries
}

/// Service producing the incoming-supply ledger from the relational snapshot.
#[derive(Clone)]
pub struct SupplyLedgerService {
    db_pool: Arc<DbPool>,
}

impl SupplyLedgerService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lists pending inbound supply due within `horizon_days`, plus all
    /// undated commitments.
    #[instrument(skip(self))]
    pub async fn list_incoming_supply(
        &self,
        horizon_days: i64,
        filters: SupplyFilters,
    ) -> Result<Vec<IncomingSupplyEntry>, ServiceError> {
        if horizon_days < 0 {
            return Err(ServiceError::InvalidInput(format!(
                "horizon_days must be non-negative, got {}",
                horizon_days
            )));
        }

        let rows = GetOpenPurchaseCommitmentsQuery {
            vendor_id: filters.vendor_id,
            item_ids: filters.item_ids,
            statuses: filters.statuses,
        }
        .execute(&self.db_pool)
        .await?;

        Ok(build_supply_ledger(
            rows,
            Utc::now().date_naive(),
            Some(horizon_days),
        ))
    }

    /// Full ledger without a horizon cap, for consumers that do their own
    /// date-window reasoning (allocator, timeline projector).
    #[instrument(skip(self))]
    pub async fn full_ledger(
        &self,
        filters: SupplyFilters,
    ) -> Result<Vec<IncomingSupplyEntry>, ServiceError> {
        let rows = GetOpenPurchaseCommitmentsQuery {
            vendor_id: filters.vendor_id,
            item_ids: filters.item_ids,
            statuses: filters.statuses,
        }
        .execute(&self.db_pool)
        .await?;

        Ok(build_supply_ledger(rows, Utc::now().date_naive(), None))
    }
}
