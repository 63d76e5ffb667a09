//! Operations dashboard: composes summary counts from the supply ledger, the
//! fulfillment forecast, and the production readiness check.
//!
//! The composition itself is pure; caching is layered on as a decorator so
//! the engines stay cache-agnostic. Cache failures never fail a dashboard
//! request — a failed read recomputes, a failed write is logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, instrument, warn};

use crate::cache::CacheBackend;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::services::fulfillment::{FulfillmentService, FulfillmentStatus, OrderFulfillment};
use crate::services::production_readiness::{ProductionReadiness, ProductionReadinessService};
use crate::services::supply_ledger::{IncomingSupplyEntry, SupplyLedgerService};

/// Cache key for the aggregated dashboard payload. Shared with the event
/// consumer that invalidates on every order/receipt/production change.
pub const DASHBOARD_CACHE_KEY: &str = "planning:dashboard";

/// Window the supply section aggregates over.
const SUPPLY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplySummary {
    /// Distinct purchase orders with pending inbound quantity
    pub total_orders: u64,
    pub expected_this_week: u64,
    /// Dated entries already past their expected arrival
    pub delayed: u64,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentSummary {
    pub open_orders: u64,
    pub ready_to_ship: u64,
    pub ready_value: Decimal,
    pub blocked: u64,
    pub avg_fulfillment_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionSummary {
    pub active_orders: u64,
    pub ready_to_start: u64,
    pub waiting_materials: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub supply: SupplySummary,
    pub fulfillment: FulfillmentSummary,
    pub production: ProductionSummary,
    pub alerts: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Pure composition of the three engines' outputs into the dashboard.
pub fn compose_dashboard(
    supply: &[IncomingSupplyEntry],
    fulfillment: &[OrderFulfillment],
    readiness: &[ProductionReadiness],
    today: NaiveDate,
    now: DateTime<Utc>,
) -> DashboardSummary {
    let distinct_pos: BTreeSet<i64> = supply.iter().map(|e| e.po_header_id).collect();
    let expected_this_week = supply
        .iter()
        .filter(|e| e.is_due_within(today, SUPPLY_WINDOW_DAYS))
        .count() as u64;
    let delayed = supply.iter().filter(|e| e.is_overdue(today)).count() as u64;
    let total_value = supply.iter().map(|e| e.pending_value()).sum();

    let ready_orders: Vec<&OrderFulfillment> = fulfillment
        .iter()
        .filter(|f| f.status == FulfillmentStatus::Ready)
        .collect();
    let blocked = fulfillment
        .iter()
        .filter(|f| f.status == FulfillmentStatus::Blocked)
        .count() as u64;
    // No open orders means nothing unmet, same convention as the per-order
    // percentage.
    let avg_fulfillment_rate = if fulfillment.is_empty() {
        100.0
    } else {
        fulfillment
            .iter()
            .map(|f| f.ready_percentage as f64)
            .sum::<f64>()
            / fulfillment.len() as f64
    };

    let ready_to_start = readiness.iter().filter(|r| r.materials_ready).count() as u64;
    let waiting_materials = readiness.len() as u64 - ready_to_start;

    let mut alerts = Vec::new();
    if delayed > 0 {
        alerts.push(format!(
            "{} inbound purchase line(s) are past their expected arrival date",
            delayed
        ));
    }
    if blocked > 0 {
        alerts.push(format!(
            "{} sales order(s) are blocked with no known resupply date",
            blocked
        ));
    }
    if waiting_materials > 0 {
        alerts.push(format!(
            "{} production order(s) are waiting on materials",
            waiting_materials
        ));
    }

    DashboardSummary {
        supply: SupplySummary {
            total_orders: distinct_pos.len() as u64,
            expected_this_week,
            delayed,
            total_value,
        },
        fulfillment: FulfillmentSummary {
            open_orders: fulfillment.len() as u64,
            ready_to_ship: ready_orders.len() as u64,
            ready_value: ready_orders.iter().map(|f| f.total_value).sum(),
            blocked,
            avg_fulfillment_rate,
        },
        production: ProductionSummary {
            active_orders: readiness.len() as u64,
            ready_to_start,
            waiting_materials,
        },
        alerts,
        generated_at: now,
    }
}

/// Anything that can produce a fresh dashboard. Split out so the cache
/// decorator can be exercised without a database.
#[async_trait]
pub trait DashboardCompute: Send + Sync {
    async fn compute_dashboard(&self) -> Result<DashboardSummary, ServiceError>;
}

/// Uncached dashboard computation over the three engines.
#[derive(Clone)]
pub struct DashboardService {
    supply_ledger: SupplyLedgerService,
    fulfillment: FulfillmentService,
    readiness: ProductionReadinessService,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            supply_ledger: SupplyLedgerService::new(db_pool.clone()),
            fulfillment: FulfillmentService::new(db_pool.clone()),
            readiness: ProductionReadinessService::new(db_pool),
        }
    }
}

#[async_trait]
impl DashboardCompute for DashboardService {
    #[instrument(skip(self))]
    async fn compute_dashboard(&self) -> Result<DashboardSummary, ServiceError> {
        // Any engine failing fails the dashboard; a summary over half a
        // snapshot would be quietly wrong.
        let supply = self
            .supply_ledger
            .list_incoming_supply(SUPPLY_WINDOW_DAYS, Default::default())
            .await?;
        let fulfillment = self.fulfillment.forecast_fulfillment(None).await?;
        let readiness = self.readiness.check_production_readiness(None).await?;

        Ok(compose_dashboard(
            &supply,
            &fulfillment,
            &readiness,
            Utc::now().date_naive(),
            Utc::now(),
        ))
    }
}

/// Cache decorator around a dashboard computation.
#[derive(Clone)]
pub struct CachedDashboard {
    inner: Arc<dyn DashboardCompute>,
    cache: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl CachedDashboard {
    pub fn new(
        inner: Arc<dyn DashboardCompute>,
        cache: Arc<dyn CacheBackend>,
        ttl: Duration,
    ) -> Self {
        Self { inner, cache, ttl }
    }

    /// Returns the cached dashboard when fresh, recomputing otherwise.
    #[instrument(skip(self))]
    pub async fn get_dashboard(&self) -> Result<DashboardSummary, ServiceError> {
        match self.cache.get(DASHBOARD_CACHE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<DashboardSummary>(&raw) {
                Ok(summary) => {
                    debug!("Dashboard served from cache");
                    return Ok(summary);
                }
                Err(e) => warn!("Discarding undecodable cached dashboard: {}", e),
            },
            Ok(None) => {}
            Err(e) => warn!("Dashboard cache read failed, recomputing: {}", e),
        }

        let summary = self.inner.compute_dashboard().await?;

        match serde_json::to_string(&summary) {
            Ok(raw) => {
                if let Err(e) = self
                    .cache
                    .set(DASHBOARD_CACHE_KEY, &raw, Some(self.ttl))
                    .await
                {
                    warn!("Dashboard cache write failed: {}", e);
                }
            }
            Err(e) => warn!("Dashboard serialization for cache failed: {}", e),
        }

        Ok(summary)
    }

    /// Drops the cached dashboard. Unlike the read/write path this surfaces
    /// failures: callers invalidate for correctness, not for speed.
    #[instrument(skip(self))]
    pub async fn invalidate(&self) -> Result<(), ServiceError> {
        self.cache
            .delete(DASHBOARD_CACHE_KEY)
            .await
            .map_err(ServiceError::from)
    }
}
