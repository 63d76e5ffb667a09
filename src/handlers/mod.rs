pub mod common;
pub mod health;
pub mod planning;

use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheBackend;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::services::dashboard::{CachedDashboard, DashboardService};
use crate::services::fulfillment::FulfillmentService;
use crate::services::material_timeline::MaterialTimelineService;
use crate::services::production_readiness::ProductionReadinessService;
use crate::services::supply_ledger::SupplyLedgerService;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub supply_ledger: Arc<SupplyLedgerService>,
    pub fulfillment: Arc<FulfillmentService>,
    pub material_timeline: Arc<MaterialTimelineService>,
    pub production_readiness: Arc<ProductionReadinessService>,
    pub dashboard: Arc<CachedDashboard>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, cache: Arc<dyn CacheBackend>, config: &AppConfig) -> Self {
        let supply_ledger = Arc::new(SupplyLedgerService::new(db_pool.clone()));
        let fulfillment = Arc::new(FulfillmentService::new(db_pool.clone()));
        let material_timeline = Arc::new(MaterialTimelineService::new(db_pool.clone()));
        let production_readiness = Arc::new(ProductionReadinessService::new(db_pool.clone()));
        let dashboard = Arc::new(CachedDashboard::new(
            Arc::new(DashboardService::new(db_pool)),
            cache,
            Duration::from_secs(config.dashboard_cache_ttl_secs),
        ));

        Self {
            supply_ledger,
            fulfillment,
            material_timeline,
            production_readiness,
            dashboard,
        }
    }
}
