use super::common::{map_service_error, no_content_response, success_response, validate_input};
use crate::{errors::ApiError, handlers::AppState, services::supply_ledger::SupplyFilters};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get},
    Router,
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

/// Creates the router for planning endpoints
pub fn planning_routes() -> Router<AppState> {
    Router::new()
        .route("/incoming-supply", get(list_incoming_supply))
        .route("/fulfillment-forecast", get(forecast_fulfillment))
        .route("/materials/:item_id/timeline", get(material_timeline))
        .route("/production-readiness", get(production_readiness))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/cache", delete(invalidate_dashboard_cache))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct IncomingSupplyParams {
    #[validate(range(min = 0, max = 3650))]
    pub horizon_days: Option<i64>,
    pub vendor_id: Option<i64>,
    /// Comma-separated item ids
    pub item_ids: Option<String>,
    /// Comma-separated purchase order statuses
    pub statuses: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TimelineParams {
    #[validate(range(min = 0, max = 3650))]
    pub horizon_days: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusFilterParams {
    /// Comma-separated status codes
    pub statuses: Option<String>,
}

fn parse_id_list(raw: &str) -> Result<Vec<i64>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid item id '{}'", s)))
        })
        .collect()
}

fn parse_status_list(raw: &Option<String>) -> Option<Vec<String>> {
    raw.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_uppercase())
            .collect()
    })
}

// Handler functions

/// List pending inbound supply within the horizon
async fn list_incoming_supply(
    State(state): State<AppState>,
    Query(params): Query<IncomingSupplyParams>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&params)?;

    let horizon_days = params
        .horizon_days
        .unwrap_or(state.config.default_horizon_days);
    let item_ids = params
        .item_ids
        .as_deref()
        .map(parse_id_list)
        .transpose()?;

    let filters = SupplyFilters {
        vendor_id: params.vendor_id,
        item_ids,
        statuses: parse_status_list(&params.statuses),
    };

    let entries = state
        .services
        .supply_ledger
        .list_incoming_supply(horizon_days, filters)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(entries))
}

/// Forecast fulfillment for all open sales orders
async fn forecast_fulfillment(
    State(state): State<AppState>,
    Query(params): Query<StatusFilterParams>,
) -> Result<impl IntoResponse, ApiError> {
    let results = state
        .services
        .fulfillment
        .forecast_fulfillment(parse_status_list(&params.statuses))
        .await
        .map_err(map_service_error)?;

    Ok(success_response(results))
}

/// Project the material timeline for one item
async fn material_timeline(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Query(params): Query<TimelineParams>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&params)?;

    let horizon_days = params
        .horizon_days
        .unwrap_or(state.config.default_horizon_days);

    let timeline = state
        .services
        .material_timeline
        .project_material_timeline(item_id, horizon_days)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(timeline))
}

/// Check material readiness for open production orders
async fn production_readiness(
    State(state): State<AppState>,
    Query(params): Query<StatusFilterParams>,
) -> Result<impl IntoResponse, ApiError> {
    let results = state
        .services
        .production_readiness
        .check_production_readiness(parse_status_list(&params.statuses))
        .await
        .map_err(map_service_error)?;

    Ok(success_response(results))
}

/// Aggregated operations dashboard (cached)
async fn get_dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .services
        .dashboard
        .get_dashboard()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summary))
}

/// Drop the cached dashboard
async fn invalidate_dashboard_cache(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .dashboard
        .invalidate()
        .await
        .map_err(map_service_error)?;

    info!("Dashboard cache invalidated");
    Ok(no_content_response())
}
