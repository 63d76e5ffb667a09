//! Production readiness: expands each scheduled production order's bill of
//! materials and compares required component quantities against current
//! on-hand balances.
//!
//! Unlike the sales allocator, each production order is checked independently
//! against the same snapshot; two orders needing the same material both see
//! the full balance. Cross-order material contention is a scheduling concern,
//! not a readiness concern.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::DbPool;
use crate::entities::{bom_line, production_orders};
use crate::errors::ServiceError;
use crate::queries::planning_queries::{
    GetBomRequirementsQuery, GetItemNumbersQuery, GetOnHandBalancesQuery,
    GetOpenProductionOrdersQuery,
};
use crate::queries::Query;
use crate::services::fulfillment::Priority;

/// One component the order cannot currently draw in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialShortage {
    pub material_id: i64,
    pub material_number: Option<String>,
    pub required_quantity: Decimal,
    pub available_quantity: Decimal,
    pub shortage_quantity: Decimal,
}

/// Readiness verdict for one production order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionReadiness {
    pub production_order_id: i64,
    pub order_number: String,
    pub product_item_id: Option<i64>,
    pub quantity: Decimal,
    pub priority: Priority,
    pub materials_ready: bool,
    pub shortages: Vec<MaterialShortage>,
}

/// Component requirement per assembled unit, resolved from the active BOM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomRequirement {
    pub material_id: i64,
    pub material_number: Option<String>,
    pub quantity_per_assembly: Decimal,
}

/// Checks one production order against the shared balance snapshot. The
/// snapshot is read-only here; nothing is reserved or depleted.
pub fn check_order_readiness(
    order: &production_orders::Model,
    bom: &[BomRequirement],
    on_hand: &HashMap<i64, Decimal>,
) -> ProductionReadiness {
    let quantity = order.outstanding_quantity();
    let mut shortages = Vec::new();

    for requirement in bom {
        let required = requirement.quantity_per_assembly * quantity;
        if required <= Decimal::ZERO {
            continue;
        }
        let available = on_hand
            .get(&requirement.material_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO);
        if available < required {
            shortages.push(MaterialShortage {
                material_id: requirement.material_id,
                material_number: requirement.material_number.clone(),
                required_quantity: required,
                available_quantity: available,
                shortage_quantity: required - available,
            });
        }
    }

    ProductionReadiness {
        production_order_id: order.production_order_id,
        order_number: order.order_number.clone(),
        product_item_id: order.item_id,
        quantity,
        priority: Priority::from_code(order.priority_code.as_deref()),
        materials_ready: shortages.is_empty(),
        shortages,
    }
}

/// Folds raw BOM lines into per-material requirements, summing duplicates.
fn bom_requirements(
    lines: &[bom_line::Model],
    item_numbers: &HashMap<i64, String>,
) -> Vec<BomRequirement> {
    let mut per_material: Vec<BomRequirement> = Vec::new();
    for line in lines {
        let Some(material_id) = line.component_item_id else {
            continue;
        };
        let per_assembly = line.quantity_per_assembly.unwrap_or(Decimal::ZERO);
        match per_material
            .iter_mut()
            .find(|r| r.material_id == material_id)
        {
            Some(existing) => existing.quantity_per_assembly += per_assembly,
            None => per_material.push(BomRequirement {
                material_id,
                material_number: item_numbers.get(&material_id).cloned(),
                quantity_per_assembly: per_assembly,
            }),
        }
    }
    per_material
}

/// Service checking material readiness for open production orders.
#[derive(Clone)]
pub struct ProductionReadinessService {
    db_pool: Arc<DbPool>,
}

impl ProductionReadinessService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Checks every open production order; results come back in order-id
    /// order for stable output.
    #[instrument(skip(self))]
    pub async fn check_production_readiness(
        &self,
        statuses: Option<Vec<String>>,
    ) -> Result<Vec<ProductionReadiness>, ServiceError> {
        let orders = GetOpenProductionOrdersQuery { statuses }
            .execute(&self.db_pool)
            .await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let product_ids: Vec<i64> = orders.iter().filter_map(|o| o.item_id).collect();
        let requirements_by_product = GetBomRequirementsQuery {
            product_item_ids: product_ids,
        }
        .execute(&self.db_pool)
        .await?;

        let material_ids: Vec<i64> = requirements_by_product
            .values()
            .flatten()
            .filter_map(|line| line.component_item_id)
            .collect();
        let item_numbers = GetItemNumbersQuery {
            item_ids: material_ids.clone(),
        }
        .execute(&self.db_pool)
        .await?;
        let on_hand = GetOnHandBalancesQuery {
            item_ids: Some(material_ids),
        }
        .execute(&self.db_pool)
        .await?;

        Ok(orders
            .iter()
            .map(|order| {
                let bom = order
                    .item_id
                    .and_then(|product_id| requirements_by_product.get(&product_id))
                    .map(|lines| bom_requirements(lines, &item_numbers))
                    .unwrap_or_default();
                check_order_readiness(order, &bom, &on_hand)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn production_order(id: i64, quantity: Decimal) -> production_orders::Model {
        production_orders::Model {
            production_order_id: id,
            order_number: format!("WO-{}", id),
            item_id: Some(500),
            quantity_to_build: Some(quantity),
            quantity_completed: None,
            priority_code: Some("HIGH".to_string()),
            status_code: Some("PLANNED".to_string()),
            scheduled_start_date: None,
            due_date: None,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    fn requirement(material_id: i64, per_assembly: Decimal) -> BomRequirement {
        BomRequirement {
            material_id,
            material_number: Some(format!("MAT-{}", material_id)),
            quantity_per_assembly: per_assembly,
        }
    }

    #[test]
    fn shortage_is_required_minus_available() {
        // 2 per unit x 5 units = 10 required, 4 on hand -> shortage of 6
        let order = production_order(1, dec!(5));
        let bom = vec![requirement(100, dec!(2))];
        let on_hand = HashMap::from([(100, dec!(4))]);

        let readiness = check_order_readiness(&order, &bom, &on_hand);
        assert!(!readiness.materials_ready);
        assert_eq!(readiness.shortages.len(), 1);
        assert_eq!(readiness.shortages[0].required_quantity, dec!(10));
        assert_eq!(readiness.shortages[0].available_quantity, dec!(4));
        assert_eq!(readiness.shortages[0].shortage_quantity, dec!(6));
    }

    #[test]
    fn fully_stocked_order_is_ready() {
        let order = production_order(1, dec!(3));
        let bom = vec![requirement(100, dec!(2)), requirement(101, dec!(1))];
        let on_hand = HashMap::from([(100, dec!(6)), (101, dec!(3))]);

        let readiness = check_order_readiness(&order, &bom, &on_hand);
        assert!(readiness.materials_ready);
        assert!(readiness.shortages.is_empty());
        assert_eq!(readiness.priority, Priority::High);
    }

    #[test]
    fn orders_do_not_deplete_a_shared_pool() {
        let bom = vec![requirement(100, dec!(2))];
        let on_hand = HashMap::from([(100, dec!(10))]);

        let first = check_order_readiness(&production_order(1, dec!(5)), &bom, &on_hand);
        let second = check_order_readiness(&production_order(2, dec!(5)), &bom, &on_hand);

        // Both see the full balance; readiness is per-order, not allocated.
        assert!(first.materials_ready);
        assert!(second.materials_ready);
    }

    #[test]
    fn completed_quantity_reduces_requirements() {
        let mut order = production_order(1, dec!(5));
        order.quantity_completed = Some(dec!(3));
        let bom = vec![requirement(100, dec!(2))];
        let on_hand = HashMap::from([(100, dec!(4))]);

        // Only 2 units outstanding -> 4 required, exactly covered.
        let readiness = check_order_readiness(&order, &bom, &on_hand);
        assert!(readiness.materials_ready);
        assert_eq!(readiness.quantity, dec!(2));
    }

    #[test]
    fn missing_material_balance_counts_as_zero() {
        let order = production_order(1, dec!(1));
        let bom = vec![requirement(999, dec!(4))];

        let readiness = check_order_readiness(&order, &bom, &HashMap::new());
        assert_eq!(readiness.shortages[0].available_quantity, dec!(0));
        assert_eq!(readiness.shortages[0].shortage_quantity, dec!(4));
    }

    #[test]
    fn duplicate_bom_lines_sum_per_material() {
        let lines = vec![
            bom_line::Model {
                bom_line_id: 1,
                bom_id: Some(1),
                component_item_id: Some(100),
                quantity_per_assembly: Some(dec!(2)),
                uom_code: None,
                created_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
                updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            },
            bom_line::Model {
                bom_line_id: 2,
                bom_id: Some(1),
                component_item_id: Some(100),
                quantity_per_assembly: Some(dec!(1)),
                uom_code: None,
                created_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
                updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            },
        ];

        let requirements = bom_requirements(&lines, &HashMap::new());
        assert_eq!(requirements.len(), 1);
        assert_eq!(requirements[0].quantity_per_assembly, dec!(3));
    }
}
