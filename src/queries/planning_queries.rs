use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::entities::{
    bom_header, bom_line, inventory_balance, item_master, po_receipt_lines, production_orders,
    purchase_order_headers, purchase_order_lines, sales_order_headers, sales_order_lines,
};
use crate::errors::ServiceError;

/// Purchase order statuses with inbound quantity still expected.
pub const OPEN_PO_STATUSES: &[&str] = &["OPEN", "APPROVED"];
/// Sales order statuses competing for on-hand inventory.
pub const OPEN_SALES_STATUSES: &[&str] = &["OPEN", "CONFIRMED"];
/// Production order statuses that still consume materials.
pub const OPEN_PRODUCTION_STATUSES: &[&str] = &["PLANNED", "RELEASED", "IN_PROGRESS"];

#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetItemQuery {
    pub item_id: i64,
}

#[async_trait]
impl Query for GetItemQuery {
    type Result = item_master::Model;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        item_master::Entity::find_by_id(self.item_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", self.item_id)))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetItemNumbersQuery {
    pub item_ids: Vec<i64>,
}

#[async_trait]
impl Query for GetItemNumbersQuery {
    type Result = HashMap<i64, String>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        if self.item_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let items = item_master::Entity::find()
            .filter(item_master::Column::InventoryItemId.is_in(self.item_ids.iter().copied()))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(items
            .into_iter()
            .map(|item| (item.inventory_item_id, item.item_number))
            .collect())
    }
}

/// Aggregates per-location balances into one on-hand total per item.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetOnHandBalancesQuery {
    pub item_ids: Option<Vec<i64>>,
}

#[async_trait]
impl Query for GetOnHandBalancesQuery {
    type Result = HashMap<i64, Decimal>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let mut query = inventory_balance::Entity::find();
        if let Some(ids) = &self.item_ids {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }
            query = query.filter(inventory_balance::Column::InventoryItemId.is_in(ids.iter().copied()));
        }

        let rows = query.all(db).await.map_err(ServiceError::db_error)?;

        let mut totals: HashMap<i64, Decimal> = HashMap::new();
        for row in rows {
            *totals.entry(row.inventory_item_id).or_insert(Decimal::ZERO) += row.quantity_on_hand;
        }
        Ok(totals)
    }
}

/// An open purchase order line joined with its header and the total quantity
/// already received against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPurchaseLine {
    pub header: purchase_order_headers::Model,
    pub line: purchase_order_lines::Model,
    pub quantity_received: Decimal,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GetOpenPurchaseCommitmentsQuery {
    pub vendor_id: Option<i64>,
    pub item_ids: Option<Vec<i64>>,
    pub statuses: Option<Vec<String>>,
}

#[async_trait]
impl Query for GetOpenPurchaseCommitmentsQuery {
    type Result = Vec<OpenPurchaseLine>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let mut header_query = purchase_order_headers::Entity::find();
        header_query = match &self.statuses {
            Some(statuses) => header_query.filter(
                purchase_order_headers::Column::StatusCode
                    .is_in(statuses.iter().map(|s| s.as_str())),
            ),
            None => header_query.filter(
                purchase_order_headers::Column::StatusCode
                    .is_in(OPEN_PO_STATUSES.iter().copied()),
            ),
        };
        if let Some(vendor_id) = self.vendor_id {
            header_query =
                header_query.filter(purchase_order_headers::Column::VendorId.eq(vendor_id));
        }

        let headers = header_query.all(db).await.map_err(ServiceError::db_error)?;
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let headers_by_id: HashMap<i64, purchase_order_headers::Model> = headers
            .into_iter()
            .map(|h| (h.po_header_id, h))
            .collect();

        let mut line_query = purchase_order_lines::Entity::find()
            .filter(
                purchase_order_lines::Column::PoHeaderId
                    .is_in(headers_by_id.keys().copied()),
            )
            .order_by_asc(purchase_order_lines::Column::CreatedAt)
            .order_by_asc(purchase_order_lines::Column::PoLineId);
        if let Some(ids) = &self.item_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            line_query = line_query.filter(purchase_order_lines::Column::ItemId.is_in(ids.iter().copied()));
        }

        let lines = line_query.all(db).await.map_err(ServiceError::db_error)?;
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let line_ids: Vec<i64> = lines.iter().map(|l| l.po_line_id).collect();
        let receipts = po_receipt_lines::Entity::find()
            .filter(po_receipt_lines::Column::PoLineId.is_in(line_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut received_by_line: HashMap<i64, Decimal> = HashMap::new();
        for receipt in receipts {
            if let Some(po_line_id) = receipt.po_line_id {
                *received_by_line.entry(po_line_id).or_insert(Decimal::ZERO) +=
                    receipt.quantity_received.unwrap_or(Decimal::ZERO);
            }
        }

        Ok(lines
            .into_iter()
            .filter_map(|line| {
                let header = headers_by_id.get(&line.po_header_id?)?.clone();
                let quantity_received = received_by_line
                    .get(&line.po_line_id)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                Some(OpenPurchaseLine {
                    header,
                    line,
                    quantity_received,
                })
            })
            .collect())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GetOpenDemandOrdersQuery {
    pub statuses: Option<Vec<String>>,
}

#[async_trait]
impl Query for GetOpenDemandOrdersQuery {
    type Result = Vec<(sales_order_headers::Model, Vec<sales_order_lines::Model>)>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let mut query = sales_order_headers::Entity::find();
        query = match &self.statuses {
            Some(statuses) => query.filter(
                sales_order_headers::Column::StatusCode.is_in(statuses.iter().map(|s| s.as_str())),
            ),
            None => query.filter(
                sales_order_headers::Column::StatusCode.is_in(OPEN_SALES_STATUSES.iter().copied()),
            ),
        };

        let mut orders = query
            .order_by_asc(sales_order_headers::Column::CreatedAt)
            .order_by_asc(sales_order_headers::Column::HeaderId)
            .find_with_related(sales_order_lines::Entity)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        // Line order within an order is part of the deterministic-output contract.
        for (_, lines) in orders.iter_mut() {
            lines.sort_by_key(|line| line.line_id);
        }
        Ok(orders)
    }
}

/// A production order consuming the queried material, with the per-assembly
/// quantity its active bill of materials specifies for that material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionRow {
    pub order: production_orders::Model,
    pub quantity_per_assembly: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetConsumptionForItemQuery {
    pub item_id: i64,
}

#[async_trait]
impl Query for GetConsumptionForItemQuery {
    type Result = Vec<ConsumptionRow>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let component_lines = bom_line::Entity::find()
            .filter(bom_line::Column::ComponentItemId.eq(self.item_id))
            .order_by_asc(bom_line::Column::BomLineId)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        if component_lines.is_empty() {
            return Ok(Vec::new());
        }

        // Sum per BOM: a bill may list the same material on several lines.
        let mut per_assembly_by_bom: HashMap<i64, Decimal> = HashMap::new();
        for line in &component_lines {
            if let Some(bom_id) = line.bom_id {
                *per_assembly_by_bom.entry(bom_id).or_insert(Decimal::ZERO) +=
                    line.quantity_per_assembly.unwrap_or(Decimal::ZERO);
            }
        }

        let headers = bom_header::Entity::find()
            .filter(bom_header::Column::BomId.is_in(per_assembly_by_bom.keys().copied()))
            .filter(bom_header::Column::StatusCode.eq("ACTIVE"))
            .order_by_asc(bom_header::Column::BomId)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        // Lowest bom_id wins if a product somehow has two active bills.
        let mut per_assembly_by_product: HashMap<i64, Decimal> = HashMap::new();
        for header in headers {
            if let (Some(product_id), Some(qty)) =
                (header.item_id, per_assembly_by_bom.get(&header.bom_id))
            {
                per_assembly_by_product.entry(product_id).or_insert(*qty);
            }
        }
        if per_assembly_by_product.is_empty() {
            return Ok(Vec::new());
        }

        let orders = production_orders::Entity::find()
            .filter(
                production_orders::Column::StatusCode
                    .is_in(OPEN_PRODUCTION_STATUSES.iter().copied()),
            )
            .filter(
                production_orders::Column::ItemId
                    .is_in(per_assembly_by_product.keys().copied()),
            )
            .order_by_asc(production_orders::Column::ProductionOrderId)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(orders
            .into_iter()
            .filter_map(|order| {
                let quantity_per_assembly =
                    *per_assembly_by_product.get(&order.item_id?)?;
                Some(ConsumptionRow {
                    order,
                    quantity_per_assembly,
                })
            })
            .collect())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GetOpenProductionOrdersQuery {
    pub statuses: Option<Vec<String>>,
}

#[async_trait]
impl Query for GetOpenProductionOrdersQuery {
    type Result = Vec<production_orders::Model>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let mut query = production_orders::Entity::find();
        query = match &self.statuses {
            Some(statuses) => query.filter(
                production_orders::Column::StatusCode.is_in(statuses.iter().map(|s| s.as_str())),
            ),
            None => query.filter(
                production_orders::Column::StatusCode
                    .is_in(OPEN_PRODUCTION_STATUSES.iter().copied()),
            ),
        };

        query
            .order_by_asc(production_orders::Column::ProductionOrderId)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}

/// Component requirements per assembled product, from each product's active
/// bill of materials (lowest bom_id wins on duplicates).
#[derive(Debug, Serialize, Deserialize)]
pub struct GetBomRequirementsQuery {
    pub product_item_ids: Vec<i64>,
}

#[async_trait]
impl Query for GetBomRequirementsQuery {
    type Result = HashMap<i64, Vec<bom_line::Model>>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        if self.product_item_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let headers = bom_header::Entity::find()
            .filter(bom_header::Column::ItemId.is_in(self.product_item_ids.iter().copied()))
            .filter(bom_header::Column::StatusCode.eq("ACTIVE"))
            .order_by_asc(bom_header::Column::BomId)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut bom_by_product: HashMap<i64, i64> = HashMap::new();
        let mut seen_products: HashSet<i64> = HashSet::new();
        for header in headers {
            if let Some(product_id) = header.item_id {
                if seen_products.insert(product_id) {
                    bom_by_product.insert(product_id, header.bom_id);
                }
            }
        }
        if bom_by_product.is_empty() {
            return Ok(HashMap::new());
        }

        let lines = bom_line::Entity::find()
            .filter(bom_line::Column::BomId.is_in(bom_by_product.values().copied()))
            .order_by_asc(bom_line::Column::BomLineId)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let product_by_bom: HashMap<i64, i64> =
            bom_by_product.into_iter().map(|(p, b)| (b, p)).collect();

        let mut requirements: HashMap<i64, Vec<bom_line::Model>> = HashMap::new();
        for line in lines {
            if let Some(product_id) = line.bom_id.and_then(|b| product_by_bom.get(&b)) {
                requirements.entry(*product_id).or_default().push(line);
            }
        }
        Ok(requirements)
    }
}
