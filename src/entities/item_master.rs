use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_master")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub inventory_item_id: i64,
    pub item_number: String,
    pub description: Option<String>,
    /// PRODUCT (sellable/assembled) or MATERIAL (consumed by production)
    pub item_type: Option<String>,
    pub primary_uom_code: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub min_stock_quantity: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub reorder_point_quantity: Option<Decimal>,
    pub status_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Threshold the timeline projector compares against: the reorder point,
    /// falling back to the minimum-stock level when no reorder point is set.
    pub fn reorder_threshold(&self) -> Option<Decimal> {
        self.reorder_point_quantity.or(self.min_stock_quantity)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory_balance::Entity")]
    InventoryBalances,
    #[sea_orm(has_many = "super::bom_header::Entity")]
    BomHeaders,
    #[sea_orm(has_many = "super::bom_line::Entity")]
    BomLinesAsComponent,
    #[sea_orm(has_many = "super::production_orders::Entity")]
    ProductionOrders,
    #[sea_orm(has_many = "super::sales_order_lines::Entity")]
    SalesOrderLines,
    #[sea_orm(has_many = "super::purchase_order_lines::Entity")]
    PurchaseOrderLines,
    #[sea_orm(has_many = "super::po_receipt_lines::Entity")]
    PoReceiptLines,
}

impl Related<super::inventory_balance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryBalances.def()
    }
}

impl Related<super::bom_header::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BomHeaders.def()
    }
}

impl Related<super::bom_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BomLinesAsComponent.def()
    }
}

impl Related<super::production_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionOrders.def()
    }
}

impl Related<super::sales_order_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesOrderLines.def()
    }
}

impl Related<super::purchase_order_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderLines.def()
    }
}

impl Related<super::po_receipt_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PoReceiptLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
