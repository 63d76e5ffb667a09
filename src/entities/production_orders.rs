use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub production_order_id: i64,
    pub order_number: String,
    /// Assembled product (item_master with item_type PRODUCT)
    pub item_id: Option<i64>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_to_build: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_completed: Option<Decimal>,
    pub priority_code: Option<String>,
    /// PLANNED / RELEASED / IN_PROGRESS / COMPLETED / CANCELLED
    pub status_code: Option<String>,
    pub scheduled_start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Quantity still to be built; partially completed orders only consume
    /// materials for their remainder.
    pub fn outstanding_quantity(&self) -> Decimal {
        let to_build = self.quantity_to_build.unwrap_or(Decimal::ZERO);
        let completed = self.quantity_completed.unwrap_or(Decimal::ZERO);
        (to_build - completed).max(Decimal::ZERO)
    }

    /// Date the order is expected to start consuming materials.
    pub fn planned_date(&self) -> Option<NaiveDate> {
        self.scheduled_start_date.or(self.due_date)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item_master::Entity",
        from = "Column::ItemId",
        to = "super::item_master::Column::InventoryItemId"
    )]
    ItemMaster,
}

impl Related<super::item_master::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemMaster.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
