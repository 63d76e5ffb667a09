use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_order_headers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub header_id: i64,
    pub order_number: String,
    pub customer_name: Option<String>,
    /// URGENT / HIGH / MEDIUM / LOW; anything unrecognized is treated MEDIUM
    pub priority_code: Option<String>,
    /// OPEN / CONFIRMED / SHIPPED / CANCELLED
    pub status_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sales_order_lines::Entity")]
    SalesOrderLines,
}

impl Related<super::sales_order_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesOrderLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
