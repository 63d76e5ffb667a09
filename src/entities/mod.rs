//! Read-only sea-orm models for the relational snapshot the planning engine
//! computes over. The engine never writes through these entities.

pub mod bom_header;
pub mod bom_line;
pub mod inventory_balance;
pub mod item_master;
pub mod po_receipt_lines;
pub mod production_orders;
pub mod purchase_order_headers;
pub mod purchase_order_lines;
pub mod sales_order_headers;
pub mod sales_order_lines;
