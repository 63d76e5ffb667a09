//! Planning engines. Every service here is a pure function of a relational
//! snapshot plus a request: it reads through the queries layer, computes, and
//! returns a transient result. Nothing in this module writes to the store.

pub mod dashboard;
pub mod fulfillment;
pub mod material_timeline;
pub mod production_readiness;
pub mod supply_ledger;
