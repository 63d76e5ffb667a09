//! Snapshot-loading query objects. Each planning request loads everything it
//! needs through these before computing; a failed load fails the whole
//! computation rather than substituting stale or partial data.

pub mod planning_queries;

pub use planning_queries::Query;
