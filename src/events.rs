//! Domain-change notifications from the mutation side of the ERP.
//!
//! The planning engine itself never writes, but its cached dashboard must be
//! invalidated whenever orders, purchase orders, receipts, production orders,
//! or inventory change. Mutating services push an event into the channel; a
//! background consumer drops the cached dashboard on every event.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::CacheBackend;
use crate::services::dashboard::DASHBOARD_CACHE_KEY;

// The events that can invalidate planning results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    SalesOrderChanged { order_id: i64 },
    PurchaseOrderChanged { po_header_id: i64 },
    GoodsReceiptPosted { po_header_id: i64, po_line_id: i64 },
    ProductionOrderChanged { production_order_id: i64 },
    InventoryAdjusted { item_id: i64 },
}

/// An event plus the delivery metadata recorded for every occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub event: Event,
}

impl EventEnvelope {
    pub fn new(event: Event) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<EventEnvelope>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<EventEnvelope>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(EventEnvelope::new(event))
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing if the channel is closed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Creates the event channel used to wire senders to the consumer task.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<EventEnvelope>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Consumes events until the channel closes, invalidating the dashboard cache
/// on every delivery. Invalidation failures are logged and skipped; the cache
/// TTL bounds how stale the dashboard can get if deletes keep failing.
pub async fn process_events(
    mut receiver: mpsc::Receiver<EventEnvelope>,
    cache: Arc<dyn CacheBackend>,
) {
    while let Some(envelope) = receiver.recv().await {
        debug!(event_id = %envelope.event_id, event = ?envelope.event, "Invalidating dashboard cache");
        if let Err(e) = cache.delete(DASHBOARD_CACHE_KEY).await {
            warn!("Failed to invalidate dashboard cache: {}", e);
        }
    }
    info!("Event channel closed; stopping cache invalidation task");
}
