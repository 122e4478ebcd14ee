use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events emitted by cart operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CartCreated(Uuid),
    CartItemAdded { cart_id: Uuid, product_id: Uuid },
    CartItemUpdated { cart_id: Uuid, item_id: Uuid },
    CartItemRemoved { cart_id: Uuid, item_id: Uuid },
    GuestCartMerged { cart_id: Uuid, merged: usize, skipped: usize },
    CartItemSaved { cart_id: Uuid, product_id: Uuid },
    SavedItemRestored { cart_id: Uuid, product_id: Uuid },
    SavedItemRemoved { cart_id: Uuid, saved_id: Uuid },
    CartCleared(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging on failure. Event delivery is best-effort and
    /// must never fail the request that produced it.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

/// Processes incoming events until the channel closes.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::GuestCartMerged {
                cart_id,
                merged,
                skipped,
            } => {
                info!(
                    "Guest cart merged into {}: {} items merged, {} skipped",
                    cart_id, merged, skipped
                );
            }
            Event::CartCleared(cart_id) => {
                info!("Cart cleared: {}", cart_id);
            }
            other => {
                debug!("Received event: {:?}", other);
            }
        }
    }

    info!("Event processing loop stopped");
}
