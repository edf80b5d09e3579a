use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

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
}

/// Lifecycle notifications emitted by the shipment service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    LandedCostShipmentCreated {
        shipment_id: Uuid,
        total_landed_cost: Decimal,
    },
    LandedCostShipmentRecalculated {
        shipment_id: Uuid,
        total_landed_cost: Decimal,
    },
    LandedCostShipmentFinalized {
        shipment_id: Uuid,
        updated_products: usize,
    },
    LandedCostFinalizationIncomplete {
        shipment_id: Uuid,
        failed_products: Vec<Uuid>,
    },
    LandedCostShipmentDeleted(Uuid),
}

impl Event {
    pub fn shipment_id(&self) -> Uuid {
        match self {
            Event::LandedCostShipmentCreated { shipment_id, .. }
            | Event::LandedCostShipmentRecalculated { shipment_id, .. }
            | Event::LandedCostShipmentFinalized { shipment_id, .. }
            | Event::LandedCostFinalizationIncomplete { shipment_id, .. } => *shipment_id,
            Event::LandedCostShipmentDeleted(shipment_id) => *shipment_id,
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::LandedCostShipmentCreated {
                shipment_id,
                total_landed_cost,
            } => {
                info!(%shipment_id, %total_landed_cost, "landed cost shipment created");
            }
            Event::LandedCostShipmentRecalculated {
                shipment_id,
                total_landed_cost,
            } => {
                info!(%shipment_id, %total_landed_cost, "landed cost shipment recalculated");
            }
            Event::LandedCostShipmentFinalized {
                shipment_id,
                updated_products,
            } => {
                info!(%shipment_id, updated_products, "landed cost shipment finalized");
            }
            Event::LandedCostFinalizationIncomplete {
                shipment_id,
                failed_products,
            } => {
                warn!(
                    %shipment_id,
                    failed = failed_products.len(),
                    "landed cost finalization left products without updated cost"
                );
            }
            Event::LandedCostShipmentDeleted(shipment_id) => {
                info!(%shipment_id, "landed cost shipment deleted");
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_events_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();

        sender
            .send(Event::LandedCostShipmentDeleted(id))
            .await
            .unwrap();
        sender
            .send(Event::LandedCostShipmentFinalized {
                shipment_id: id,
                updated_products: 2,
            })
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), Event::LandedCostShipmentDeleted(id));
        assert_eq!(rx.recv().await.unwrap().shipment_id(), id);
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender
            .send(Event::LandedCostShipmentDeleted(Uuid::new_v4()))
            .await
            .is_err());
    }
}
