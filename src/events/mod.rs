//! In-process domain events published after checkout writes commit.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{Money, OrderStatus, PaymentStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        total_amount: Money,
    },
    OrderStatusChanged {
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    },
    PaymentStatusChanged {
        payment_id: Uuid,
        order_id: Uuid,
        status: PaymentStatus,
    },
    CouponRedeemed {
        coupon_id: Uuid,
        order_id: Uuid,
    },
}

/// Cloneable handle for publishing [`Event`]s.
#[derive(Clone, Debug)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
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

    /// Sends an event, logging instead of failing when the channel is closed.
    ///
    /// Events are published after the owning write has committed, so a lost
    /// event never undoes the write.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("{}", e);
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match serde_json::to_string(&event) {
            Ok(payload) => info!(event = %payload, "checkout event"),
            Err(e) => error!("Failed to serialize event {:?}: {}", event, e),
        }
    }

    info!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let order_id = Uuid::new_v4();

        sender
            .send(Event::OrderCreated {
                order_id,
                total_amount: Money::new(100),
            })
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(Event::OrderCreated {
                order_id,
                total_amount: Money::new(100)
            })
        );
    }

    #[tokio::test]
    async fn send_or_log_tolerates_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        sender
            .send_or_log(Event::CouponRedeemed {
                coupon_id: Uuid::new_v4(),
                order_id: Uuid::new_v4(),
            })
            .await;
    }
}
