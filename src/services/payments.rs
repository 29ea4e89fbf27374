use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{abandon, bounded, order_status::TransitionPolicy};
use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::{OrderStatus, Payment, PaymentStatus},
    repositories::{CheckoutStore, CheckoutTransaction},
};

/// Outcome of a payment status change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaymentStatusUpdate {
    pub payment: Payment,
    /// Set when the owning order was moved as part of the update.
    pub order_status_change: Option<OrderStatusChange>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct OrderStatusChange {
    pub order_id: Uuid,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

pub fn parse_payment_status(raw: &str) -> Result<PaymentStatus, ServiceError> {
    PaymentStatus::from_str(raw.trim()).map_err(|_| {
        ServiceError::InvalidStatus(format!(
            "'{}' is not a payment status. Valid statuses are: Pending, Completed, Failed",
            raw
        ))
    })
}

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn CheckoutStore>,
    policy: TransitionPolicy,
    event_sender: Option<Arc<EventSender>>,
    store_timeout: Duration,
}

impl PaymentService {
    pub fn new(store: Arc<dyn CheckoutStore>, policy: TransitionPolicy, store_timeout: Duration) -> Self {
        Self {
            store,
            policy,
            event_sender: None,
            store_timeout,
        }
    }

    pub fn with_event_sender(mut self, sender: Arc<EventSender>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Records a new payment status.
    ///
    /// Completing a payment also moves the owning order to `Processing`. Both
    /// writes share one transaction, so either both land or the update fails
    /// as a whole.
    #[instrument(skip(self, transaction_id), fields(payment_id = %payment_id))]
    pub async fn update_payment_status(
        &self,
        payment_id: Uuid,
        new_status: &str,
        transaction_id: Option<String>,
    ) -> Result<PaymentStatusUpdate, ServiceError> {
        let next = parse_payment_status(new_status).map_err(|e| {
            error!("Rejected payment status '{}' for payment {}", new_status, payment_id);
            e
        })?;

        let mut txn = bounded(self.store_timeout, "transaction begin", self.store.begin()).await?;

        let update = match self
            .apply_status(txn.as_mut(), payment_id, next, transaction_id)
            .await
        {
            Ok(update) => update,
            Err(e) => {
                abandon(txn, self.store_timeout).await;
                return Err(e);
            }
        };

        bounded(self.store_timeout, "transaction commit", txn.commit())
            .await
            .map_err(|e| {
                error!("Failed to commit status change for payment {}: {}", payment_id, e);
                e
            })?;

        info!("Payment {} status set to '{}'", payment_id, next);
        self.publish(&update).await;

        Ok(update)
    }

    async fn apply_status(
        &self,
        txn: &mut dyn CheckoutTransaction,
        payment_id: Uuid,
        next: PaymentStatus,
        transaction_id: Option<String>,
    ) -> Result<PaymentStatusUpdate, ServiceError> {
        let limit = self.store_timeout;
        let mut payment = bounded(limit, "payment lookup", txn.get_payment(payment_id))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment {} not found", payment_id)))?;

        if self.policy == TransitionPolicy::Strict && !payment.status.can_transition_to(next) {
            return Err(ServiceError::InvalidStatus(format!(
                "Payment {} is {} and cannot become {}",
                payment_id, payment.status, next
            )));
        }

        bounded(
            limit,
            "payment status update",
            txn.update_payment_status(payment_id, next, transaction_id.clone()),
        )
        .await?;
        payment.status = next;
        if transaction_id.is_some() {
            payment.transaction_id = transaction_id;
        }

        let order_status_change = if next == PaymentStatus::Completed {
            self.advance_order(txn, payment.order_id).await?
        } else {
            None
        };

        Ok(PaymentStatusUpdate {
            payment,
            order_status_change,
        })
    }

    async fn advance_order(
        &self,
        txn: &mut dyn CheckoutTransaction,
        order_id: Uuid,
    ) -> Result<Option<OrderStatusChange>, ServiceError> {
        let order = bounded(self.store_timeout, "order lookup", txn.get_order(order_id))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.status == OrderStatus::Processing {
            return Ok(None);
        }
        self.policy.check(order.status, OrderStatus::Processing)?;

        bounded(
            self.store_timeout,
            "order status update",
            txn.update_order_status(order_id, OrderStatus::Processing),
        )
        .await?;

        Ok(Some(OrderStatusChange {
            order_id,
            from: order.status,
            to: OrderStatus::Processing,
        }))
    }

    async fn publish(&self, update: &PaymentStatusUpdate) {
        let Some(sender) = &self.event_sender else {
            return;
        };

        sender
            .send_or_log(Event::PaymentStatusChanged {
                payment_id: update.payment.id,
                order_id: update.payment.order_id,
                status: update.payment.status,
            })
            .await;

        if let Some(change) = update.order_status_change {
            sender
                .send_or_log(Event::OrderStatusChanged {
                    order_id: change.order_id,
                    from: change.from,
                    to: change.to,
                })
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_payment_statuses() {
        assert_eq!(parse_payment_status("completed").unwrap(), PaymentStatus::Completed);
        assert_matches!(parse_payment_status("Refunded"), Err(ServiceError::InvalidStatus(_)));
    }
}
