use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{abandon, bounded};
use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::{Order, OrderStatus},
    repositories::{CheckoutStore, CheckoutTransaction},
};

/// Statuses an order may be set to.
pub const VALID_STATUSES: &[OrderStatus] = &[
    OrderStatus::Pending,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
];

/// Which order status changes are accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Any listed status may follow any other.
    #[default]
    Permissive,
    /// Only forward moves along `Pending → Processing → Shipped → Completed`,
    /// plus cancellation before shipping.
    Strict,
}

impl TransitionPolicy {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Permissive
        }
    }

    pub fn allows(self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => from.can_transition_to(to),
        }
    }

    pub fn check(self, from: OrderStatus, to: OrderStatus) -> Result<(), ServiceError> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(ServiceError::InvalidTransition { from, to })
        }
    }
}

/// Parses a status name from the API, naming the accepted values on failure.
pub fn parse_order_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(raw.trim()).map_err(|_| {
        let valid: Vec<String> = VALID_STATUSES.iter().map(ToString::to_string).collect();
        ServiceError::InvalidStatus(format!(
            "'{}' is not an order status. Valid statuses are: {}",
            raw,
            valid.join(", ")
        ))
    })
}

/// Moves `order_id` to `next` inside `txn`, returning the previous status.
///
/// Shared with payment completion, which drives the order forward in the
/// same transaction as the payment write.
pub(crate) async fn transition_order(
    txn: &mut dyn CheckoutTransaction,
    order_id: Uuid,
    next: OrderStatus,
    policy: TransitionPolicy,
    limit: Duration,
) -> Result<(Order, OrderStatus), ServiceError> {
    let mut order = bounded(limit, "order lookup", txn.get_order(order_id))
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

    let previous = order.status;
    policy.check(previous, next)?;

    if previous != next {
        bounded(limit, "order status update", txn.update_order_status(order_id, next)).await?;
        order.status = next;
    }

    Ok((order, previous))
}

#[derive(Clone)]
pub struct OrderStatusService {
    store: Arc<dyn CheckoutStore>,
    policy: TransitionPolicy,
    event_sender: Option<Arc<EventSender>>,
    store_timeout: Duration,
}

impl OrderStatusService {
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

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Updates the status of an order.
    ///
    /// Unknown status names fail with `InvalidStatus` before the store is
    /// touched. Setting the current status again succeeds without a write.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn update_status(&self, order_id: Uuid, new_status: &str) -> Result<Order, ServiceError> {
        let next = parse_order_status(new_status).map_err(|e| {
            error!("Rejected order status '{}' for order {}", new_status, order_id);
            e
        })?;

        let mut txn = bounded(self.store_timeout, "transaction begin", self.store.begin()).await?;

        let (order, previous) =
            match transition_order(txn.as_mut(), order_id, next, self.policy, self.store_timeout).await {
                Ok(moved) => moved,
                Err(e) => {
                    abandon(txn, self.store_timeout).await;
                    return Err(e);
                }
            };

        bounded(self.store_timeout, "transaction commit", txn.commit())
            .await
            .map_err(|e| {
                error!("Failed to commit status change for order {}: {}", order_id, e);
                e
            })?;

        if previous != next {
            info!("Order {} status updated from '{}' to '{}'", order_id, previous, next);
            if let Some(sender) = &self.event_sender {
                sender
                    .send_or_log(Event::OrderStatusChanged {
                        order_id,
                        from: previous,
                        to: next,
                    })
                    .await;
            }
        }

        Ok(order)
    }
}
