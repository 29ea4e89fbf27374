mod common;

use assert_matches::assert_matches;
use common::{two_line_cart, Fixture};
use storefront_checkout::{
    errors::ServiceError,
    events::Event,
    models::{HydratedOrder, OrderStatus, PaymentStatus},
    repositories::{CheckoutStore, FailPoint},
    services::order_status::TransitionPolicy,
};
use uuid::Uuid;

async fn place_order(fx: &Fixture) -> HydratedOrder {
    fx.orders()
        .create_order(fx.draft(&fx.standard_shipping, None), &two_line_cart())
        .await
        .expect("order should be created")
}

async fn stored_status(fx: &Fixture, order_id: Uuid) -> OrderStatus {
    fx.store
        .get_order(order_id)
        .await
        .unwrap()
        .expect("order exists")
        .order
        .status
}

#[tokio::test]
async fn shipped_is_accepted_from_pending_by_default() {
    let fx = Fixture::new().await;
    let placed = place_order(&fx).await;

    let updated = fx
        .order_status(TransitionPolicy::Permissive)
        .update_status(placed.order.id, "Shipped")
        .await
        .unwrap();

    assert_eq!(updated.status, OrderStatus::Shipped);
    assert_eq!(stored_status(&fx, placed.order.id).await, OrderStatus::Shipped);
}

#[tokio::test]
async fn unlisted_status_leaves_order_untouched() {
    let fx = Fixture::new().await;
    let placed = place_order(&fx).await;

    let result = fx
        .order_status(TransitionPolicy::Permissive)
        .update_status(placed.order.id, "Delivered")
        .await;

    assert_matches!(result, Err(ServiceError::InvalidStatus(_)));
    assert_eq!(stored_status(&fx, placed.order.id).await, OrderStatus::Pending);
}

#[tokio::test]
async fn strict_policy_rejects_skipping_processing() {
    let fx = Fixture::new().await;
    let placed = place_order(&fx).await;
    let service = fx.order_status(TransitionPolicy::Strict);

    assert_matches!(
        service.update_status(placed.order.id, "Shipped").await,
        Err(ServiceError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Shipped
        })
    );
    assert_eq!(stored_status(&fx, placed.order.id).await, OrderStatus::Pending);

    service.update_status(placed.order.id, "Processing").await.unwrap();
    service.update_status(placed.order.id, "Shipped").await.unwrap();
    service.update_status(placed.order.id, "Completed").await.unwrap();
    assert_matches!(
        service.update_status(placed.order.id, "Cancelled").await,
        Err(ServiceError::InvalidTransition { .. })
    );
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let fx = Fixture::new().await;
    assert_matches!(
        fx.order_status(TransitionPolicy::Permissive)
            .update_status(Uuid::new_v4(), "Processing")
            .await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn status_change_is_published() {
    let mut fx = Fixture::new().await;
    let placed = place_order(&fx).await;
    fx.drain_events();

    fx.order_status(TransitionPolicy::Permissive)
        .update_status(placed.order.id, "cancelled")
        .await
        .unwrap();

    assert_eq!(
        fx.drain_events(),
        vec![Event::OrderStatusChanged {
            order_id: placed.order.id,
            from: OrderStatus::Pending,
            to: OrderStatus::Cancelled,
        }]
    );
}

#[tokio::test]
async fn completed_payment_moves_order_to_processing() {
    let fx = Fixture::new().await;
    let placed = place_order(&fx).await;
    let payment_id = placed.payment.as_ref().unwrap().id;

    let update = fx
        .payments(TransitionPolicy::Permissive)
        .update_payment_status(payment_id, "Completed", Some("txn_8842".to_string()))
        .await
        .unwrap();

    assert_eq!(update.payment.status, PaymentStatus::Completed);
    assert_eq!(update.payment.transaction_id.as_deref(), Some("txn_8842"));
    assert_eq!(
        update.order_status_change.map(|change| change.to),
        Some(OrderStatus::Processing)
    );
    assert_eq!(stored_status(&fx, placed.order.id).await, OrderStatus::Processing);
}

#[tokio::test]
async fn failed_payment_leaves_order_alone() {
    let fx = Fixture::new().await;
    let placed = place_order(&fx).await;
    let payment_id = placed.payment.as_ref().unwrap().id;

    let update = fx
        .payments(TransitionPolicy::Permissive)
        .update_payment_status(payment_id, "Failed", None)
        .await
        .unwrap();

    assert_eq!(update.payment.status, PaymentStatus::Failed);
    assert!(update.order_status_change.is_none());
    assert_eq!(stored_status(&fx, placed.order.id).await, OrderStatus::Pending);
}

#[tokio::test]
async fn payment_and_order_update_together_or_not_at_all() {
    let fx = Fixture::new().await;
    let placed = place_order(&fx).await;
    let payment_id = placed.payment.as_ref().unwrap().id;
    fx.store.fail_on(FailPoint::UpdateOrderStatus).await;

    let result = fx
        .payments(TransitionPolicy::Permissive)
        .update_payment_status(payment_id, "Completed", Some("txn_1".to_string()))
        .await;

    assert!(result.is_err());
    let payment = fx.store.get_payment(payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert!(payment.transaction_id.is_none());
    assert_eq!(stored_status(&fx, placed.order.id).await, OrderStatus::Pending);
}

#[tokio::test]
async fn strict_policy_cannot_complete_payment_for_shipped_order() {
    let fx = Fixture::new().await;
    let placed = place_order(&fx).await;
    let payment_id = placed.payment.as_ref().unwrap().id;
    fx.order_status(TransitionPolicy::Permissive)
        .update_status(placed.order.id, "Shipped")
        .await
        .unwrap();

    let result = fx
        .payments(TransitionPolicy::Strict)
        .update_payment_status(payment_id, "Completed", None)
        .await;

    assert_matches!(result, Err(ServiceError::InvalidTransition { .. }));
    let payment = fx.store.get_payment(payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
}

#[tokio::test]
async fn strict_policy_treats_completed_payment_as_final() {
    let fx = Fixture::new().await;
    let placed = place_order(&fx).await;
    let payment_id = placed.payment.as_ref().unwrap().id;
    let payments = fx.payments(TransitionPolicy::Strict);

    payments
        .update_payment_status(payment_id, "Completed", None)
        .await
        .unwrap();

    assert_matches!(
        payments.update_payment_status(payment_id, "Failed", None).await,
        Err(ServiceError::InvalidStatus(_))
    );
}

#[tokio::test]
async fn unknown_payment_status_is_rejected() {
    let fx = Fixture::new().await;
    let placed = place_order(&fx).await;
    let payment_id = placed.payment.as_ref().unwrap().id;

    assert_matches!(
        fx.payments(TransitionPolicy::Permissive)
            .update_payment_status(payment_id, "Refunded", None)
            .await,
        Err(ServiceError::InvalidStatus(_))
    );
}
